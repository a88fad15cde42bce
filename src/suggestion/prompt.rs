use super::SuggestionRequest;

pub const SYSTEM_PROMPT: &str = "You help people build better habits. They were just nudged away \
from an app they find distracting, and you suggest one productive app to use instead.";

/// User message for a suggestion. The profile paragraph is only added when a profile is present.
pub fn build_prompt(request: &SuggestionRequest) -> String {
    let mut prompt = format!(
        "The user was just using {}. Suggest a single alternative application and give a brief \
         reason why it would be a good alternative. Be concise.",
        request.distracting_app_name
    );
    if let Some(profile) = &request.user_profile {
        prompt.push_str("\n\nConsider the following user profile when making your suggestion: ");
        prompt.push_str(profile);
    }
    prompt
}
