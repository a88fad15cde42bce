//! Productive-alternative suggestions shown on the block screen. Generation itself happens in an
//! external service behind [SuggestionGenerator]; [SuggestionClient] validates what goes in and
//! what comes out and never retries.

pub mod endpoint;
pub mod openai;
pub mod prompt;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub distracting_app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<String>,
}

impl SuggestionRequest {
    /// Trims the inputs. A blank app name is rejected, a blank profile is dropped.
    pub fn new(
        distracting_app_name: &str,
        user_profile: Option<&str>,
    ) -> Result<Self, SuggestionError> {
        let distracting_app_name = distracting_app_name.trim();
        if distracting_app_name.is_empty() {
            return Err(SuggestionError::InvalidRequest(
                "distractingAppName must not be empty".into(),
            ));
        }
        Ok(Self {
            distracting_app_name: distracting_app_name.to_string(),
            user_profile: user_profile
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub suggested_app_name: String,
    pub reason: String,
}

/// Suggestion as it comes off the wire, before checking that both fields are there.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSuggestion {
    pub suggested_app_name: Option<String>,
    pub reason: Option<String>,
}

impl TryFrom<RawSuggestion> for Suggestion {
    type Error = SuggestionError;

    fn try_from(value: RawSuggestion) -> Result<Self, Self::Error> {
        let suggested_app_name = non_blank(value.suggested_app_name)
            .ok_or(SuggestionError::MissingField("suggestedAppName"))?;
        let reason = non_blank(value.reason).ok_or(SuggestionError::MissingField("reason"))?;
        Ok(Suggestion {
            suggested_app_name,
            reason,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SuggestionError {
    #[error("Invalid suggestion request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),

    #[error("Suggestion is missing {0}")]
    MissingField(&'static str),
}

impl SuggestionError {
    /// Whether the caller sent something unusable, as opposed to the generation failing.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, SuggestionError::InvalidRequest(_))
    }

    pub(crate) fn from_transport(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            SuggestionError::Timeout(timeout)
        } else {
            SuggestionError::Network(error.to_string())
        }
    }
}

/// One attempt at generating a suggestion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn generate(&self, request: &SuggestionRequest) -> Result<Suggestion, SuggestionError>;
}

pub struct SuggestionClient {
    generator: Arc<dyn SuggestionGenerator>,
}

impl SuggestionClient {
    pub fn new(generator: Arc<dyn SuggestionGenerator>) -> Self {
        Self { generator }
    }

    pub async fn request_suggestion(
        &self,
        distracting_app_name: &str,
        user_profile: Option<&str>,
    ) -> Result<Suggestion, SuggestionError> {
        let request = SuggestionRequest::new(distracting_app_name, user_profile)?;
        self.send(request).await
    }

    /// Sends an already built request. Inputs are checked again, so requests deserialized from
    /// the outside go through the same rules.
    pub async fn send(&self, request: SuggestionRequest) -> Result<Suggestion, SuggestionError> {
        let request =
            SuggestionRequest::new(&request.distracting_app_name, request.user_profile.as_deref())?;
        debug!("Requesting suggestion {:?}", request);

        let suggestion = self
            .generator
            .generate(&request)
            .await
            .inspect_err(|e| warn!(app = %request.distracting_app_name, "Suggestion failed: {e}"))?;

        let suggestion = Suggestion::try_from(RawSuggestion {
            suggested_app_name: Some(suggestion.suggested_app_name),
            reason: Some(suggestion.reason),
        })
        .inspect_err(|e| warn!("Generator returned an incomplete suggestion: {e}"))?;

        info!(
            app = %request.distracting_app_name,
            suggested = %suggestion.suggested_app_name,
            "Received suggestion"
        );
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;

    use super::{
        MockSuggestionGenerator, RawSuggestion, Suggestion, SuggestionClient, SuggestionError,
        SuggestionRequest,
    };

    fn suggestion(name: &str, reason: &str) -> Suggestion {
        Suggestion {
            suggested_app_name: name.into(),
            reason: reason.into(),
        }
    }

    #[test]
    fn request_validation() {
        assert!(SuggestionRequest::new("  ", None)
            .unwrap_err()
            .is_invalid_request());

        let request = SuggestionRequest::new(" Games ", Some("   ")).unwrap();
        assert_eq!(request.distracting_app_name, "Games");
        assert_eq!(request.user_profile, None);

        let request = SuggestionRequest::new("Games", Some("student")).unwrap();
        assert_eq!(request.user_profile.as_deref(), Some("student"));
    }

    #[test]
    fn raw_suggestion_requires_both_fields() {
        let missing_reason = RawSuggestion {
            suggested_app_name: Some("Duolingo".into()),
            reason: None,
        };
        assert_eq!(
            Suggestion::try_from(missing_reason),
            Err(SuggestionError::MissingField("reason"))
        );

        let blank_name = RawSuggestion {
            suggested_app_name: Some(" ".into()),
            reason: Some("Learn".into()),
        };
        assert_eq!(
            Suggestion::try_from(blank_name),
            Err(SuggestionError::MissingField("suggestedAppName"))
        );
    }

    #[tokio::test]
    async fn client_forwards_validated_request() {
        let mut generator = MockSuggestionGenerator::new();
        generator
            .expect_generate()
            .with(eq(SuggestionRequest {
                distracting_app_name: "Games".into(),
                user_profile: None,
            }))
            .times(1)
            .returning(|_| Ok(suggestion("Duolingo", "Five minutes of practice")));

        let client = SuggestionClient::new(Arc::new(generator));
        let result = client.request_suggestion("Games", None).await;
        assert_eq!(result, Ok(suggestion("Duolingo", "Five minutes of practice")));
    }

    #[tokio::test]
    async fn client_rejects_empty_app_without_calling_generator() {
        let mut generator = MockSuggestionGenerator::new();
        generator.expect_generate().never();

        let client = SuggestionClient::new(Arc::new(generator));
        let result = client.request_suggestion("", Some("profile")).await;
        assert!(matches!(result, Err(SuggestionError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn client_surfaces_transport_failure_once() {
        let mut generator = MockSuggestionGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Err(SuggestionError::Network("connection refused".into())));

        let client = SuggestionClient::new(Arc::new(generator));
        let result = client.request_suggestion("Games", None).await;
        assert_eq!(
            result,
            Err(SuggestionError::Network("connection refused".into()))
        );
    }

    #[tokio::test]
    async fn client_treats_partial_suggestion_as_failure() {
        let mut generator = MockSuggestionGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok(suggestion("Kindle", "")));

        let client = SuggestionClient::new(Arc::new(generator));
        let result = client.request_suggestion("YouTube", None).await;
        assert_eq!(result, Err(SuggestionError::MissingField("reason")));
    }
}
