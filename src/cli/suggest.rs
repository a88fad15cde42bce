use anyhow::{anyhow, Result};
use clap::Parser;

use crate::config::GeneratorArgs;

#[derive(Debug, Parser)]
pub struct SuggestCommand {
    #[arg(help = "The app you want to get away from")]
    app: String,
    #[arg(
        long,
        env = "NUDGEBLOCK_PROFILE",
        help = "A few words about you, used to tailor the suggestion"
    )]
    profile: Option<String>,
    #[arg(long, help = "Print the suggestion as JSON")]
    json: bool,
    #[command(flatten)]
    generator: GeneratorArgs,
}

pub async fn process_suggest_command(command: SuggestCommand) -> Result<()> {
    let client = command.generator.suggestion_client()?.ok_or_else(|| {
        anyhow!("No suggestion service configured, set NUDGEBLOCK_API_KEY or NUDGEBLOCK_ENDPOINT")
    })?;
    let suggestion = client
        .request_suggestion(&command.app, command.profile.as_deref())
        .await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&suggestion)?);
    } else {
        println!("Try {}: {}", suggestion.suggested_app_name, suggestion.reason);
    }
    Ok(())
}
