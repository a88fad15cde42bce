pub mod focus;
pub mod report;
pub mod suggest;

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use focus::{process_focus_command, FocusCommand};
use report::{process_report_command, ReportCommand};
use suggest::{process_suggest_command, SuggestCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    config::GeneratorArgs,
    server::{args::DEFAULT_ADDR, start_server},
    session::config::{APP_CATALOG, NUDGE_INTERVAL_OPTIONS},
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "NudgeBlock", version, long_about = None)]
#[command(about = "Focus sessions that nudge you away from distracting apps", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start an interactive focus session")]
    Focus {
        #[command(flatten)]
        command: FocusCommand,
    },
    #[command(about = "Show time spent on apps you were nudged away from")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Ask for a productive alternative to an app")]
    Suggest {
        #[command(flatten)]
        command: SuggestCommand,
    },
    #[command(about = "Serve POST /api/suggest in the foreground")]
    Serve {
        #[arg(long, env = "NUDGEBLOCK_ADDR", default_value = DEFAULT_ADDR)]
        addr: SocketAddr,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    #[command(about = "List the apps and nudge intervals to choose from")]
    Apps {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Focus { command } => process_focus_command(command, dir).await,
        Commands::Report { command } => process_report_command(command, dir).await,
        Commands::Suggest { command } => process_suggest_command(command).await,
        Commands::Serve { addr, generator } => {
            let client = generator.suggestion_client()?.ok_or_else(|| {
                anyhow!("No suggestion service configured, set NUDGEBLOCK_API_KEY")
            })?;
            start_server(addr, client).await
        }
        Commands::Apps {} => {
            println!("Apps: {}", APP_CATALOG.join(", "));
            let intervals = NUDGE_INTERVAL_OPTIONS
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>();
            println!("Nudge intervals (minutes): {}", intervals.join(", "));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Args, Commands};

    #[test]
    fn arguments_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::try_parse_from(["nudgeblock", "focus", "--log", "--dir", "/tmp/nb"])
            .expect("flags after the subcommand");
        assert!(args.log);
        assert_eq!(args.dir.as_deref(), Some(std::path::Path::new("/tmp/nb")));
        assert!(matches!(args.commands, Commands::Focus { .. }));

        let args = Args::try_parse_from(["nudgeblock", "--log", "report", "--json"])
            .expect("flags before the subcommand");
        assert!(args.log);
        assert!(matches!(args.commands, Commands::Report { .. }));
    }
}
