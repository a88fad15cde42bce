use std::{io::BufRead, path::PathBuf, sync::Arc};

use ansi_term::Colour;
use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::GeneratorArgs,
    server::shutdown::detect_shutdown,
    session::{
        config::{AppName, NudgeInterval, SessionConfig, APP_CATALOG},
        error::{PhaseName, SessionError},
        machine::{SessionMachine, SessionSnapshot},
        runtime::{SessionCommand, SessionNotice, SessionRuntime},
    },
    storage::usage_log::JsonUsageLog,
    utils::{
        clock::DefaultClock,
        time::{format_countdown, format_local, format_minutes},
    },
};

const CHANNEL_SIZE: usize = 32;

/// Countdown lines are printed on whole minutes and for the last few seconds only.
const FINAL_SECONDS: u32 = 10;

const HELP: &str = "\
Commands:
  select <app>      add an app to the selection (only while no session runs)
  deselect <app>    remove an app from the selection
  interval <1-5>    set the nudge interval in minutes
  start             start a focus session with the current selection
  open <app>        simulate opening a monitored app, starts its countdown
  stop              stop using the current app, resets the countdown
  ack               acknowledge a block and return to the dashboard
  status            show the session state
  end               end the focus session
  apps              list the apps to choose from
  help              show this message
  quit              end everything and exit";

#[derive(Debug, Parser)]
pub struct FocusCommand {
    #[arg(
        long,
        short,
        value_delimiter = ',',
        help = "Apps to monitor, comma separated. The session starts right away when given"
    )]
    apps: Vec<AppName>,
    #[arg(long, short, default_value_t = NudgeInterval::default(), help = "Minutes allowed per use, 1 to 5")]
    interval: NudgeInterval,
    #[arg(
        long,
        env = "NUDGEBLOCK_PROFILE",
        help = "A few words about you, used to tailor suggestions"
    )]
    profile: Option<String>,
    #[command(flatten)]
    generator: GeneratorArgs,
}

/// A parsed dashboard line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Session(SessionCommand),
    Select(AppName),
    Deselect(AppName),
    Interval(NudgeInterval),
    Start,
    Apps,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };
    let app = || AppName::from_catalog(argument).map_err(|e| e.to_string());

    let input = match command.to_ascii_lowercase().as_str() {
        "select" => Input::Select(app()?),
        "deselect" => Input::Deselect(app()?),
        "interval" => Input::Interval(argument.parse().map_err(|e: SessionError| e.to_string())?),
        "start" => Input::Start,
        "open" => Input::Session(SessionCommand::Open(app()?)),
        "stop" => Input::Session(SessionCommand::Stop),
        "ack" | "acknowledge" | "back" => Input::Session(SessionCommand::Acknowledge),
        "status" => Input::Session(SessionCommand::Status),
        "end" => Input::Session(SessionCommand::End),
        "apps" => Input::Apps,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("Unknown command {other:?}, type `help` for the list")),
    };
    Ok(Some(input))
}

fn warning(message: impl std::fmt::Display) -> String {
    Colour::Yellow.paint(format!("! {message}")).to_string()
}

fn render_config(config: &SessionConfig) -> String {
    let apps = config
        .monitored_apps()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>();
    format!(
        "Monitoring {} with a limit of {} per use.",
        apps.join(", "),
        format_minutes(config.nudge_interval().minutes())
    )
}

fn render_status(snapshot: &SessionSnapshot) -> String {
    match (snapshot.phase, &snapshot.active_app, snapshot.remaining_seconds) {
        (PhaseName::Idle, _, _) => "No focus session is running.".to_string(),
        (PhaseName::Running, Some(app), Some(remaining)) => {
            format!("Using {app}, {} left.", format_countdown(remaining))
        }
        (PhaseName::Running, _, _) => "Focus session running, no app in use.".to_string(),
        (PhaseName::Blocked, Some(app), _) => format!("{app} is blocked. Type `ack` to go back."),
        (PhaseName::Blocked, None, _) => "An app is blocked. Type `ack` to go back.".to_string(),
    }
}

/// Text for a notice, `None` for countdown ticks that are not worth a line. `limit_seconds` is the
/// full countdown of the running session, used for the share of time left.
fn render_notice(notice: &SessionNotice, limit_seconds: Option<u32>) -> Option<String> {
    let text = match notice {
        SessionNotice::Started(config) => {
            format!("Focus session started. {}", render_config(config))
        }
        SessionNotice::Warning(e) => warning(e),
        SessionNotice::Opened {
            app,
            remaining_seconds,
        } => format!(
            "Opened {app}. You have {} before it gets blocked.",
            format_countdown(*remaining_seconds)
        ),
        SessionNotice::Countdown {
            app,
            remaining_seconds,
        } => {
            if remaining_seconds % 60 != 0 && *remaining_seconds > FINAL_SECONDS {
                return None;
            }
            let countdown = format_countdown(*remaining_seconds);
            match limit_seconds.filter(|v| *v > 0) {
                Some(limit) => format!(
                    "{app} {countdown} ({}% left)",
                    remaining_seconds * 100 / limit
                ),
                None => format!("{app} {countdown}"),
            }
        }
        SessionNotice::Stopped(app) => format!("Stopped using {app}. Its timer has been reset."),
        SessionNotice::Blocked { app, event } => format!(
            "{}\nYour time limit for {app} ran out at {}. Take a break and try something else.",
            Colour::Red.bold().paint(format!("{app} is blocked")),
            format_local(event.timestamp)
        ),
        SessionNotice::Suggested { suggestion, .. } => format!(
            "{} {}\nType `ack` to go back to the dashboard.",
            Colour::Green.paint(format!("Try {}:", suggestion.suggested_app_name)),
            suggestion.reason
        ),
        SessionNotice::SuggestionFailed { error, .. } => format!(
            "{}\nType `ack` to go back to the dashboard.",
            warning(format!("Couldn't get a suggestion: {error}"))
        ),
        SessionNotice::SuggestionUnavailable(_) => {
            "Type `ack` to go back to the dashboard.".to_string()
        }
        SessionNotice::Resumed(app) => {
            format!("Back on the dashboard. {app} stays monitored, open an app to start again.")
        }
        SessionNotice::Ended => "Focus session ended.".to_string(),
        SessionNotice::Status(snapshot) => render_status(snapshot),
    };
    Some(text)
}

/// Terminal front end. Owns the app selection while no session runs and forwards everything else
/// to the runtime.
struct Dashboard {
    selection: Vec<AppName>,
    interval: NudgeInterval,
    session_active: bool,
    limit_seconds: Option<u32>,
    commands: mpsc::Sender<SessionCommand>,
    notices: mpsc::Receiver<SessionNotice>,
    lines: mpsc::Receiver<String>,
    shutdown: CancellationToken,
}

impl Dashboard {
    fn new(
        selection: Vec<AppName>,
        interval: NudgeInterval,
        commands: mpsc::Sender<SessionCommand>,
        notices: mpsc::Receiver<SessionNotice>,
        lines: mpsc::Receiver<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            selection,
            interval,
            session_active: false,
            limit_seconds: None,
            commands,
            notices,
            lines,
            shutdown,
        }
    }

    fn draft(&self) -> SessionConfig {
        SessionConfig::new(self.selection.iter().cloned(), self.interval)
    }

    fn frozen(&self) -> Option<String> {
        self.session_active
            .then(|| warning("The selection can't change while a session is running"))
    }

    /// Applies a local input. Returns `false` when the dashboard should exit.
    async fn handle_input(&mut self, input: Input) -> Result<bool> {
        let message = match input {
            Input::Select(app) => self.frozen().unwrap_or_else(|| {
                if !self.selection.contains(&app) {
                    self.selection.push(app);
                }
                render_selection(&self.draft())
            }),
            Input::Deselect(app) => self.frozen().unwrap_or_else(|| {
                self.selection.retain(|v| *v != app);
                render_selection(&self.draft())
            }),
            Input::Interval(interval) => self.frozen().unwrap_or_else(|| {
                self.interval = interval;
                render_selection(&self.draft())
            }),
            Input::Start => {
                self.commands.send(SessionCommand::Start(self.draft())).await?;
                return Ok(true);
            }
            Input::Session(command) => {
                self.commands.send(command).await?;
                return Ok(true);
            }
            Input::Apps => format!("Apps: {}", APP_CATALOG.join(", ")),
            Input::Help => HELP.to_string(),
            Input::Quit => return Ok(false),
        };
        println!("{message}");
        Ok(true)
    }

    async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                notice = self.notices.recv() => {
                    let Some(notice) = notice else { break };
                    match &notice {
                        SessionNotice::Started(config) => {
                            self.session_active = true;
                            self.limit_seconds = Some(config.nudge_interval().seconds());
                        }
                        SessionNotice::Ended => {
                            self.session_active = false;
                            self.limit_seconds = None;
                        }
                        _ => {}
                    }
                    if let Some(text) = render_notice(&notice, self.limit_seconds) {
                        println!("{text}");
                    }
                }
                line = self.lines.recv() => {
                    let Some(line) = line else {
                        debug!("Input closed");
                        break;
                    };
                    match parse_input(&line) {
                        Ok(Some(input)) => {
                            if !self.handle_input(input).await? {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => println!("{}", warning(e)),
                    }
                }
            }
        }
        self.shutdown.cancel();
        Ok(())
    }
}

/// Forwards stdin lines from a plain thread. Blocking reads can't be cancelled, so the thread is
/// detached and goes away with the process.
fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (sender, lines) = mpsc::channel(CHANNEL_SIZE);
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Couldn't read input: {e}");
                        break;
                    }
                }
            }
        })?;
    Ok(lines)
}

fn render_selection(config: &SessionConfig) -> String {
    if config.is_empty() {
        format!(
            "No apps selected, limit {} per use.",
            format_minutes(config.nudge_interval().minutes())
        )
    } else {
        format!("Selected: {}", render_config(config))
    }
}

pub async fn process_focus_command(command: FocusCommand, dir: PathBuf) -> Result<()> {
    let store = Arc::new(JsonUsageLog::new(dir)?);
    let clock = DefaultClock::shared();
    let shutdown = CancellationToken::new();

    let (commands_sender, commands) = mpsc::channel(CHANNEL_SIZE);
    let (notices_sender, notices) = mpsc::channel(CHANNEL_SIZE);

    let machine = SessionMachine::new(store, clock.clone());
    let mut runtime = SessionRuntime::new(
        machine,
        commands,
        notices_sender,
        clock,
        shutdown.clone(),
    );
    match command.generator.suggestion_client()? {
        Some(client) => runtime = runtime.with_suggestions(Arc::new(client), command.profile),
        None => println!(
            "{}",
            warning("No suggestion service configured, set NUDGEBLOCK_API_KEY or NUDGEBLOCK_ENDPOINT")
        ),
    }

    let dashboard = Dashboard::new(
        command.apps,
        command.interval,
        commands_sender,
        notices,
        spawn_stdin_reader()?,
        shutdown.clone(),
    );

    println!("{HELP}");
    let draft = dashboard.draft();
    if draft.is_empty() {
        println!("{}", render_selection(&draft));
    } else {
        dashboard.commands.send(SessionCommand::Start(draft)).await?;
    }

    info!("Focus dashboard started");
    let (_, dashboard_result, _) = tokio::join!(
        runtime.run(),
        dashboard.run(),
        detect_shutdown(shutdown.clone())
    );
    info!("Focus dashboard stopped");
    dashboard_result
}
