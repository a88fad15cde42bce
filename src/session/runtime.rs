use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::{
    storage::entities::UsageEvent,
    suggestion::{Suggestion, SuggestionClient, SuggestionError},
    utils::clock::SharedClock,
};

use super::{
    config::{AppName, SessionConfig},
    error::SessionError,
    machine::{SessionMachine, SessionSnapshot, TickOutcome},
    ticker::{CountdownTicker, Tick},
};

const INTERNAL_CHANNEL_SIZE: usize = 16;

/// Requests coming from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start(SessionConfig),
    Open(AppName),
    Stop,
    Acknowledge,
    End,
    Status,
}

/// Everything the dashboard has to render.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Started(SessionConfig),
    Warning(SessionError),
    Opened {
        app: AppName,
        remaining_seconds: u32,
    },
    Countdown {
        app: AppName,
        remaining_seconds: u32,
    },
    Stopped(AppName),
    Blocked {
        app: AppName,
        event: UsageEvent,
    },
    Suggested {
        app: AppName,
        suggestion: Suggestion,
    },
    SuggestionFailed {
        app: AppName,
        error: SuggestionError,
    },
    /// Suggestions are not configured, the block screen has nothing to wait for.
    SuggestionUnavailable(AppName),
    Resumed(AppName),
    Ended,
    Status(SessionSnapshot),
}

#[derive(Debug)]
struct SuggestionOutcome {
    block_token: u64,
    app: AppName,
    result: Result<Suggestion, SuggestionError>,
}

/// Event loop around [SessionMachine]. Commands, ticks and suggestion results are handled one at
/// a time on the same task, so the machine needs no locking.
pub struct SessionRuntime {
    machine: SessionMachine,
    commands: mpsc::Receiver<SessionCommand>,
    notices: mpsc::Sender<SessionNotice>,
    suggestions: Option<Arc<SuggestionClient>>,
    user_profile: Option<String>,
    clock: SharedClock,
    shutdown: CancellationToken,
    ticker: Option<CountdownTicker>,
    tick_sender: mpsc::Sender<Tick>,
    ticks: mpsc::Receiver<Tick>,
    outcome_sender: mpsc::Sender<SuggestionOutcome>,
    outcomes: mpsc::Receiver<SuggestionOutcome>,
    pending_suggestion: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    pub fn new(
        machine: SessionMachine,
        commands: mpsc::Receiver<SessionCommand>,
        notices: mpsc::Sender<SessionNotice>,
        clock: SharedClock,
        shutdown: CancellationToken,
    ) -> Self {
        let (tick_sender, ticks) = mpsc::channel(INTERNAL_CHANNEL_SIZE);
        let (outcome_sender, outcomes) = mpsc::channel(INTERNAL_CHANNEL_SIZE);
        Self {
            machine,
            commands,
            notices,
            suggestions: None,
            user_profile: None,
            clock,
            shutdown,
            ticker: None,
            tick_sender,
            ticks,
            outcome_sender,
            outcomes,
            pending_suggestion: None,
        }
    }

    /// Requests a suggestion from `client` whenever an app gets blocked.
    pub fn with_suggestions(
        mut self,
        client: Arc<SuggestionClient>,
        user_profile: Option<String>,
    ) -> Self {
        self.suggestions = Some(client);
        self.user_profile = user_profile;
        self
    }

    /// Runs until shutdown is requested or the command channel is closed.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Session runtime shutting down");
                    break;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed");
                        break;
                    };
                    self.handle_command(command).await;
                }
                Some(tick) = self.ticks.recv() => self.handle_tick(tick).await,
                Some(outcome) = self.outcomes.recv() => self.handle_outcome(outcome).await,
            }
        }
        self.ticker = None;
        self.abort_pending_suggestion();
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        debug!("Handling command {:?}", command);
        let result = match command {
            SessionCommand::Start(config) => self
                .machine
                .start(config.clone())
                .map(|_| SessionNotice::Started(config)),
            SessionCommand::Open(app) => self.machine.open(app.clone()).map(|generation| {
                self.ticker = Some(CountdownTicker::spawn(
                    generation,
                    self.clock.clone(),
                    self.tick_sender.clone(),
                    &self.shutdown,
                ));
                SessionNotice::Opened {
                    app,
                    remaining_seconds: self.machine.snapshot().remaining_seconds.unwrap_or(0),
                }
            }),
            SessionCommand::Stop => self.machine.stop().map(|app| {
                self.ticker = None;
                SessionNotice::Stopped(app)
            }),
            SessionCommand::Acknowledge => self.machine.acknowledge().map(|app| {
                self.abort_pending_suggestion();
                SessionNotice::Resumed(app)
            }),
            SessionCommand::End => self.machine.end().map(|_| {
                self.ticker = None;
                self.abort_pending_suggestion();
                SessionNotice::Ended
            }),
            SessionCommand::Status => Ok(SessionNotice::Status(self.machine.snapshot())),
        };

        match result {
            Ok(notice) => self.notify(notice).await,
            Err(e) => {
                warn!("Session command rejected: {e}");
                self.notify(SessionNotice::Warning(e)).await
            }
        }
    }

    async fn handle_tick(&mut self, tick: Tick) {
        match self.machine.tick(tick.generation).await {
            TickOutcome::Counting {
                app,
                remaining_seconds,
            } => {
                self.notify(SessionNotice::Countdown {
                    app,
                    remaining_seconds,
                })
                .await
            }
            TickOutcome::Expired {
                app,
                event,
                block_token,
            } => {
                self.ticker = None;
                self.notify(SessionNotice::Blocked {
                    app: app.clone(),
                    event,
                })
                .await;
                self.request_suggestion(app, block_token).await;
            }
            TickOutcome::Stale => debug!("Ignoring stale tick {:?}", tick),
        }
    }

    async fn request_suggestion(&mut self, app: AppName, block_token: u64) {
        let Some(client) = self.suggestions.clone() else {
            self.notify(SessionNotice::SuggestionUnavailable(app)).await;
            return;
        };
        self.abort_pending_suggestion();

        let profile = self.user_profile.clone();
        let sender = self.outcome_sender.clone();
        let span = info_span!("block_suggestion", %app, block_token);
        self.pending_suggestion = Some(tokio::spawn(
            async move {
                let result = client.request_suggestion(&app, profile.as_deref()).await;
                let outcome = SuggestionOutcome {
                    block_token,
                    app,
                    result,
                };
                if sender.send(outcome).await.is_err() {
                    debug!("Runtime is gone, dropping suggestion");
                }
            }
            .instrument(span),
        ));
    }

    async fn handle_outcome(&mut self, outcome: SuggestionOutcome) {
        if !self.machine.is_current_block(outcome.block_token) {
            debug!(
                "Dropping suggestion for a dismissed block screen {:?}",
                outcome
            );
            return;
        }
        self.pending_suggestion = None;
        let notice = match outcome.result {
            Ok(suggestion) => SessionNotice::Suggested {
                app: outcome.app,
                suggestion,
            },
            Err(error) => SessionNotice::SuggestionFailed {
                app: outcome.app,
                error,
            },
        };
        self.notify(notice).await;
    }

    fn abort_pending_suggestion(&mut self) {
        if let Some(handle) = self.pending_suggestion.take() {
            handle.abort();
        }
    }

    async fn notify(&self, notice: SessionNotice) {
        if self.notices.send(notice).await.is_err() {
            debug!("Dashboard stopped listening");
        }
    }
}
