use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    storage::{entities::UsageEvent, usage_log::UsageLogStore},
    utils::clock::SharedClock,
};

use super::{
    config::{AppName, SessionConfig},
    error::{PhaseName, SessionError},
};

/// Countdown for the app currently in use. `generation` identifies the countdown so that ticks
/// scheduled for a replaced countdown can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub app: AppName,
    pub remaining_seconds: u32,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running {
        config: SessionConfig,
        countdown: Option<Countdown>,
    },
    Blocked {
        config: SessionConfig,
        app: AppName,
        event: UsageEvent,
        block_token: u64,
    },
}

impl SessionPhase {
    pub fn name(&self) -> PhaseName {
        match self {
            SessionPhase::Idle => PhaseName::Idle,
            SessionPhase::Running { .. } => PhaseName::Running,
            SessionPhase::Blocked { .. } => PhaseName::Blocked,
        }
    }
}

/// Flat view of the session used for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: PhaseName,
    pub active_app: Option<AppName>,
    pub remaining_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Counting {
        app: AppName,
        remaining_seconds: u32,
    },
    Expired {
        app: AppName,
        event: UsageEvent,
        block_token: u64,
    },
    /// The tick belongs to a countdown that no longer exists.
    Stale,
}

/// Session lifecycle: `idle -> running -> blocked -> running`, `end` returns to idle from any
/// active phase. Only a countdown that runs out is logged.
pub struct SessionMachine {
    phase: SessionPhase,
    store: Arc<dyn UsageLogStore>,
    clock: SharedClock,
    last_generation: u64,
    last_block_token: u64,
}

impl SessionMachine {
    pub fn new(store: Arc<dyn UsageLogStore>, clock: SharedClock) -> Self {
        Self {
            phase: SessionPhase::Idle,
            store,
            clock,
            last_generation: 0,
            last_block_token: 0,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match &self.phase {
            SessionPhase::Idle => SessionSnapshot {
                phase: PhaseName::Idle,
                active_app: None,
                remaining_seconds: None,
            },
            SessionPhase::Running { countdown, .. } => SessionSnapshot {
                phase: PhaseName::Running,
                active_app: countdown.as_ref().map(|v| v.app.clone()),
                remaining_seconds: countdown.as_ref().map(|v| v.remaining_seconds),
            },
            SessionPhase::Blocked { app, .. } => SessionSnapshot {
                phase: PhaseName::Blocked,
                active_app: Some(app.clone()),
                remaining_seconds: None,
            },
        }
    }

    pub fn start(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        self.expect_phase("start", PhaseName::Idle)?;
        if config.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        info!(
            apps = ?config.monitored_apps(),
            interval = %config.nudge_interval(),
            "Starting focus session"
        );
        self.phase = SessionPhase::Running {
            config,
            countdown: None,
        };
        Ok(())
    }

    /// Starts a countdown for `app`, replacing any countdown in progress. Returns the generation
    /// of the new countdown.
    pub fn open(&mut self, app: AppName) -> Result<u64, SessionError> {
        let SessionPhase::Running { config, countdown } = &mut self.phase else {
            return Err(self.invalid("open an app"));
        };
        if !config.is_monitored(&app) {
            return Err(SessionError::NotMonitored(app));
        }
        if let Some(previous) = countdown.as_ref() {
            debug!(
                "Countdown for {} interrupted with {}s left",
                previous.app, previous.remaining_seconds
            );
        }

        self.last_generation += 1;
        let generation = self.last_generation;
        let remaining_seconds = config.nudge_interval().seconds();
        info!(%app, remaining_seconds, generation, "Countdown started");
        *countdown = Some(Countdown {
            app,
            remaining_seconds,
            generation,
        });
        Ok(generation)
    }

    /// Clears the running countdown without logging it.
    pub fn stop(&mut self) -> Result<AppName, SessionError> {
        let SessionPhase::Running { countdown, .. } = &mut self.phase else {
            return Err(self.invalid("stop using an app"));
        };
        let stopped = countdown.take().ok_or(SessionError::NoActiveApp)?;
        info!(app = %stopped.app, remaining = stopped.remaining_seconds, "Countdown stopped");
        Ok(stopped.app)
    }

    /// Advances the countdown identified by `generation` by one second. Reaching zero logs a usage
    /// event and blocks the app.
    pub async fn tick(&mut self, generation: u64) -> TickOutcome {
        let SessionPhase::Running {
            countdown: Some(countdown),
            ..
        } = &mut self.phase
        else {
            debug!(generation, "Tick outside of a countdown");
            return TickOutcome::Stale;
        };
        if countdown.generation != generation {
            debug!(
                generation,
                active = countdown.generation,
                "Tick from a replaced countdown"
            );
            return TickOutcome::Stale;
        }

        countdown.remaining_seconds = countdown.remaining_seconds.saturating_sub(1);
        if countdown.remaining_seconds > 0 {
            return TickOutcome::Counting {
                app: countdown.app.clone(),
                remaining_seconds: countdown.remaining_seconds,
            };
        }
        self.expire().await
    }

    async fn expire(&mut self) -> TickOutcome {
        let phase = std::mem::replace(&mut self.phase, SessionPhase::Idle);
        let (config, countdown) = match phase {
            SessionPhase::Running {
                config,
                countdown: Some(countdown),
            } => (config, countdown),
            other => {
                self.phase = other;
                return TickOutcome::Stale;
            }
        };

        let event = UsageEvent::new(
            countdown.app.as_arc(),
            config.nudge_interval().minutes(),
            self.clock.time(),
        );
        if let Err(e) = self.store.append(event.clone()).await {
            error!("Failed to persist usage event {:?}: {e:?}", event);
        }

        self.last_block_token += 1;
        let block_token = self.last_block_token;
        info!(app = %countdown.app, block_token, "Time is up, app blocked");
        self.phase = SessionPhase::Blocked {
            config,
            app: countdown.app.clone(),
            event: event.clone(),
            block_token,
        };
        TickOutcome::Expired {
            app: countdown.app,
            event,
            block_token,
        }
    }

    /// Dismisses the block screen. The session keeps running with the same config, so another
    /// app can be opened right away.
    pub fn acknowledge(&mut self) -> Result<AppName, SessionError> {
        let phase = std::mem::replace(&mut self.phase, SessionPhase::Idle);
        let (config, app) = match phase {
            SessionPhase::Blocked { config, app, .. } => (config, app),
            other => {
                self.phase = other;
                return Err(self.invalid("acknowledge a block"));
            }
        };
        info!(%app, "Block acknowledged");
        self.phase = SessionPhase::Running {
            config,
            countdown: None,
        };
        Ok(app)
    }

    /// Ends the session from any active phase. A countdown in progress is dropped unlogged.
    pub fn end(&mut self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Idle {
            return Err(self.invalid("end the session"));
        }
        info!(phase = %self.phase.name(), "Ending focus session");
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    /// Whether `block_token` identifies the block screen currently shown.
    pub fn is_current_block(&self, block_token: u64) -> bool {
        matches!(&self.phase, SessionPhase::Blocked { block_token: v, .. } if *v == block_token)
    }

    #[cfg(test)]
    pub fn active_generation(&self) -> Option<u64> {
        match &self.phase {
            SessionPhase::Running {
                countdown: Some(countdown),
                ..
            } => Some(countdown.generation),
            _ => None,
        }
    }

    fn expect_phase(&self, action: &'static str, expected: PhaseName) -> Result<(), SessionError> {
        if self.phase.name() == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}
