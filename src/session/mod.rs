//! Focus session lifecycle. [machine::SessionMachine] owns the phase and the countdown and is
//! driven by [runtime::SessionRuntime], which feeds it UI commands and the ticks produced by
//! [ticker::CountdownTicker].

pub mod config;
pub mod error;
pub mod machine;
pub mod runtime;
pub mod ticker;
