//! Focus sessions for building better habits. Pick the apps you find distracting, get a countdown
//! every time you open one, and get nudged toward something productive when the time is up.
//! Completed countdowns are logged locally and summarized in a report.

pub mod cli;
pub mod config;
pub mod fs;
pub mod report;
pub mod server;
pub mod session;
pub mod storage;
pub mod suggestion;
pub mod utils;
