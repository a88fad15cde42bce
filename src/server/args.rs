use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::config::GeneratorArgs;

pub const DEFAULT_ADDR: &str = "127.0.0.1:9002";

#[derive(Parser)]
#[command(name = "nudgeblock-server", version, about = "Serves POST /api/suggest")]
pub struct ServerArgs {
    #[arg(long, env = "NUDGEBLOCK_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Mirror logs to stderr.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    #[command(flatten)]
    pub generator: GeneratorArgs,
}
