use anyhow::{anyhow, Result};
use clap::Parser;
use nudgeblock::{
    server::{args::ServerArgs, start_server},
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, SERVER_PREFIX},
        runtime::single_thread_runtime,
    },
};
use tracing::error;

fn main() -> Result<()> {
    run(ServerArgs::parse())
}

fn run(args: ServerArgs) -> Result<()> {
    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;
    enable_logging(SERVER_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;

    let client = args
        .generator
        .suggestion_client()?
        .ok_or_else(|| anyhow!("No suggestion service configured, set NUDGEBLOCK_API_KEY"))?;

    single_thread_runtime()?
        .block_on(async move { start_server(args.addr, client).await })
        .inspect_err(|e| error!("Server stopped with an error {e:?}"))
}
