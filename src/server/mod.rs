//! HTTP wrapper around [SuggestionClient]: `POST /api/suggest`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::suggestion::SuggestionClient;

pub mod args;
pub mod routes;
pub mod shutdown;

/// Binds `addr` and serves until ctrl-c.
pub async fn start_server(addr: SocketAddr, client: SuggestionClient) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let shutdown_token = CancellationToken::new();

    let (_, serve_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        serve(listener, Arc::new(client), shutdown_token.clone()),
    );
    serve_result
}

/// Serves on an already bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    client: Arc<SuggestionClient>,
    shutdown: CancellationToken,
) -> Result<()> {
    info!("Serving suggestions on {}", listener.local_addr()?);
    let result = axum::serve(listener, routes::router(client))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;
    // Let the signal watcher finish if the server stopped on its own.
    shutdown.cancel();
    result?;
    info!("Server stopped");
    Ok(())
}
