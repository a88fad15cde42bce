use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels `cancelation` on ctrl-c. Returns early if something else cancelled it first.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}
