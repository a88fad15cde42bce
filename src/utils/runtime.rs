use anyhow::Result;

/// Everything in nudgeblock runs on one thread: the session runtime, its ticker and the
/// suggestion requests all share the same event loop.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
