use anyhow::Result;

/// Every piece of state in the reminder lives on one thread, so the daemon never needs more
/// than a current-thread runtime.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
