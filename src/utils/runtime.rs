use anyhow::Result;

/// The keyboard hook runs on its own OS thread, so the session itself only needs one.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
