use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `cancelation` when the process receives Ctrl+C. Returns once the token is cancelled
/// by anyone, so the listener doesn't outlive the session.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Received interrupt, ending session early");
                cancelation.cancel();
            }
            Err(e) => {
                error!("Failed to listen for interrupt {e:?}");
                cancelation.cancelled().await;
            }
        },
        _ = cancelation.cancelled() => (),
    };
}
