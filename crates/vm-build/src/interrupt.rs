use std::future::Future;

use tokio::sync::watch;

/// Turn the first interrupt into a cancellation request.
///
/// Returns `true` once a second interrupt arrives; the caller should then
/// exit without waiting for the in-flight driver call. Returns `false` if
/// listening for interrupts fails.
pub async fn cancel_on_interrupt<F, Fut>(mut interrupt: F, cancel: watch::Sender<bool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        tracing::warn!(error = %e, "cannot listen for interrupts");
        return false;
    }
    tracing::warn!("interrupt received, cancelling build (interrupt again to exit now)");
    let _ = cancel.send(true);

    if let Err(e) = interrupt().await {
        tracing::warn!(error = %e, "cannot listen for interrupts");
        return false;
    }
    tracing::error!("second interrupt received, exiting without cleanup");
    true
}
