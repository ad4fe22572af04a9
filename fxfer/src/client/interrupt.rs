//! Ctrl-C detection for the interactive shell
// (c) 2025 fxfer developers

use tokio::sync::watch;
use tracing::debug;

/// Latches once the user presses Ctrl-C.
///
/// Create it once, before the first prompt, so that no interrupt is lost
/// between one `select!` and the next.
#[derive(Debug, Clone)]
pub(crate) struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Starts listening for Ctrl-C on a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn on_ctrl_c() -> Self {
        let (tx, rx) = watch::channel(false);
        let _ = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = tx.send(true);
                }
                Err(e) => {
                    debug!("could not listen for ctrl-c: {e}");
                    // Keep the sender alive so waiters stay pending
                    std::future::pending::<()>().await;
                }
            }
        });
        Self { rx }
    }

    /// An interrupt that is raised by hand
    #[cfg(test)]
    pub(crate) fn manual() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Has Ctrl-C been pressed?
    #[must_use]
    pub(crate) fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once Ctrl-C has been pressed. Never completes if the listener went away without one.
    pub(crate) async fn raised(&mut self) {
        if self.rx.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
