use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels a token when the user presses Ctrl-C.
///
/// Listening stops when the guard is dropped.
pub(crate) struct InterruptGuard {
    task: JoinHandle<()>,
}

impl InterruptGuard {
    pub(crate) fn new(token: CancellationToken) -> Self {
        let task = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!(message = "Signal received.", signal = "SIGINT");
                    token.cancel();
                }
                Err(error) => error!(%error, "Couldn't listen for interrupt signal."),
            }
        });

        Self { task }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
