//! Signal handling for graceful interruption
//!
//! A received CTRL-C or SIGTERM cancels the run's [`CancellationToken`]. The
//! coordinator observes the token between job completions, so an interrupt
//! always ends in the same report path as a normal finish.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Signal handler that cancels a token on interrupt
pub struct SignalHandler {
    token: CancellationToken,
}

impl SignalHandler {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Setup signal handling for interruption (CTRL-C, SIGTERM)
    ///
    /// Returns a handle to the background task that monitors for signals.
    /// The task also ends quietly when the token is cancelled elsewhere.
    pub fn setup(&self) -> JoinHandle<()> {
        let token = self.token.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received Ctrl+C, stopping");
                    token.cancel();
                },
                _ = terminate => {
                    info!("Received terminate signal, stopping");
                    token.cancel();
                },
                _ = token.cancelled() => {},
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_handler_exits_when_token_cancelled() {
        let token = CancellationToken::new();
        let handle = SignalHandler::new(token.clone()).setup();

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let result = timeout(Duration::from_millis(500), handle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_child_tokens_observe_cancellation() {
        let token = CancellationToken::new();
        let child = token.child_token();

        tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                token.cancel();
            }
        });

        let result = timeout(Duration::from_millis(200), child.cancelled()).await;
        assert!(result.is_ok());
    }
}
