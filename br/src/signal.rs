//! Termination signal handling

use eyre::Result;
use tracing::{debug, warn};

/// Listens for SIGINT/SIGTERM (Ctrl+C elsewhere)
///
/// Handlers are registered on [`ShutdownSignal::install`], so a signal that
/// arrives before anyone awaits [`ShutdownSignal::recv`] is kept, not lost.
pub struct ShutdownSignal {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignal {
    pub fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        debug!("ShutdownSignal::install: called");
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Resolve on the first termination signal
    ///
    /// Later signals are logged and otherwise ignored while shutdown runs.
    pub async fn recv(mut self) {
        tokio::select! {
            _ = self.sigint.recv() => warn!("SIGINT received"),
            _ = self.sigterm.recv() => warn!("SIGTERM received"),
        }

        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    s = self.sigint.recv() => s,
                    s = self.sigterm.recv() => s,
                };
                if received.is_none() {
                    break;
                }
                warn!("Shutdown already in progress, ignoring signal");
            }
        });
    }
}

#[cfg(not(unix))]
impl ShutdownSignal {
    pub fn install() -> Result<Self> {
        debug!("ShutdownSignal::install: called");
        Ok(Self {})
    }

    pub async fn recv(self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        warn!("Ctrl+C received");

        tokio::spawn(async {
            while tokio::signal::ctrl_c().await.is_ok() {
                warn!("Shutdown already in progress, ignoring signal");
            }
        });
    }
}
