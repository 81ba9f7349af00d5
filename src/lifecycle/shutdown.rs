//! Signal handling for graceful shutdown
//!
//! The hook thread is busy pumping messages, so signals are awaited on a
//! separate thread that then asks the message loop to exit. `stop()` runs on
//! the hook thread once the loop returns.

use std::io;
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, error};

/// Handles shutdown signals (Ctrl+C, console close, SIGTERM)
pub struct ShutdownSignal;

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    #[cfg(unix)]
    pub async fn wait(&self) -> io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = sigint.recv() => {
                debug!("received SIGINT");
            }
        }
        Ok(())
    }

    /// Wait for a shutdown signal
    #[cfg(windows)]
    pub async fn wait(&self) -> io::Result<()> {
        use tokio::signal::windows::{ctrl_c, ctrl_close};

        let mut ctrl_c = ctrl_c()?;
        let mut ctrl_close = ctrl_close()?;

        tokio::select! {
            _ = ctrl_c.recv() => {
                debug!("received Ctrl+C");
            }
            _ = ctrl_close.recv() => {
                debug!("console window closing");
            }
        }
        Ok(())
    }

    /// Run `on_shutdown` from a watcher thread once a signal arrives
    pub fn spawn_watcher<F>(self, on_shutdown: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new()
            .name("shutdown-signal".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!(%e, "failed to start signal runtime");
                        return;
                    }
                };

                match runtime.block_on(self.wait()) {
                    Ok(()) => on_shutdown(),
                    Err(e) => error!(%e, "failed to register shutdown signal handlers"),
                }
            })
            .context("failed to spawn shutdown watcher")?;

        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
