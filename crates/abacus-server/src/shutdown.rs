//! Graceful shutdown.
//!
//! Both halves are built on `tokio::sync::watch`, so a late subscriber always
//! sees the current state instead of waiting for the next change:
//!
//! - [`ShutdownSignal`] flips once from running to stopping
//! - [`ConnectionTracker`] holds the number of open connections

use std::sync::Arc;

use tokio::sync::watch;

/// A trigger-once shutdown flag shared by the accept loop and every
/// connection task.
///
/// ```rust
/// use abacus_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
///
/// assert!(shutdown.trigger());
/// assert!(!shutdown.trigger());
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates a signal in the running state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Starts shutdown. Returns `false` if it had already started.
    pub fn trigger(&self) -> bool {
        self.state.send_if_modified(|stopping| !std::mem::replace(stopping, true))
    }

    /// Returns `true` once shutdown has started.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.state.borrow()
    }

    /// Completes once shutdown has started.
    pub async fn recv(&self) {
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = state.wait_for(|stopping| *stopping).await;
    }

    /// Creates a signal that SIGTERM or SIGINT will trigger (Ctrl+C off Unix).
    ///
    /// Must be called inside a Tokio runtime. If the handlers cannot be
    /// installed the error is logged and only [`trigger`](Self::trigger)
    /// stops the server.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            match os_signal().await {
                Ok(name) => {
                    tracing::info!(signal = name, "Starting graceful shutdown");
                    trigger.trigger();
                }
                Err(e) => tracing::error!(error = %e, "Cannot install signal handlers"),
            }
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn os_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn os_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

/// Counts open connections so shutdown can wait for them.
///
/// ```rust
/// use abacus_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    open: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// Creates a tracker with no open connections.
    #[must_use]
    pub fn new() -> Self {
        let (open, _) = watch::channel(0);
        Self {
            open: Arc::new(open),
        }
    }

    /// Registers a connection. It counts as open until the token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.open.send_modify(|open| *open += 1);
        ConnectionToken {
            open: Arc::clone(&self.open),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.open.borrow()
    }

    /// Completes once no connection is open.
    pub async fn drained(&self) {
        let mut open = self.open.subscribe();
        let _ = open.wait_for(|open| *open == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// An open connection, released on drop.
#[derive(Debug)]
pub struct ConnectionToken {
    open: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.open.send_modify(|open| *open -= 1);
    }
}
