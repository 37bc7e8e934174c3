use crate::core::errors::BitcoindeError;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::warn;

/// Receives every error produced by a client, in addition to the caller
/// getting it back as the call's result.
pub trait ErrorObserver: Send + Sync {
    fn on_error(&self, error: &BitcoindeError);
}

impl<F> ErrorObserver for F
where
    F: Fn(&BitcoindeError) + Send + Sync,
{
    fn on_error(&self, error: &BitcoindeError) {
        self(error);
    }
}

/// Forwards error descriptions into an unbounded channel.
///
/// Sends to a closed channel are dropped silently.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelObserver {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }

    /// Create an observer together with the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl ErrorObserver for ChannelObserver {
    fn on_error(&self, error: &BitcoindeError) {
        let _ = self.sender.send(error.to_string());
    }
}

/// Observer registry shared by a client and its clones
#[derive(Default, Clone)]
pub struct ErrorListeners {
    observers: Arc<RwLock<Vec<Arc<dyn ErrorObserver>>>>,
}

impl std::fmt::Debug for ErrorListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorListeners")
            .field("observers", &self.len())
            .finish()
    }
}

impl ErrorListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn ErrorObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Log the error and hand it to every registered observer once
    pub fn emit(&self, error: &BitcoindeError) {
        warn!(kind = ?error.kind(), "{}", error);

        // Snapshot so observers may register further observers without deadlocking
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_error(error);
        }
    }

    /// Emit and return the error, for use in `Err(...)` position
    pub fn report(&self, error: BitcoindeError) -> BitcoindeError {
        self.emit(&error);
        error
    }
}
