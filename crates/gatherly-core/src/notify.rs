//! User-facing notifications.
//!
//! Managers report the outcome of mutations as `Notice`s instead of letting
//! errors escape into the front end's render path. The front end owns the
//! receiving half of the channel and decides how to show them (toast, login
//! prompt, stderr line).

use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
    /// A mutation was attempted without a session; prompt for sign-in.
    LoginRequired,
}

#[derive(Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::Sender<Notice>>,
}

impl Notifier {
    /// Notifier plus the receiver the front end drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notice>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// Notifier that drops everything, for headless use.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Never blocks: a full or closed channel drops the notice.
    pub fn notify(&self, notice: Notice) {
        let Some(tx) = &self.tx else {
            debug!(?notice, "Notification dropped (no receiver)");
            return;
        };
        if let Err(e) = tx.try_send(notice) {
            warn!(error = %e, "Failed to deliver notification");
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Notice::Success(message.into()));
    }

    pub fn failure(&self, message: impl Into<String>) {
        self.notify(Notice::Failure(message.into()));
    }
}
