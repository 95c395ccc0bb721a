pub mod models;
pub use models::*;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresentError {
    #[error("notification permission was not granted")]
    PermissionDenied,
    #[error("notification channel {0:?} does not exist")]
    UnknownChannel(String),
}

/// Whatever shows notifications to the user on this host
pub trait NotificationPresenter: Send + Sync {
    /// Asked once at startup. Returns whether posting is allowed.
    fn request_permission(&self) -> bool;

    /// Safe to call repeatedly, an existing channel is left alone
    fn ensure_channel(&self, channel: &Channel);

    fn post(&self, notification: &Notification) -> Result<(), PresentError>;
}

/// Prints notifications to stdout
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    granted: bool,
    channels: Mutex<HashSet<String>>,
    posted: Mutex<Vec<Notification>>,
}

impl TerminalPresenter {
    pub fn new(granted: bool) -> Self {
        Self {
            granted,
            ..Default::default()
        }
    }

    pub fn posted(&self) -> Vec<Notification> {
        self.posted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationPresenter for TerminalPresenter {
    fn request_permission(&self) -> bool {
        if !self.granted {
            tracing::warn!("Notifications are disabled, incoming messages will only be logged");
        }
        self.granted
    }

    fn ensure_channel(&self, channel: &Channel) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if channels.insert(channel.id.clone()) {
            tracing::debug!("Created notification channel {:?} ({})", channel.id, channel.name);
        }
    }

    fn post(&self, notification: &Notification) -> Result<(), PresentError> {
        if !self.granted {
            return Err(PresentError::PermissionDenied);
        }
        if !self
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&notification.channel_id)
        {
            return Err(PresentError::UnknownChannel(notification.channel_id.clone()));
        }

        println!("[{}] {}", notification.title, notification.body);
        self.posted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }
}

/// Turns incoming remote messages into user-visible notifications
pub struct MessageHandler {
    presenter: Arc<dyn NotificationPresenter>,
}

impl MessageHandler {
    pub fn new(presenter: Arc<dyn NotificationPresenter>) -> Self {
        Self { presenter }
    }

    pub fn on_message_received(&self, message: RemoteMessage) -> Result<(), PresentError> {
        let notification = Notification::from(message);
        self.presenter.ensure_channel(&Channel::default());
        self.presenter
            .post(&notification)
            .inspect_err(|e| tracing::warn!("Dropped notification {:?}: {}", notification.title, e))
    }
}
