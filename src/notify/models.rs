use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL_ID: &str = "default_channel";
pub const DEFAULT_CHANNEL_NAME: &str = "Default Channel";
pub const DEFAULT_TITLE: &str = "New message";

/// A message delivered by the push provider. Either field can be
/// missing, e.g. for data-only messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteMessage {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl RemoteMessage {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            body: Some(body.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            id: DEFAULT_CHANNEL_ID.to_string(),
            name: DEFAULT_CHANNEL_NAME.to_string(),
        }
    }
}

/// What ends up in front of the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
}

impl From<RemoteMessage> for Notification {
    fn from(message: RemoteMessage) -> Self {
        Self {
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            title: message.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: message.body.unwrap_or_default(),
        }
    }
}
