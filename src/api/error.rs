//! Errors returned by the device backend client

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use super::public::DeviceId;

/// Which backend call failed. Used to pick the user-facing notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Register,
    Dispatch,
    Broadcast,
    ListDevices,
    FetchDevice,
    DeleteDevice,
    Health,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Register => "register device",
            Operation::Dispatch => "send notification",
            Operation::Broadcast => "broadcast notification",
            Operation::ListDevices => "list devices",
            Operation::FetchDevice => "fetch device",
            Operation::DeleteDevice => "delete device",
            Operation::Health => "health check",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Backend,
    Precondition,
}

/// Local checks that fail before any request is sent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Precondition {
    #[error("device is not registered yet")]
    NotRegistered,
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to {operation}: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to {operation}: unexpected response: {reason}")]
    MalformedResponse { operation: Operation, reason: String },

    #[error("failed to {operation}: backend returned {status}: {body}")]
    Backend {
        operation: Operation,
        status: StatusCode,
        body: String,
    },

    #[error(transparent)]
    Precondition(#[from] Precondition),

    /// The backend created the device but a newer registration was
    /// stored in the session first
    #[error("registration {id} was superseded by a newer token")]
    Superseded { id: DeviceId },
}

impl ClientError {
    pub fn transport(operation: Operation) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ClientError::Transport { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport { .. } | ClientError::MalformedResponse { .. } => {
                ErrorKind::Transport
            }
            ClientError::Backend { .. } => ErrorKind::Backend,
            ClientError::Precondition(_) | ClientError::Superseded { .. } => {
                ErrorKind::Precondition
            }
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ClientError::Transport { operation, .. }
            | ClientError::MalformedResponse { operation, .. }
            | ClientError::Backend { operation, .. } => Some(*operation),
            ClientError::Superseded { .. } => Some(Operation::Register),
            ClientError::Precondition(_) => None,
        }
    }

    /// Raw error body for backend failures
    pub fn body(&self) -> Option<&str> {
        match self {
            ClientError::Backend { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Short message to show the user. Carries the category only, the
    /// details belong in the logs.
    pub fn notice(&self) -> &'static str {
        match self {
            ClientError::Precondition(Precondition::NotRegistered) => {
                "Device is not registered yet"
            }
            ClientError::Precondition(Precondition::EmptyField(_)) => "Missing device details",
            ClientError::Superseded { .. } => "Registration replaced by a newer token",
            other => match other.operation() {
                Some(Operation::Register) => "Failed to register device",
                Some(Operation::Dispatch) => "Failed to send notification",
                Some(Operation::Broadcast) => "Failed to broadcast notification",
                Some(Operation::ListDevices | Operation::FetchDevice) => {
                    "Failed to load devices"
                }
                Some(Operation::DeleteDevice) => "Failed to delete device",
                Some(Operation::Health) | None => "Backend is unavailable",
            },
        }
    }
}
