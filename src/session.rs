//! In-memory registration state for a running client.
//!
//! A session starts `Unregistered`. A successful registration replaces
//! the whole state with `Registered`, so a reader either sees no device
//! or a complete id/token pair. Nothing is persisted: a new process
//! starts unregistered and has to register again before it can
//! dispatch.
//!
//! Registrations may overlap. Each one is numbered when it starts and
//! only a result newer than the stored one is kept, so a slow response
//! for an old token can't replace the device of a newer token. Failed
//! attempts leave the numbering of stored results untouched.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use crate::api::{ClientError, Device, DeviceApi, DeviceId, Precondition, device_request};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Registration {
    #[default]
    Unregistered,
    Registered {
        id: DeviceId,
        token: String,
    },
}

/// Result of registering a token only when it is new to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Registered(Device),
    /// The token is already registered in this session
    Unchanged(DeviceId),
    /// A registration for the token is still waiting on the backend
    Pending,
}

#[derive(Debug, Default)]
struct Attempts {
    started: u64,
    // Attempt whose result is in `Session::state`, 0 for none
    stored: u64,
    in_flight: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<Registration>,
    // Lock order is `attempts` then `state`
    attempts: Mutex<Attempts>,
}

/// A started registration. Dropping it, on any path, removes the token
/// from the in-flight list.
struct Attempt<'a> {
    session: &'a Session,
    number: u64,
    token: String,
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        let mut attempts = self.session.attempts();
        if let Some(pos) = attempts.in_flight.iter().position(|t| *t == self.token) {
            attempts.in_flight.swap_remove(pos);
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registration(&self) -> Registration {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn device_id(&self) -> Option<DeviceId> {
        match self.registration() {
            Registration::Registered { id, .. } => Some(id),
            Registration::Unregistered => None,
        }
    }

    pub fn token(&self) -> Option<String> {
        match self.registration() {
            Registration::Registered { token, .. } => Some(token),
            Registration::Unregistered => None,
        }
    }

    /// Id to dispatch to, or the precondition failure when nothing has
    /// been registered in this session
    pub fn require_device(&self) -> Result<DeviceId, Precondition> {
        self.device_id().ok_or(Precondition::NotRegistered)
    }

    fn attempts(&self) -> MutexGuard<'_, Attempts> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(&self, attempts: &mut Attempts, token: &str) -> Attempt<'_> {
        attempts.started += 1;
        attempts.in_flight.push(token.to_string());
        Attempt {
            session: self,
            number: attempts.started,
            token: token.to_string(),
        }
    }

    async fn complete(
        &self,
        api: &dyn DeviceApi,
        model: &str,
        attempt: Attempt<'_>,
    ) -> Result<Device, ClientError> {
        let device = api.register_device(model, &attempt.token).await?;

        let mut attempts = self.attempts();
        if attempt.number < attempts.stored {
            tracing::warn!(
                "Discarding registration {} for a token that has since been replaced",
                device.id
            );
            return Err(ClientError::Superseded { id: device.id });
        }
        attempts.stored = attempt.number;
        // Keep the token we asked for, the backend echo may differ
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Registration::Registered {
            id: device.id,
            token: attempt.token.clone(),
        };
        Ok(device)
    }

    /// Registers `token` and stores the returned id. On failure the
    /// previous registration, if any, is left in place. Fails with
    /// `ClientError::Superseded` when a newer registration was stored
    /// while this one was in flight.
    pub async fn register(
        &self,
        api: &dyn DeviceApi,
        model: &str,
        token: &str,
    ) -> Result<Device, ClientError> {
        device_request(model, token)?;
        let attempt = {
            let mut attempts = self.attempts();
            self.start(&mut attempts, token)
        };
        self.complete(api, model, attempt).await
    }

    /// Like `register`, but skips tokens that are already registered or
    /// on their way to the backend
    pub async fn register_if_new(
        &self,
        api: &dyn DeviceApi,
        model: &str,
        token: &str,
    ) -> Result<TokenOutcome, ClientError> {
        device_request(model, token)?;
        let attempt = {
            let mut attempts = self.attempts();
            if let Registration::Registered { id, token: current } = self.registration()
                && current == token
            {
                return Ok(TokenOutcome::Unchanged(id));
            }
            if attempts.in_flight.iter().any(|t| t == token) {
                return Ok(TokenOutcome::Pending);
            }
            self.start(&mut attempts, token)
        };
        self.complete(api, model, attempt)
            .await
            .map(TokenOutcome::Registered)
    }

    /// Asks the backend to deliver a notification to the registered
    /// device. Fails locally, without a request, when unregistered.
    pub async fn dispatch(
        &self,
        api: &dyn DeviceApi,
        title: &str,
        body: &str,
    ) -> Result<DeviceId, ClientError> {
        let device_id = self.require_device()?;
        api.send_notification(device_id, title, body).await?;
        Ok(device_id)
    }
}
