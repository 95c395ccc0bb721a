//! Push token delivery.
//!
//! The messaging provider hands out a token once at startup and may
//! issue a new one at any later point. Both paths end up in
//! `TokenListener::on_token_issued` so every token reaches the backend.

use std::sync::Arc;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;

use crate::api::{ClientError, DeviceApi};
use crate::session::Session;
pub use crate::session::TokenOutcome;

/// One-shot fetch of the current push token
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<String, Error>;
}

#[async_trait]
pub trait TokenListener: Send + Sync {
    async fn on_token_issued(&self, token: String);
}

/// Token known up front, e.g. passed on the command line
#[derive(Debug, Clone)]
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self) -> Result<String, Error> {
        if self.0.trim().is_empty() {
            return Err(anyhow!("No push token available"));
        }
        Ok(self.0.clone())
    }
}

/// Registers every issued token with the backend and records the
/// result in the session
pub struct DeviceRegistrar {
    api: Arc<dyn DeviceApi>,
    session: Arc<Session>,
    model: String,
}

impl DeviceRegistrar {
    pub fn new(api: Arc<dyn DeviceApi>, session: Arc<Session>, model: &str) -> Self {
        Self {
            api,
            session,
            model: model.to_string(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The backend only exposes create, so a rotated token gets a fresh
    /// device record and the session moves to the new id. A token that
    /// is registered or still in flight is not sent again.
    pub async fn handle_token(&self, token: &str) -> Result<TokenOutcome, ClientError> {
        self.session
            .register_if_new(self.api.as_ref(), &self.model, token)
            .await
    }
}

#[async_trait]
impl TokenListener for DeviceRegistrar {
    async fn on_token_issued(&self, token: String) {
        match self.handle_token(&token).await {
            Ok(TokenOutcome::Registered(device)) => {
                tracing::info!("Registered push token as device {}", device.id)
            }
            Ok(TokenOutcome::Unchanged(id)) => {
                tracing::debug!("Token already registered as device {}", id)
            }
            Ok(TokenOutcome::Pending) => {
                tracing::debug!("Token registration already in progress")
            }
            Err(e) => tracing::error!("{}: {}", e.notice(), e),
        }
    }
}

/// Fetches the initial token and feeds it to `listener`
pub async fn bootstrap(source: &dyn TokenSource, listener: &dyn TokenListener) -> Result<()> {
    let token = source
        .fetch_token()
        .await
        .inspect_err(|e| tracing::error!("Failed to fetch push token: {}", e))?;
    listener.on_token_issued(token).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DeviceId;
    use crate::session::Registration;
    use crate::session::tests::{Call, GatedApi, RecordingApi};

    fn registrar(api: &Arc<RecordingApi>) -> DeviceRegistrar {
        DeviceRegistrar::new(
            Arc::clone(api) as Arc<dyn DeviceApi>,
            Arc::new(Session::new()),
            "Pixel 7",
        )
    }

    #[tokio::test]
    async fn it_registers_the_bootstrap_token() {
        let api = Arc::new(RecordingApi::default());
        let registrar = registrar(&api);

        bootstrap(&StaticTokenSource::new("abc123"), &registrar)
            .await
            .unwrap();

        assert_eq!(
            registrar.session().registration(),
            Registration::Registered {
                id: DeviceId::new(1),
                token: "abc123".to_string()
            }
        );
    }

    #[tokio::test]
    async fn it_reregisters_on_rotation() {
        let api = Arc::new(RecordingApi::default());
        let registrar = registrar(&api);

        registrar.on_token_issued("abc123".to_string()).await;
        registrar.on_token_issued("def456".to_string()).await;

        assert_eq!(registrar.session().device_id(), Some(DeviceId::new(2)));
        assert_eq!(
            api.calls(),
            vec![
                Call::Register {
                    model: "Pixel 7".to_string(),
                    token: "abc123".to_string()
                },
                Call::Register {
                    model: "Pixel 7".to_string(),
                    token: "def456".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn it_skips_a_repeated_token() {
        let api = Arc::new(RecordingApi::default());
        let registrar = registrar(&api);

        registrar.handle_token("abc123").await.unwrap();
        let outcome = registrar.handle_token("abc123").await.unwrap();

        assert_eq!(outcome, TokenOutcome::Unchanged(DeviceId::new(1)));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn it_fails_bootstrap_without_a_token() {
        let api = Arc::new(RecordingApi::default());
        let registrar = registrar(&api);

        let result = bootstrap(&StaticTokenSource::new(""), &registrar).await;

        assert!(result.is_err());
        assert!(api.calls().is_empty());
        assert_eq!(registrar.session().registration(), Registration::Unregistered);
    }

    #[tokio::test]
    async fn it_registers_overlapping_deliveries_once() {
        let api = Arc::new(GatedApi::new("abc123"));
        let registrar = DeviceRegistrar::new(
            Arc::clone(&api) as Arc<dyn DeviceApi>,
            Arc::new(Session::new()),
            "Pixel 7",
        );

        tokio::join!(registrar.on_token_issued("abc123".to_string()), async {
            registrar.on_token_issued("abc123".to_string()).await;
            api.release();
        });

        assert_eq!(api.inner.calls().len(), 1);
        assert_eq!(registrar.session().device_id(), Some(DeviceId::new(1)));
    }

    #[tokio::test]
    async fn it_keeps_an_in_flight_registration_after_an_empty_token() {
        let api = Arc::new(GatedApi::new("abc123"));
        let registrar = DeviceRegistrar::new(
            Arc::clone(&api) as Arc<dyn DeviceApi>,
            Arc::new(Session::new()),
            "Pixel 7",
        );

        let (first, empty) = tokio::join!(registrar.handle_token("abc123"), async {
            let outcome = registrar.handle_token("").await;
            api.release();
            outcome
        });

        assert!(empty.is_err());
        assert!(matches!(first.unwrap(), TokenOutcome::Registered(_)));
        assert_eq!(
            registrar.session().registration(),
            Registration::Registered {
                id: DeviceId::new(1),
                token: "abc123".to_string()
            }
        );
    }
}
