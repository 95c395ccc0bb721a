use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use super::error::{ClientError, Operation, Precondition};
use super::public::{Device, DeviceId, DeviceRequest, HealthResponse, NotificationRequest};
use crate::core::AppConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The two calls a running session depends on. Kept behind a trait so
/// the session and token handling can be driven without a network.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// `POST /devices`
    async fn register_device(&self, model: &str, token: &str) -> Result<Device, ClientError>;

    /// `POST /notify/device/{id}`
    async fn send_notification(
        &self,
        device_id: DeviceId,
        title: &str,
        body: &str,
    ) -> Result<(), ClientError>;
}

/// Validates and builds the registration body
pub fn device_request(model: &str, token: &str) -> Result<DeviceRequest, Precondition> {
    if model.trim().is_empty() {
        return Err(Precondition::EmptyField("model"));
    }
    if token.trim().is_empty() {
        return Err(Precondition::EmptyField("token"));
    }
    Ok(DeviceRequest {
        model: model.to_string(),
        token: token.to_string(),
    })
}

/// HTTP client for the device backend
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<Device>, ClientError> {
        let op = Operation::ListDevices;
        let response = self
            .http
            .get(self.url("devices"))
            .send()
            .await
            .map_err(ClientError::transport(op))?;
        let response = check_status(op, response).await?;
        // An empty table is encoded as `null`
        let devices: Option<Vec<Device>> =
            response.json().await.map_err(ClientError::transport(op))?;
        Ok(devices.unwrap_or_default())
    }

    /// `GET /devices/{id}`
    pub async fn get_device(&self, device_id: DeviceId) -> Result<Device, ClientError> {
        let op = Operation::FetchDevice;
        let response = self
            .http
            .get(self.url(&format!("devices/{}", device_id)))
            .send()
            .await
            .map_err(ClientError::transport(op))?;
        let response = check_status(op, response).await?;
        response.json().await.map_err(ClientError::transport(op))
    }

    /// `DELETE /devices/{id}`
    pub async fn delete_device(&self, device_id: DeviceId) -> Result<(), ClientError> {
        let op = Operation::DeleteDevice;
        let response = self
            .http
            .delete(self.url(&format!("devices/{}", device_id)))
            .send()
            .await
            .map_err(ClientError::transport(op))?;
        check_status(op, response).await?;
        tracing::info!("Deleted device {}", device_id);
        Ok(())
    }

    /// `POST /notify/all`
    pub async fn notify_all(&self, title: &str, body: &str) -> Result<(), ClientError> {
        let op = Operation::Broadcast;
        let response = self
            .http
            .post(self.url("notify/all"))
            .json(&NotificationRequest::new(title, body))
            .send()
            .await
            .map_err(ClientError::transport(op))?;
        check_status(op, response).await?;
        Ok(())
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let op = Operation::Health;
        let response = self
            .http
            .get(self.url("health"))
            .send()
            .await
            .map_err(ClientError::transport(op))?;
        let response = check_status(op, response).await?;
        response.json().await.map_err(ClientError::transport(op))
    }
}

#[async_trait]
impl DeviceApi for ApiClient {
    async fn register_device(&self, model: &str, token: &str) -> Result<Device, ClientError> {
        let op = Operation::Register;
        let request = device_request(model, token)?;

        tracing::debug!("Registering device {:?} with {}", request.model, self.base_url);
        let response = self
            .http
            .post(self.url("devices"))
            .json(&request)
            .send()
            .await
            .map_err(ClientError::transport(op))?;
        let response = check_status(op, response).await?;
        let device: Device = response.json().await.map_err(ClientError::transport(op))?;

        if device.id.get() <= 0 {
            return Err(ClientError::MalformedResponse {
                operation: op,
                reason: format!("device id must be positive, got {}", device.id),
            });
        }
        if device.model != request.model || device.token != request.token {
            tracing::warn!(
                "Backend stored device {} with model {:?} and a different token than requested",
                device.id,
                device.model
            );
        }

        tracing::info!("Device registered successfully: id={}", device.id);
        Ok(device)
    }

    async fn send_notification(
        &self,
        device_id: DeviceId,
        title: &str,
        body: &str,
    ) -> Result<(), ClientError> {
        let op = Operation::Dispatch;
        let response = self
            .http
            .post(self.url(&format!("notify/device/{}", device_id)))
            .json(&NotificationRequest::new(title, body))
            .send()
            .await
            .map_err(ClientError::transport(op))?;
        check_status(op, response).await?;
        tracing::info!("Notification dispatched to device {}", device_id);
        Ok(())
    }
}

/// Turns a non-2xx response into a backend error carrying the raw body
async fn check_status(operation: Operation, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .map_err(ClientError::transport(operation))?;
    Err(ClientError::Backend {
        operation,
        status,
        body,
    })
}
