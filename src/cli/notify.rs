use anyhow::Result;

use super::report;
use crate::api::{ApiClient, DeviceApi, DeviceId};
use crate::core::AppConfig;
use crate::session::Session;

/// Dispatch to an id obtained elsewhere, e.g. from `register`
pub async fn run(config: &AppConfig, device_id: i64, title: &str, body: &str) -> Result<()> {
    let client = ApiClient::new(config)?;
    client
        .send_notification(DeviceId::new(device_id), title, body)
        .await
        .map_err(report)?;
    println!("Notification sent");
    Ok(())
}

pub async fn test_push(
    config: &AppConfig,
    model: &str,
    token: &str,
    title: &str,
    body: &str,
) -> Result<()> {
    let client = ApiClient::new(config)?;
    let session = Session::new();

    let device = session
        .register(&client, model, token)
        .await
        .map_err(report)?;
    println!("Registered device {}", device.id);

    session
        .dispatch(&client, title, body)
        .await
        .map_err(report)?;
    println!("Notification sent");
    Ok(())
}

pub async fn broadcast(config: &AppConfig, title: &str, body: &str) -> Result<()> {
    let client = ApiClient::new(config)?;
    client.notify_all(title, body).await.map_err(report)?;
    println!("Notification sent to all devices");
    Ok(())
}
