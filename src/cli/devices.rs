use anyhow::Result;

use super::report;
use crate::api::{ApiClient, DeviceId};
use crate::core::AppConfig;

pub async fn list(config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(config)?;
    let devices = client.list_devices().await.map_err(report)?;
    if devices.is_empty() {
        println!("No devices registered");
        return Ok(());
    }
    for device in devices {
        println!(
            "{}\t{}\tlast seen {}",
            device.id, device.model, device.last_seen_at
        );
    }
    Ok(())
}

pub async fn show(config: &AppConfig, id: i64) -> Result<()> {
    let client = ApiClient::new(config)?;
    let device = client
        .get_device(DeviceId::new(id))
        .await
        .map_err(report)?;
    println!("{}", serde_json::to_string_pretty(&device)?);
    Ok(())
}

pub async fn delete(config: &AppConfig, id: i64) -> Result<()> {
    let client = ApiClient::new(config)?;
    client
        .delete_device(DeviceId::new(id))
        .await
        .map_err(report)?;
    println!("Deleted device {}", id);
    Ok(())
}

pub async fn health(config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(config)?;
    let health = client.health().await.map_err(report)?;
    println!("{} (status: {})", health.message, health.status);
    Ok(())
}
