use anyhow::Result;

use super::report;
use crate::api::{ApiClient, DeviceApi};
use crate::core::AppConfig;

pub async fn run(config: &AppConfig, model: &str, token: &str) -> Result<()> {
    let client = ApiClient::new(config)?;
    let device = client
        .register_device(model, token)
        .await
        .map_err(report)?;
    println!("{}", serde_json::to_string_pretty(&device)?);
    Ok(())
}
