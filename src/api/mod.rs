//! Client for the device registration and notification backend

mod client;
mod error;
pub mod public;

pub use client::{ApiClient, DeviceApi, device_request};
pub use error::{ClientError, ErrorKind, Operation, Precondition};
pub use public::{Device, DeviceId, DeviceRequest, HealthResponse, NotificationRequest};
