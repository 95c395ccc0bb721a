//! Integration tests for device registration and the device endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use stablepush::api::{
        ApiClient, ClientError, DeviceApi, DeviceId, ErrorKind, Operation, Precondition,
    };
    use stablepush::core::AppConfig;

    use crate::test_utils::{DEVICE_42, mock_register, test_backend};

    /// Tests the registration round trip echoes the request
    #[tokio::test]
    async fn it_registers_a_device() {
        let (mut server, client) = test_backend().await;
        let mock = mock_register(&mut server).await;

        let device = client.register_device("Pixel 7", "abc123").await.unwrap();

        mock.assert_async().await;
        assert_eq!(device.id, DeviceId::new(42));
        assert!(device.id.get() > 0);
        assert_eq!(device.model, "Pixel 7");
        assert_eq!(device.token, "abc123");
        assert_eq!(device.first_seen_at, "2024-01-01T00:00:00Z");
        assert_eq!(device.last_seen_at, "2024-01-01T00:00:00Z");
    }

    /// Tests a 400 surfaces the exact backend body
    #[tokio::test]
    async fn it_surfaces_backend_errors_verbatim() {
        let (mut server, client) = test_backend().await;
        let _mock = server
            .mock("POST", "/devices")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid token"}"#)
            .create_async()
            .await;

        let err = client
            .register_device("Pixel 7", "abc123")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.operation(), Some(Operation::Register));
        assert_eq!(err.body(), Some(r#"{"error":"invalid token"}"#));
        match err {
            ClientError::Backend { status, .. } => assert_eq!(status.as_u16(), 400),
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    /// Tests empty registration fields never reach the backend
    #[tokio::test]
    async fn it_validates_registration_locally() {
        let (mut server, client) = test_backend().await;
        let mock = server
            .mock("POST", "/devices")
            .expect(0)
            .create_async()
            .await;

        let err = client.register_device("Pixel 7", "").await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err,
            ClientError::Precondition(Precondition::EmptyField("token"))
        ));
    }

    /// Tests an unreachable backend is reported as a transport error
    #[tokio::test]
    async fn it_reports_transport_errors() {
        // Nothing listens on port 9 (discard) on test machines
        let client = ApiClient::new(&AppConfig::new("http://127.0.0.1:9")).unwrap();

        let err = client
            .register_device("Pixel 7", "abc123")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.notice(), "Failed to register device");
    }

    /// Tests a backend that accepts but never answers is cut off by the
    /// configured request timeout
    #[tokio::test]
    async fn it_times_out_a_silent_backend() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _backend = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        let mut config = AppConfig::new(&format!("http://{}", addr));
        config.timeout_secs = 1;
        let client = ApiClient::new(&config).unwrap();

        let started = Instant::now();
        let err = client
            .register_device("Pixel 7", "abc123")
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(err.kind(), ErrorKind::Transport);
        match err {
            ClientError::Transport { source, .. } => assert!(source.is_timeout()),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    /// Tests listing devices
    #[tokio::test]
    async fn it_lists_devices() {
        let (mut server, client) = test_backend().await;
        let _mock = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!("[{}]", DEVICE_42))
            .create_async()
            .await;

        let devices = client.list_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, DeviceId::new(42));
    }

    /// Tests an empty device table, which the backend encodes as `null`
    #[tokio::test]
    async fn it_lists_no_devices() {
        let (mut server, client) = test_backend().await;
        let _mock = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("null")
            .create_async()
            .await;

        assert!(client.list_devices().await.unwrap().is_empty());
    }

    /// Tests fetching a single device
    #[tokio::test]
    async fn it_fetches_a_device() {
        let (mut server, client) = test_backend().await;
        let _mock = server
            .mock("GET", "/devices/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(DEVICE_42)
            .create_async()
            .await;

        let device = client.get_device(DeviceId::new(42)).await.unwrap();
        assert_eq!(device.model, "Pixel 7");
    }

    /// Tests a missing device comes back as a backend error
    #[tokio::test]
    async fn it_returns_404_for_unknown_device() {
        let (mut server, client) = test_backend().await;
        let _mock = server
            .mock("GET", "/devices/7")
            .with_status(404)
            .with_body("sql: no rows in result set\n")
            .create_async()
            .await;

        let err = client.get_device(DeviceId::new(7)).await.unwrap_err();
        assert_eq!(err.operation(), Some(Operation::FetchDevice));
        assert_eq!(err.body(), Some("sql: no rows in result set\n"));
    }

    /// Tests deleting a device accepts 204 No Content
    #[tokio::test]
    async fn it_deletes_a_device() {
        let (mut server, client) = test_backend().await;
        let mock = server
            .mock("DELETE", "/devices/42")
            .with_status(204)
            .create_async()
            .await;

        client.delete_device(DeviceId::new(42)).await.unwrap();
        mock.assert_async().await;
    }

    /// Tests the health endpoint
    #[tokio::test]
    async fn it_checks_health() {
        let (mut server, client) = test_backend().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Service is running","status":true}"#)
            .create_async()
            .await;

        let health = client.health().await.unwrap();
        assert!(health.status);
        assert_eq!(health.message, "Service is running");
    }
}
