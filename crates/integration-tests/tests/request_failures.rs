// Request failure classification against a real HTTP stack

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use squonk2_integration_tests::{dm_client, TOKEN};
use squonk2_sdk::{ApiError, ClientConfig, DmClient, ErrorKind, Timeouts};

#[tokio::test]
async fn test_no_api_url_makes_no_request() {
    let dm = DmClient::new(ClientConfig::default()).unwrap();

    let err = dm.ping(TOKEN).await.unwrap_err();
    assert!(matches!(err, ApiError::NoApiUrl));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    // Grab a free port, then release it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dm = DmClient::new(ClientConfig::new(format!("http://127.0.0.1:{}", port))).unwrap();
    let err = dm.get_version(TOKEN).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.status().is_none());
    assert!(err.to_string().contains("Failed getting version"));
}

#[tokio::test]
async fn test_unexpected_status_keeps_label_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/project"))
        .respond_with(ResponseTemplate::new(403).set_body_string("{\"error\": \"Forbidden\"}"))
        .mount(&server)
        .await;

    let err = dm_client(&server)
        .get_available_projects(TOKEN)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnexpectedStatus);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
    assert!(err.body().unwrap_or_default().contains("Forbidden"));
    assert!(err.to_string().contains("Failed to get projects"));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"version": "1.0.0"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let timeouts = Timeouts {
        request: Duration::from_millis(100),
        ..Timeouts::default()
    };
    let dm = DmClient::new(ClientConfig::new(server.uri()).with_timeouts(timeouts)).unwrap();

    let err = dm.get_version(TOKEN).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account-server/namespace"))
        .and(wiremock::matchers::header(
            "authorization",
            format!("Bearer {}", TOKEN).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    dm_client(&server).ping(TOKEN).await.unwrap();
}
