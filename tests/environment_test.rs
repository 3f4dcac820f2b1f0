use deployment_gatekeeper::error::GatekeeperError;
use deployment_gatekeeper::github::credentials::CredentialProvider;
use deployment_gatekeeper::github::environments::{EnvironmentResolver, PendingDeployment};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

fn resolver(server: &MockServer) -> EnvironmentResolver {
    let credentials = CredentialProvider::new(&test_config(server)).unwrap();
    EnvironmentResolver::new(reqwest::Client::new(), credentials)
}

#[tokio::test]
async fn test_resolves_matching_environment() {
    let server = MockServer::start().await;
    mount_installation(&server).await;
    Mock::given(method("GET"))
        .and(path(PENDING_PATH))
        .and(header("authorization", format!("token {}", INSTALLATION_TOKEN).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pending_deployments(&[("staging", 7), ("production", 42)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pending = resolver(&server)
        .resolve_environment_id(
            &format!("{}{}", server.uri(), PENDING_PATH),
            "acme",
            "widgets",
            "production",
        )
        .await
        .unwrap();

    assert_eq!(
        pending,
        Some(PendingDeployment {
            environment_name: "production".to_string(),
            environment_id: 42,
        })
    );
}

#[tokio::test]
async fn test_empty_pending_list_is_not_found() {
    let server = MockServer::start().await;
    mount_installation(&server).await;
    Mock::given(method("GET"))
        .and(path(PENDING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_deployments(&[])))
        .mount(&server)
        .await;

    let pending = resolver(&server)
        .resolve_environment_id(
            &format!("{}{}", server.uri(), PENDING_PATH),
            "acme",
            "widgets",
            "production",
        )
        .await
        .unwrap();

    assert!(pending.is_none());
}

#[tokio::test]
async fn test_unlisted_environment_is_not_found() {
    let server = MockServer::start().await;
    mount_installation(&server).await;
    Mock::given(method("GET"))
        .and(path(PENDING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(pending_deployments(&[("Production", 42)])))
        .mount(&server)
        .await;

    let pending = resolver(&server)
        .resolve_environment_id(
            &format!("{}{}", server.uri(), PENDING_PATH),
            "acme",
            "widgets",
            "production",
        )
        .await
        .unwrap();

    assert!(pending.is_none());
}

#[tokio::test]
async fn test_pending_list_failure_is_upstream_unavailable() {
    let server = MockServer::start().await;
    mount_installation(&server).await;
    Mock::given(method("GET"))
        .and(path(PENDING_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = resolver(&server)
        .resolve_environment_id(
            &format!("{}{}", server.uri(), PENDING_PATH),
            "acme",
            "widgets",
            "production",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatekeeperError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_slow_pending_list_is_transport_error() {
    let server = MockServer::start().await;
    mount_installation(&server).await;
    Mock::given(method("GET"))
        .and(path(PENDING_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pending_deployments(&[("production", 42)]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let credentials = CredentialProvider::new(&test_config(&server)).unwrap();
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let err = EnvironmentResolver::new(http_client, credentials)
        .resolve_environment_id(
            &format!("{}{}", server.uri(), PENDING_PATH),
            "acme",
            "widgets",
            "production",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatekeeperError::TransportError(_)), "got {:?}", err);
}
