#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use deployment_gatekeeper::config::AppConfig;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_APP_KEY: &str = include_str!("../fixtures/test-app-key.pem");
pub const INSTALLATION_TOKEN: &str = "ghs_installation_token";
pub const APPROVER_TOKEN: &str = "ghp_approver_token";
pub const ALLOW_LIST_PATH: &str = "/repos/acme/policy/contents/allow.yml";
pub const PENDING_PATH: &str = "/repos/acme/widgets/actions/runs/555/pending_deployments";

/// Configuration pointing every outbound call at `server`.
pub fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        app_id: 225253,
        private_key_pem: TEST_APP_KEY.to_string(),
        approver_token: APPROVER_TOKEN.to_string(),
        allow_list_url: format!("{}{}", server.uri(), ALLOW_LIST_PATH),
        github_api_url: server.uri(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        http_timeout: Duration::from_secs(5),
    }
}

/// A `deployment_review` `requested` delivery for acme/widgets run 555.
pub fn requested_payload(server: &MockServer, environment: &str, requestor: &str) -> Value {
    json!({
        "action": "requested",
        "environment": environment,
        "requestor": { "login": requestor },
        "workflow_run": { "id": 555, "actor": { "login": requestor } },
        "workflow_job_run": {
            "id": 777,
            "status": "waiting",
            "html_url": "https://github.com/acme/widgets/actions/runs/555/job/777"
        },
        "repository": {
            "name": "widgets",
            "url": format!("{}/repos/acme/widgets", server.uri()),
            "owner": { "login": "acme" }
        }
    })
}

pub fn pending_deployments(environments: &[(&str, u64)]) -> Value {
    Value::Array(
        environments
            .iter()
            .map(|(name, id)| {
                json!({
                    "environment": { "id": id, "name": name },
                    "wait_timer": 0,
                    "current_user_can_approve": true
                })
            })
            .collect(),
    )
}

/// Contents-API envelope around `document`, wrapped like GitHub does.
pub fn content_envelope(document: &str) -> Value {
    let encoded = STANDARD.encode(document);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "type": "file",
        "encoding": "base64",
        "name": "allow.yml",
        "path": "allow.yml",
        "content": wrapped
    })
}

/// Installation lookup and token minting for acme/widgets.
pub async fn mount_installation(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/installation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4242,
            "app_id": 225253,
            "target_type": "Organization"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/app/installations/4242/access_tokens"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": INSTALLATION_TOKEN,
            "expires_at": "2030-01-01T00:00:00Z"
        })))
        .mount(server)
        .await;
}
