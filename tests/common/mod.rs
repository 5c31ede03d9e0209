#![allow(dead_code)]

use betfair_rpc::config::{BetfairConfig, Config};
use betfair_rpc::retry::{RetryConfig, RetryPolicy};
use betfair_rpc::JsonRpcClient;
use std::time::Duration;

pub const APP_KEY: &str = "test-app-key";
pub const LOGIN_PATH: &str = "/api/certlogin";
pub const API_PATH: &str = "/exchange/betting/json-rpc/v1";

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Config pointing both endpoints at `base_url`.
pub fn test_config(base_url: &str) -> Config {
    Config {
        betfair: BetfairConfig {
            username: "test_user".to_string(),
            password: "test_pass".to_string(),
            api_key: APP_KEY.to_string(),
            cert_path: fixture("client.crt"),
            key_path: fixture("client.key"),
            root_ca_path: Some(fixture("rootca.pem")),
            login_url: Some(format!("{base_url}{LOGIN_PATH}")),
            api_url: Some(format!("{base_url}{API_PATH}")),
            timeout_secs: Some(5),
        },
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(RetryConfig {
        max_attempts: None,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        multiplier: 2.0,
        jitter: false,
    })
}

/// Plain-HTTP client for talking to a mock server.
pub fn test_client(base_url: &str) -> JsonRpcClient {
    JsonRpcClient::from_parts(test_config(base_url), reqwest::Client::new())
        .unwrap()
        .with_retry_policy(fast_retry())
}

/// Test client that already holds a session token.
pub fn logged_in_client(base_url: &str, token: &str) -> JsonRpcClient {
    let client = test_client(base_url);
    client.set_session_token(token);
    client
}
