//! Authenticated JSON-RPC transport.
//!
//! [`JsonRpcClient`] owns the HTTPS client, the configuration and the current
//! session token. Every remote operation goes through [`JsonRpcClient::invoke`],
//! which builds the envelope, sends it under the retry policy and hands back the
//! raw `result` for the caller to decode.

use crate::config::Config;
use crate::dto::{JsonRpcRequest, JsonRpcResponse, LoginResponse, MarketFilter};
use crate::error::{BetfairError, Result};
use crate::params::{build_params, OperationParams};
use crate::retry::RetryPolicy;
use crate::tls;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Namespace every betting operation name is sent under.
pub const METHOD_PREFIX: &str = "SportsAPING/v1.0/";

const LOGIN_SUCCESS: &str = "SUCCESS";

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_token: String,
    pub login_status: String,
}

pub struct JsonRpcClient {
    client: Client,
    config: Arc<Config>,
    session_token: RwLock<Option<String>>,
    retry_policy: RetryPolicy,
    deadline: Option<Instant>,
}

impl JsonRpcClient {
    /// Build a client presenting the configured certificate.
    ///
    /// Fails without any network activity when the application key is missing,
    /// the trust root cannot be read, or the client keypair is malformed.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = tls::build_http_client(&config)?;
        Self::from_parts(config, client)
    }

    /// Use a caller-built HTTP client instead of the certificate-backed one.
    pub fn from_parts(config: Config, client: Client) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            config: Arc::new(config),
            session_token: RwLock::new(None),
            retry_policy: RetryPolicy::default(),
            deadline: None,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Bound every call made through this client by an absolute deadline.
    /// Without one, each call gets the configured timeout from when it starts.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Log in with username and password and keep the issued session token.
    pub async fn authenticate(&self) -> Result<Session> {
        let betfair = &self.config.betfair;
        let form = [
            ("username", betfair.username.as_str()),
            ("password", betfair.password.as_str()),
        ];

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("X-Application", betfair.api_key.parse()?);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let url = self.config.login_url();
        let form = &form[..];
        let headers = &headers;
        let (status, text) = self
            .retry_policy
            .retry(self.call_deadline(), move || {
                self.post(url, headers, Payload::Form(form))
            })
            .await?;
        debug!("Login response status: {}", status);

        if status != StatusCode::OK {
            let reason = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            warn!("Login failed with status {}: {}", status, text);
            return Err(BetfairError::Auth {
                status: status.as_u16(),
                reason,
            });
        }

        let response: LoginResponse = serde_json::from_str(&text)?;
        if response.login_status != LOGIN_SUCCESS {
            warn!("Login rejected: {}", response.login_status);
            return Err(BetfairError::LoginRejected {
                login_status: response.login_status,
            });
        }

        self.set_session_token(response.session_token.clone());
        info!("Login successful");

        Ok(Session {
            session_token: response.session_token,
            login_status: response.login_status,
        })
    }

    pub fn session_token(&self) -> Option<String> {
        self.session_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Restore a previously issued session without logging in again.
    pub fn set_session_token(&self, token: impl Into<String>) {
        *self
            .session_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear_session(&self) {
        *self
            .session_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Call one betting operation and return its `result` as raw JSON bytes.
    ///
    /// `method` is the bare operation name, e.g. `listEventTypes`. A response
    /// carrying an error object fails with [`BetfairError::RemoteApi`]; a
    /// missing `result` comes back as `null`.
    pub async fn invoke(
        &self,
        id: i32,
        method: &str,
        filter: Option<&MarketFilter>,
        extra: Option<&OperationParams>,
    ) -> Result<Vec<u8>> {
        // one token for every attempt of this call
        let session_token = self.session_token().ok_or(BetfairError::NotAuthenticated)?;

        let request = JsonRpcRequest::new(
            format!("{METHOD_PREFIX}{method}"),
            build_params(filter, extra),
            id,
        );
        let body = serde_json::to_vec(&request)?;
        debug!("API request: {}", String::from_utf8_lossy(&body));

        let mut headers = HeaderMap::with_capacity(4);
        headers.insert("X-Application", self.config.betfair.api_key.parse()?);
        headers.insert("X-Authentication", session_token.parse()?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let url = self.config.api_url();
        let body = body.as_slice();
        let headers = &headers;
        let (status, text) = self
            .retry_policy
            .retry(self.call_deadline(), move || {
                self.post(url, headers, Payload::Json(body))
            })
            .await?;
        debug!("API response status: {}", status);
        debug!("API response: {}", text);

        if status != StatusCode::OK {
            return Err(BetfairError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let response: JsonRpcResponse = serde_json::from_str(&text)?;
        if let Some(error) = response.error {
            let exception_code = error.exception_code().map(str::to_string);
            warn!(
                "{} returned error {}: {} ({})",
                method,
                error.code,
                error.message,
                exception_code.as_deref().unwrap_or("-")
            );
            return Err(BetfairError::RemoteApi {
                code: error.code,
                message: error.message,
                exception_code,
            });
        }

        let result = response.result.unwrap_or(Value::Null);
        Ok(serde_json::to_vec(&result)?)
    }

    /// One HTTP attempt. Send failures are connection failures; everything
    /// after the status line counts as a received response.
    async fn post(
        &self,
        url: &str,
        headers: &HeaderMap,
        payload: Payload<'_>,
    ) -> Result<(StatusCode, String)> {
        let request = self.client.post(url).headers(headers.clone());
        let request = match payload {
            Payload::Form(form) => request.form(form),
            Payload::Json(body) => request.body(body.to_vec()),
        };

        let response = request.send().await.map_err(BetfairError::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(BetfairError::Body)?;
        Ok((status, text))
    }

    fn call_deadline(&self) -> Instant {
        self.deadline
            .unwrap_or_else(|| Instant::now() + self.config.timeout())
    }
}

#[derive(Clone, Copy)]
enum Payload<'a> {
    Form(&'a [(&'a str, &'a str)]),
    Json(&'a [u8]),
}
