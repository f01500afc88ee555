//! Authenticated request gateway.
//!
//! Every backend call goes through [`Gateway::send`], which attaches the
//! stored access token as a bearer credential. A 401 answer triggers one
//! token refresh and one retry of the original request; nothing is retried
//! more than once per call.
//!
//! Refreshes are single-flight: while one is running, other callers that hit
//! a 401 join it and receive the same result instead of spending the refresh
//! token a second time.

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::{Credential, CredentialStore, TokenClaims, decode_claims};
use crate::types::{LoginRequest, RefreshGrant, RefreshRequest, TokenPair};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A request as described by the caller, without any credential.
///
/// The gateway only borrows it, so the same descriptor can be dispatched
/// twice (original and retry) and is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint path relative to the API base URL, or an absolute URL.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

type RefreshFlight = Shared<BoxFuture<'static, ClientResult<String>>>;

/// Issues backend calls with the current bearer token and recovers from an
/// expired access token by refreshing once.
///
/// Cheap to clone; clones share the HTTP client, the credential store and the
/// in-flight refresh.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: reqwest::Client,
    api: ApiConfig,
    credentials: Arc<dyn CredentialStore>,
    refresh_flight: Mutex<Option<RefreshFlight>>,
}

impl Gateway {
    /// Build a gateway with its own HTTP client honoring `api.timeout_secs`.
    pub fn new(api: ApiConfig, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;
        Ok(Self::with_client(http, api, credentials))
    }

    /// Build a gateway around an existing HTTP client.
    pub fn with_client(
        http: reqwest::Client,
        api: ApiConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        debug!(base_url = %api.base_url, "Gateway initialized");
        Self {
            inner: Arc::new(GatewayInner {
                http,
                api,
                credentials,
                refresh_flight: Mutex::new(None),
            }),
        }
    }

    pub fn api(&self) -> &ApiConfig {
        &self.inner.api
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    /// Whether an access token is currently stored.
    pub fn is_authenticated(&self) -> bool {
        self.inner.credentials.access_token().is_some()
    }

    /// Claims of the stored access token, when it is a JWT.
    pub fn session_claims(&self) -> Option<TokenClaims> {
        self.inner
            .credentials
            .access_token()
            .and_then(|token| decode_claims(&token))
    }

    /// Send `request` with the current access token.
    ///
    /// A 401 triggers [`refresh`](Self::refresh) and, if it succeeds, exactly
    /// one retry with the new token. If the refresh fails the credential has
    /// been cleared and the original 401 response is returned. Any other
    /// status is returned unmodified; callers decide what non-2xx means.
    pub async fn send(&self, request: &ApiRequest) -> ClientResult<Response> {
        let token = self.inner.credentials.access_token();
        let response = self.dispatch(request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            "Request unauthorized; refreshing access token"
        );

        // Another caller may have refreshed while this request was out.
        if let Some(current) = self.inner.credentials.access_token()
            && token.as_deref() != Some(current.as_str())
        {
            debug!("Access token changed during request; retrying with the current token");
            return self.dispatch(request, Some(&current)).await;
        }

        match self.refresh_after(token).await {
            Ok(fresh) => self.dispatch(request, Some(&fresh)).await,
            Err(err) => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %err,
                    "Token refresh failed; returning unauthorized response"
                );
                Ok(response)
            }
        }
    }

    /// Obtain a new access token with the stored refresh token.
    ///
    /// Fails with [`ClientError::NoRefreshToken`] without touching the network
    /// when no refresh token is stored. Any failure clears the stored
    /// credential. Concurrent callers share one in-flight refresh.
    pub async fn refresh(&self) -> ClientResult<String> {
        let seen = self.inner.credentials.access_token();
        self.refresh_after(seen).await
    }

    /// Refresh on behalf of a caller whose request carried `seen`. If the
    /// stored token already differs from it, an earlier flight has finished
    /// and its token is returned without another network call.
    async fn refresh_after(&self, seen: Option<String>) -> ClientResult<String> {
        let flight = {
            let mut slot = self
                .inner
                .refresh_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(flight) => {
                    debug!("Joining in-flight token refresh");
                    flight.clone()
                }
                None => {
                    let gateway = self.clone();
                    let flight = async move {
                        let result = gateway.refresh_once(seen).await;
                        gateway.finish_refresh();
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }

    /// Exchange username and password for a token pair and store it.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Credential> {
        let url = self.inner.api.url(&self.inner.api.token_path);
        let response = self
            .inner
            .http
            .post(&url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| ClientError::LoginFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(username = %username, status = status.as_u16(), "Login rejected");
            return Err(ClientError::LoginFailed(rejection_message(status, &body)));
        }

        let pair: TokenPair = response
            .json()
            .await
            .map_err(|e| ClientError::LoginFailed(format!("unexpected token response: {}", e)))?;

        let credential = Credential::new(pair.access, pair.refresh);
        self.inner.credentials.set(&credential)?;
        info!(username = %username, "Logged in");
        Ok(credential)
    }

    /// Forget the stored credential. No network call.
    pub fn logout(&self) -> ClientResult<()> {
        self.inner.credentials.clear()?;
        info!("Logged out");
        Ok(())
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Response> {
        let url = self.inner.api.url(&request.path);
        let mut builder = self.inner.http.request(request.method.clone(), &url);

        for (name, value) in &request.headers {
            if token.is_some() && name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(
            method = %request.method,
            url = %url,
            status = response.status().as_u16(),
            authenticated = token.is_some(),
            "Request dispatched"
        );
        Ok(response)
    }

    async fn refresh_once(&self, seen: Option<String>) -> ClientResult<String> {
        if let Some(current) = self.inner.credentials.access_token()
            && seen.as_deref() != Some(current.as_str())
        {
            debug!("Access token already replaced; skipping refresh");
            return Ok(current);
        }

        let Some(refresh_token) = self.inner.credentials.refresh_token() else {
            warn!("No refresh token stored; clearing credentials");
            self.clear_credentials();
            return Err(ClientError::NoRefreshToken);
        };

        match self.request_access_token(&refresh_token).await {
            Ok(grant) => {
                match grant.refresh {
                    Some(rotated) => self
                        .inner
                        .credentials
                        .set(&Credential::new(grant.access.clone(), rotated))?,
                    None => self.inner.credentials.set_access_token(&grant.access)?,
                }
                info!("Access token refreshed");
                Ok(grant.access)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh rejected; clearing credentials");
                self.clear_credentials();
                Err(ClientError::RefreshFailed(err.to_string()))
            }
        }
    }

    async fn request_access_token(&self, refresh_token: &str) -> ClientResult<RefreshGrant> {
        let url = self.inner.api.url(&self.inner.api.refresh_path);
        let response = self
            .inner
            .http
            .post(&url)
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::http(status, body));
        }
        Ok(response.json().await?)
    }

    fn finish_refresh(&self) {
        let mut slot = self
            .inner
            .refresh_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    fn clear_credentials(&self) {
        if let Err(err) = self.inner.credentials.clear() {
            warn!(error = %err, "Failed to clear stored credentials");
        }
    }
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string));
    match detail {
        Some(detail) => format!("{} ({})", detail, status.as_u16()),
        None => format!("server answered {}", status),
    }
}
