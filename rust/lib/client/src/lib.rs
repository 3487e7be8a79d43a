//! zonedesk HTTP gateway.
//!
//! Translates CRUD intents on a [`Resource`] into authenticated requests
//! against the admin REST API and parses the `{ success, data, message? }`
//! envelope into typed results. Authentication is pluggable through
//! [`TokenSource`]; every request also carries the anti-forgery header from
//! [`GatewayConfig`].
//!
//! Every call is a single attempt. Nothing here retries.
//!
//! # Usage
//!
//! ```ignore
//! use zonedesk_client::{Gateway, GatewayConfig, ResourceClient, StaticToken};
//! use zonedesk_types::Zone;
//!
//! let config = GatewayConfig::new("http://localhost:8000/api").with_csrf_token(csrf);
//! let zones = ResourceClient::<Zone>::new(config, Arc::new(StaticToken::new(jwt)));
//! let all = zones.list().await?;
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use zonedesk_types::{Ack, Availability, Envelope, FieldErrors, Resource};


// ── Error ───────────────────────────────────────────────────────────

/// Gateway failure. `Display` is the human-readable message a form can show.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS, TLS, broken body stream.
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response that is not a validation or lookup failure.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// Server-reported field errors (HTTP 422 or an `errors` map).
    /// `in_envelope` is set when they came in a 2xx `success: false` body.
    #[error("{message}")]
    Validation {
        message: String,
        errors: FieldErrors,
        in_envelope: bool,
    },

    /// The referenced identity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// 2xx envelope with `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// Body is not the expected JSON shape.
    #[error("decode: {0}")]
    Decode(String),

    #[error("auth: {0}")]
    Auth(String),
}

impl ApiError {
    /// True when the response arrived but could not be trusted structurally.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ApiError::Decode(_))
    }

    /// True when a 2xx response carried `success: false`, with or without
    /// field errors.
    pub fn is_envelope_rejection(&self) -> bool {
        matches!(
            self,
            ApiError::Rejected(_) | ApiError::Validation { in_envelope: true, .. }
        )
    }
}

// ── TokenSource ─────────────────────────────────────────────────────

/// Pluggable bearer credential provider, called before every request.
///
/// Returns `Ok(None)` to skip the Authorization header.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;
}

/// Anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// Session-derived bearer token obtained by the surrounding application.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        if self.0.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.0.clone()))
    }
}

// ── Config ──────────────────────────────────────────────────────────

/// Default anti-forgery header name.
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Where and how to reach the admin API.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// API root, e.g. `http://localhost:8000/api`. Trailing `/` is trimmed.
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub csrf_header: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token: None,
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.csrf_token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn with_csrf_header(mut self, header: impl Into<String>) -> Self {
        self.csrf_header = header.into();
        self
    }
}

// ── Gateway ─────────────────────────────────────────────────────────

/// The CRUD surface of one resource kind.
///
/// [`ResourceClient`] speaks HTTP; tests substitute in-memory fakes.
#[async_trait::async_trait]
pub trait Gateway<T: Resource>: Send + Sync + 'static {
    /// `GET /{resource}`.
    async fn list(&self) -> Result<Vec<T>, ApiError>;

    /// `GET /{resource}/{id}`. [`ApiError::NotFound`] when nothing matches.
    async fn get(&self, id: &str) -> Result<T, ApiError>;

    /// `POST /{resource}/store`.
    async fn create(&self, draft: &T::Draft) -> Result<T, ApiError>;

    /// `PATCH /{resource}/update/{id}`.
    async fn update(&self, id: &str, patch: &T::Patch) -> Result<T, ApiError>;

    /// `DELETE /{resource}/delete/{id}`. The acknowledgement is returned
    /// as reported; `success: false` is for the caller to interpret.
    async fn delete(&self, id: &str) -> Result<Ack, ApiError>;

    /// `PUT /{resource}/restore/{id}`.
    async fn restore(&self, id: &str) -> Result<T, ApiError>;

    /// `GET /{resource}/{field}-check/{value}?id={exclude_id}`.
    async fn check_uniqueness(
        &self,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<Availability, ApiError>;
}

// ── ResourceClient ──────────────────────────────────────────────────

/// Characters escaped in a path segment. Unreserved URL characters stay as-is.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// HTTP [`Gateway`] for a single resource kind.
///
/// Paths are `{base_url}/{T::PATH}/...`.
pub struct ResourceClient<T: Resource> {
    http: reqwest::Client,
    config: GatewayConfig,
    token_source: Arc<dyn TokenSource>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(config: GatewayConfig, token_source: Arc<dyn TokenSource>) -> Self {
        Self::with_http(reqwest::Client::new(), config, token_source)
    }

    /// Share one connection pool across several resource clients.
    pub fn with_http(
        http: reqwest::Client,
        config: GatewayConfig,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            config,
            token_source,
            _phantom: PhantomData,
        }
    }

    /// `{base_url}/{resource}`.
    fn collection_url(&self) -> String {
        format!("{}/{}", self.config.base_url, T::PATH)
    }

    /// `{base_url}/{resource}/{action}/{id}`; `action` may be empty.
    fn item_url(&self, action: &str, id: &str) -> String {
        let id = utf8_percent_encode(id, PATH_SEGMENT);
        if action.is_empty() {
            format!("{}/{}", self.collection_url(), id)
        } else {
            format!("{}/{}/{}", self.collection_url(), action, id)
        }
    }

    fn check_url(&self, value: &str) -> String {
        self.item_url(&format!("{}-check", T::UNIQUE_FIELD), value)
    }

    /// Build a request carrying the bearer credential and anti-forgery header.
    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, ApiError> {
        debug!(resource = T::PATH, %method, url, "gateway request");
        let mut builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(csrf) = &self.config.csrf_token {
            builder = builder.header(self.config.csrf_header.as_str(), csrf.as_str());
        }
        match self.token_source.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        Ok(builder.send().await?)
    }

    /// Read the body, mapping non-2xx statuses to [`ApiError`] and decoding
    /// the rest as `R`.
    async fn parse<R: DeserializeOwned>(resp: Response) -> Result<R, ApiError> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        serde_json::from_str::<R>(&body)
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    /// Parse an envelope that must carry `data`.
    async fn parse_data<R: DeserializeOwned>(resp: Response) -> Result<R, ApiError> {
        let env: Envelope<R> = Self::parse(resp).await?;
        accept(env)?.ok_or_else(|| ApiError::Decode("envelope has no data".to_string()))
    }
}

#[async_trait::async_trait]
impl<T: Resource> Gateway<T> for ResourceClient<T> {
    async fn list(&self) -> Result<Vec<T>, ApiError> {
        let req = self.request(Method::GET, &self.collection_url()).await?;
        let resp = Self::send(req).await?;
        Self::parse_data(resp).await
    }

    async fn get(&self, id: &str) -> Result<T, ApiError> {
        let req = self.request(Method::GET, &self.item_url("", id)).await?;
        let resp = Self::send(req).await?;
        let env: Envelope<T> = Self::parse(resp).await?;
        accept(env)?.ok_or_else(|| ApiError::NotFound(format!("{} '{}' not found", T::LABEL, id)))
    }

    async fn create(&self, draft: &T::Draft) -> Result<T, ApiError> {
        let url = format!("{}/store", self.collection_url());
        let req = self.request(Method::POST, &url).await?.json(draft);
        let resp = Self::send(req).await?;
        Self::parse_data(resp).await
    }

    async fn update(&self, id: &str, patch: &T::Patch) -> Result<T, ApiError> {
        let req = self
            .request(Method::PATCH, &self.item_url("update", id))
            .await?
            .json(patch);
        let resp = Self::send(req).await?;
        Self::parse_data(resp).await
    }

    async fn delete(&self, id: &str) -> Result<Ack, ApiError> {
        let req = self.request(Method::DELETE, &self.item_url("delete", id)).await?;
        let resp = Self::send(req).await?;
        Self::parse(resp).await
    }

    async fn restore(&self, id: &str) -> Result<T, ApiError> {
        let req = self
            .request(Method::PUT, &self.item_url("restore", id))
            .await?
            .json(&serde_json::json!({}));
        let resp = Self::send(req).await?;
        Self::parse_data(resp).await
    }

    async fn check_uniqueness(
        &self,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<Availability, ApiError> {
        let mut req = self.request(Method::GET, &self.check_url(value)).await?;
        if let Some(id) = exclude_id {
            req = req.query(&[("id", id)]);
        }
        let resp = Self::send(req).await?;
        Self::parse_data(resp).await
    }
}

// ── Envelope handling ───────────────────────────────────────────────

/// Turn a `success: false` envelope into an error; pass `data` through otherwise.
fn accept<R>(env: Envelope<R>) -> Result<Option<R>, ApiError> {
    if env.success {
        return Ok(env.data);
    }
    let message = env
        .failure_message()
        .unwrap_or_else(|| "request was rejected by the server".to_string());
    match env.errors {
        Some(errors) if !errors.is_empty() => Err(ApiError::Validation {
            message,
            errors,
            in_envelope: true,
        }),
        _ => Err(ApiError::Rejected(message)),
    }
}

/// Map a non-2xx response to an [`ApiError`], preferring the server's own
/// `message` over a generic description of the status.
fn error_from_body(status: StatusCode, body: &str) -> ApiError {
    let json: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let errors: Option<FieldErrors> = json
        .as_ref()
        .and_then(|v| v.get("errors"))
        .and_then(|e| serde_json::from_value(e.clone()).ok())
        .filter(|e: &FieldErrors| !e.is_empty());
    let message = json
        .as_ref()
        .and_then(server_message)
        .or_else(|| {
            errors
                .as_ref()
                .and_then(|e| e.values().flatten().next().cloned())
        })
        .unwrap_or_else(|| generic_message(status));

    match (status, errors) {
        (StatusCode::NOT_FOUND, _) => ApiError::NotFound(message),
        (StatusCode::UNPROCESSABLE_ENTITY, errors) => ApiError::Validation {
            message,
            errors: errors.unwrap_or_default(),
            in_envelope: false,
        },
        (_, Some(errors)) => ApiError::Validation {
            message,
            errors,
            in_envelope: false,
        },
        (status, None) => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

fn server_message(json: &serde_json::Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| json.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn generic_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("request failed: {}", reason),
        None => format!("request failed with status {}", status.as_u16()),
    }
}
