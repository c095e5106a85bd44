//! HTTP Transport
//!
//! Uniform contract for issuing an HTTP request and receiving either a
//! structured response or a classified failure. The built-in implementation
//! wraps `reqwest`; callers may inject any `HttpTransport`.

mod authenticated;
mod client;
mod config;
mod error;

pub use authenticated::{AuthenticatedTransport, TokenSupplier, UnauthorizedHook};
pub use client::ReqwestTransport;
pub use config::{
    CachePolicy, CredentialsPolicy, HttpMethod, RedirectPolicy, ReferrerPolicy, RequestConfig,
    RequestMode,
};
pub use error::{Result, TransportError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Request / Response
// ============================================================================

/// A single transport call.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    pub url: String,
    /// Method; transports fall back to their configured default, then POST.
    pub method: Option<HttpMethod>,
    pub headers: BTreeMap<String, String>,
    /// JSON body for non-GET methods.
    pub data: Option<Value>,
    /// Query-string parameters, in order.
    pub params: Vec<(String, String)>,
    /// Per-call transport options, merged over the transport's defaults.
    pub config: RequestConfig,
    /// Fires to abandon the call before it resolves.
    pub signal: Option<CancellationToken>,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url).with_method(HttpMethod::Get)
    }

    pub fn post(url: impl Into<String>, data: Value) -> Self {
        Self::new(url).with_method(HttpMethod::Post).with_data(data)
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        config::set_header(&mut self.headers, name.into(), value.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Flatten a JSON object into query parameters. Strings are sent verbatim,
    /// nulls are skipped and everything else is sent as its JSON text.
    pub fn with_params_from(mut self, payload: &Value) -> Self {
        if let Value::Object(map) = payload {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::String(s) => self.params.push((key.clone(), s.clone())),
                    other => self.params.push((key.clone(), other.to_string())),
                }
            }
        }
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout = Some(timeout_ms);
        self
    }

    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = self.config.merge(&config);
        self
    }

    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Whether the cancellation signal has already fired.
    pub fn is_cancelled(&self) -> bool {
        self.signal.as_ref().is_some_and(|s| s.is_cancelled())
    }
}

/// Successful (or manually surfaced redirect) transport outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// Decoded JSON body; non-JSON bodies become a JSON string, empty bodies null.
    pub data: Value,
    pub status: u16,
    pub status_text: String,
}

impl TransportResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            status: 200,
            status_text: "OK".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body into a typed value.
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Anything able to carry a `TransportRequest` to a server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse> {
        (**self).request(request).await
    }
}

/// Body decoding shared by transports: JSON when possible, else a JSON string.
pub(crate) fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
