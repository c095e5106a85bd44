//! Authenticated Transport Decorator
//!
//! Wraps any `HttpTransport` with a base URL for relative paths, default
//! headers, a bearer token supplier and a hook for 401 answers.

use super::config::{merge_headers, set_header};
use super::error::{Result, TransportError};
use super::{HttpTransport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Produces the current bearer token, if any.
pub type TokenSupplier = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Invoked with the failing request URL when the server answers 401.
pub type UnauthorizedHook = Arc<dyn Fn(&str) + Send + Sync>;

pub struct AuthenticatedTransport<T> {
    inner: T,
    base_url: Option<String>,
    default_headers: BTreeMap<String, String>,
    token: Option<TokenSupplier>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl<T: HttpTransport> AuthenticatedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            base_url: None,
            default_headers: BTreeMap::new(),
            token: None,
            on_unauthorized: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.default_headers, name.into(), value.into());
        self
    }

    pub fn with_token<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.token = Some(Arc::new(supplier));
        self
    }

    pub fn on_unauthorized<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn resolve_url(&self, url: &str) -> String {
        let is_absolute = url.starts_with("http://") || url.starts_with("https://");
        match &self.base_url {
            Some(base) if !is_absolute => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            _ => url.to_string(),
        }
    }
}

impl<T> fmt::Debug for AuthenticatedTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers.keys().collect::<Vec<_>>())
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for AuthenticatedTransport<T> {
    async fn request(&self, mut request: TransportRequest) -> Result<TransportResponse> {
        request.url = self.resolve_url(&request.url);

        let mut headers = self.default_headers.clone();
        if let Some(token) = self.token.as_ref().and_then(|supply| supply()) {
            set_header(&mut headers, "Authorization".to_string(), format!("Bearer {}", token));
        }
        merge_headers(&mut headers, std::mem::take(&mut request.headers));
        request.headers = headers;

        let url = request.url.clone();
        let result = self.inner.request(request).await;

        if let Err(TransportError::Status { status: 401, .. }) = &result {
            log::warn!("Unauthorized response from {}", url);
            if let Some(hook) = &self.on_unauthorized {
                hook(&url);
            }
        }

        result
    }
}
