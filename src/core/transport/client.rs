//! Built-in reqwest Transport

use super::config::{merge_headers, HttpMethod, RedirectPolicy, RequestConfig};
use super::error::{Result, TransportError};
use super::{decode_body, HttpTransport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use reqwest::header::{LOCATION, RETRY_AFTER};
use reqwest::{redirect, Client};

/// `HttpTransport` backed by a `reqwest::Client`.
///
/// The transport holds default `RequestConfig` values that every call is
/// merged under. Redirect handling is fixed when the client is built:
/// `error` and `manual` disable following, and a 3xx answer then becomes
/// `TransportError::Redirect` or is returned as-is.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    defaults: RequestConfig,
}

impl ReqwestTransport {
    /// Transport with no defaults that follows redirects.
    pub fn new() -> Result<Self> {
        Self::with_config(RequestConfig::default())
    }

    /// Build an owned client honoring `defaults.redirect`.
    pub fn with_config(defaults: RequestConfig) -> Result<Self> {
        let policy = match defaults.redirect {
            Some(RedirectPolicy::Error) | Some(RedirectPolicy::Manual) => redirect::Policy::none(),
            _ => redirect::Policy::default(),
        };

        let client = Client::builder()
            .redirect(policy)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("HTTP client: {}", e)))?;

        Ok(Self { client, defaults })
    }

    /// Use an externally constructed client (connection pool, proxies, TLS
    /// settings are the caller's).
    pub fn from_client(client: Client) -> Self {
        Self::from_client_with_config(client, RequestConfig::default())
    }

    pub fn from_client_with_config(client: Client, defaults: RequestConfig) -> Self {
        Self { client, defaults }
    }

    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    async fn execute(
        &self,
        request: TransportRequest,
        method: HttpMethod,
        config: &RequestConfig,
    ) -> Result<TransportResponse> {
        let mut builder = self.client.request(method.into(), &request.url);

        for (name, value) in config.effective_headers() {
            builder = builder.header(name, value);
        }

        let mut params = request.params;
        match request.data {
            Some(data) if method.sends_body() => builder = builder.json(&data),
            Some(data) => params.extend(TransportRequest::default().with_params_from(&data).params),
            None => {}
        }
        if !params.is_empty() {
            builder = builder.query(&params);
        }

        let response = builder.send().await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;
        let data = decode_body(&bytes);

        if status.is_redirection() {
            if config.redirect == Some(RedirectPolicy::Error) {
                return Err(TransportError::Redirect {
                    status: status.as_u16(),
                    location,
                });
            }
        } else if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                status_text,
                body: data,
                retry_after,
            });
        }

        Ok(TransportResponse {
            data,
            status: status.as_u16(),
            status_text,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, mut request: TransportRequest) -> Result<TransportResponse> {
        let signal = request.signal.take();
        if signal.as_ref().is_some_and(|s| s.is_cancelled()) {
            return Err(TransportError::Cancelled);
        }

        let mut config = self.defaults.merge(&request.config);
        merge_headers(&mut config.headers, std::mem::take(&mut request.headers));
        let method = request.method.or(config.method).unwrap_or(HttpMethod::Post);
        let timeout = config.timeout_duration();

        log::debug!("{} {}", method, request.url);

        let call = async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, self.execute(request, method, &config))
                    .await
                    .map_err(|_| TransportError::Timeout(limit))?,
                None => self.execute(request, method, &config).await,
            }
        };

        match signal {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(TransportError::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        }
    }
}
