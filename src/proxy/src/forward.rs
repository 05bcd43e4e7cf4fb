//! Backend forwarding
//!
//! Re-issues the inbound request against the resource's host, keeping
//! method, path, query and body, and relays the backend answer.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use http_body_util::LengthLimitError;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;
use warden_api_server::middleware::X_REQUEST_ID;

use crate::error::{ProxyError, Result};

/// Largest request body the gateway buffers
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Connection-scoped headers never forwarded in either direction
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// HTTP client towards proxied backends
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProxyError::Internal(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Send `request` to `host`, relaying status, headers and body
    pub async fn forward(&self, host: &str, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = target_url(host, path_and_query)?;

        let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(body_error)?;

        let mut headers = strip_hop_by_hop(&parts.headers);
        headers.remove(header::HOST);
        if let Some(request_id) = parts.extensions.get::<Uuid>() {
            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                headers.insert(X_REQUEST_ID, value);
            }
        }

        debug!(method = %parts.method, url = %url, "Forwarding request");

        let upstream = self
            .client
            .request(parts.method, url.clone())
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| self.upstream_error(&url, e))?;

        let status = upstream.status();
        let upstream_headers = strip_hop_by_hop(upstream.headers());
        let bytes = upstream
            .bytes()
            .await
            .map_err(|e| self.upstream_error(&url, e))?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = upstream_headers;
        Ok(response)
    }

    fn upstream_error(&self, url: &Url, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            warn!(url = %url, timeout_ms = self.timeout.as_millis() as u64, "Backend timed out");
            ProxyError::Timeout(format!("{} did not answer within {:?}", url, self.timeout))
        } else {
            warn!(url = %url, error = %err, "Backend unreachable");
            ProxyError::BadGateway(format!("{}: {}", url, err))
        }
    }
}

fn body_error(err: axum::Error) -> ProxyError {
    let inner = err.into_inner();
    if inner.downcast_ref::<LengthLimitError>().is_some() {
        ProxyError::PayloadTooLarge(MAX_BODY_BYTES)
    } else {
        ProxyError::BadRequest(format!("request body: {}", inner))
    }
}

/// Swap the inbound host for the backend host
pub fn target_url(host: &str, path_and_query: &str) -> Result<Url> {
    let raw = format!("{}{}", host.trim_end_matches('/'), path_and_query);
    let url = Url::parse(&raw)
        .map_err(|e| ProxyError::BadGateway(format!("invalid backend url {}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return Err(ProxyError::BadGateway(format!("invalid backend url {}", raw)));
    }
    Ok(url)
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut kept = headers.clone();
    for name in HOP_BY_HOP.iter() {
        kept.remove(name);
    }
    kept
}
