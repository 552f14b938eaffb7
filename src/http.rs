//! Blocking JSON request helper shared by the service clients.
//!
//! Maps the three failure layers onto [`ServiceError`]:
//! - no response at all → `Transport`
//! - non-2xx status → `Status` with the decoded body
//! - body that is not a non-empty JSON object → `Shape` (raw body logged)

use std::time::Duration;

use anyhow::{Context, Result};
use ragline_core::{ServiceError, ServiceResult};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Build a blocking client with a timeout and an optional auth header.
pub(crate) fn build_client(
    timeout_secs: u64,
    auth: Option<(HeaderName, String)>,
    label: &str,
) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some((name, value)) = auth {
        headers.insert(
            name,
            HeaderValue::from_str(value.trim())
                .with_context(|| format!("invalid {} credentials", label))?,
        );
    }
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .with_context(|| format!("failed to build {} HTTP client", label))
}

/// `Authorization: Bearer <key>` header pair.
pub(crate) fn bearer(api_key: &str) -> Option<(HeaderName, String)> {
    Some((AUTHORIZATION, format!("Bearer {}", api_key.trim())))
}

pub(crate) fn ensure_http_url(url: &str, label: &str) -> Result<()> {
    anyhow::ensure!(
        url.starts_with("http://") || url.starts_with("https://"),
        "{} endpoint must be an http(s) URL, got '{}'",
        label,
        url
    );
    Ok(())
}

/// A decoded JSON object together with the raw body it came from.
pub(crate) struct JsonBody {
    pub value: Value,
    pub raw: String,
}

impl JsonBody {
    /// Deserialize into a typed response, reporting failures as `Shape`.
    pub fn decode<T: DeserializeOwned>(self) -> ServiceResult<T> {
        let raw = self.raw;
        serde_json::from_value(self.value)
            .map_err(|e| ServiceError::shape(format!("unexpected response layout: {}", e), raw))
    }
}

/// Send `request` and decode a non-empty JSON object from a 2xx response.
pub(crate) fn send_json(request: RequestBuilder) -> ServiceResult<JsonBody> {
    let response = request.send().map_err(ServiceError::transport)?;
    let status = response.status();
    let raw = response.text().map_err(ServiceError::transport)?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), body = %raw, "service returned an error status");
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body: raw,
        });
    }

    let value: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => return Err(ServiceError::shape(format!("invalid JSON: {}", e), raw)),
    };
    match value.as_object() {
        Some(obj) if !obj.is_empty() => Ok(JsonBody { value, raw }),
        _ => Err(ServiceError::shape("expected a non-empty JSON object", raw)),
    }
}
