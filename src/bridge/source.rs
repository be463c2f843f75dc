use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::resolve::value_map::ValueMapEntry;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("invalid value source endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("value request to {endpoint} timed out after {timeout_ms} ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("value request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("value source {endpoint} answered HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("could not decode field values ({context}): {reason}")]
    Decode { context: String, reason: String },

    #[error("failed to read value file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The source answered but reported failure.
    #[error("value source rejected the request: {0}")]
    Rejected(String),
}

/// Request sent to the companion service for a page's field values.
#[derive(Debug, Clone, Serialize)]
pub struct FieldValuesRequest<'a> {
    pub action: &'static str,
    pub url: &'a str,
}

/// `{success, fields, error}` envelope returned by the companion service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldValuesResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub fields: Vec<ValueMapEntry>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValuePayload {
    Records(Vec<ValueMapEntry>),
    Envelope(FieldValuesResponse),
}

impl ValuePayload {
    fn into_entries(self) -> Result<Vec<ValueMapEntry>, BridgeError> {
        match self {
            ValuePayload::Records(records) => Ok(records),
            ValuePayload::Envelope(response) if response.success == Some(false) => Err(BridgeError::Rejected(
                response.error.unwrap_or_else(|| "no reason given".to_string()),
            )),
            ValuePayload::Envelope(response) => Ok(response.fields),
        }
    }
}

/// Decode a value payload: a bare record array or a response envelope.
pub fn decode_entries(content: &str, context: &str) -> Result<Vec<ValueMapEntry>, BridgeError> {
    let payload: ValuePayload = serde_json::from_str(content).map_err(|e| BridgeError::Decode {
        context: context.to_string(),
        reason: e.to_string(),
    })?;
    payload.into_entries()
}

/// Single-shot supplier of `{key, name, label, value}` records for a page.
pub trait ValueSource {
    fn fetch_values(&self, page_url: &str) -> Result<Vec<ValueMapEntry>, BridgeError>;
}

// ============================================================================
// File source
// ============================================================================

pub struct FileValueSource {
    path: String,
}

impl FileValueSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ValueSource for FileValueSource {
    fn fetch_values(&self, page_url: &str) -> Result<Vec<ValueMapEntry>, BridgeError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| BridgeError::Io {
            path: self.path.clone(),
            source,
        })?;
        let entries = decode_entries(&content, &self.path)?;
        debug!(path = %self.path, page_url, count = entries.len(), "loaded field values from file");
        Ok(entries)
    }
}

// ============================================================================
// HTTP source
// ============================================================================

/// Asks a companion service for field values with one POST per page.
pub struct HttpValueSource {
    endpoint: Url,
    timeout: Duration,
}

impl HttpValueSource {
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self, BridgeError> {
        let endpoint = Url::parse(endpoint).map_err(|e| BridgeError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(BridgeError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", endpoint.scheme()),
            });
        }
        Ok(Self {
            endpoint,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ValueSource for HttpValueSource {
    fn fetch_values(&self, page_url: &str) -> Result<Vec<ValueMapEntry>, BridgeError> {
        let endpoint = self.endpoint.to_string();
        let transport = |source: reqwest::Error| {
            if source.is_timeout() {
                BridgeError::Timeout {
                    endpoint: endpoint.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                BridgeError::Transport {
                    endpoint: endpoint.clone(),
                    source,
                }
            }
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(&transport)?;

        let request = FieldValuesRequest {
            action: "getFieldValues",
            url: page_url,
        };
        let response = client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .map_err(&transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status {
                endpoint: endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(&transport)?;
        let entries = decode_entries(&body, &endpoint)?;
        info!(endpoint = %endpoint, page_url, count = entries.len(), "received field values");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_failure_is_rejected() {
        let err = decode_entries(r#"{"success": false, "error": "no data"}"#, "test").unwrap_err();
        assert!(matches!(err, BridgeError::Rejected(reason) if reason == "no data"));
    }

    #[test]
    fn bare_records_and_envelopes_decode() {
        let bare = decode_entries(r#"[{"key": "email", "value": "a@b.c"}]"#, "test").unwrap();
        let wrapped = decode_entries(r#"{"success": true, "fields": [{"key": "email", "value": "a@b.c"}]}"#, "test").unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].key, "email");
    }

    #[test]
    fn non_http_endpoint_is_refused() {
        assert!(matches!(
            HttpValueSource::new("ftp://example.com", 100),
            Err(BridgeError::InvalidEndpoint { .. })
        ));
        assert!(HttpValueSource::new("not a url", 100).is_err());
    }
}
