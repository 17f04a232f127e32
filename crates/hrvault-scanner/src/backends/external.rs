//! External HTTP scan API backend
//!
//! POSTs the buffer as multipart to a managed scanning service. Any
//! transport error, timeout or non-2xx status is a scan failure; the
//! backend never infers cleanliness from an unreachable service.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::outcome::ScanOutcome;
use crate::scanner::{ScanBackend, ScanError};

#[derive(Clone)]
pub struct ExternalApiBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanApiResponse {
    is_clean: bool,
    #[serde(default)]
    threats: Vec<String>,
}

impl ExternalApiBackend {
    pub fn new(url: String, api_key: String, timeout_secs: u64) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScanError::Backend(format!("Failed to build scan client: {}", e)))?;
        Ok(Self {
            client,
            url,
            api_key,
        })
    }
}

#[async_trait]
impl ScanBackend for ExternalApiBackend {
    fn name(&self) -> &'static str {
        "external"
    }

    async fn scan(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        tracing::debug!(url = %self.url, size_bytes = data.len(), "Starting external scan");

        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name("upload")
            .mime_str("application/octet-stream")
            .map_err(|e| ScanError::Backend(format!("Failed to build scan request: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScanError::Backend("External scan request timed out".to_string())
                } else {
                    ScanError::Backend(format!("External scan request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(ScanError::Backend(format!(
                "External scan service returned {}",
                response.status()
            )));
        }

        let body: ScanApiResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Backend(format!("Invalid scan service response: {}", e)))?;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if body.is_clean {
            tracing::info!(duration_ms = elapsed_ms, "External scan completed: clean");
            Ok(ScanOutcome::clean(self.name(), elapsed_ms))
        } else {
            tracing::warn!(
                duration_ms = elapsed_ms,
                threats = ?body.threats,
                "External scan detected threats"
            );
            let threats = if body.threats.is_empty() {
                vec!["unknown".to_string()]
            } else {
                body.threats
            };
            Ok(ScanOutcome::infected(self.name(), threats, elapsed_ms))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserialization() {
        let body: ScanApiResponse =
            serde_json::from_str(r#"{"isClean": false, "threats": ["Trojan.Generic"]}"#).unwrap();
        assert!(!body.is_clean);
        assert_eq!(body.threats, vec!["Trojan.Generic"]);

        let clean: ScanApiResponse = serde_json::from_str(r#"{"isClean": true}"#).unwrap();
        assert!(clean.is_clean);
        assert!(clean.threats.is_empty());
    }
}
