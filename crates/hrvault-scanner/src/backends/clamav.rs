//! clamd-over-TCP backend
//!
//! Uses the sync clamav-client API inside `spawn_blocking` to avoid !Send
//! tokio futures, bounded by a timeout. Every failure path is an error;
//! an unreachable or misbehaving daemon never passes a file.

use async_trait::async_trait;
use clamav_client::{clean, Tcp};
use std::str;
use std::time::{Duration, Instant};

use crate::outcome::ScanOutcome;
use crate::scanner::{ScanBackend, ScanError};

#[derive(Clone)]
pub struct ClamAvBackend {
    host: String,
    port: u16,
    timeout_secs: u64,
}

impl ClamAvBackend {
    pub fn new(host: String, port: u16, timeout_secs: u64) -> Self {
        Self {
            host,
            port,
            timeout_secs,
        }
    }
}

fn parse_virus_name(response_bytes: &[u8]) -> String {
    let response_str = match str::from_utf8(response_bytes) {
        Ok(s) => s.trim(),
        Err(_) => "unknown",
    };
    if response_str.contains("FOUND") {
        response_str
            .split(':')
            .nth(1)
            .unwrap_or("unknown")
            .split_whitespace()
            .next()
            .unwrap_or("unknown")
            .to_string()
    } else {
        "unknown".to_string()
    }
}

#[async_trait]
impl ScanBackend for ClamAvBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn scan(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        tracing::debug!(host = %self.host, port = %self.port, "Starting ClamAV scan");
        let data = data.to_vec();
        let host = self.host.clone();
        let port = self.port;

        let result = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            tokio::task::spawn_blocking(move || {
                let address = format!("{}:{}", host, port);
                let connection = Tcp {
                    host_address: address.as_str(),
                };
                let response_bytes = clamav_client::scan_buffer(data.as_slice(), connection, None)
                    .map_err(|e| ScanError::Backend(format!("ClamAV scan error: {}", e)))?;
                let is_clean = clean(&response_bytes).map_err(|e| {
                    ScanError::Backend(format!("Failed to parse ClamAV response: {}", e))
                })?;
                Ok::<_, ScanError>((is_clean, response_bytes))
            }),
        )
        .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(Ok((true, _)))) => {
                tracing::info!(duration_ms = elapsed_ms, "ClamAV scan completed: clean");
                Ok(ScanOutcome::clean(self.name(), elapsed_ms))
            }
            Ok(Ok(Ok((false, response_bytes)))) => {
                let virus_name = parse_virus_name(&response_bytes);
                tracing::warn!(
                    duration_ms = elapsed_ms,
                    virus = %virus_name,
                    "ClamAV scan detected virus"
                );
                Ok(ScanOutcome::infected(
                    self.name(),
                    vec![virus_name],
                    elapsed_ms,
                ))
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, "ClamAV scan failed");
                Err(e)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "ClamAV scan task panicked");
                Err(ScanError::Backend(format!(
                    "ClamAV scan task join error: {}",
                    e
                )))
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.timeout_secs,
                    "ClamAV scan timeout"
                );
                Err(ScanError::Timeout(self.timeout_secs))
            }
        }
    }
}
