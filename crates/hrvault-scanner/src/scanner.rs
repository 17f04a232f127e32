//! Scan facade
//!
//! Orders the cheap checks (size gate, EICAR signature) before any
//! backend I/O and dispatches to the configured backend(s). Fail closed:
//! a disabled or misconfigured scanner is an error at construction or at
//! scan time, never a silent pass.

use async_trait::async_trait;
use hrvault_core::{Config, ScanProvider};
use std::sync::Arc;

use crate::backends::{ClamAvBackend, ExternalApiBackend};
use crate::metrics::{ScanMetrics, ScanMetricsSnapshot};
use crate::outcome::ScanOutcome;

/// The standard antivirus test signature; any buffer containing it is
/// reported infected before backend dispatch.
const EICAR_SIGNATURE: &[u8] =
    br"X5O!P%@AP[4\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

const EICAR_THREAT_NAME: &str = "Eicar-Test-Signature";
const SIZE_LIMIT_THREAT_NAME: &str = "Scan.SizeLimit.Exceeded";

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Antivirus scanning is disabled")]
    Disabled,

    #[error("Scanner misconfigured: {0}")]
    Misconfigured(String),

    #[error("Scan backend error: {0}")]
    Backend(String),

    #[error("Scan timed out after {0} seconds")]
    Timeout(u64),
}

/// A single scanning backend.
#[async_trait]
pub trait ScanBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn scan(&self, data: &[u8]) -> Result<ScanOutcome, ScanError>;
}

/// Antivirus scan facade.
pub struct Scanner {
    provider: ScanProvider,
    local: Option<Arc<dyn ScanBackend>>,
    external: Option<Arc<dyn ScanBackend>>,
    max_scan_size: usize,
    metrics: Arc<ScanMetrics>,
    enabled: bool,
}

impl Scanner {
    /// Build a scanner from configuration. Erroring here is deliberate:
    /// a deployment that asked for scanning but cannot scan must not
    /// start serving uploads.
    pub fn from_config(config: &Config) -> Result<Self, ScanError> {
        if !config.antivirus_enabled {
            return Err(ScanError::Disabled);
        }

        let needs_local = matches!(config.scan_provider, ScanProvider::Local | ScanProvider::Dual);
        let needs_external = matches!(
            config.scan_provider,
            ScanProvider::External | ScanProvider::Dual
        );

        let local: Option<Arc<dyn ScanBackend>> = if needs_local {
            Some(Arc::new(ClamAvBackend::new(
                config.clamav_host.clone(),
                config.clamav_port,
                config.scan_timeout_seconds,
            )))
        } else {
            None
        };

        let external: Option<Arc<dyn ScanBackend>> = if needs_external {
            let url = config
                .scan_api_url
                .clone()
                .ok_or_else(|| ScanError::Misconfigured("SCAN_API_URL is not set".to_string()))?;
            let api_key = config
                .scan_api_key
                .clone()
                .ok_or_else(|| ScanError::Misconfigured("SCAN_API_KEY is not set".to_string()))?;
            Some(Arc::new(ExternalApiBackend::new(
                url,
                api_key,
                config.scan_timeout_seconds,
            )?))
        } else {
            None
        };

        Ok(Self {
            provider: config.scan_provider,
            local,
            external,
            max_scan_size: config.max_scan_size_bytes,
            metrics: Arc::new(ScanMetrics::default()),
            enabled: true,
        })
    }

    /// A scanner for deployments that explicitly turned scanning off.
    /// Every scan through it fails; it never reports clean.
    pub fn disabled() -> Self {
        Self {
            provider: ScanProvider::Local,
            local: None,
            external: None,
            max_scan_size: 0,
            metrics: Arc::new(ScanMetrics::default()),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn provider(&self) -> ScanProvider {
        self.provider
    }

    pub fn max_scan_size(&self) -> usize {
        self.max_scan_size
    }

    pub fn metrics(&self) -> ScanMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Scan one buffer. `filename` and `requested_by` are for the audit
    /// trail only; file content never reaches the logs.
    pub async fn scan_buffer(
        &self,
        data: &[u8],
        filename: &str,
        requested_by: &str,
    ) -> Result<ScanOutcome, ScanError> {
        if !self.enabled {
            tracing::error!(
                filename = %filename,
                requested_by = %requested_by,
                "Scan requested while antivirus is disabled; rejecting"
            );
            return Err(ScanError::Disabled);
        }

        self.metrics.record_scan();

        if data.len() > self.max_scan_size {
            self.metrics.record_threat();
            tracing::warn!(
                filename = %filename,
                requested_by = %requested_by,
                size_bytes = data.len(),
                max_scan_size = self.max_scan_size,
                "File exceeds scannable size; rejecting"
            );
            return Ok(ScanOutcome::infected(
                "policy",
                vec![SIZE_LIMIT_THREAT_NAME.to_string()],
                0,
            ));
        }

        if contains_eicar(data) {
            self.metrics.record_threat();
            tracing::warn!(
                filename = %filename,
                requested_by = %requested_by,
                threat = EICAR_THREAT_NAME,
                "EICAR test signature detected"
            );
            return Ok(ScanOutcome::infected(
                "signature",
                vec![EICAR_THREAT_NAME.to_string()],
                0,
            ));
        }

        let outcome = match self.provider {
            ScanProvider::Local => self.scan_local(data).await?,
            ScanProvider::External => self.scan_external(data).await?,
            ScanProvider::Dual => self.scan_dual(data).await?,
        };

        if !outcome.is_clean {
            self.metrics.record_threat();
            tracing::warn!(
                filename = %filename,
                requested_by = %requested_by,
                threats = ?outcome.threats,
                provider = outcome.provider,
                "Scan detected threats"
            );
        }

        Ok(outcome)
    }

    async fn scan_local(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        let backend = self
            .local
            .as_ref()
            .ok_or_else(|| ScanError::Misconfigured("Local backend not configured".to_string()))?;
        backend.scan(data).await.map_err(|e| {
            self.metrics.record_local_failure();
            e
        })
    }

    async fn scan_external(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        let backend = self.external.as_ref().ok_or_else(|| {
            ScanError::Misconfigured("External backend not configured".to_string())
        })?;
        backend.scan(data).await.map_err(|e| {
            self.metrics.record_external_failure();
            e
        })
    }

    /// Run both backends concurrently. A single failure falls back to
    /// the survivor's verdict; both failing is a scan failure.
    async fn scan_dual(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        let local = self
            .local
            .as_ref()
            .ok_or_else(|| ScanError::Misconfigured("Local backend not configured".to_string()))?;
        let external = self.external.as_ref().ok_or_else(|| {
            ScanError::Misconfigured("External backend not configured".to_string())
        })?;

        let (local_result, external_result) =
            tokio::join!(local.scan(data), external.scan(data));

        match (local_result, external_result) {
            (Ok(a), Ok(b)) => Ok(a.merge(b)),
            (Ok(outcome), Err(e)) => {
                self.metrics.record_external_failure();
                tracing::warn!(error = %e, "External backend failed; using local verdict");
                Ok(outcome)
            }
            (Err(e), Ok(outcome)) => {
                self.metrics.record_local_failure();
                tracing::warn!(error = %e, "Local backend failed; using external verdict");
                Ok(outcome)
            }
            (Err(local_err), Err(external_err)) => {
                self.metrics.record_local_failure();
                self.metrics.record_external_failure();
                Err(ScanError::Backend(format!(
                    "All scan backends failed: local: {}; external: {}",
                    local_err, external_err
                )))
            }
        }
    }
}

fn contains_eicar(data: &[u8]) -> bool {
    data.len() >= EICAR_SIGNATURE.len()
        && data
            .windows(EICAR_SIGNATURE.len())
            .any(|window| window == EICAR_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticBackend {
        name: &'static str,
        verdict: Result<ScanOutcome, ()>,
    }

    #[async_trait]
    impl ScanBackend for StaticBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn scan(&self, _data: &[u8]) -> Result<ScanOutcome, ScanError> {
            match &self.verdict {
                Ok(outcome) => Ok(outcome.clone()),
                Err(()) => Err(ScanError::Backend("backend down".to_string())),
            }
        }
    }

    fn clean_backend(name: &'static str) -> Arc<dyn ScanBackend> {
        Arc::new(StaticBackend {
            name,
            verdict: Ok(ScanOutcome::clean(name, 1)),
        })
    }

    fn infected_backend(name: &'static str, threat: &str) -> Arc<dyn ScanBackend> {
        Arc::new(StaticBackend {
            name,
            verdict: Ok(ScanOutcome::infected(name, vec![threat.to_string()], 1)),
        })
    }

    fn failing_backend(name: &'static str) -> Arc<dyn ScanBackend> {
        Arc::new(StaticBackend {
            name,
            verdict: Err(()),
        })
    }

    fn scanner(
        provider: ScanProvider,
        local: Option<Arc<dyn ScanBackend>>,
        external: Option<Arc<dyn ScanBackend>>,
    ) -> Scanner {
        Scanner {
            provider,
            local,
            external,
            max_scan_size: 1024,
            metrics: Arc::new(ScanMetrics::default()),
            enabled: true,
        }
    }

    fn eicar_payload() -> Vec<u8> {
        let mut data = b"prefix ".to_vec();
        data.extend_from_slice(EICAR_SIGNATURE);
        data.extend_from_slice(b" suffix");
        data
    }

    #[tokio::test]
    async fn test_eicar_detected_without_backend_io() {
        // failing backends prove the verdict came from the signature check
        let scanner = scanner(
            ScanProvider::Local,
            Some(failing_backend("local")),
            None,
        );
        let outcome = scanner
            .scan_buffer(&eicar_payload(), "evil.txt", "alice")
            .await
            .unwrap();
        assert!(!outcome.is_clean);
        assert_eq!(outcome.threats, vec![EICAR_THREAT_NAME]);
        assert_eq!(outcome.provider, "signature");
    }

    #[tokio::test]
    async fn test_oversize_rejected_as_non_clean() {
        let scanner = scanner(ScanProvider::Local, Some(clean_backend("local")), None);
        let big = vec![0u8; 2048];
        let outcome = scanner.scan_buffer(&big, "big.pdf", "alice").await.unwrap();
        assert!(!outcome.is_clean);
        assert_eq!(outcome.threats, vec![SIZE_LIMIT_THREAT_NAME]);
    }

    #[tokio::test]
    async fn test_disabled_scanner_never_clean() {
        let scanner = Scanner::disabled();
        let result = scanner.scan_buffer(b"harmless", "a.txt", "alice").await;
        assert!(matches!(result, Err(ScanError::Disabled)));
    }

    #[tokio::test]
    async fn test_local_failure_is_an_error() {
        let scanner = scanner(ScanProvider::Local, Some(failing_backend("local")), None);
        let result = scanner.scan_buffer(b"harmless", "a.txt", "alice").await;
        assert!(matches!(result, Err(ScanError::Backend(_))));
        assert_eq!(scanner.metrics().local_failures, 1);
    }

    #[tokio::test]
    async fn test_dual_merges_threats() {
        let scanner = scanner(
            ScanProvider::Dual,
            Some(infected_backend("local", "A")),
            Some(infected_backend("external", "B")),
        );
        let outcome = scanner.scan_buffer(b"x", "a.txt", "alice").await.unwrap();
        assert!(!outcome.is_clean);
        assert_eq!(outcome.threats, vec!["A", "B"]);
        assert_eq!(outcome.provider, "dual");
    }

    #[tokio::test]
    async fn test_dual_survivor_verdict_on_single_failure() {
        let scanner = scanner(
            ScanProvider::Dual,
            Some(failing_backend("local")),
            Some(infected_backend("external", "Trojan.Generic")),
        );
        let outcome = scanner.scan_buffer(b"x", "a.txt", "alice").await.unwrap();
        assert!(!outcome.is_clean);
        assert_eq!(outcome.threats, vec!["Trojan.Generic"]);
        assert_eq!(scanner.metrics().local_failures, 1);
    }

    #[tokio::test]
    async fn test_dual_both_failing_is_an_error() {
        let scanner = scanner(
            ScanProvider::Dual,
            Some(failing_backend("local")),
            Some(failing_backend("external")),
        );
        let result = scanner.scan_buffer(b"x", "a.txt", "alice").await;
        assert!(matches!(result, Err(ScanError::Backend(_))));
    }

    #[tokio::test]
    async fn test_clean_path() {
        let scanner = scanner(ScanProvider::Local, Some(clean_backend("local")), None);
        let outcome = scanner
            .scan_buffer(b"ordinary bytes", "a.txt", "alice")
            .await
            .unwrap();
        assert!(outcome.is_clean);
        assert!(outcome.threats.is_empty());
        assert_eq!(scanner.metrics().scans_total, 1);
        assert_eq!(scanner.metrics().threats_detected, 0);
    }
}
