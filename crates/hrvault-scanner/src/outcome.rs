//! Scan outcome and the dual-provider merge

use serde::Serialize;

/// The result of scanning one buffer.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub is_clean: bool,
    /// Threat names in first-seen order.
    pub threats: Vec<String>,
    pub scan_time_ms: u64,
    pub provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanOutcome {
    pub fn clean(provider: &'static str, scan_time_ms: u64) -> Self {
        Self {
            is_clean: true,
            threats: Vec::new(),
            scan_time_ms,
            provider,
            error: None,
        }
    }

    pub fn infected(provider: &'static str, threats: Vec<String>, scan_time_ms: u64) -> Self {
        Self {
            is_clean: false,
            threats,
            scan_time_ms,
            provider,
            error: None,
        }
    }

    /// Combine two outcomes: clean only if both are clean, threats as a
    /// deduplicated union preserving first-seen order.
    pub fn merge(self, other: ScanOutcome) -> ScanOutcome {
        let mut threats = self.threats;
        for threat in other.threats {
            if !threats.contains(&threat) {
                threats.push(threat);
            }
        }
        ScanOutcome {
            is_clean: self.is_clean && other.is_clean,
            threats,
            scan_time_ms: self.scan_time_ms.max(other.scan_time_ms),
            provider: "dual",
            error: self.error.or(other.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_clean_and_clean() {
        let merged = ScanOutcome::clean("local", 10).merge(ScanOutcome::clean("external", 20));
        assert!(merged.is_clean);
        assert!(merged.threats.is_empty());
        assert_eq!(merged.scan_time_ms, 20);
        assert_eq!(merged.provider, "dual");
    }

    #[test]
    fn test_merge_clean_and_infected() {
        let infected =
            ScanOutcome::infected("external", vec!["Win.Test.EICAR_HDB-1".to_string()], 5);
        let merged = ScanOutcome::clean("local", 10).merge(infected);
        assert!(!merged.is_clean);
        assert_eq!(merged.threats, vec!["Win.Test.EICAR_HDB-1"]);
    }

    #[test]
    fn test_merge_dedups_preserving_order() {
        let a = ScanOutcome::infected("local", vec!["A".to_string(), "B".to_string()], 1);
        let b = ScanOutcome::infected("external", vec!["B".to_string(), "C".to_string()], 2);
        let merged = a.merge(b);
        assert_eq!(merged.threats, vec!["A", "B", "C"]);
    }
}
