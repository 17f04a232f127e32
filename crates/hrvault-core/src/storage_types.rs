use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage provider types
///
/// Defined in core because the configuration, the storage factory and the
/// security status endpoint all need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Local,
    S3,
    Hybrid,
}

impl FromStr for StorageProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageProvider::Local),
            "s3" => Ok(StorageProvider::S3),
            "hybrid" => Ok(StorageProvider::Hybrid),
            _ => Err(anyhow::anyhow!("Invalid storage provider: {}", s)),
        }
    }
}

impl Display for StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageProvider::Local => write!(f, "local"),
            StorageProvider::S3 => write!(f, "s3"),
            StorageProvider::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Antivirus provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanProvider {
    Local,
    External,
    Dual,
}

impl FromStr for ScanProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "clamav" => Ok(ScanProvider::Local),
            "external" => Ok(ScanProvider::External),
            "dual" => Ok(ScanProvider::Dual),
            _ => Err(anyhow::anyhow!("Invalid scan provider: {}", s)),
        }
    }
}

impl Display for ScanProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ScanProvider::Local => write!(f, "local"),
            ScanProvider::External => write!(f, "external"),
            ScanProvider::Dual => write!(f, "dual"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_provider_from_str() {
        assert_eq!(
            "LOCAL".parse::<StorageProvider>().unwrap(),
            StorageProvider::Local
        );
        assert_eq!(
            "hybrid".parse::<StorageProvider>().unwrap(),
            StorageProvider::Hybrid
        );
        assert!("nfs".parse::<StorageProvider>().is_err());
    }

    #[test]
    fn test_scan_provider_from_str() {
        assert_eq!(
            "clamav".parse::<ScanProvider>().unwrap(),
            ScanProvider::Local
        );
        assert_eq!("dual".parse::<ScanProvider>().unwrap(), ScanProvider::Dual);
        assert!("none".parse::<ScanProvider>().is_err());
    }
}
