//! Configuration module
//!
//! Env-driven configuration for the vault service. `from_env()` reads the
//! environment (with `.env` support), `validate()` fails closed at startup
//! when a selected provider is missing its settings.

use std::env;

use crate::storage_types::{ScanProvider, StorageProvider};

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 5;
const MAX_SCAN_SIZE_MB: usize = 50;
const SIGNED_URL_TTL_SECS: i64 = 600;
const SCAN_TIMEOUT_SECS: u64 = 30;
const CLAMAV_PORT: u16 = 3310;

/// Base configuration shared by the HTTP layer
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_provider: StorageProvider,
    pub local_storage_path: Option<String>,
    /// Base64-encoded 32-byte key for at-rest encryption (local/hybrid)
    pub encryption_key: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_sse_algorithm: String,
    // Signed URL configuration
    pub url_signing_secret: String,
    pub signed_url_ttl_seconds: i64,
    pub public_base_url: String,
    // Upload validation configuration
    pub max_file_size_bytes: usize,
    // Antivirus configuration
    pub antivirus_enabled: bool,
    pub scan_provider: ScanProvider,
    pub max_scan_size_bytes: usize,
    pub scan_timeout_seconds: u64,
    pub clamav_host: String,
    pub clamav_port: u16,
    pub scan_api_url: Option<String>,
    pub scan_api_key: Option<String>,
    pub quarantine_dir: String,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let storage_provider = env::var("STORAGE_PROVIDER")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageProvider>()?;

        let scan_provider = env::var("SCAN_PROVIDER")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<ScanProvider>()?;

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let max_scan_size_mb = env::var("MAX_SCAN_SIZE_MB")
            .unwrap_or_else(|_| MAX_SCAN_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_SCAN_SIZE_MB);

        let config = Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_provider,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            encryption_key: env::var("FILE_ENCRYPTION_KEY").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").or_else(|_| env::var("AWS_REGION")).ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_sse_algorithm: env::var("S3_SSE_ALGORITHM").unwrap_or_else(|_| "AES256".to_string()),
            url_signing_secret: env::var("URL_SIGNING_SECRET")
                .map_err(|_| anyhow::anyhow!("URL_SIGNING_SECRET must be set"))?,
            signed_url_ttl_seconds: env::var("SIGNED_URL_TTL_SECONDS")
                .unwrap_or_else(|_| SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(SIGNED_URL_TTL_SECS),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            antivirus_enabled: env::var("ANTIVIRUS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            scan_provider,
            max_scan_size_bytes: max_scan_size_mb * 1024 * 1024,
            scan_timeout_seconds: env::var("SCAN_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| SCAN_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(SCAN_TIMEOUT_SECS),
            clamav_host: env::var("CLAMAV_HOST").unwrap_or_else(|_| "localhost".to_string()),
            clamav_port: env::var("CLAMAV_PORT")
                .unwrap_or_else(|_| CLAMAV_PORT.to_string())
                .parse()
                .unwrap_or(CLAMAV_PORT),
            scan_api_url: env::var("SCAN_API_URL").ok().filter(|s| !s.is_empty()),
            scan_api_key: env::var("SCAN_API_KEY").ok().filter(|s| !s.is_empty()),
            quarantine_dir: env::var("QUARANTINE_DIR")
                .unwrap_or_else(|_| "quarantine".to_string()),
            base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Startup validation. Every unmet precondition of a selected provider
    /// is a hard error; nothing degrades to a weaker mode silently.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.url_signing_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "URL_SIGNING_SECRET must be at least 32 characters long"
            ));
        }

        if matches!(
            self.storage_provider,
            StorageProvider::Local | StorageProvider::Hybrid
        ) {
            if self.local_storage_path.is_none() {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_PATH must be set when using local or hybrid storage"
                ));
            }
            let key = self.encryption_key.as_deref().ok_or_else(|| {
                anyhow::anyhow!(
                    "FILE_ENCRYPTION_KEY must be set when using local or hybrid storage"
                )
            })?;
            let decoded = {
                use base64::{engine::general_purpose, Engine as _};
                general_purpose::STANDARD
                    .decode(key)
                    .map_err(|e| anyhow::anyhow!("FILE_ENCRYPTION_KEY is not valid base64: {}", e))?
            };
            if decoded.len() != 32 {
                return Err(anyhow::anyhow!(
                    "FILE_ENCRYPTION_KEY must decode to exactly 32 bytes, got {}",
                    decoded.len()
                ));
            }
        }

        if matches!(
            self.storage_provider,
            StorageProvider::S3 | StorageProvider::Hybrid
        ) && self.s3_bucket.is_none()
        {
            return Err(anyhow::anyhow!(
                "S3_BUCKET must be set when using s3 or hybrid storage"
            ));
        }

        if self.antivirus_enabled
            && matches!(
                self.scan_provider,
                ScanProvider::External | ScanProvider::Dual
            )
        {
            if self.scan_api_url.is_none() {
                return Err(anyhow::anyhow!(
                    "SCAN_API_URL must be set when using the external scan provider"
                ));
            }
            if self.scan_api_key.is_none() {
                return Err(anyhow::anyhow!(
                    "SCAN_API_KEY must be set when using the external scan provider"
                ));
            }
        }

        Ok(())
    }
}
