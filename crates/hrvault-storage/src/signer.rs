//! HMAC signed URLs for the content endpoint
//!
//! The signature covers `{file_id}:{expires_millis}`, so neither the
//! target file nor the expiry can be swapped without invalidating the
//! URL. Verification is constant-time.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: String,
}

impl UrlSigner {
    pub fn new(secret: &str, base_url: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn signature(&self, file_id: Uuid, expires_at_millis: i64) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| StorageError::Configuration(format!("Invalid signing secret: {}", e)))?;
        mac.update(format!("{}:{}", file_id, expires_at_millis).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Issue a signed URL for the content endpoint.
    pub fn signed_url(
        &self,
        file_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<String> {
        let expires = expires_at.timestamp_millis();
        let signature = self.signature(file_id, expires)?;
        Ok(format!(
            "{}/api/v1/files/{}/content?expires={}&signature={}",
            self.base_url, file_id, expires, signature
        ))
    }

    /// Check a presented signature. False on expiry, malformed hex or
    /// any mismatch; verification never distinguishes the reasons.
    pub fn verify(
        &self,
        file_id: Uuid,
        expires_at_millis: i64,
        presented_signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if now.timestamp_millis() >= expires_at_millis {
            return false;
        }
        let expected = match self.signature(file_id, expires_at_millis) {
            Ok(s) => s,
            Err(_) => return false,
        };
        let expected_bytes = match hex::decode(&expected) {
            Ok(b) => b,
            Err(_) => return false,
        };
        let presented_bytes = match hex::decode(presented_signature) {
            Ok(b) => b,
            Err(_) => return false,
        };
        if presented_bytes.len() != expected_bytes.len() {
            return false;
        }
        expected_bytes.ct_eq(&presented_bytes).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signer() -> UrlSigner {
        UrlSigner::new(
            "0123456789abcdef0123456789abcdef",
            "https://vault.example.com/",
        )
    }

    fn extract_query_param(url: &str, name: &str) -> String {
        let query = url.split('?').nth(1).unwrap();
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_signed_url_shape() {
        let id = Uuid::new_v4();
        let expires = Utc::now() + Duration::minutes(10);
        let url = signer().signed_url(id, expires).unwrap();
        assert!(url.starts_with(&format!(
            "https://vault.example.com/api/v1/files/{}/content?",
            id
        )));
        assert_eq!(
            extract_query_param(&url, "expires"),
            expires.timestamp_millis().to_string()
        );
        assert_eq!(extract_query_param(&url, "signature").len(), 64);
    }

    #[test]
    fn test_valid_signature_verifies_before_expiry() {
        let signer = signer();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires = now + Duration::minutes(10);
        let url = signer.signed_url(id, expires).unwrap();
        let sig = extract_query_param(&url, "signature");

        assert!(signer.verify(id, expires.timestamp_millis(), &sig, now));
    }

    #[test]
    fn test_rejected_at_and_after_expiry() {
        let signer = signer();
        let id = Uuid::new_v4();
        let expires = Utc::now();
        let sig = signer.signature(id, expires.timestamp_millis()).unwrap();

        assert!(!signer.verify(id, expires.timestamp_millis(), &sig, expires));
        assert!(!signer.verify(
            id,
            expires.timestamp_millis(),
            &sig,
            expires + Duration::seconds(1)
        ));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let signer = signer();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires = now + Duration::minutes(10);
        let sig = signer.signature(id, expires.timestamp_millis()).unwrap();

        let mut tampered: Vec<char> = sig.chars().collect();
        tampered[0] = if tampered[0] == '0' { '1' } else { '0' };
        let tampered: String = tampered.into_iter().collect();

        assert!(!signer.verify(id, expires.timestamp_millis(), &tampered, now));
    }

    #[test]
    fn test_signature_bound_to_file_and_expiry() {
        let signer = signer();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires = now + Duration::minutes(10);
        let sig = signer.signature(id, expires.timestamp_millis()).unwrap();

        assert!(!signer.verify(Uuid::new_v4(), expires.timestamp_millis(), &sig, now));
        assert!(!signer.verify(id, expires.timestamp_millis() + 1, &sig, now));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        let signer = signer();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let expires = (now + Duration::minutes(10)).timestamp_millis();

        assert!(!signer.verify(id, expires, "not-hex!", now));
        assert!(!signer.verify(id, expires, "abcd", now));
        assert!(!signer.verify(id, expires, "", now));
    }
}
