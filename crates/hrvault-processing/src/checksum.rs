//! Content checksums

use bytes::Bytes;
use sha2::{Digest, Sha256};

/// sha256 hex digest of a buffer.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hash on a blocking thread; uploads can be several MiB.
pub async fn sha256_hex_spawned(data: Bytes) -> Result<String, anyhow::Error> {
    tokio::task::spawn_blocking(move || sha256_hex(&data))
        .await
        .map_err(|e| anyhow::anyhow!("Checksum task failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        // sha256("abc")
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_spawned_matches_sync() {
        let data = Bytes::from_static(b"payload bytes");
        let spawned = sha256_hex_spawned(data.clone()).await.unwrap();
        assert_eq!(spawned, sha256_hex(&data));
    }
}
