//! Archive digests as Harbor reports them (hex-encoded SHA256)

use sha2::{Digest, Sha256};

/// Compute the hex SHA256 digest of data
pub fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check if two digests match (supports `sha256:` prefixes and any case)
pub fn digest_matches(expected: &str, actual: &str) -> bool {
    let normalize = |digest: &str| {
        digest
            .trim()
            .to_lowercase()
            .replace("sha256:", "")
            .replace("sha256-", "")
    };
    normalize(expected) == normalize(actual)
}
