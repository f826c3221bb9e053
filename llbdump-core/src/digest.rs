//! Content digests of encoded ops.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;
use sha2::{Digest as _, Sha256};

/// Algorithm prefix used by BuildKit digests.
pub const ALGORITHM: &str = "sha256";

/// `sha256:<hex>` digest of an op's encoded bytes.
///
/// Ops are addressed by the hash of their own encoding, so two identical blobs
/// always share a digest. Digests read back from the wire (input references,
/// metadata keys) are kept verbatim through [`Digest::from`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Compute the digest of raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{ALGORITHM}:{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex part without the algorithm prefix.
    pub fn hex(&self) -> &str {
        self.0
            .split_once(':')
            .map(|(_, hex)| hex)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Digest {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Digest {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for Digest {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
