//! Cache key derivation.

use std::fmt;

use sha2::{Digest, Sha256};

use super::QueryDescriptor;

/// Hex characters of the digest kept in a key (16 bytes).
const DIGEST_HEX_LEN: usize = 32;

/// Stable cache key for a [`QueryDescriptor`].
///
/// Rendered as `<entity-type>:<digest>`, where the digest is taken over the
/// canonical query text. Keys carry no process-local state, so the same
/// descriptor yields the same key in every process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn derive(descriptor: &QueryDescriptor) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(descriptor.to_groq().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(format!(
            "{}:{}",
            descriptor.entity_type(),
            &digest[..DIGEST_HEX_LEN]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&QueryDescriptor> for QueryKey {
    fn from(descriptor: &QueryDescriptor) -> Self {
        Self::derive(descriptor)
    }
}
