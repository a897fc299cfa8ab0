//! Partitioner trait and implementations.

use crate::token::RingToken;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// A partitioner converts keys into ring tokens.
///
/// Partitioners are stateless and thread-safe, allowing concurrent token
/// generation without synchronization overhead. Every participant in the
/// cluster must use the same partitioner: replica-set agreement depends on
/// clients and servers computing identical tokens for identical keys.
pub trait Partitioner: Send + Sync + 'static {
    /// Converts a key into a token on the ring.
    fn position(&self, key: &[u8]) -> RingToken;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}

/// SipHash-1-3 partitioner with a fixed zero key.
///
/// Fixing the key makes the mapping deterministic across processes and
/// restarts, unlike the randomly seeded hashers used for in-process maps.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipPartitioner;

impl Partitioner for SipPartitioner {
    fn position(&self, key: &[u8]) -> RingToken {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        RingToken(hasher.finish())
    }

    fn name(&self) -> &'static str {
        "SipPartitioner"
    }
}
