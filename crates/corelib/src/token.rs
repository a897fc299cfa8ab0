//! Ring token type.

use std::fmt;

/// A position on the consistent hash ring.
///
/// Tokens are plain `u64` values; they have no meaning other than their
/// position in the sorted order on the ring, which wraps at `u64::MAX`
/// back to zero.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RingToken(pub u64);

impl RingToken {
    /// Clockwise distance from `self` to `other`, wrapping around the ring.
    pub fn distance_to(&self, other: &Self) -> Self {
        if other.0 >= self.0 {
            RingToken(other.0 - self.0)
        } else {
            RingToken((u64::MAX - self.0) + other.0 + 1)
        }
    }
}

impl fmt::Display for RingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
