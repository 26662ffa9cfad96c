use serde::{Deserialize, Serialize};

/// Version stamp of a persisted aggregate, used for optimistic concurrency.
///
/// An aggregate that has never been stored is at version 0. Every successful
/// write bumps the version by one, and an update is only accepted when the
/// caller's version matches the stored one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of an aggregate that was never stored.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version assigned on first persist.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_then_first() {
        assert_eq!(Version::initial().next(), Version::first());
        assert_eq!(Version::first().as_i64(), 1);
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(Version::new(2) > Version::first());
    }
}
