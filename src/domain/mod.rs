//! Domain primitives for the artist classification subsystem.
//!
//! Newtypes here keep artist ids from being mixed with other integers
//! (row counts, limits) that flow through the same call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an Artist in the system.
///
/// # Examples
///
/// ```rust
/// use sayu_apt::domain::ArtistId;
///
/// let id = ArtistId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ArtistId(i32);

impl ArtistId {
    /// Creates a new `ArtistId` from a raw i32 value.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `id` is negative.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "ArtistId should be non-negative");
        Self(id)
    }

    /// Returns the underlying i32 value.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ArtistId> for i32 {
    fn from(id: ArtistId) -> Self {
        id.0
    }
}

impl From<i32> for ArtistId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for ArtistId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for ArtistId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Which artists a batch run should pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Worklist {
    /// Only artists whose profile is still null.
    #[default]
    Unclassified,
    /// Every artist, including already classified ones.
    All,
}

/// Whether a write may replace a protected (expert-curated) profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    RespectProtected,
    Force,
}

impl WriteMode {
    #[must_use]
    pub const fn from_force_flag(force: bool) -> Self {
        if force { Self::Force } else { Self::RespectProtected }
    }

    #[must_use]
    pub const fn is_forced(&self) -> bool {
        matches!(self, Self::Force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_id_roundtrip() {
        let id = ArtistId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let back: ArtistId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(i32::from(back), 7);
    }

    #[test]
    fn test_write_mode_flag() {
        assert!(WriteMode::from_force_flag(true).is_forced());
        assert!(!WriteMode::from_force_flag(false).is_forced());
        assert_eq!(Worklist::default(), Worklist::Unclassified);
    }
}
