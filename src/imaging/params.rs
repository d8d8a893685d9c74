//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the target size and format) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (0-100, default 85). Clamped on construction.
//! - [`EncodeParams`]: everything one transcode needs: source payload, target
//!   size, output format and quality.

use super::codec::OutputFormat;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (0-100).
///
/// Deserializes from a plain integer and rejects values above 100, so a typo
/// in a config file is reported instead of silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as a 0.0–1.0 fraction.
    pub fn fraction(self) -> f32 {
        super::codec::quality_fraction(self.0)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl TryFrom<u32> for Quality {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > 100 {
            return Err(format!("quality must be 0-100, got {value}"));
        }
        Ok(Self(value))
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> u32 {
        q.0
    }
}

/// Parameters for a single resize + encode operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams<'a> {
    /// Original (still encoded) image payload.
    pub source: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 0);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn quality_fraction_is_percent_over_100() {
        assert_eq!(Quality::new(85).fraction(), 0.85);
        assert_eq!(Quality::new(100).fraction(), 1.0);
        assert_eq!(Quality::new(0).fraction(), 0.0);
    }

    #[test]
    fn quality_try_from_rejects_out_of_range() {
        assert!(Quality::try_from(101).is_err());
        assert_eq!(Quality::try_from(100).unwrap().value(), 100);
    }
}
