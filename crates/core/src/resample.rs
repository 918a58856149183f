//! Resample planning.
//!
//! Lossy targets are produced from 16-bit audio at 44.1 or 48 kHz. Anything
//! else is converted with an integer-ratio resample to the matching base
//! rate. Rates that are not a multiple of either base are rejected rather
//! than approximated.

use serde::Serialize;
use std::fmt;

use crate::validator::ValidationError;

/// 44.1 kHz family base rate.
pub const CD_RATE: u32 = 44_100;
/// 48 kHz family base rate.
pub const DVD_RATE: u32 = 48_000;
/// Bit depth of every resampled stream.
pub const TARGET_BITS: u8 = 16;

/// Whether, and to what rate, a track set must be resampled before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResamplePlan {
    /// Decode and encode as-is.
    Keep,
    /// Convert to 16 bit at `rate` Hz.
    Resample { rate: u32 },
}

impl ResamplePlan {
    /// Target rate, if resampling.
    pub fn target_rate(&self) -> Option<u32> {
        match self {
            Self::Keep => None,
            Self::Resample { rate } => Some(*rate),
        }
    }
}

impl fmt::Display for ResamplePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "no resample"),
            Self::Resample { rate } => write!(f, "resample to {} bit / {} Hz", TARGET_BITS, rate),
        }
    }
}

/// Decides the resample plan for the given stream parameters.
pub fn plan(bits_per_sample: u8, sample_rate: u32) -> Result<ResamplePlan, ValidationError> {
    let native = bits_per_sample <= TARGET_BITS && matches!(sample_rate, CD_RATE | DVD_RATE);
    if native {
        return Ok(ResamplePlan::Keep);
    }

    if sample_rate != 0 && sample_rate % CD_RATE == 0 {
        Ok(ResamplePlan::Resample { rate: CD_RATE })
    } else if sample_rate != 0 && sample_rate % DVD_RATE == 0 {
        Ok(ResamplePlan::Resample { rate: DVD_RATE })
    } else {
        Err(ValidationError::UnsupportedRate { rate: sample_rate })
    }
}
