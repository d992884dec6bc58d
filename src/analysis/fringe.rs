use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, Result};
use crate::data::model::ScanRecord;

// ---------------------------------------------------------------------------
// FringeOffset – how the zero-path-difference point is found
// ---------------------------------------------------------------------------

/// Strategy for locating the white-light fringe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FringeOffset {
    /// Global maximum of the visibility. No secondary-peak rejection.
    #[default]
    Auto,
    /// Sample whose position (cm) is closest to the given value.
    Position(f64),
}

impl FromStr for FringeOffset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(FringeOffset::Auto);
        }
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(FringeOffset::Position)
            .ok_or_else(|| format!("expected 'auto' or a position in cm, got '{s}'"))
    }
}

impl fmt::Display for FringeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FringeOffset::Auto => write!(f, "auto"),
            FringeOffset::Position(p) => write!(f, "{p} cm"),
        }
    }
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// Index of the zero-path-difference sample in `scan`.
pub fn locate(scan: &ScanRecord, offset: FringeOffset) -> Result<usize> {
    let index = match offset {
        FringeOffset::Auto => argmax(scan.visibility()),
        FringeOffset::Position(target) if !target.is_finite() => {
            return Err(AnalysisError::InvalidParameter(format!(
                "fringe offset {target} is not finite"
            )));
        }
        FringeOffset::Position(target) => nearest_index(scan.position(), target),
    };
    index.ok_or_else(|| AnalysisError::InvalidScan("scan has no samples".into()))
}

/// Index of the first maximum, `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the first value minimising `|value - target|`, `None` for an empty slice.
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let distance = (v - target).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}
