//! Stage sweep planning.
//!
//! Picks the stage step from the highest frequency to resolve (Nyquist in
//! path-length difference) and the sweep length from the wanted frequency
//! resolution, then expresses both in encoder counts.

use thiserror::Error;

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT_M_PER_S: f64 = 299_792_458.0;

/// Encoder counts per millimetre of stage travel.
pub const DEFAULT_COUNTS_PER_MM: f64 = 2_000.0;

/// Sweep extends this far past the length the resolution strictly needs.
pub const RESOLUTION_MARGIN: f64 = 1.2;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("step of {step_mm} mm rounds to zero counts at {counts_per_mm} counts/mm")]
    ZeroStep { step_mm: f64, counts_per_mm: f64 },

    #[error("sweep ends at {end_counts} counts, not after its start at {start_counts}")]
    EmptySweep { start_counts: i64, end_counts: i64 },
}

/// Commanded stage positions for one interferogram sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPlan {
    pub step_mm: f64,
    pub start_mm: f64,
    pub end_mm: f64,
    pub start_counts: i64,
    pub end_counts: i64,
    pub step_counts: i64,
}

impl SweepPlan {
    pub fn new(
        freq_resolution_ghz: f64,
        max_freq_ghz: f64,
        start_mm: f64,
        counts_per_mm: f64,
    ) -> Result<Self, SweepError> {
        for (name, value) in [
            ("frequency resolution", freq_resolution_ghz),
            ("maximum frequency", max_freq_ghz),
            ("counts per mm", counts_per_mm),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SweepError::NonPositive { name, value });
            }
        }
        if !start_mm.is_finite() {
            return Err(SweepError::NonPositive {
                name: "start position",
                value: start_mm,
            });
        }

        let c_mm_per_s = SPEED_OF_LIGHT_M_PER_S * 1000.0;
        let step_mm = c_mm_per_s / (max_freq_ghz * 1e9 * 2.0);
        let end_mm = RESOLUTION_MARGIN * c_mm_per_s / (freq_resolution_ghz * 1e9 * 2.0);

        let to_counts = |mm: f64| (mm * counts_per_mm).round() as i64;
        let start_counts = to_counts(start_mm);
        let end_counts = to_counts(end_mm);
        let step_counts = to_counts(step_mm);

        if step_counts == 0 {
            return Err(SweepError::ZeroStep {
                step_mm,
                counts_per_mm,
            });
        }
        if end_counts <= start_counts {
            return Err(SweepError::EmptySweep {
                start_counts,
                end_counts,
            });
        }

        let plan = SweepPlan {
            step_mm,
            start_mm,
            end_mm,
            start_counts,
            end_counts,
            step_counts,
        };
        log::debug!("{plan:?}");
        Ok(plan)
    }

    /// Commanded positions in counts, `start, start + step, …` below `end`.
    pub fn positions(&self) -> impl Iterator<Item = i64> {
        let step = self.step_counts;
        (self.start_counts..self.end_counts).step_by(step as usize)
    }

    pub fn len(&self) -> usize {
        self.positions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
