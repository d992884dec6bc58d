//! Cosine-transform spectral estimate and frequency calibration.
//!
//! The spectrum of a one-sided interferogram is estimated with an unnormalized
//! type-II DCT,
//!
//! ```text
//! X_k = 2 · Σ_{n=0}^{N-1} x_n · cos(π k (2n + 1) / 2N)
//! ```
//!
//! computed through a length-`2N` FFT of the evenly mirrored input. Only the
//! magnitude is kept.
//!
//! Bin `k` sits at `k · c / (path_factor · max_position)`.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use super::branch::Branch;
use super::error::{AnalysisError, Result};

/// Speed of light in cm/s as used by the reference instrument's calibration.
pub const SPEED_OF_LIGHT_CM_PER_S: f64 = 3.0e10;

/// Optical path change per unit of recorded position: the beam passes the
/// moving mirror twice on each arm of a double-sided interferometer.
pub const DOUBLE_PASS_PATH_FACTOR: f64 = 4.0;

const HZ_PER_GHZ: f64 = 1e9;

/// Geometry constants turning a path-length span into a frequency step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentGeometry {
    pub speed_of_light_cm_per_s: f64,
    pub path_factor: f64,
}

impl Default for InstrumentGeometry {
    fn default() -> Self {
        Self {
            speed_of_light_cm_per_s: SPEED_OF_LIGHT_CM_PER_S,
            path_factor: DOUBLE_PASS_PATH_FACTOR,
        }
    }
}

impl InstrumentGeometry {
    /// Frequency spacing of the spectral bins, in GHz.
    pub fn frequency_step_ghz(&self, max_position_cm: f64) -> Result<f64> {
        if !(max_position_cm.is_finite() && max_position_cm > 0.0) {
            return Err(AnalysisError::DegenerateGeometry(format!(
                "maximum path-length difference is {max_position_cm} cm"
            )));
        }
        if !(self.speed_of_light_cm_per_s > 0.0 && self.path_factor > 0.0)
            || !(self.speed_of_light_cm_per_s.is_finite() && self.path_factor.is_finite())
        {
            return Err(AnalysisError::InvalidParameter(format!(
                "geometry constants must be positive and finite (c = {}, factor = {})",
                self.speed_of_light_cm_per_s, self.path_factor
            )));
        }
        let step_hz = self.speed_of_light_cm_per_s / (self.path_factor * max_position_cm);
        Ok(step_hz / HZ_PER_GHZ)
    }
}

/// Raw and windowed amplitude spectra with their shared frequency axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralEstimate {
    pub raw_spectrum: Vec<f64>,
    pub windowed_spectrum: Vec<f64>,
    /// GHz, `frequency[k] = k · frequency_step_ghz`.
    pub frequency: Vec<f64>,
    pub frequency_step_ghz: f64,
}

/// Spectra of the detrended valid branch, unwindowed and windowed.
pub fn transform(
    valid: &Branch,
    windowed_visibility: &[f64],
    geometry: &InstrumentGeometry,
) -> Result<SpectralEstimate> {
    if windowed_visibility.len() != valid.len() {
        return Err(AnalysisError::DimensionMismatch {
            what: "windowed visibility",
            expected: valid.len(),
            actual: windowed_visibility.len(),
        });
    }

    let max_position = valid.max_position().unwrap_or(0.0);
    let step = geometry.frequency_step_ghz(max_position)?;
    log::debug!(
        "spectral transform: {} samples, max path {max_position} cm, step {step} GHz",
        valid.len()
    );

    let mut planner = FftPlanner::new();
    let raw_spectrum = dct2_magnitude(&mut planner, &valid.visibility);
    let windowed_spectrum = dct2_magnitude(&mut planner, windowed_visibility);
    let frequency = (0..raw_spectrum.len()).map(|k| k as f64 * step).collect();

    Ok(SpectralEstimate {
        raw_spectrum,
        windowed_spectrum,
        frequency,
        frequency_step_ghz: step,
    })
}

/// Unnormalized type-II DCT.
pub fn dct2(planner: &mut FftPlanner<f64>, input: &[f64]) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }

    // Even extension: x_0 … x_{N-1}, x_{N-1} … x_0
    let mut buffer: Vec<Complex<f64>> = input
        .iter()
        .chain(input.iter().rev())
        .map(|&x| Complex::new(x, 0.0))
        .collect();
    planner.plan_fft_forward(2 * n).process(&mut buffer);

    buffer
        .iter()
        .take(n)
        .enumerate()
        .map(|(k, v)| {
            let twiddle = Complex::from_polar(1.0, -PI * k as f64 / (2 * n) as f64);
            (v * twiddle).re
        })
        .collect()
}

fn dct2_magnitude(planner: &mut FftPlanner<f64>, input: &[f64]) -> Vec<f64> {
    dct2(planner, input).into_iter().map(f64::abs).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_dct2(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                2.0 * x
                    .iter()
                    .enumerate()
                    .map(|(i, v)| v * (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
                    .sum::<f64>()
            })
            .collect()
    }

    fn branch(position: Vec<f64>, visibility: Vec<f64>) -> Branch {
        Branch {
            position,
            visibility,
        }
    }

    #[test]
    fn dct_matches_direct_sum() {
        let x = [
            0.0,
            0.19509032201612825,
            0.3826834323650898,
            0.5555702330196022,
            0.7071067811865475,
            0.8314696123025452,
            0.9238795325112867,
            0.9807852804032304,
        ];
        let mut planner = FftPlanner::new();
        let fast = dct2(&mut planner, &x);
        // Twice the half-scaled reference sum
        assert!((fast[0] - 2.0 * 4.57658519380443).abs() < 1e-9);
        assert!((fast[1] - 2.0 * -1.846801405099262).abs() < 1e-9);
        for (a, b) in fast.iter().zip(direct_dct2(&x)) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn dct_of_odd_length_matches_direct_sum() {
        let x = [5.0, 1.0, 0.0, -2.0, 3.5];
        let mut planner = FftPlanner::new();
        for (a, b) in dct2(&mut planner, &x).iter().zip(direct_dct2(&x)) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn cosine_input_peaks_in_its_bin() {
        let n = 64;
        let bin = 10;
        let x: Vec<f64> = (0..n)
            .map(|i| (PI * bin as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
            .collect();
        let mut planner = FftPlanner::new();
        let spectrum = dct2_magnitude(&mut planner, &x);
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
        assert!((spectrum[bin] - n as f64).abs() < 1e-9);
    }

    #[test]
    fn transform_outputs_are_non_negative_with_increasing_axis() {
        let valid = branch(vec![0.0, 0.5, 1.0, 1.5], vec![5.0, -1.0, 0.5, -2.0]);
        let windowed = vec![5.0, -0.75, 0.25, -0.5];
        let est = transform(&valid, &windowed, &InstrumentGeometry::default()).unwrap();

        assert_eq!(est.raw_spectrum.len(), 4);
        assert!(est.raw_spectrum.iter().all(|v| *v >= 0.0));
        assert!(est.windowed_spectrum.iter().all(|v| *v >= 0.0));
        assert_eq!(est.frequency[0], 0.0);
        assert!(est.frequency.windows(2).all(|w| w[1] > w[0]));

        // 3e10 / (4 · 1.5) Hz = 5 GHz
        assert!((est.frequency_step_ghz - 5.0).abs() < 1e-12);
        assert!((est.frequency[3] - 15.0).abs() < 1e-12);
    }

    #[test]
    fn zero_max_position_is_degenerate() {
        let valid = branch(vec![0.0], vec![1.0]);
        let err = transform(&valid, &[1.0], &InstrumentGeometry::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateGeometry(_)));

        let geometry = InstrumentGeometry::default();
        assert!(matches!(
            geometry.frequency_step_ghz(0.0).unwrap_err(),
            AnalysisError::DegenerateGeometry(_)
        ));
    }

    #[test]
    fn custom_geometry_scales_frequency_step() {
        let geometry = InstrumentGeometry {
            speed_of_light_cm_per_s: 2.997_924_58e10,
            path_factor: 2.0,
        };
        let step = geometry.frequency_step_ghz(10.0).unwrap();
        assert!((step - 1.498_962_29).abs() < 1e-9);
    }

    #[test]
    fn mismatched_windowed_length_fails() {
        let valid = branch(vec![0.0, 1.0], vec![1.0, 0.0]);
        assert!(matches!(
            transform(&valid, &[1.0], &InstrumentGeometry::default()).unwrap_err(),
            AnalysisError::DimensionMismatch { .. }
        ));
    }
}
