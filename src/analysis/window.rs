//! Apodization windows.
//!
//! The valid branch starts at the fringe peak, so it must not be tapered at
//! the origin. [`build_window`] therefore generates a symmetric profile of
//! twice the branch length and keeps only its falling half.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, Result};

/// Slack allowed on generated values before they count as outside `[0, 1]`.
const RANGE_TOLERANCE: f64 = 1e-12;

/// Produces a window profile of a requested length.
pub trait WindowGenerator {
    fn name(&self) -> &str {
        "custom"
    }

    fn generate(&self, len: usize) -> Vec<f64>;
}

impl<F> WindowGenerator for F
where
    F: Fn(usize) -> Vec<f64>,
{
    fn generate(&self, len: usize) -> Vec<f64> {
        self(len)
    }
}

/// Built-in symmetric windows, sampled like their NumPy namesakes
/// (endpoints included, `M - 1` in the denominator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Raised cosine.
    #[default]
    Hann,
    Hamming,
    Blackman,
    /// Triangular, zero at both ends.
    Bartlett,
    /// No apodization.
    Rectangular,
}

impl WindowKind {
    pub const ALL: [WindowKind; 5] = [
        WindowKind::Hann,
        WindowKind::Hamming,
        WindowKind::Blackman,
        WindowKind::Bartlett,
        WindowKind::Rectangular,
    ];
}

impl WindowGenerator for WindowKind {
    fn name(&self) -> &str {
        match self {
            WindowKind::Hann => "hann",
            WindowKind::Hamming => "hamming",
            WindowKind::Blackman => "blackman",
            WindowKind::Bartlett => "bartlett",
            WindowKind::Rectangular => "rectangular",
        }
    }

    fn generate(&self, len: usize) -> Vec<f64> {
        if len == 0 {
            return Vec::new();
        }
        if len == 1 {
            return vec![1.0];
        }
        let denom = (len - 1) as f64;
        (0..len)
            .map(|n| {
                let phase = 2.0 * PI * n as f64 / denom;
                match self {
                    WindowKind::Hann => 0.5 - 0.5 * phase.cos(),
                    WindowKind::Hamming => 0.54 - 0.46 * phase.cos(),
                    WindowKind::Blackman => {
                        (0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()).max(0.0)
                    }
                    WindowKind::Bartlett => 1.0 - (2.0 * n as f64 / denom - 1.0).abs(),
                    WindowKind::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

/// Falling half of a `2 * length` profile from `generator`.
pub fn build_window(length: usize, generator: &dyn WindowGenerator) -> Result<Vec<f64>> {
    let full = generator.generate(2 * length);
    if full.len() != 2 * length {
        return Err(AnalysisError::DimensionMismatch {
            what: "generated window",
            expected: 2 * length,
            actual: full.len(),
        });
    }
    if let Some(bad) = full
        .iter()
        .find(|w| !(-RANGE_TOLERANCE..=1.0 + RANGE_TOLERANCE).contains(*w))
    {
        return Err(AnalysisError::InvalidParameter(format!(
            "{} window produced {bad}, outside [0, 1]",
            generator.name()
        )));
    }

    Ok(full[length..].iter().map(|w| w.clamp(0.0, 1.0)).collect())
}

/// Elementwise product of `visibility` and `window`.
pub fn apply(visibility: &[f64], window: &[f64]) -> Result<Vec<f64>> {
    if visibility.len() != window.len() {
        return Err(AnalysisError::DimensionMismatch {
            what: "window",
            expected: visibility.len(),
            actual: window.len(),
        });
    }
    Ok(visibility.iter().zip(window).map(|(v, w)| v * w).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_descending(len: usize) -> Vec<f64> {
        if len < 2 {
            return vec![1.0; len];
        }
        (0..len)
            .map(|i| 1.0 - i as f64 / (len - 1) as f64)
            .collect()
    }

    #[test]
    fn hann_matches_reference_values() {
        let w = WindowKind::Hann.generate(5);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];
        for (a, b) in w.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn custom_generator_is_sliced_from_the_second_half() {
        let full = linear_descending(6);
        let w = build_window(3, &linear_descending).unwrap();
        assert_eq!(w.len(), 3);
        for (a, b) in w.iter().zip(&full[3..]) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((w[0] - 0.4).abs() < 1e-12);
        assert!(w[2].abs() < 1e-12);
    }

    #[test]
    fn built_in_windows_start_at_their_peak() {
        for kind in WindowKind::ALL {
            for length in [1, 2, 3, 10, 257] {
                let w = build_window(length, &kind).unwrap();
                assert_eq!(w.len(), length);
                assert!(w.iter().all(|v| (0.0..=1.0).contains(v)), "{kind:?}");

                let peak = kind
                    .generate(2 * length)
                    .into_iter()
                    .fold(f64::NEG_INFINITY, f64::max);
                assert!((w[0] - peak).abs() < 1e-12, "{kind:?} length {length}");
                assert!(w.windows(2).all(|p| p[1] <= p[0] + 1e-12), "{kind:?}");
            }
        }
    }

    #[test]
    fn zero_length_window_is_empty() {
        assert!(build_window(0, &WindowKind::Hann).unwrap().is_empty());
    }

    #[test]
    fn wrong_length_generator_is_rejected() {
        let short = |len: usize| vec![1.0; len / 2];
        assert!(matches!(
            build_window(4, &short).unwrap_err(),
            AnalysisError::DimensionMismatch { .. }
        ));
    }

    #[test]
    fn out_of_range_generator_is_rejected() {
        let loud = |len: usize| vec![2.0; len];
        assert!(matches!(
            build_window(4, &loud).unwrap_err(),
            AnalysisError::InvalidParameter(_)
        ));
    }

    #[test]
    fn apply_multiplies_elementwise() {
        assert_eq!(
            apply(&[2.0, 4.0, 6.0], &[1.0, 0.5, 0.0]).unwrap(),
            vec![2.0, 2.0, 0.0]
        );
        assert!(matches!(
            apply(&[1.0, 2.0], &[1.0]).unwrap_err(),
            AnalysisError::DimensionMismatch { .. }
        ));
    }
}
