//! Interferogram → spectrum pipeline.
//!
//! ```text
//!   ScanRecord
//!        │  fringe::locate
//!        ▼
//!   fringe index
//!        │  branch::split
//!        ▼
//!   valid / negative branches
//!        │  TrendRemover::detrend, detrend::correct_negative
//!        ▼
//!   detrended branches
//!        │  window::build_window, window::apply
//!        ▼
//!   windowed visibility
//!        │  spectrum::transform
//!        ▼
//!   AnalysisResult
//! ```
//!
//! Every stage is a pure function; the result is built once and never mutated.

pub mod branch;
pub mod detrend;
pub mod error;
pub mod fringe;
pub mod spectrum;
pub mod window;

use serde::{Deserialize, Serialize};

use crate::data::model::{ScanDirection, ScanRecord};
use branch::Branch;
use detrend::{TrendRemoval, TrendRemover};
use error::{AnalysisError, Result};
use fringe::FringeOffset;
use spectrum::InstrumentGeometry;
use window::{WindowGenerator, WindowKind};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Everything that selects how a scan is analysed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisSettings {
    pub fringe_offset: FringeOffset,
    /// Cap on the path-length difference of the valid branch (cm).
    pub max_offset: Option<f64>,
    pub trend: TrendRemoval,
    pub window: WindowKind,
    pub geometry: InstrumentGeometry,
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// All arrays derived from one scan.
///
/// `valid`, `window`, `windowed_visibility`, `raw_spectrum`,
/// `windowed_spectrum` and `frequency` share one length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub fringe_index: usize,
    /// Detrended positive-delay branch.
    pub valid: Branch,
    /// Negative-delay branch corrected with the valid-branch baseline.
    pub negative: Branch,
    /// Baseline removed from the valid branch.
    pub trend: Vec<f64>,
    pub window: Vec<f64>,
    pub windowed_visibility: Vec<f64>,
    pub raw_spectrum: Vec<f64>,
    pub windowed_spectrum: Vec<f64>,
    /// GHz.
    pub frequency: Vec<f64>,
    pub frequency_step_ghz: f64,
}

impl AnalysisResult {
    /// Number of spectral bins.
    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    /// Largest path-length difference analysed (cm).
    pub fn max_path_difference(&self) -> f64 {
        self.valid.max_position().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the pipeline with the built-in strategies named in `settings`.
pub fn analyze(scan: &ScanRecord, settings: &AnalysisSettings) -> Result<AnalysisResult> {
    analyze_with(
        scan,
        settings.fringe_offset,
        settings.max_offset,
        &settings.trend,
        &settings.window,
        &settings.geometry,
    )
}

/// Run the pipeline with caller-supplied trend and window strategies.
pub fn analyze_with(
    scan: &ScanRecord,
    fringe_offset: FringeOffset,
    max_offset: Option<f64>,
    trend_remover: &dyn TrendRemover,
    window_generator: &dyn WindowGenerator,
    geometry: &InstrumentGeometry,
) -> Result<AnalysisResult> {
    // Every sample after the fringe would sit at a non-positive path difference.
    if scan.direction() == ScanDirection::Decreasing {
        return Err(AnalysisError::DegenerateGeometry(
            "scan runs towards decreasing path difference; reverse it before analysis".into(),
        ));
    }

    let fringe_index = fringe::locate(scan, fringe_offset)?;
    log::debug!(
        "fringe ({fringe_offset}) at index {fringe_index}, position {} cm",
        scan.position()[fringe_index]
    );

    let (valid, negative) = branch::split(scan, fringe_index, max_offset)?;
    let (valid, trend) = trend_remover.detrend(&valid)?;
    let negative = detrend::correct_negative(&negative, &trend)?;

    let window = window::build_window(valid.len(), window_generator)?;
    let windowed_visibility = window::apply(&valid.visibility, &window)?;

    let estimate = spectrum::transform(&valid, &windowed_visibility, geometry)?;

    log::info!(
        "analysed '{}': {} valid / {} negative samples, {} trend, {} window, {:.4} GHz bins",
        scan.title(),
        valid.len(),
        negative.len(),
        trend_remover.name(),
        window_generator.name(),
        estimate.frequency_step_ghz
    );

    Ok(AnalysisResult {
        fringe_index,
        valid,
        negative,
        trend,
        window,
        windowed_visibility,
        raw_spectrum: estimate.raw_spectrum,
        windowed_spectrum: estimate.windowed_spectrum,
        frequency: estimate.frequency,
        frequency_step_ghz: estimate.frequency_step_ghz,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn scan(position: Vec<f64>, visibility: Vec<f64>) -> ScanRecord {
        ScanRecord::new(position, visibility, BTreeMap::new()).unwrap()
    }

    #[test]
    fn reference_scan_without_detrending() {
        let s = scan(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0, 5.0, 1.0, 0.0]);
        let settings = AnalysisSettings {
            trend: TrendRemoval::None,
            ..Default::default()
        };
        let result = analyze(&s, &settings).unwrap();

        assert_eq!(result.fringe_index, 2);
        assert_eq!(result.valid.position, vec![0.0, 1.0, 2.0]);
        assert_eq!(result.valid.visibility, vec![5.0, 1.0, 0.0]);
        assert_eq!(result.negative.position, vec![2.0, 1.0]);
        assert_eq!(result.negative.visibility, vec![0.0, 0.0]);
        assert_eq!(result.len(), 3);
        assert_eq!(result.max_path_difference(), 2.0);
    }

    #[test]
    fn default_settings_detrend_both_branches() {
        let s = scan(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0, 5.0, 1.0, 0.0]);
        let result = analyze(&s, &AnalysisSettings::default()).unwrap();

        // Least-squares line through (0, 5), (1, 1), (2, 0): 4.5 - 2.5 i
        let expected_trend = [4.5, 2.0, -0.5];
        for (t, e) in result.trend.iter().zip(expected_trend) {
            assert!((t - e).abs() < 1e-12);
        }
        for (v, t) in result.negative.visibility.iter().zip(&result.trend) {
            assert!((v + t).abs() < 1e-12);
        }
        assert_eq!(result.window.len(), 3);
        assert_eq!(result.windowed_visibility.len(), 3);
    }

    #[test]
    fn custom_strategies_are_accepted() {
        let position: Vec<f64> = (0..32).map(|i| i as f64 * 0.01).collect();
        let visibility: Vec<f64> = (0..32).map(|i| if i == 4 { 10.0 } else { 0.1 }).collect();
        let s = scan(position, visibility);
        let flat = |len: usize| vec![1.0; len];

        let result = analyze_with(
            &s,
            FringeOffset::Auto,
            None,
            &TrendRemoval::Mean,
            &flat,
            &InstrumentGeometry::default(),
        )
        .unwrap();
        assert_eq!(result.fringe_index, 4);
        assert_eq!(result.raw_spectrum, result.windowed_spectrum);
    }

    #[test]
    fn fringe_at_last_sample_is_insufficient_for_linear_fit() {
        let s = scan(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 9.0]);
        let err = analyze(&s, &AnalysisSettings::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn late_fringe_leaves_negative_branch_without_baseline() {
        let s = scan(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 9.0]);
        let settings = AnalysisSettings {
            trend: TrendRemoval::None,
            ..Default::default()
        };
        let err = analyze(&s, &settings).unwrap_err();
        assert!(matches!(err, AnalysisError::DimensionMismatch { .. }));
    }

    #[test]
    fn single_sample_scan_is_degenerate() {
        let s = scan(vec![0.0], vec![1.0]);
        let settings = AnalysisSettings {
            trend: TrendRemoval::None,
            ..Default::default()
        };
        let err = analyze(&s, &settings).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateGeometry(_)));
    }

    #[test]
    fn decreasing_scan_is_degenerate() {
        let s = scan(vec![4.0, 3.0, 2.0, 1.0, 0.0], vec![0.0, 0.0, 5.0, 1.0, 0.0]);
        let settings = AnalysisSettings {
            trend: TrendRemoval::None,
            ..Default::default()
        };
        let err = analyze(&s, &settings).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateGeometry(_)));
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = AnalysisSettings {
            fringe_offset: FringeOffset::Position(0.5),
            max_offset: Some(12.0),
            trend: TrendRemoval::Mean,
            window: WindowKind::Blackman,
            geometry: InstrumentGeometry::default(),
        };
        let text = serde_json::to_string(&settings).unwrap();
        let back: AnalysisSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(back, settings);

        let partial: AnalysisSettings = serde_json::from_str(r#"{"window": "hamming"}"#).unwrap();
        assert_eq!(partial.window, WindowKind::Hamming);
        assert_eq!(partial.fringe_offset, FringeOffset::Auto);
        assert_eq!(partial.trend, TrendRemoval::Linear);
    }
}
