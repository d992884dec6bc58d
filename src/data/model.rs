use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::error::{AnalysisError, Result};

/// Metadata key conventionally holding the human-readable scan title.
pub const TITLE_KEY: &str = "Note";

/// Metadata key the loaders fill with the originating file name.
pub const SOURCE_KEY: &str = "source";

// ---------------------------------------------------------------------------
// ScanDirection
// ---------------------------------------------------------------------------

/// Direction in which the stage swept the path-length difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanDirection {
    Increasing,
    Decreasing,
}

// ---------------------------------------------------------------------------
// ScanRecord – one raw interferogram
// ---------------------------------------------------------------------------

/// A single raw interferogram scan as produced by a loader.
///
/// Invariants, checked by [`ScanRecord::new`]:
/// * `position.len() == visibility.len() > 0`
/// * every value is finite
/// * `position` is monotonic (repeated positions are allowed)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    /// Path-length difference in centimetres.
    position: Vec<f64>,
    /// Detector signal, same length as `position`.
    visibility: Vec<f64>,
    /// Free-form annotations from the source file.
    metadata: BTreeMap<String, String>,
}

impl ScanRecord {
    pub fn new(
        position: Vec<f64>,
        visibility: Vec<f64>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self> {
        if position.is_empty() {
            return Err(AnalysisError::InvalidScan("scan has no samples".into()));
        }
        if position.len() != visibility.len() {
            return Err(AnalysisError::InvalidScan(format!(
                "{} positions but {} visibilities",
                position.len(),
                visibility.len()
            )));
        }
        if let Some(i) = position.iter().position(|p| !p.is_finite()) {
            return Err(AnalysisError::InvalidScan(format!(
                "position[{i}] is not finite"
            )));
        }
        if let Some(i) = visibility.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidScan(format!(
                "visibility[{i}] is not finite"
            )));
        }
        if direction_of(&position).is_none() {
            return Err(AnalysisError::InvalidScan(
                "positions are not monotonic".into(),
            ));
        }

        Ok(ScanRecord {
            position,
            visibility,
            metadata,
        })
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn visibility(&self) -> &[f64] {
        &self.visibility
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Always false for a validated record; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Sweep direction. A constant-position scan counts as increasing.
    pub fn direction(&self) -> ScanDirection {
        direction_of(&self.position).unwrap_or(ScanDirection::Increasing)
    }

    /// Display title: the `Note` annotation, else the source file name.
    pub fn title(&self) -> &str {
        self.metadata
            .get(TITLE_KEY)
            .or_else(|| self.metadata.get(SOURCE_KEY))
            .map(String::as_str)
            .unwrap_or("untitled scan")
    }
}

fn direction_of(position: &[f64]) -> Option<ScanDirection> {
    let increasing = position.windows(2).all(|w| w[1] >= w[0]);
    if increasing {
        return Some(ScanDirection::Increasing);
    }
    let decreasing = position.windows(2).all(|w| w[1] <= w[0]);
    decreasing.then_some(ScanDirection::Decreasing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_scan() {
        let err = ScanRecord::new(vec![], vec![], BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidScan(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = ScanRecord::new(vec![0.0, 1.0], vec![1.0], BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidScan(_)));
    }

    #[test]
    fn rejects_non_finite_values() {
        let err =
            ScanRecord::new(vec![0.0, f64::NAN], vec![1.0, 2.0], BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidScan(_)));

        let err = ScanRecord::new(vec![0.0, 1.0], vec![1.0, f64::INFINITY], BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidScan(_)));
    }

    #[test]
    fn rejects_non_monotonic_positions() {
        let err = ScanRecord::new(vec![0.0, 2.0, 1.0], vec![0.0; 3], BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidScan(_)));
    }

    #[test]
    fn detects_direction() {
        let up = ScanRecord::new(vec![0.0, 1.0, 1.0, 2.0], vec![0.0; 4], BTreeMap::new()).unwrap();
        assert_eq!(up.direction(), ScanDirection::Increasing);

        let down = ScanRecord::new(vec![2.0, 1.0, 0.0], vec![0.0; 3], BTreeMap::new()).unwrap();
        assert_eq!(down.direction(), ScanDirection::Decreasing);
    }

    #[test]
    fn title_prefers_note_over_source() {
        let mut meta = BTreeMap::new();
        meta.insert(SOURCE_KEY.to_string(), "scan.txt".to_string());
        let scan = ScanRecord::new(vec![0.0], vec![1.0], meta.clone()).unwrap();
        assert_eq!(scan.title(), "scan.txt");

        meta.insert(TITLE_KEY.to_string(), "blue filter".to_string());
        let scan = ScanRecord::new(vec![0.0], vec![1.0], meta).unwrap();
        assert_eq!(scan.title(), "blue filter");
    }
}
