use serde::Serialize;

use super::error::{AnalysisError, Result};
use super::fringe::nearest_index;
use crate::data::model::ScanRecord;

/// One side of the interferogram, re-zeroed so the fringe sits at position 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Branch {
    /// Path-length difference from the fringe (cm).
    pub position: Vec<f64>,
    pub visibility: Vec<f64>,
}

impl Branch {
    pub fn len(&self) -> usize {
        self.visibility.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visibility.is_empty()
    }

    /// Largest path-length difference covered by the branch.
    pub fn max_position(&self) -> Option<f64> {
        self.position.iter().copied().reduce(f64::max)
    }
}

/// Split `scan` at `fringe_index` into the valid (positive delay) and negative
/// (negative delay) branches.
///
/// With `max_offset`, the valid branch is cut just before the sample closest to
/// that path-length difference. The negative branch holds `fringe_index`
/// samples in scan order, so it is empty when the fringe is the first sample.
pub fn split(
    scan: &ScanRecord,
    fringe_index: usize,
    max_offset: Option<f64>,
) -> Result<(Branch, Branch)> {
    if fringe_index >= scan.len() {
        return Err(AnalysisError::InvalidScan(format!(
            "fringe index {fringe_index} outside scan of {} samples",
            scan.len()
        )));
    }

    let position = scan.position();
    let visibility = scan.visibility();
    let origin = position[fringe_index];

    let mut valid = Branch {
        position: position[fringe_index..].iter().map(|p| p - origin).collect(),
        visibility: visibility[fringe_index..].to_vec(),
    };

    if let Some(limit) = max_offset {
        if !limit.is_finite() {
            return Err(AnalysisError::InvalidParameter(format!(
                "max offset {limit} is not finite"
            )));
        }
        if let Some(cut) = nearest_index(&valid.position, limit) {
            log::debug!("truncating valid branch at index {cut} (max offset {limit} cm)");
            valid.position.truncate(cut);
            valid.visibility.truncate(cut);
        }
    }

    let negative = Branch {
        position: position[..fringe_index].iter().map(|p| origin - p).collect(),
        visibility: visibility[..fringe_index].to_vec(),
    };

    Ok((valid, negative))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn scan(position: Vec<f64>, visibility: Vec<f64>) -> ScanRecord {
        ScanRecord::new(position, visibility, BTreeMap::new()).unwrap()
    }

    #[test]
    fn splits_around_fringe() {
        let s = scan(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0, 5.0, 1.0, 0.0]);
        let (valid, negative) = split(&s, 2, None).unwrap();
        assert_eq!(valid.position, vec![0.0, 1.0, 2.0]);
        assert_eq!(valid.visibility, vec![5.0, 1.0, 0.0]);
        assert_eq!(negative.position, vec![2.0, 1.0]);
        assert_eq!(negative.visibility, vec![0.0, 0.0]);
    }

    #[test]
    fn valid_branch_starts_at_zero_and_negative_matches_index() {
        let position: Vec<f64> = (0..20).map(|i| 0.1 * i as f64 - 0.7).collect();
        let s = scan(position, vec![1.0; 20]);
        for fringe in [0, 1, 7, 19] {
            let (valid, negative) = split(&s, fringe, None).unwrap();
            assert_eq!(valid.position[0], 0.0);
            assert_eq!(negative.len(), fringe);
            assert_eq!(negative.position.len(), fringe);
        }
    }

    #[test]
    fn fringe_at_start_gives_empty_negative_branch() {
        let s = scan(vec![0.0, 1.0, 2.0], vec![3.0, 2.0, 1.0]);
        let (valid, negative) = split(&s, 0, None).unwrap();
        assert_eq!(valid.len(), 3);
        assert!(negative.is_empty());
    }

    #[test]
    fn max_offset_truncates_exclusively() {
        let s = scan(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        );
        let (valid, _) = split(&s, 1, Some(2.1)).unwrap();
        // valid.position = [0, 1, 2, 3, 4]; closest to 2.1 is index 2
        assert_eq!(valid.position, vec![0.0, 1.0]);
        assert_eq!(valid.visibility, vec![5.0, 4.0]);
    }

    #[test]
    fn out_of_range_fringe_is_invalid() {
        let s = scan(vec![0.0, 1.0], vec![1.0, 0.0]);
        assert!(matches!(
            split(&s, 2, None).unwrap_err(),
            AnalysisError::InvalidScan(_)
        ));
    }

    #[test]
    fn non_finite_max_offset_is_rejected() {
        let s = scan(vec![0.0, 1.0], vec![1.0, 0.0]);
        assert!(matches!(
            split(&s, 0, Some(f64::INFINITY)).unwrap_err(),
            AnalysisError::InvalidParameter(_)
        ));
    }

    #[test]
    fn max_position_of_empty_branch_is_none() {
        assert_eq!(Branch::default().max_position(), None);
    }
}
