use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::AnalysisResult;

/// Power of an amplitude spectrum in decibels, `10·log10(a²)`.
///
/// A zero amplitude maps to negative infinity.
pub fn power_db(amplitude: f64) -> f64 {
    10.0 * (amplitude * amplitude).log10()
}

/// JSON document written by [`write_json`].
#[derive(Serialize)]
struct ExportDocument<'a> {
    title: &'a str,
    #[serde(flatten)]
    result: &'a AnalysisResult,
}

/// Write the whole analysis result as pretty JSON.
pub fn write_json(path: &Path, title: &str, result: &AnalysisResult) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &ExportDocument { title, result })
        .context("serializing analysis result")?;
    writer.flush().context("flushing JSON export")?;
    log::info!("Exported analysis of '{title}' to {}", path.display());
    Ok(())
}

/// One CSV row per spectral bin.
#[derive(Debug, Serialize)]
struct SpectrumRow {
    frequency_ghz: f64,
    raw_spectrum: f64,
    windowed_spectrum: f64,
    /// Empty when the windowed amplitude is zero.
    power_db: Option<f64>,
}

/// Write the spectral bins as CSV.
pub fn write_csv(path: &Path, result: &AnalysisResult) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    for ((&frequency_ghz, &raw_spectrum), &windowed_spectrum) in result
        .frequency
        .iter()
        .zip(&result.raw_spectrum)
        .zip(&result.windowed_spectrum)
    {
        let db = power_db(windowed_spectrum);
        writer
            .serialize(SpectrumRow {
                frequency_ghz,
                raw_spectrum,
                windowed_spectrum,
                power_db: db.is_finite().then_some(db),
            })
            .context("writing CSV row")?;
    }

    writer.flush().context("flushing CSV export")?;
    log::info!("Exported {} spectral bins to {}", result.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_db_of_unit_amplitude_is_zero() {
        assert_eq!(power_db(1.0), 0.0);
        assert!((power_db(10.0) - 20.0).abs() < 1e-12);
        assert_eq!(power_db(0.0), f64::NEG_INFINITY);
    }
}
