use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use npyz::npz::NpzArchive;
use npyz::DType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};

use super::model::{ScanRecord, SOURCE_KEY};

/// Stage encoder counts per centimetre of recorded position.
pub const DEFAULT_COUNTS_PER_CM: f64 = 20_000.0;

/// Archive column holding the stage position in encoder counts.
const POSITION_COLUMN: &str = "position";
/// Archive column holding the lock-in magnitude.
const RESPONSE_COLUMN: &str = "r";

/// Settings for formats that need unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    pub counts_per_cm: f64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            counts_per_cm: DEFAULT_COUNTS_PER_CM,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a scan from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.npz`     – NumPy sweep archive with `position` (counts) and `r` arrays
/// * `.parquet` – sweep archive with the same columns
/// * `.csv`     – sweep archive with the same columns
/// * anything else – text dump of `key: value` lines and `position visibility` rows
pub fn load_file(path: &Path, options: &LoaderOptions) -> Result<ScanRecord> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let scan = match ext.as_str() {
        "npz" => load_npz(path, options),
        "parquet" | "pq" => load_parquet(path, options),
        "csv" => load_csv(path, options),
        _ => load_text(path),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded '{}' from {}: {} samples",
        scan.title(),
        path.display(),
        scan.len()
    );
    Ok(scan)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Text loader
// ---------------------------------------------------------------------------

/// Text layout, one record per line:
///
/// ```text
/// Note: blue and green input filter
/// Date: 2014-03-02
///
/// -0.5000 0.0121
/// -0.4995 0.0124
/// ```
///
/// Lines containing a colon are metadata (split at the first colon, both
/// sides trimmed). Other non-blank lines need at least two numeric columns;
/// extra columns are ignored.
fn load_text(path: &Path) -> Result<ScanRecord> {
    let text = std::fs::read_to_string(path).context("reading text file")?;
    let mut metadata = BTreeMap::new();
    metadata.insert(SOURCE_KEY.to_string(), file_name(path));

    let (position, visibility) = parse_text(&text, &mut metadata)?;
    Ok(ScanRecord::new(position, visibility, metadata)?)
}

/// Parse the text layout; metadata is merged into `metadata`.
pub fn parse_text(
    text: &str,
    metadata: &mut BTreeMap<String, String>,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let mut position = Vec::new();
    let mut visibility = Vec::new();
    let mut extra_columns_seen = false;

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            metadata.insert(key.trim().to_string(), value.trim().to_string());
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(x), Some(y)) = (parts.next(), parts.next()) else {
            bail!("line {line_no}: expected 'position visibility', got '{line}'");
        };
        let x = x
            .parse::<f64>()
            .with_context(|| format!("line {line_no}: position '{x}' is not a number"))?;
        let y = y
            .parse::<f64>()
            .with_context(|| format!("line {line_no}: visibility '{y}' is not a number"))?;
        if parts.next().is_some() && !extra_columns_seen {
            log::warn!("line {line_no}: ignoring columns after the second");
            extra_columns_seen = true;
        }

        position.push(x);
        visibility.push(y);
    }

    if position.is_empty() {
        bail!("no data lines found");
    }
    Ok((position, visibility))
}

// ---------------------------------------------------------------------------
// Archive conversion
// ---------------------------------------------------------------------------

/// Turn raw `(counts, response)` columns into a scan in centimetres.
pub fn scan_from_counts(
    counts: &[f64],
    response: Vec<f64>,
    options: &LoaderOptions,
    source: String,
) -> Result<ScanRecord> {
    let counts_per_cm = options.counts_per_cm;
    if !(counts_per_cm.is_finite() && counts_per_cm > 0.0) {
        bail!("counts per cm must be positive, got {counts_per_cm}");
    }
    if counts.len() != response.len() {
        bail!(
            "'{POSITION_COLUMN}' has {} values but '{RESPONSE_COLUMN}' has {}",
            counts.len(),
            response.len()
        );
    }

    let position = counts.iter().map(|c| c / counts_per_cm).collect();
    let mut metadata = BTreeMap::new();
    metadata.insert(SOURCE_KEY.to_string(), source);
    metadata.insert("counts_per_cm".to_string(), counts_per_cm.to_string());

    Ok(ScanRecord::new(position, response, metadata)?)
}

// ---------------------------------------------------------------------------
// CSV archive loader
// ---------------------------------------------------------------------------

/// CSV layout: header row, numeric `position` (counts) and `r` columns.
/// Other columns (e.g. `theta`) are ignored.
fn load_csv(path: &Path, options: &LoaderOptions) -> Result<ScanRecord> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();

    let x_idx = headers
        .iter()
        .position(|h| h.trim() == POSITION_COLUMN)
        .with_context(|| format!("CSV missing '{POSITION_COLUMN}' column"))?;
    let y_idx = headers
        .iter()
        .position(|h| h.trim() == RESPONSE_COLUMN)
        .with_context(|| format!("CSV missing '{RESPONSE_COLUMN}' column"))?;

    let mut counts = Vec::new();
    let mut response = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        counts.push(parse_cell(record.get(x_idx), row_no, POSITION_COLUMN)?);
        response.push(parse_cell(record.get(y_idx), row_no, RESPONSE_COLUMN)?);
    }

    scan_from_counts(&counts, response, options, file_name(path))
}

fn parse_cell(cell: Option<&str>, row: usize, col: &str) -> Result<f64> {
    let cell = cell.unwrap_or("").trim();
    cell.parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{cell}' is not a number"))
}

// ---------------------------------------------------------------------------
// NPZ archive loader
// ---------------------------------------------------------------------------

/// Load a NumPy `.npz` sweep archive as saved by `np.savez`.
///
/// Expected arrays:
/// - `position`: int64 / int32 / float64 / float32 – stage encoder counts
/// - `r`: float64 / float32 – lock-in magnitude
/// - any other arrays (`theta`, …) are ignored
fn load_npz(path: &Path, options: &LoaderOptions) -> Result<ScanRecord> {
    let mut archive = NpzArchive::open(path).context("opening npz archive")?;
    let counts = npz_f64_array(&mut archive, POSITION_COLUMN)?;
    let response = npz_f64_array(&mut archive, RESPONSE_COLUMN)?;
    scan_from_counts(&counts, response, options, file_name(path))
}

/// Read a numeric array of any shape, flattened, as `f64`.
fn npz_f64_array<R: Read + Seek>(archive: &mut NpzArchive<R>, name: &str) -> Result<Vec<f64>> {
    let npy = archive
        .by_name(name)
        .with_context(|| format!("reading '{name}'"))?
        .with_context(|| format!("npz archive missing '{name}' array"))?;

    let DType::Plain(type_str) = npy.dtype() else {
        bail!("'{name}' is not a plain numeric array");
    };
    // descriptor such as "<f8": byte order, kind, width
    let descr = type_str.to_string();
    let values = match descr.get(1..) {
        Some("f8") => npy.into_vec::<f64>()?,
        Some("f4") => npy.into_vec::<f32>()?.into_iter().map(f64::from).collect(),
        Some("i8") => npy.into_vec::<i64>()?.into_iter().map(|v| v as f64).collect(),
        Some("i4") => npy.into_vec::<i32>()?.into_iter().map(f64::from).collect(),
        _ => bail!("'{name}' has unsupported dtype {descr}"),
    };
    Ok(values)
}

// ---------------------------------------------------------------------------
// Parquet archive loader
// ---------------------------------------------------------------------------

/// Load a Parquet sweep archive.
///
/// Expected schema:
/// - `position`: Int64 / Int32 / Float64 / Float32 – stage encoder counts
/// - `r`: Float64 / Float32 – lock-in magnitude
/// - any other columns (`theta`, …) are ignored
fn load_parquet(path: &Path, options: &LoaderOptions) -> Result<ScanRecord> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut counts = Vec::new();
    let mut response = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let x_idx = schema
            .index_of(POSITION_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{POSITION_COLUMN}' column"))?;
        let y_idx = schema
            .index_of(RESPONSE_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{RESPONSE_COLUMN}' column"))?;

        counts.extend(
            extract_f64_column(batch.column(x_idx))
                .with_context(|| format!("reading '{POSITION_COLUMN}'"))?,
        );
        response.extend(
            extract_f64_column(batch.column(y_idx))
                .with_context(|| format!("reading '{RESPONSE_COLUMN}'"))?,
        );
    }

    scan_from_counts(&counts, response, options, file_name(path))
}

// -- Parquet / Arrow helpers --

/// Read a flat numeric column as `f64`. Nulls are rejected.
fn extract_f64_column(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    if col.null_count() > 0 {
        bail!("column contains {} null values", col.null_count());
    }

    let any = col.as_any();
    let values = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .values()
            .to_vec(),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .values()
            .iter()
            .map(|&v| v as f64)
            .collect(),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .values()
            .iter()
            .map(|&v| v as f64)
            .collect(),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .values()
            .iter()
            .map(|&v| v as f64)
            .collect(),
        other => bail!("expected a numeric column, got {other:?}"),
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TITLE_KEY;

    #[test]
    fn parses_metadata_and_data_lines() {
        let text = "Note: blue filter\nDate: 2014-03-02 12:00\n\n0.0 1.5\n0.1\t2.5 9.9\n   \n0.2 -0.5\n";
        let mut meta = BTreeMap::new();
        let (x, y) = parse_text(text, &mut meta).unwrap();
        assert_eq!(x, vec![0.0, 0.1, 0.2]);
        assert_eq!(y, vec![1.5, 2.5, -0.5]);
        assert_eq!(meta.get(TITLE_KEY).map(String::as_str), Some("blue filter"));
        // only the first colon splits
        assert_eq!(meta.get("Date").map(String::as_str), Some("2014-03-02 12:00"));
    }

    #[test]
    fn bad_number_reports_line() {
        let mut meta = BTreeMap::new();
        let err = parse_text("0.0 1.0\n0.1 abc\n", &mut meta).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn single_column_line_is_rejected() {
        let mut meta = BTreeMap::new();
        assert!(parse_text("0.0\n", &mut meta).is_err());
    }

    #[test]
    fn metadata_only_file_is_rejected() {
        let mut meta = BTreeMap::new();
        assert!(parse_text("Note: empty\n", &mut meta).is_err());
    }

    #[test]
    fn counts_are_converted_to_centimetres() {
        let scan = scan_from_counts(
            &[0.0, 100.0, 200.0],
            vec![1.0, 2.0, 3.0],
            &LoaderOptions { counts_per_cm: 100.0 },
            "sweep.parquet".into(),
        )
        .unwrap();
        assert_eq!(scan.position(), &[0.0, 1.0, 2.0]);
        assert_eq!(scan.title(), "sweep.parquet");
    }

    #[test]
    fn default_conversion_matches_stage_encoder() {
        let scan = scan_from_counts(
            &[0.0, 20_000.0],
            vec![0.0, 1.0],
            &LoaderOptions::default(),
            "x".into(),
        )
        .unwrap();
        assert_eq!(scan.position(), &[0.0, 1.0]);
    }

    #[test]
    fn zero_counts_per_cm_is_rejected() {
        assert!(scan_from_counts(
            &[0.0],
            vec![0.0],
            &LoaderOptions { counts_per_cm: 0.0 },
            "x".into()
        )
        .is_err());
    }
}
