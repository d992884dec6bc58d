mod app;
mod color;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use app::RustyFtsApp;
use clap::Parser;
use eframe::egui;
use rusty_fts::analysis::detrend::{TrendRemoval, TrendRemover};
use rusty_fts::analysis::fringe::FringeOffset;
use rusty_fts::analysis::window::{WindowGenerator, WindowKind};
use rusty_fts::analysis::{analyze, AnalysisResult, AnalysisSettings};
use rusty_fts::data::export;
use rusty_fts::data::loader::{load_file, LoaderOptions};
use state::AppState;

/// Analyse Fourier transform spectrometer interferograms.
///
/// Without `--headless` or an export flag the viewer opens, with FILE loaded
/// if one is given.
#[derive(Parser, Debug)]
#[command(name = "rusty-fts")]
#[command(version)]
#[command(about = "Interferogram to spectrum analysis for FTS scans", long_about = None)]
struct Args {
    /// Scan file (.txt text dump, .npz, .parquet or .csv sweep archive).
    file: Option<PathBuf>,

    /// JSON file with analysis settings; the flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fringe location: `auto` or a position in cm.
    #[arg(long, allow_negative_numbers = true)]
    offset: Option<FringeOffset>,

    /// Truncate the valid branch at this path-length difference (cm).
    #[arg(long, allow_negative_numbers = true)]
    max_offset: Option<f64>,

    /// Baseline removal: linear, mean or none.
    #[arg(long, value_parser = parse_trend)]
    trend: Option<TrendRemoval>,

    /// Apodization window: hann, hamming, blackman, bartlett or rectangular.
    #[arg(long, value_parser = parse_window)]
    window: Option<WindowKind>,

    /// Stage encoder counts per cm, for sweep archives.
    #[arg(long)]
    counts_per_cm: Option<f64>,

    /// Write the full analysis as JSON.
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Write the spectrum as CSV.
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Print a summary instead of opening the viewer.
    #[arg(long)]
    headless: bool,
}

fn parse_trend(s: &str) -> Result<TrendRemoval, String> {
    TrendRemoval::ALL
        .into_iter()
        .find(|t| t.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown trend removal '{s}'"))
}

fn parse_window(s: &str) -> Result<WindowKind, String> {
    WindowKind::ALL
        .into_iter()
        .find(|w| w.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown window '{s}'"))
}

impl Args {
    fn settings(&self) -> Result<AnalysisSettings> {
        let mut settings = match &self.config {
            Some(path) => read_settings(path)?,
            None => AnalysisSettings::default(),
        };
        if let Some(offset) = self.offset {
            settings.fringe_offset = offset;
        }
        if self.max_offset.is_some() {
            settings.max_offset = self.max_offset;
        }
        if let Some(trend) = self.trend {
            settings.trend = trend;
        }
        if let Some(window) = self.window {
            settings.window = window;
        }
        Ok(settings)
    }

    fn loader_options(&self) -> LoaderOptions {
        let mut options = LoaderOptions::default();
        if let Some(counts) = self.counts_per_cm {
            options.counts_per_cm = counts;
        }
        options
    }

    fn is_headless(&self) -> bool {
        self.headless || self.export_json.is_some() || self.export_csv.is_some()
    }
}

fn read_settings(path: &Path) -> Result<AnalysisSettings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
}

/// Strongest bin above DC: (frequency GHz, windowed amplitude).
fn strongest_line(result: &AnalysisResult) -> Option<(f64, f64)> {
    result
        .frequency
        .iter()
        .zip(&result.windowed_spectrum)
        .skip(1)
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(&f, &a)| (f, a))
}

fn run_headless(args: &Args, settings: &AnalysisSettings) -> Result<()> {
    let path = args
        .file
        .as_deref()
        .context("a scan file is required without the viewer")?;
    let scan = load_file(path, &args.loader_options())?;
    let result = analyze(&scan, settings).with_context(|| format!("analysing {}", path.display()))?;

    println!("{}", scan.title());
    println!(
        "  fringe index {} of {}, {} valid / {} negative samples",
        result.fringe_index,
        scan.len(),
        result.valid.len(),
        result.negative.len()
    );
    println!(
        "  max path difference {:.4} cm, {:.4} GHz per bin, {} bins",
        result.max_path_difference(),
        result.frequency_step_ghz,
        result.len()
    );
    if let Some((freq, amplitude)) = strongest_line(&result) {
        println!(
            "  strongest line {freq:.3} GHz ({:.1} dB)",
            export::power_db(amplitude)
        );
    }

    if let Some(out) = &args.export_json {
        export::write_json(out, scan.title(), &result)?;
    }
    if let Some(out) = &args.export_csv {
        export::write_csv(out, &result)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = args.settings()?;

    if args.is_headless() {
        return run_headless(&args, &settings);
    }

    let mut state = AppState::new(settings, args.loader_options());
    if let Some(path) = &args.file {
        state.load(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty FTS – Interferogram Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(RustyFtsApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let args = Args::parse_from([
            "rusty-fts",
            "scan.txt",
            "--offset",
            "0.25",
            "--trend",
            "mean",
            "--window",
            "Blackman",
            "--max-offset",
            "8",
        ]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.fringe_offset, FringeOffset::Position(0.25));
        assert_eq!(settings.trend, TrendRemoval::Mean);
        assert_eq!(settings.window, WindowKind::Blackman);
        assert_eq!(settings.max_offset, Some(8.0));
        assert!(!args.is_headless());
    }

    #[test]
    fn negative_offset_is_a_value() {
        let args = Args::try_parse_from(["rusty-fts", "scan.txt", "--offset", "-0.05"]).unwrap();
        let settings = args.settings().unwrap();
        assert_eq!(settings.fringe_offset, FringeOffset::Position(-0.05));
        assert_eq!(args.file.as_deref(), Some(Path::new("scan.txt")));

        let args = Args::try_parse_from(["rusty-fts", "--max-offset", "-0.5"]).unwrap();
        assert_eq!(args.max_offset, Some(-0.5));
    }

    #[test]
    fn export_implies_headless() {
        let args = Args::parse_from(["rusty-fts", "scan.txt", "--export-csv", "out.csv"]);
        assert!(args.is_headless());
        assert_eq!(args.loader_options(), LoaderOptions::default());
    }

    #[test]
    fn unknown_window_is_rejected() {
        assert!(Args::try_parse_from(["rusty-fts", "--window", "kaiser"]).is_err());
    }
}
