use std::path::{Path, PathBuf};

use anyhow::Result;
use rusty_fts::analysis::fringe::FringeOffset;
use rusty_fts::analysis::{analyze, AnalysisResult, AnalysisSettings};
use rusty_fts::data::export;
use rusty_fts::data::loader::{load_file, LoaderOptions};
use rusty_fts::data::model::ScanRecord;

use crate::color::TraceColors;

/// Default zoomed spectrum range (GHz).
pub const DEFAULT_ZOOM_REGION: (f64, f64) = (100.0, 200.0);

/// Default zoomed interferogram range around the fringe (cm).
pub const DEFAULT_FRINGE_ZOOM_CM: f64 = 2.0;

// ---------------------------------------------------------------------------
// Display options
// ---------------------------------------------------------------------------

/// How the analysis result is drawn; never feeds back into the analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    /// Spectrum in dB instead of linear power.
    pub log_scale: bool,
    /// Overlay the negative branch on the zoomed interferogram.
    pub show_negative: bool,
    /// Frequency range of the zoomed spectrum plot (GHz).
    pub zoom_region: (f64, f64),
    /// Frequencies (GHz) annotated on the spectrum plots.
    pub notes: Vec<f64>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            log_scale: true,
            show_negative: true,
            zoom_region: DEFAULT_ZOOM_REGION,
            notes: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded scan (None until user loads a file).
    pub scan: Option<ScanRecord>,

    /// File the scan came from, for reloading.
    pub source: Option<PathBuf>,

    /// Analysis configuration edited in the side panel.
    pub settings: AnalysisSettings,

    /// Unit conversion for archive files.
    pub loader_options: LoaderOptions,

    /// Result of the last successful analysis of `scan`.
    pub result: Option<AnalysisResult>,

    pub view: ViewOptions,

    /// Position edited while the fringe offset is in manual mode (cm).
    pub manual_offset_cm: f64,

    /// Limit edited while the max offset is enabled (cm).
    pub max_offset_cm: f64,

    /// Text box for adding annotated frequencies.
    pub note_input: String,

    pub colors: TraceColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            scan: None,
            source: None,
            settings: AnalysisSettings::default(),
            loader_options: LoaderOptions::default(),
            result: None,
            view: ViewOptions::default(),
            manual_offset_cm: 0.0,
            max_offset_cm: 10.0,
            note_input: String::new(),
            colors: TraceColors::default(),
            status_message: None,
        }
    }
}

impl AppState {
    pub fn new(settings: AnalysisSettings, loader_options: LoaderOptions) -> Self {
        let mut state = Self {
            settings,
            loader_options,
            ..Default::default()
        };
        if let FringeOffset::Position(p) = settings.fringe_offset {
            state.manual_offset_cm = p;
        }
        if let Some(limit) = settings.max_offset {
            state.max_offset_cm = limit;
        }
        state
    }

    /// Load `path` and analyse it; failures end up in `status_message`.
    pub fn load(&mut self, path: &Path) {
        match load_file(path, &self.loader_options) {
            Ok(scan) => {
                self.source = Some(path.to_path_buf());
                self.set_scan(scan);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Load the current source again, e.g. after changing the counts conversion.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            self.load(&path);
        }
    }

    /// Ingest a newly loaded scan and analyse it.
    pub fn set_scan(&mut self, scan: ScanRecord) {
        self.scan = Some(scan);
        self.reanalyze();
    }

    /// Re-run the analysis with the current settings.
    pub fn reanalyze(&mut self) {
        let Some(scan) = &self.scan else {
            return;
        };
        match analyze(scan, &self.settings) {
            Ok(result) => {
                self.result = Some(result);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Analysis of '{}' failed: {e}", scan.title());
                self.result = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Sync the editable offsets into `settings`; returns whether anything changed.
    pub fn apply_offset_edits(&mut self, manual_fringe: bool, limit_enabled: bool) -> bool {
        let fringe_offset = if manual_fringe {
            FringeOffset::Position(self.manual_offset_cm)
        } else {
            FringeOffset::Auto
        };
        let max_offset = limit_enabled.then_some(self.max_offset_cm);

        let changed =
            fringe_offset != self.settings.fringe_offset || max_offset != self.settings.max_offset;
        self.settings.fringe_offset = fringe_offset;
        self.settings.max_offset = max_offset;
        changed
    }

    /// Parse `note_input` as a frequency and add it to the annotations.
    pub fn add_note_from_input(&mut self) {
        match self.note_input.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => {
                self.view.notes.push(f);
                self.note_input.clear();
            }
            _ => {
                self.status_message = Some(format!(
                    "Error: '{}' is not a frequency in GHz",
                    self.note_input.trim()
                ));
            }
        }
    }

    pub fn title(&self) -> &str {
        self.scan.as_ref().map(ScanRecord::title).unwrap_or("")
    }

    pub fn export_json(&self, path: &Path) -> Result<()> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("nothing to export"))?;
        export::write_json(path, self.title(), result)
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("nothing to export"))?;
        export::write_csv(path, result)
    }
}
