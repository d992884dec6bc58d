use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use rusty_fts::analysis::detrend::{TrendRemoval, TrendRemover};
use rusty_fts::analysis::fringe::FringeOffset;
use rusty_fts::analysis::window::{WindowGenerator, WindowKind};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – analysis settings
// ---------------------------------------------------------------------------

/// Render the left settings panel; re-runs the analysis when a setting changes.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Analysis");
    ui.separator();

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Fringe location ----
            ui.strong("White-light fringe");
            let mut manual = matches!(state.settings.fringe_offset, FringeOffset::Position(_));
            let mut limit_enabled = state.settings.max_offset.is_some();
            ui.horizontal(|ui: &mut Ui| {
                ui.radio_value(&mut manual, false, "Auto");
                ui.radio_value(&mut manual, true, "At");
                ui.add_enabled(
                    manual,
                    DragValue::new(&mut state.manual_offset_cm)
                        .speed(0.001)
                        .suffix(" cm"),
                );
            });

            ui.horizontal(|ui: &mut Ui| {
                ui.checkbox(&mut limit_enabled, "Max offset");
                ui.add_enabled(
                    limit_enabled,
                    DragValue::new(&mut state.max_offset_cm)
                        .speed(0.01)
                        .range(0.0..=f64::MAX)
                        .suffix(" cm"),
                );
            });
            changed |= state.apply_offset_edits(manual, limit_enabled);
            ui.separator();

            // ---- Strategies ----
            ui.strong("Detrend");
            egui::ComboBox::from_id_salt("trend")
                .selected_text(state.settings.trend.name())
                .show_ui(ui, |ui: &mut Ui| {
                    for trend in TrendRemoval::ALL {
                        changed |= ui
                            .selectable_value(&mut state.settings.trend, trend, trend.name())
                            .changed();
                    }
                });

            ui.strong("Window");
            egui::ComboBox::from_id_salt("window")
                .selected_text(state.settings.window.name())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in WindowKind::ALL {
                        changed |= ui
                            .selectable_value(&mut state.settings.window, kind, kind.name())
                            .changed();
                    }
                });
            ui.separator();

            // ---- Instrument ----
            egui::CollapsingHeader::new(RichText::new("Instrument").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("Path factor");
                        changed |= ui
                            .add(
                                DragValue::new(&mut state.settings.geometry.path_factor)
                                    .speed(0.01)
                                    .range(0.1..=16.0),
                            )
                            .changed();
                    });
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("Counts / cm");
                        ui.add(
                            DragValue::new(&mut state.loader_options.counts_per_cm)
                                .speed(10.0)
                                .range(1.0..=f64::MAX),
                        );
                        if ui.small_button("Reload").clicked() {
                            state.reload();
                        }
                    });
                });
            ui.separator();

            // ---- Display ----
            ui.strong("Display");
            ui.checkbox(&mut state.view.log_scale, "Power in dB");
            ui.checkbox(&mut state.view.show_negative, "Show negative region");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Zoom");
                ui.add(DragValue::new(&mut state.view.zoom_region.0).suffix(" GHz"));
                ui.label("–");
                ui.add(DragValue::new(&mut state.view.zoom_region.1).suffix(" GHz"));
            });

            ui.horizontal(|ui: &mut Ui| {
                let response = ui.text_edit_singleline(&mut state.note_input);
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.small_button("Mark").clicked() || submitted {
                    state.add_note_from_input();
                }
            });
            let mut remove = None;
            for (i, note) in state.view.notes.iter().enumerate() {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(format!("{note:.3} GHz"));
                    if ui.small_button("✕").clicked() {
                        remove = Some(i);
                    }
                });
            }
            if let Some(i) = remove {
                state.view.notes.remove(i);
            }
            ui.separator();

            metadata_table(ui, state);
        });

    if changed {
        state.reanalyze();
    }
}

fn metadata_table(ui: &mut Ui, state: &AppState) {
    let Some(scan) = &state.scan else {
        ui.label("No scan loaded.");
        return;
    };

    ui.strong(format!("Scan: {} samples", scan.len()));
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::remainder())
        .header(18.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Key");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("Value");
            });
        })
        .body(|mut body| {
            for (key, value) in scan.metadata() {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(key);
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(value);
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
            ui.separator();
            let can_export = state.result.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export JSON…"))
                .clicked()
            {
                export_dialog(state, ExportFormat::Json);
                ui.close_menu();
            }
            if ui
                .add_enabled(can_export, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_dialog(state, ExportFormat::Csv);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(result) = &state.result {
            ui.label(format!(
                "fringe at sample {}, {:.3} cm span, {:.4} GHz bins",
                result.fringe_index,
                result.max_path_difference(),
                result.frequency_step_ghz
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open interferogram")
        .add_filter(
            "Supported files",
            &["txt", "dat", "fts", "npz", "parquet", "pq", "csv"],
        )
        .add_filter("Text scan", &["txt", "dat", "fts"])
        .add_filter("NumPy sweep archive", &["npz"])
        .add_filter("Parquet sweep archive", &["parquet", "pq"])
        .add_filter("CSV sweep archive", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.load(&path);
    }
}

#[derive(Debug, Clone, Copy)]
enum ExportFormat {
    Json,
    Csv,
}

fn export_dialog(state: &mut AppState, format: ExportFormat) {
    let (label, ext) = match format {
        ExportFormat::Json => ("JSON", "json"),
        ExportFormat::Csv => ("CSV", "csv"),
    };
    let Some(path) = rfd::FileDialog::new()
        .set_title(format!("Export {label}"))
        .add_filter(label, &[ext])
        .save_file()
    else {
        return;
    };

    let outcome = match format {
        ExportFormat::Json => state.export_json(&path),
        ExportFormat::Csv => state.export_csv(&path),
    };
    if let Err(e) = outcome {
        log::error!("Export failed: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}
