use eframe::egui::{Align2, Ui};
use egui_plot::{Legend, Line, LineStyle, Plot, PlotBounds, PlotPoint, PlotPoints, Points, Text};
use rusty_fts::analysis::fringe::nearest_index;
use rusty_fts::analysis::AnalysisResult;
use rusty_fts::data::export::power_db;

use crate::color::TraceColors;
use crate::state::{AppState, ViewOptions, DEFAULT_FRINGE_ZOOM_CM};

// ---------------------------------------------------------------------------
// Summary (central panel)
// ---------------------------------------------------------------------------

/// Render the four summary plots: interferograms on the left, spectra on the right.
pub fn summary_plots(ui: &mut Ui, state: &AppState) {
    let result = match &state.result {
        Some(r) => r,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                if state.scan.is_some() {
                    ui.heading("Analysis failed – see the status bar");
                } else {
                    ui.heading("Open a scan to analyse it  (File → Open…)");
                }
            });
            return;
        }
    };

    ui.heading(state.title());
    let height = ((ui.available_height() - 24.0) / 2.0).max(120.0);
    let colors = &state.colors;
    let view = &state.view;

    ui.columns(2, |cols: &mut [Ui]| {
        cols[0].strong("Interferogram");
        interferogram_plot(&mut cols[0], "interferogram", result, colors, false, None, height);
        interferogram_plot(
            &mut cols[0],
            "interferogram_zoom",
            result,
            colors,
            view.show_negative,
            Some((0.0, DEFAULT_FRINGE_ZOOM_CM)),
            height,
        );

        cols[1].strong("Spectrum");
        spectrum_plot(&mut cols[1], "spectrum", result, colors, view, None, height);
        spectrum_plot(
            &mut cols[1],
            "spectrum_zoom",
            result,
            colors,
            view,
            Some(view.zoom_region),
            height,
        );
    });
}

fn line_from(x: &[f64], y: &[f64]) -> PlotPoints<'static> {
    x.iter()
        .zip(y)
        .filter(|(_, yi)| yi.is_finite())
        .map(|(&xi, &yi)| [xi, yi])
        .collect()
}

// ---------------------------------------------------------------------------
// Interferogram
// ---------------------------------------------------------------------------

fn interferogram_plot(
    ui: &mut Ui,
    id: &str,
    result: &AnalysisResult,
    colors: &TraceColors,
    show_negative: bool,
    x_range: Option<(f64, f64)>,
    height: f32,
) {
    let valid = &result.valid;
    let bounds = x_range.and_then(|range| {
        view_bounds(&valid.position, &valid.visibility, Some(range), false)
    });

    let plot = Plot::new(id)
        .legend(Legend::default())
        .x_axis_label("Path length difference [cm]")
        .y_axis_label("Visibility amplitude")
        .height(height)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    plot.show(ui, |plot_ui| {
        plot_ui.line(
            Line::new(line_from(&valid.position, &valid.visibility))
                .name("not windowed")
                .color(colors.valid)
                .width(1.5),
        );

        if show_negative {
            let negative = &result.negative;
            plot_ui.line(
                Line::new(line_from(&negative.position, &negative.visibility))
                    .name("negative region")
                    .color(colors.negative)
                    .style(LineStyle::dashed_loose())
                    .width(1.0),
            );
        } else {
            plot_ui.line(
                Line::new(line_from(&valid.position, &result.windowed_visibility))
                    .name("windowed")
                    .color(colors.windowed)
                    .width(1.5),
            );
        }

        // Auto-bounds mode only: panning clears it, double-click restores it.
        if let Some((min, max)) = bounds {
            if plot_ui.auto_bounds().any() {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Spectrum
// ---------------------------------------------------------------------------

/// Display power `windowed_spectrum²`, in dB when `log_scale` is set.
pub fn display_power(result: &AnalysisResult, log_scale: bool) -> Vec<f64> {
    result
        .windowed_spectrum
        .iter()
        .map(|&a| if log_scale { power_db(a) } else { a * a })
        .collect()
}

/// Fraction of the vertical span added above and below the data.
const VIEW_MARGIN: f64 = 0.05;

/// Plot rectangle `(min, max)` covering the samples whose `x` lies inside
/// `x_range`, or all samples when there is none. Non-finite values are
/// ignored; with `skip_dc` the first sample is left out of the vertical range.
pub fn view_bounds(
    x: &[f64],
    y: &[f64],
    x_range: Option<(f64, f64)>,
    skip_dc: bool,
) -> Option<([f64; 2], [f64; 2])> {
    let (x_lo, x_hi) = match x_range {
        Some((a, b)) => (a.min(b), a.max(b)),
        None => {
            let lo = x.iter().copied().filter(|v| v.is_finite()).reduce(f64::min)?;
            let hi = x.iter().copied().filter(|v| v.is_finite()).reduce(f64::max)?;
            (lo, hi)
        }
    };

    let visible = x
        .iter()
        .zip(y)
        .skip(usize::from(skip_dc))
        .filter(|(xi, yi)| (x_lo..=x_hi).contains(*xi) && yi.is_finite())
        .map(|(_, &yi)| yi);
    let (y_lo, y_hi) = visible.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        None => Some((v, v)),
    })?;

    let pad = if y_hi > y_lo {
        (y_hi - y_lo) * VIEW_MARGIN
    } else {
        0.5
    };
    let x_hi = if x_hi > x_lo { x_hi } else { x_lo + 1.0 };
    Some(([x_lo, y_lo - pad], [x_hi, y_hi + pad]))
}

fn spectrum_plot(
    ui: &mut Ui,
    id: &str,
    result: &AnalysisResult,
    colors: &TraceColors,
    view: &ViewOptions,
    x_range: Option<(f64, f64)>,
    height: f32,
) {
    let power = display_power(result, view.log_scale);
    let unit = if view.log_scale { "dB" } else { "arb" };

    let bounds = view_bounds(&result.frequency, &power, x_range, true);

    let plot = Plot::new(id)
        .x_axis_label("Frequency [GHz]")
        .y_axis_label(format!("Power [{unit}]"))
        .height(height)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    plot.show(ui, |plot_ui| {
        plot_ui.line(
            Line::new(line_from(&result.frequency, &power))
                .color(colors.spectrum)
                .width(1.0),
        );

        for &note in &view.notes {
            let Some(idx) = nearest_index(&result.frequency, note) else {
                continue;
            };
            let (freq, value) = (result.frequency[idx], power[idx]);
            if !value.is_finite() {
                continue;
            }
            plot_ui.points(
                Points::new(vec![[freq, value]])
                    .radius(3.0)
                    .color(colors.annotation),
            );
            plot_ui.text(
                Text::new(
                    PlotPoint::new(freq, value),
                    format!("{freq:.3} GHz\n{value:.1} {unit}"),
                )
                .color(colors.annotation)
                .anchor(Align2::RIGHT_BOTTOM),
            );
        }

        if let Some((min, max)) = bounds {
            if plot_ui.auto_bounds().any() {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
            }
        }
    });
}
