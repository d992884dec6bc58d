use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trace colours
// ---------------------------------------------------------------------------

/// One colour per kind of curve in the summary plots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceColors {
    pub valid: Color32,
    pub windowed: Color32,
    pub negative: Color32,
    pub spectrum: Color32,
    pub annotation: Color32,
}

impl Default for TraceColors {
    fn default() -> Self {
        let palette = generate_palette(3);
        TraceColors {
            valid: palette[2],
            windowed: palette[0],
            spectrum: palette[1],
            negative: Color32::GRAY,
            annotation: Color32::WHITE,
        }
    }
}
