use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

pub const YES_COLOR: Color32 = Color32::from_rgb(214, 76, 76);
pub const NO_COLOR: Color32 = Color32::from_rgb(76, 140, 214);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.65, 0.55).into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Category → colour
// ---------------------------------------------------------------------------

/// Stable colours for the categories of one dimension (genders, locations,
/// race columns) so the same category keeps its colour across charts.
#[derive(Debug, Clone, Default)]
pub struct CategoryColors {
    mapping: BTreeMap<String, Color32>,
}

impl CategoryColors {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        let mapping = labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .zip(generate_palette(labels.len()))
            .collect();
        CategoryColors { mapping }
    }

    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}
