use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues at the
/// given lightness.
pub fn generate_palette(n: usize, lightness: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, lightness);
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
// Color mapping: feature → (raw colour, derived colour)
// ---------------------------------------------------------------------------

/// Stable colours per feature. A derived series shares its feature's hue in a
/// lighter shade so raw and smoothed lines read as a pair.
#[derive(Debug, Clone, Default)]
pub struct SeriesColors {
    mapping: BTreeMap<String, (Color32, Color32)>,
}

impl SeriesColors {
    pub fn new(features: &[String]) -> Self {
        let raw = generate_palette(features.len(), 0.45);
        let derived = generate_palette(features.len(), 0.75);
        let mapping = features
            .iter()
            .cloned()
            .zip(raw.into_iter().zip(derived))
            .collect();
        SeriesColors { mapping }
    }

    pub fn raw(&self, feature: &str) -> Color32 {
        self.mapping
            .get(feature)
            .map_or(Color32::LIGHT_BLUE, |(c, _)| *c)
    }

    pub fn derived(&self, feature: &str) -> Color32 {
        self.mapping.get(feature).map_or(Color32::GRAY, |(_, c)| *c)
    }
}
