use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use catalog_browser::data::model::Value;
use catalog_browser::data::summary::ValueCount;

/// Colour of the missing-value bar.
pub const MISSING_COLOR: Color32 = Color32::GRAY;

// ---------------------------------------------------------------------------
// Bar colours for value counts
// ---------------------------------------------------------------------------

/// `n` colours evenly spaced around the hue wheel.
pub fn hue_steps(n: usize) -> Vec<Color32> {
    let step = 360.0 / n.max(1) as f32;
    (0..n)
        .map(|i| {
            let hsl: Hsl = Hsl::new(200.0 + i as f32 * step, 0.6, 0.5);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// One colour per bar; the null bucket is always grey.
pub fn bar_colors(counts: &[ValueCount]) -> Vec<Color32> {
    let present = counts.iter().filter(|c| c.value != Value::Null).count();
    let mut palette = hue_steps(present).into_iter();
    counts
        .iter()
        .map(|c| match c.value {
            Value::Null => MISSING_COLOR,
            _ => palette.next().unwrap_or(MISSING_COLOR),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_bucket_is_grey_and_others_distinct() {
        let counts = vec![
            ValueCount { value: Value::from("a"), count: 3 },
            ValueCount { value: Value::Null, count: 2 },
            ValueCount { value: Value::from("b"), count: 1 },
        ];
        let colors = bar_colors(&counts);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[1], MISSING_COLOR);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn no_values_no_colours() {
        assert!(hue_steps(0).is_empty());
    }
}
