//! Utility functions for visualization: colors, color scales, locale mapping, label areas.

use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use super::text::estimate_text_width_px;

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green, Dark Blue, Dark Orange, Dark Gray, Brownish Gold.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // blue      (#4472C4)
    RGBColor(237, 125, 49),  // orange    (#ED7D31)
    RGBColor(165, 165, 165), // gray      (#A5A5A5)
    RGBColor(255, 192, 0),   // gold      (#FFC000)
    RGBColor(91, 155, 213),  // light blue(#5B9BD5)
    RGBColor(112, 173, 71),  // green     (#70AD47)
    RGBColor(38, 68, 120),   // dark blue (#264478)
    RGBColor(158, 72, 14),   // dark org. (#9E480E)
    RGBColor(99, 99, 99),    // dark gray (#636363)
    RGBColor(153, 115, 0),   // brownish  (#997300)
];

/// Yellow → green → blue, for heat maps.
pub const YL_GN_BU: [RGBColor; 4] = [
    RGBColor(255, 255, 217),
    RGBColor(127, 205, 187),
    RGBColor(29, 145, 192),
    RGBColor(8, 29, 88),
];

/// Light to dark orange, for the choropleth.
pub const ORANGES: [RGBColor; 3] = [
    RGBColor(255, 245, 235),
    RGBColor(253, 141, 60),
    RGBColor(127, 39, 4),
];

/// Fill for cells/countries without data.
pub const NO_DATA: RGBColor = RGBColor(224, 224, 224);

/// Get a color from the Office palette.
#[inline]
pub fn office_color(idx: usize) -> RGBAColor {
    OFFICE10[idx % OFFICE10.len()].to_rgba()
}

/// Pick the `idx`-th color: from `custom` when given, else the Office palette.
pub fn series_color(custom: &[RGBColor], idx: usize) -> RGBAColor {
    if custom.is_empty() {
        office_color(idx)
    } else {
        custom[idx % custom.len()].to_rgba()
    }
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<RGBColor> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let ch = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RGBColor(ch(0)?, ch(2)?, ch(4)?))
}

/// Linear interpolation through `stops` at `t` in `[0, 1]` (clamped).
pub fn sequential_color(t: f64, stops: &[RGBColor]) -> RGBColor {
    match stops.len() {
        0 => NO_DATA,
        1 => stops[0],
        n => {
            let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
            let pos = t * (n - 1) as f64;
            let i = (pos.floor() as usize).min(n - 2);
            let f = pos - i as f64;
            let (a, b) = (stops[i], stops[i + 1]);
            let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
            RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
        }
    }
}

/// Position of `v` within `[lo, hi]`; 0.5 for a degenerate range.
pub fn normalize(v: f64, lo: f64, hi: f64) -> f64 {
    if (hi - lo).abs() < f64::EPSILON {
        0.5
    } else {
        (v - lo) / (hi - lo)
    }
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'), // default
    }
}

/// Whole-number tick label with locale thousands separators.
pub fn format_tick(v: f64, locale: &Locale) -> String {
    let n = v.round() as i64;
    n.to_formatted_string(locale)
}

/// Width in pixels for a category label area holding `labels`, clamped to a
/// sensible range.
pub fn category_label_area_px(labels: &[String], font_px: u32) -> u32 {
    let max_px = labels
        .iter()
        .map(|l| estimate_text_width_px(l, font_px))
        .max()
        .unwrap_or(0);
    // Padding for tick marks & a little breathing room.
    max_px.saturating_add(18).clamp(48, 260)
}

/// Upper end of a value axis starting at zero: 5% headroom, never empty.
pub fn value_axis_max(max_val: f64) -> f64 {
    if max_val.is_finite() && max_val > 0.0 {
        max_val * 1.05
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#D7BDE2"), Some(RGBColor(0xD7, 0xBD, 0xE2)));
        assert_eq!(parse_hex_color("28920F"), Some(RGBColor(0x28, 0x92, 0x0F)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn sequential_scale_endpoints() {
        assert_eq!(sequential_color(0.0, &ORANGES), ORANGES[0]);
        assert_eq!(sequential_color(1.0, &ORANGES), ORANGES[2]);
        assert_eq!(sequential_color(0.5, &ORANGES), ORANGES[1]);
        assert_eq!(sequential_color(7.0, &ORANGES), ORANGES[2]);
    }

    #[test]
    fn value_axis_never_collapses() {
        assert_eq!(value_axis_max(0.0), 1.0);
        assert_eq!(value_axis_max(f64::NAN), 1.0);
        assert!((value_axis_max(100.0) - 105.0).abs() < 1e-9);
    }
}
