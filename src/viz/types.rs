//! Public types and constants for the visualization module.

use plotters::style::RGBColor;
use std::path::PathBuf;

use super::util::parse_hex_color;

/// Bar direction for bar and stacked bar charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Categories on the Y axis, bars grow to the right (default).
    #[default]
    Horizontal,
    /// Categories on the X axis, bars grow upward.
    Vertical,
}

/// Size, text, and colors of one chart.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    /// Locale tag for tick and value labels (`"en"`, `"de"`, ...).
    pub locale: String,
    /// Series colors; empty uses the Office palette.
    pub colors: Vec<RGBColor>,
    /// TrueType font to register as `sans-serif`; `None` searches system locations.
    pub font_path: Option<PathBuf>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: String::new(),
            x_desc: String::new(),
            y_desc: String::new(),
            locale: "en".to_string(),
            colors: Vec::new(),
            font_path: None,
        }
    }
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn axes(mut self, x_desc: impl Into<String>, y_desc: impl Into<String>) -> Self {
        self.x_desc = x_desc.into();
        self.y_desc = y_desc.into();
        self
    }

    /// Series colors as `#RRGGBB`; unparsable entries are skipped.
    pub fn hex_colors(mut self, colors: &[&str]) -> Self {
        self.colors = colors.iter().filter_map(|c| parse_hex_color(c)).collect();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

pub const DEFAULT_WIDTH: u32 = 1000;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Axis description used for emission values.
pub const EMISSIONS_AXIS: &str = "Emissions (kt)";
