//! Visualization utilities: render emission charts to **SVG** or **PNG**.
//!
//! - Bar and stacked bar charts (horizontal or vertical) from aggregate tables and cross-tabs
//! - Pie charts of shares
//! - Heat maps with an explicit "no data" color
//! - Choropleth maps from a boundary join
//!
//! The output format follows the file extension: `.svg` uses the SVG backend,
//! anything else the bitmap backend.

pub mod bar;
pub mod choropleth;
pub mod heatmap;
pub mod legend;
pub mod pie;
pub mod text;
pub mod types;
pub mod util;

// Re-export types for public API
pub use bar::{plot_bar, plot_stacked_bar};
pub use choropleth::plot_choropleth;
pub use heatmap::plot_heatmap;
pub use pie::plot_pie;
pub use types::{ChartOptions, EMISSIONS_AXIS, Orientation};

use anyhow::{Result, anyhow};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Font files tried, in order, when no font path is given.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font registered as "sans-serif", once per process.
static REGISTERED_FONT: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Register a "sans-serif" font for the `ab_glyph` text path, which doesn't
/// discover OS fonts. `preferred` is tried before the system locations.
/// Once a font is registered later calls are no-ops.
pub fn ensure_fonts_registered(preferred: Option<&Path>) -> Result<()> {
    let mut registered = REGISTERED_FONT
        .lock()
        .map_err(|_| anyhow!("font registry poisoned"))?;
    if registered.is_some() {
        return Ok(());
    }
    let candidates = preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // ab_glyph keeps a reference for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        if plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            bytes,
        )
        .is_ok()
        {
            debug!("registered chart font {}", path.display());
            *registered = Some(path);
            return Ok(());
        }
    }
    Err(anyhow!(
        "no usable TrueType font found; pass one explicitly (e.g. --font DejaVuSans.ttf)"
    ))
}

/// Evaluate `$draw` with `$root` bound to an SVG or bitmap drawing area,
/// chosen by the extension of `$path`.
macro_rules! with_backend {
    ($path:expr, $opts:expr, |$root:ident| $draw:expr) => {{
        let out_path: &std::path::Path = $path;
        let path_string = out_path.to_string_lossy().into_owned();
        let size = ($opts.width, $opts.height);
        if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
            let $root = plotters_svg::SVGBackend::new(path_string.as_str(), size).into_drawing_area();
            $draw
        } else {
            let $root =
                plotters_bitmap::BitMapBackend::new(path_string.as_str(), size).into_drawing_area();
            $draw
        }
    }};
}
pub(crate) use with_backend;
