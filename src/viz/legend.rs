//! Legend panels drawn next to the plot area: a swatch list for categorical
//! series and a color bar for sequential scales.

use anyhow::Result;
use num_format::Locale;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::wrap_text_to_width;
use super::util::{format_tick, sequential_color};

/// Single-column list of colored swatches with wrapped labels.
pub fn draw_legend_panel<DB: DrawingBackend>(
    legend_area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBAColor)],
    title: &str, // pass "" to omit
) -> Result<()> {
    legend_area
        .fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let (w_u32, _) = legend_area.dim_in_pixel();
    let w = w_u32 as i32;

    let font_px: u32 = 14;
    let title_font_px: u32 = 16;
    let line_h: i32 = font_px as i32 + 2;
    let row_gap: i32 = 6;
    let pad_x: i32 = 6;
    let swatch: i32 = 10;

    let title_style: TextStyle = TextStyle::from((FontFamily::SansSerif, title_font_px))
        .pos(Pos::new(HPos::Left, VPos::Top));
    let label_style: TextStyle =
        TextStyle::from((FontFamily::SansSerif, font_px)).pos(Pos::new(HPos::Left, VPos::Center));

    let mut y = 24;
    if !title.trim().is_empty() {
        legend_area
            .draw(&Text::new(title, (pad_x, y), title_style))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        y += title_font_px as i32 + 10;
    }

    let text_x = pad_x + swatch + 10;
    let max_text_w = (w - text_x - pad_x).max(40) as u32;

    for (label, color) in items {
        let lines = wrap_text_to_width(label, font_px, max_text_w);
        let block_h = (lines.len().max(1) as i32) * line_h;
        let center_y = y + line_h / 2;

        legend_area
            .draw(&Rectangle::new(
                [
                    (pad_x, center_y - swatch / 2),
                    (pad_x + swatch, center_y + swatch / 2),
                ],
                color.filled(),
            ))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        for (i, line) in lines.iter().enumerate() {
            let line_center_y = y + (i as i32) * line_h + line_h / 2;
            legend_area
                .draw(&Text::new(
                    line.as_str(),
                    (text_x, line_center_y),
                    label_style.clone(),
                ))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        y += block_h + row_gap;
    }
    Ok(())
}

/// Vertical color bar from `min` (bottom) to `max` (top) with end labels.
pub fn draw_color_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    min: f64,
    max: f64,
    stops: &[RGBColor],
    caption: &str,
    locale: &Locale,
) -> Result<()> {
    area.fill(&WHITE).map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let (_, h_u32) = area.dim_in_pixel();
    let h = h_u32 as i32;

    let top = 40;
    let bottom = (h - 40).max(top + 10);
    let (x0, x1) = (10, 30);
    let steps = (bottom - top).max(1);

    for i in 0..steps {
        // i = 0 is the top of the bar, i.e. the max value
        let t = 1.0 - i as f64 / steps as f64;
        let y = top + i;
        area.draw(&Rectangle::new(
            [(x0, y), (x1, y + 1)],
            sequential_color(t, stops).filled(),
        ))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    area.draw(&Rectangle::new([(x0, top), (x1, bottom)], BLACK.stroke_width(1)))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let label_style: TextStyle =
        TextStyle::from((FontFamily::SansSerif, 12)).pos(Pos::new(HPos::Left, VPos::Center));
    for (v, y) in [(max, top), ((min + max) / 2.0, (top + bottom) / 2), (min, bottom)] {
        area.draw(&Text::new(
            format_tick(v, locale),
            (x1 + 6, y),
            label_style.clone(),
        ))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    if !caption.is_empty() {
        let caption_style: TextStyle =
            TextStyle::from((FontFamily::SansSerif, 12)).pos(Pos::new(HPos::Left, VPos::Top));
        area.draw(&Text::new(caption, (x0, 12), caption_style))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}
