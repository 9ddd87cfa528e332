use anyhow::{Result, anyhow};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use super::legend::draw_color_bar;
use super::text::truncate_to_width;
use super::types::ChartOptions;
use super::util::{
    NO_DATA, YL_GN_BU, category_label_area_px, format_tick, map_locale, normalize,
    sequential_color,
};
use super::{ensure_fonts_registered, with_backend};
use crate::crosstab::CrossTab;

/// Heat map of a cross-tab: rows top to bottom, columns left to right.
/// Cells without data are drawn in a neutral gray outside the color scale.
pub fn plot_heatmap<P: AsRef<Path>>(tab: &CrossTab, out_path: P, opts: &ChartOptions) -> Result<()> {
    let (lo, hi) = value_range(tab).ok_or_else(|| anyhow!("no data to plot"))?;
    let out_path = out_path.as_ref();
    ensure_fonts_registered(opts.font_path.as_deref())?;
    with_backend!(out_path, opts, |root| draw_heatmap(root, tab, lo, hi, opts))?;
    info!("wrote heat map to {}", out_path.display());
    Ok(())
}

/// Min and max over present cells.
fn value_range(tab: &CrossTab) -> Option<(f64, f64)> {
    tab.cells
        .iter()
        .flatten()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn draw_heatmap<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    tab: &CrossTab,
    lo: f64,
    hi: f64,
    opts: &ChartOptions,
) -> Result<()> {
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    let (num_locale, _) = map_locale(&opts.locale);
    let (plot_area, bar_area) = root.split_horizontally((88).percent_width());

    let n_rows = tab.row_labels.len() as i32;
    let n_cols = tab.col_labels.len() as i32;
    let row_labels: Vec<String> = tab
        .row_labels
        .iter()
        .map(|l| truncate_to_width(l, 12, 200))
        .collect();
    let (w, _) = plot_area.dim_in_pixel();
    let col_px = ((w as f64 * 0.8) / n_cols.max(1) as f64) as u32;
    let col_labels: Vec<String> = tab
        .col_labels
        .iter()
        .map(|l| truncate_to_width(l, 12, col_px.saturating_sub(6).max(40)))
        .collect();

    // slot 0 is the bottom; the first row goes on top
    let row_of_slot = |s: i32| (n_rows - 1 - s) as usize;
    let y_fmt = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(s) if (0..n_rows).contains(s) => row_labels[row_of_slot(*s)].clone(),
        _ => String::new(),
    };
    let x_fmt = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(c) if (0..n_cols).contains(c) => col_labels[*c as usize].clone(),
        _ => String::new(),
    };

    let mut builder = ChartBuilder::on(&plot_area);
    builder.margin(16);
    if !opts.title.trim().is_empty() {
        builder.caption(opts.title.trim(), (FontFamily::SansSerif, 24));
    }
    let mut chart = builder
        .set_label_area_size(LabelAreaPosition::Left, category_label_area_px(&row_labels, 12))
        .set_label_area_size(LabelAreaPosition::Bottom, 48)
        .build_cartesian_2d((0..n_cols).into_segmented(), (0..n_rows).into_segmented())
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(opts.x_desc.as_str())
        .y_desc(opts.y_desc.as_str())
        .x_labels(tab.col_labels.len())
        .y_labels(tab.row_labels.len())
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 16))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    let mut cells = Vec::new();
    for (r, row) in tab.cells.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            cells.push((c as i32, n_rows - 1 - r as i32, *cell));
        }
    }

    chart
        .draw_series(cells.iter().map(|&(x, y, cell)| {
            let fill = match cell {
                Some(v) => sequential_color(normalize(v, lo, hi), &YL_GN_BU),
                None => NO_DATA,
            };
            Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                fill.filled(),
            )
        }))
        .map_err(|e| anyhow!("{:?}", e))?;

    let centered: TextStyle = TextStyle::from((FontFamily::SansSerif, 12))
        .pos(Pos::new(HPos::Center, VPos::Center));
    let dark = centered.color(&BLACK);
    let light = centered.color(&WHITE);
    chart
        .draw_series(cells.iter().map(|&(x, y, cell)| {
            let (text, style) = match cell {
                Some(v) if normalize(v, lo, hi) > 0.6 => (format_tick(v, num_locale), &light),
                Some(v) => (format_tick(v, num_locale), &dark),
                None => ("n/a".to_string(), &dark),
            };
            Text::new(
                text,
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                style.clone(),
            )
        }))
        .map_err(|e| anyhow!("{:?}", e))?;

    draw_color_bar(&bar_area, lo, hi, &YL_GN_BU, "kt", num_locale)?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    #[test]
    fn range_ignores_missing_cells() {
        let tab = CrossTab {
            row_dim: Column::Type,
            col_dim: Column::Country,
            row_labels: vec!["Energy".into(), "Waste".into()],
            col_labels: vec!["A".into(), "B".into()],
            cells: vec![vec![Some(3.0), None], vec![None, Some(-2.0)]],
        };
        assert_eq!(value_range(&tab), Some((-2.0, 3.0)));

        let empty = CrossTab {
            cells: vec![vec![None, None], vec![None, None]],
            ..tab
        };
        assert_eq!(value_range(&empty), None);
    }
}
