//! Bar and stacked bar charts.
//!
//! A plain bar chart is drawn as a stack with a single series, so both share
//! one drawing routine. Missing cross-tab cells contribute no segment;
//! negative values are clamped to zero.

use anyhow::{Result, anyhow};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use std::path::Path;

use super::legend::draw_legend_panel;
use super::text::truncate_to_width;
use super::types::{ChartOptions, EMISSIONS_AXIS, Orientation};
use super::util::{
    category_label_area_px, format_tick, map_locale, series_color, value_axis_max,
};
use super::{ensure_fonts_registered, with_backend};
use crate::crosstab::CrossTab;
use crate::query::AggregateTable;

const LABEL_FONT_PX: u32 = 12;

/// One bar per row of `table`, first row at the top (horizontal) or left (vertical).
pub fn plot_bar<P: AsRef<Path>>(
    table: &AggregateTable,
    out_path: P,
    opts: &ChartOptions,
    orientation: Orientation,
) -> Result<()> {
    if table.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    let categories = table.labels();
    let series = vec![EMISSIONS_AXIS.to_string()];
    let cells: Vec<Vec<Option<f64>>> = table.values().into_iter().map(|v| vec![Some(v)]).collect();
    render(&categories, &series, &cells, out_path.as_ref(), opts, orientation)
}

/// One bar per cross-tab row, stacked by column, with a legend of the columns.
pub fn plot_stacked_bar<P: AsRef<Path>>(
    tab: &CrossTab,
    out_path: P,
    opts: &ChartOptions,
    orientation: Orientation,
) -> Result<()> {
    if tab.is_empty() {
        return Err(anyhow!("no data to plot"));
    }
    render(
        &tab.row_labels,
        &tab.col_labels,
        &tab.cells,
        out_path.as_ref(),
        opts,
        orientation,
    )
}

fn render(
    categories: &[String],
    series: &[String],
    cells: &[Vec<Option<f64>>],
    out_path: &Path,
    opts: &ChartOptions,
    orientation: Orientation,
) -> Result<()> {
    ensure_fonts_registered(opts.font_path.as_deref())?;
    with_backend!(out_path, opts, |root| draw_bars(
        root,
        categories,
        series,
        cells,
        opts,
        orientation
    ))?;
    info!("wrote bar chart to {}", out_path.display());
    Ok(())
}

/// (category index, series index, low, high) for every present cell.
fn stack_segments(cells: &[Vec<Option<f64>>]) -> (Vec<(usize, usize, f64, f64)>, f64) {
    let mut segments = Vec::new();
    let mut max_total = 0.0f64;
    for (i, row) in cells.iter().enumerate() {
        let mut cum = 0.0;
        for (j, cell) in row.iter().enumerate() {
            if let Some(v) = cell {
                let v = v.max(0.0);
                segments.push((i, j, cum, cum + v));
                cum += v;
            }
        }
        max_total = max_total.max(cum);
    }
    (segments, max_total)
}

fn draw_bars<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    categories: &[String],
    series: &[String],
    cells: &[Vec<Option<f64>>],
    opts: &ChartOptions,
    orientation: Orientation,
) -> Result<()> {
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    let (num_locale, _) = map_locale(&opts.locale);
    let stacked = series.len() > 1;

    let (plot_area, legend_area) = if stacked {
        let (plot, legend) = root.split_horizontally((80).percent_width());
        (plot, Some(legend))
    } else {
        (root.clone(), None)
    };

    let (segments, max_total) = stack_segments(cells);
    let vmax = value_axis_max(max_total);
    let n = categories.len() as i32;
    let value_fmt = |v: &f64| format_tick(*v, num_locale);

    let mut builder = ChartBuilder::on(&plot_area);
    builder.margin(16);
    if !opts.title.trim().is_empty() {
        builder.caption(opts.title.trim(), (FontFamily::SansSerif, 24));
    }

    match orientation {
        Orientation::Horizontal => {
            let labels: Vec<String> = categories
                .iter()
                .map(|c| truncate_to_width(c, LABEL_FONT_PX, 240))
                .collect();
            // slot 0 is the bottom; the first category goes on top
            let slot_label = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(s) if (0..n).contains(s) => {
                    labels[(n - 1 - s) as usize].clone()
                }
                _ => String::new(),
            };
            let mut chart = builder
                .set_label_area_size(LabelAreaPosition::Left, category_label_area_px(&labels, LABEL_FONT_PX))
                .set_label_area_size(LabelAreaPosition::Bottom, 48)
                .build_cartesian_2d(0f64..vmax, (0..n).into_segmented())
                .map_err(|e| anyhow!("{:?}", e))?;
            chart
                .configure_mesh()
                .disable_y_mesh()
                .x_desc(opts.x_desc.as_str())
                .y_desc(opts.y_desc.as_str())
                .x_labels(8)
                .y_labels(categories.len())
                .x_label_formatter(&value_fmt)
                .y_label_formatter(&slot_label)
                .label_style((FontFamily::SansSerif, LABEL_FONT_PX))
                .axis_desc_style((FontFamily::SansSerif, 16))
                .draw()
                .map_err(|e| anyhow!("{:?}", e))?;
            chart
                .draw_series(segments.iter().map(|&(i, j, lo, hi)| {
                    let slot = n - 1 - i as i32;
                    let mut bar = Rectangle::new(
                        [(lo, SegmentValue::Exact(slot)), (hi, SegmentValue::Exact(slot + 1))],
                        series_color(&opts.colors, j).filled(),
                    );
                    bar.set_margin(4, 4, 0, 0);
                    bar
                }))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        Orientation::Vertical => {
            let (w, _) = plot_area.dim_in_pixel();
            let slot_px = ((w as f64 * 0.85) / n.max(1) as f64) as u32;
            let labels: Vec<String> = categories
                .iter()
                .map(|c| truncate_to_width(c, LABEL_FONT_PX, slot_px.saturating_sub(8).max(40)))
                .collect();
            let slot_label = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(s) if (0..n).contains(s) => labels[*s as usize].clone(),
                _ => String::new(),
            };
            let mut chart = builder
                .set_label_area_size(LabelAreaPosition::Left, 72)
                .set_label_area_size(LabelAreaPosition::Bottom, 48)
                .build_cartesian_2d((0..n).into_segmented(), 0f64..vmax)
                .map_err(|e| anyhow!("{:?}", e))?;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(opts.x_desc.as_str())
                .y_desc(opts.y_desc.as_str())
                .x_labels(categories.len())
                .y_labels(8)
                .x_label_formatter(&slot_label)
                .y_label_formatter(&value_fmt)
                .label_style((FontFamily::SansSerif, LABEL_FONT_PX))
                .axis_desc_style((FontFamily::SansSerif, 16))
                .draw()
                .map_err(|e| anyhow!("{:?}", e))?;
            chart
                .draw_series(segments.iter().map(|&(i, j, lo, hi)| {
                    let slot = i as i32;
                    let mut bar = Rectangle::new(
                        [(SegmentValue::Exact(slot), lo), (SegmentValue::Exact(slot + 1), hi)],
                        series_color(&opts.colors, j).filled(),
                    );
                    bar.set_margin(0, 0, 6, 6);
                    bar
                }))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    if let Some(ref legend_area) = legend_area {
        let items: Vec<(String, RGBAColor)> = series
            .iter()
            .enumerate()
            .map(|(j, s)| (s.clone(), series_color(&opts.colors, j)))
            .collect();
        draw_legend_panel(legend_area, &items, "")?;
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
