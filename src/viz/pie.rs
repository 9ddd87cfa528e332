use anyhow::{Result, anyhow};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::Path;

use super::legend::draw_legend_panel;
use super::types::ChartOptions;
use super::util::series_color;
use super::{ensure_fonts_registered, with_backend};
use crate::query::AggregateTable;

/// Fraction of the radius by which the largest slice is pulled out.
const EXPLODE: f64 = 0.1;

/// Pie of the table's shares; slices start at 12 o'clock and run clockwise in
/// table order. Non-positive values get no slice.
pub fn plot_pie<P: AsRef<Path>>(
    table: &AggregateTable,
    out_path: P,
    opts: &ChartOptions,
) -> Result<()> {
    let slices = pie_slices(&table.values());
    if slices.is_empty() {
        return Err(anyhow!("no positive values to plot"));
    }
    let out_path = out_path.as_ref();
    ensure_fonts_registered(opts.font_path.as_deref())?;
    let labels = table.labels();
    with_backend!(out_path, opts, |root| draw_pie(root, &labels, &slices, opts))?;
    info!("wrote pie chart to {}", out_path.display());
    Ok(())
}

/// A slice: source index, start/end angle in radians, share in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Slice {
    idx: usize,
    start: f64,
    end: f64,
    pct: f64,
}

fn pie_slices(values: &[f64]) -> Vec<Slice> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total.is_nan() || total <= 0.0 {
        return Vec::new();
    }
    let mut angle = 0.0;
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0.0)
        .map(|(idx, v)| {
            let sweep = v / total * TAU;
            let s = Slice {
                idx,
                start: angle,
                end: angle + sweep,
                pct: v / total * 100.0,
            };
            angle += sweep;
            s
        })
        .collect()
}

/// Pixel position at `angle` (0 = 12 o'clock, clockwise) and `r` from `center`.
fn polar(center: (i32, i32), r: f64, angle: f64) -> (i32, i32) {
    let a = angle - FRAC_PI_2;
    (
        center.0 + (r * a.cos()).round() as i32,
        center.1 + (r * a.sin()).round() as i32,
    )
}

fn draw_pie<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    labels: &[String],
    slices: &[Slice],
    opts: &ChartOptions,
) -> Result<()> {
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    let (plot_area, legend_area) = root.split_horizontally((75).percent_width());
    let plot_area = if opts.title.trim().is_empty() {
        plot_area
    } else {
        plot_area
            .titled(opts.title.trim(), (FontFamily::SansSerif, 24))
            .map_err(|e| anyhow!("{:?}", e))?
    };

    let (w, h) = plot_area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = (w.min(h) as f64) * 0.36;

    let largest = slices
        .iter()
        .max_by(|a, b| a.pct.partial_cmp(&b.pct).unwrap_or(std::cmp::Ordering::Equal))
        .map(|s| s.idx);

    let pct_style: TextStyle = TextStyle::from((FontFamily::SansSerif, 14))
        .pos(Pos::new(HPos::Center, VPos::Center))
        .color(&BLACK);

    for s in slices {
        let mid = (s.start + s.end) / 2.0;
        let c = if Some(s.idx) == largest && slices.len() > 1 {
            polar(center, radius * EXPLODE, mid)
        } else {
            center
        };

        let steps = (((s.end - s.start) / TAU * 180.0).ceil() as usize).max(2);
        let mut points = Vec::with_capacity(steps + 2);
        points.push(c);
        for k in 0..=steps {
            let a = s.start + (s.end - s.start) * k as f64 / steps as f64;
            points.push(polar(c, radius, a));
        }

        let color = series_color(&opts.colors, s.idx);
        plot_area
            .draw(&Polygon::new(points.clone(), color.filled()))
            .map_err(|e| anyhow!("{:?}", e))?;
        points.push(c);
        plot_area
            .draw(&PathElement::new(points, WHITE.stroke_width(2)))
            .map_err(|e| anyhow!("{:?}", e))?;

        if s.pct >= 2.0 {
            plot_area
                .draw(&Text::new(
                    format!("{:.1}%", s.pct),
                    polar(c, radius * 0.62, mid),
                    pct_style.clone(),
                ))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    let items: Vec<(String, RGBAColor)> = slices
        .iter()
        .map(|s| {
            (
                labels.get(s.idx).cloned().unwrap_or_default(),
                series_color(&opts.colors, s.idx),
            )
        })
        .collect();
    draw_legend_panel(&legend_area, &items, "")?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
