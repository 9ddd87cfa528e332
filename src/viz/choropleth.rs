//! Choropleth map: country polygons filled on a sequential scale.
//!
//! Coordinates are plotted as plain longitude/latitude (equirectangular).
//! Countries in the boundary set without a value are drawn in the "no data"
//! gray so the map keeps its outline.

use anyhow::{Result, anyhow};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use std::path::Path;

use super::legend::draw_color_bar;
use super::types::ChartOptions;
use super::util::{NO_DATA, ORANGES, map_locale, normalize, sequential_color};
use super::{ensure_fonts_registered, with_backend};
use crate::geo::GeoJoin;

const BORDER: RGBColor = RGBColor(90, 90, 90);

pub fn plot_choropleth<P: AsRef<Path>>(join: &GeoJoin, out_path: P, opts: &ChartOptions) -> Result<()> {
    if join.matched.is_empty() {
        return Err(anyhow!("no country matched the boundary set"));
    }
    let bounds = ring_bounds(join).ok_or_else(|| anyhow!("boundary set has no coordinates"))?;
    let out_path = out_path.as_ref();
    ensure_fonts_registered(opts.font_path.as_deref())?;
    with_backend!(out_path, opts, |root| draw_map(root, join, bounds, opts))?;
    info!(
        "wrote choropleth to {} ({} countries, {} unmapped)",
        out_path.display(),
        join.matched.len(),
        join.unmapped.len()
    );
    Ok(())
}

/// (min_x, max_x, min_y, max_y) over every ring in the join.
fn ring_bounds(join: &GeoJoin) -> Option<(f64, f64, f64, f64)> {
    let matched = join.matched.iter().flat_map(|c| c.rings.iter());
    let background = join.background.iter().flat_map(|c| c.rings.iter());
    matched
        .chain(background)
        .flatten()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .fold(None, |acc, &(x, y)| match acc {
            None => Some((x, x, y, y)),
            Some((x0, x1, y0, y1)) => Some((x0.min(x), x1.max(x), y0.min(y), y1.max(y))),
        })
}

fn draw_map<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    join: &GeoJoin,
    (x0, x1, y0, y1): (f64, f64, f64, f64),
    opts: &ChartOptions,
) -> Result<()> {
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
    let (num_locale, _) = map_locale(&opts.locale);
    let (map_area, bar_area) = root.split_horizontally((88).percent_width());

    let (lo, hi) = join
        .matched
        .iter()
        .map(|c| c.value)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    // keep degenerate extents drawable
    let pad_x = ((x1 - x0) * 0.02).max(0.5);
    let pad_y = ((y1 - y0) * 0.02).max(0.5);

    let mut builder = ChartBuilder::on(&map_area);
    builder.margin(12);
    if !opts.title.trim().is_empty() {
        builder.caption(opts.title.trim(), (FontFamily::SansSerif, 24));
    }
    let mut chart = builder
        .build_cartesian_2d((x0 - pad_x)..(x1 + pad_x), (y0 - pad_y)..(y1 + pad_y))
        .map_err(|e| anyhow!("{:?}", e))?;

    let background = join
        .background
        .iter()
        .flat_map(|shape| shape.rings.iter().map(|ring| (ring, NO_DATA)));
    let matched = join.matched.iter().flat_map(|c| {
        let fill = sequential_color(normalize(c.value, lo, hi), &ORANGES);
        c.rings.iter().map(move |ring| (ring, fill))
    });
    let polygons: Vec<(&Vec<(f64, f64)>, RGBColor)> = background.chain(matched).collect();

    chart
        .draw_series(
            polygons
                .iter()
                .map(|(ring, fill)| Polygon::new((*ring).clone(), fill.filled())),
        )
        .map_err(|e| anyhow!("{:?}", e))?;
    chart
        .draw_series(polygons.iter().map(|(ring, _)| {
            let mut closed = (*ring).clone();
            if let Some(first) = ring.first() {
                closed.push(*first);
            }
            PathElement::new(closed, BORDER.stroke_width(1))
        }))
        .map_err(|e| anyhow!("{:?}", e))?;

    draw_color_bar(&bar_area, lo, hi, &ORANGES, "kt", num_locale)?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{CountryShape, JoinedCountry};

    #[test]
    fn bounds_cover_matched_and_background() {
        let join = GeoJoin {
            matched: vec![JoinedCountry {
                name: "A".into(),
                value: 1.0,
                rings: vec![vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0)]],
            }],
            unmapped: vec![],
            background: vec![CountryShape {
                name: "B".into(),
                rings: vec![vec![(-5.0, -3.0), (-4.0, 8.0), (-4.5, 1.0)]],
            }],
        };
        assert_eq!(ring_bounds(&join), Some((-5.0, 2.0, -3.0, 8.0)));
    }
}
