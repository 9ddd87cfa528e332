//! Country-name normalization and the join against country boundaries.
//!
//! Boundaries come from a GeoJSON `FeatureCollection` (for example the
//! Natural Earth `admin_0_countries` export), keyed by a name property. The
//! emissions data names a few countries differently, so names are normalized
//! with [`normalize_country`] before joining.

use crate::error::AnalysisError;
use crate::models::Record;
use crate::query::AggregateTable;
use crate::table::Table;
use ahash::AHashMap;
use anyhow::{Context, Result, anyhow, bail};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;

/// Emissions-data name → boundary-data name.
pub const COUNTRY_RENAMES: &[(&str, &str)] = &[("United States", "United States of America")];

/// Feature property holding the country name by default.
pub const DEFAULT_NAME_PROPERTY: &str = "name";

/// Apply [`COUNTRY_RENAMES`]; unknown names pass through unchanged.
pub fn normalize_country(name: &str) -> Cow<'_, str> {
    COUNTRY_RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| Cow::Borrowed(*to))
        .unwrap_or(Cow::Borrowed(name))
}

/// New table with every `country` normalized.
pub fn normalize_countries(table: &Table) -> Table {
    table.map_records(|r| Record {
        country: normalize_country(&r.country).into_owned(),
        ..r.clone()
    })
}

/// Outer rings of one country's polygons, as (longitude, latitude).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryShape {
    pub name: String,
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// Country boundaries indexed by name.
#[derive(Debug, Clone, Default)]
pub struct Boundaries {
    shapes: Vec<CountryShape>,
    index: AHashMap<String, usize>,
}

impl Boundaries {
    pub fn from_geojson_path<P: AsRef<Path>>(path: P, name_property: &str) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading boundaries {}", path.display()))?;
        Self::from_geojson_str(&text, name_property)
            .with_context(|| format!("parsing boundaries {}", path.display()))
    }

    /// Parse a GeoJSON `FeatureCollection` of `Polygon`/`MultiPolygon`
    /// features. Features without the name property or with other geometry
    /// types are skipped.
    pub fn from_geojson_str(text: &str, name_property: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(text)?;
        if doc.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            bail!("expected a GeoJSON FeatureCollection");
        }
        let features = doc
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?;

        let mut out = Boundaries::default();
        for feature in features {
            let Some(name) = feature
                .get("properties")
                .and_then(|p| p.get(name_property))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let Some(geometry) = feature.get("geometry") else {
                continue;
            };
            let rings = parse_rings(geometry)?;
            if rings.is_empty() {
                continue;
            }
            out.insert(CountryShape {
                name: name.to_string(),
                rings,
            });
        }
        Ok(out)
    }

    /// Add a shape; a second shape with the same name extends the first.
    pub fn insert(&mut self, shape: CountryShape) {
        match self.index.get(&shape.name) {
            Some(&i) => self.shapes[i].rings.extend(shape.rings),
            None => {
                self.index.insert(shape.name.clone(), self.shapes.len());
                self.shapes.push(shape);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CountryShape> {
        self.index.get(name).map(|&i| &self.shapes[i])
    }

    pub fn shapes(&self) -> &[CountryShape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn parse_point(v: &Value) -> Result<(f64, f64)> {
    let pair = v.as_array().ok_or_else(|| anyhow!("position is not an array"))?;
    match (
        pair.first().and_then(Value::as_f64),
        pair.get(1).and_then(Value::as_f64),
    ) {
        (Some(lon), Some(lat)) => Ok((lon, lat)),
        _ => bail!("position needs two numbers"),
    }
}

/// Outer ring of a GeoJSON polygon coordinate array.
fn parse_polygon(v: &Value) -> Result<Option<Vec<(f64, f64)>>> {
    let rings = v.as_array().ok_or_else(|| anyhow!("polygon is not an array"))?;
    let Some(outer) = rings.first() else {
        return Ok(None);
    };
    let ring = outer
        .as_array()
        .ok_or_else(|| anyhow!("ring is not an array"))?
        .iter()
        .map(parse_point)
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(ring))
}

fn parse_rings(geometry: &Value) -> Result<Vec<Vec<(f64, f64)>>> {
    let coords = geometry.get("coordinates");
    match (geometry.get("type").and_then(Value::as_str), coords) {
        (Some("Polygon"), Some(c)) => Ok(parse_polygon(c)?.into_iter().collect()),
        (Some("MultiPolygon"), Some(c)) => {
            let polys = c
                .as_array()
                .ok_or_else(|| anyhow!("multipolygon is not an array"))?;
            let mut rings = Vec::with_capacity(polys.len());
            for p in polys {
                rings.extend(parse_polygon(p)?);
            }
            Ok(rings)
        }
        _ => Ok(Vec::new()),
    }
}

/// A country with data and a boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedCountry {
    pub name: String,
    pub value: f64,
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// Result of joining a per-country aggregate against boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoJoin {
    /// In aggregate-table order.
    pub matched: Vec<JoinedCountry>,
    /// Countries with data but no boundary; left off the map.
    pub unmapped: Vec<String>,
    /// Boundaries without data, for drawing as background.
    pub background: Vec<CountryShape>,
}

/// Join aggregate values (keyed by country name) to boundaries.
///
/// Keys are used as given; normalize the table with [`normalize_countries`]
/// before aggregating. Unmatched countries are logged and listed in
/// [`GeoJoin::unmapped`]; the join itself never fails.
pub fn join(values: &AggregateTable, boundaries: &Boundaries) -> GeoJoin {
    let mut out = GeoJoin::default();
    let mut used = vec![false; boundaries.len()];

    for row in values {
        let name = row.key.label();
        match boundaries.index.get(&name) {
            Some(&i) => {
                used[i] = true;
                out.matched.push(JoinedCountry {
                    name,
                    value: row.value,
                    rings: boundaries.shapes[i].rings.clone(),
                });
            }
            None => {
                warn!("{}", AnalysisError::UnmappedJoinKey { country: name.clone() });
                out.unmapped.push(name);
            }
        }
    }
    out.background = boundaries
        .shapes
        .iter()
        .zip(used)
        .filter(|(_, u)| !u)
        .map(|(s, _)| s.clone())
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_only_mapped_names() {
        assert_eq!(normalize_country("United States"), "United States of America");
        assert_eq!(normalize_country("United States of America"), "United States of America");
        assert_eq!(normalize_country("Russia"), "Russia");
    }

    #[test]
    fn polygon_and_multipolygon_rings() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "A"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
                {"type": "Feature", "properties": {"name": "B"},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[2,2],[3,2],[3,3],[2,2]]],
                    [[[4,4],[5,4],[5,5],[4,4]]]
                 ]}},
                {"type": "Feature", "properties": {"name": "P"},
                 "geometry": {"type": "Point", "coordinates": [9,9]}}
            ]
        }"#;
        let b = Boundaries::from_geojson_str(text, "name").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b.get("A").unwrap().rings[0].len(), 4);
        assert_eq!(b.get("B").unwrap().rings.len(), 2);
        assert!(b.get("P").is_none());
    }

    #[test]
    fn rejects_non_collections() {
        assert!(Boundaries::from_geojson_str(r#"{"type":"Feature"}"#, "name").is_err());
    }
}
