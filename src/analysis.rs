//! The named analyses of the methane study, as pure functions over a [`Table`].
//!
//! Every function builds its result fresh from the table; [`Report::build`]
//! runs them all and [`Report::render`] turns the figures into commentary.

use crate::crosstab::{CrossTab, cross_tab};
use crate::error::AnalysisError;
use crate::geo::normalize_countries;
use crate::models::{ALL_REASONS, Column, EmissionType, TOTAL_SEGMENT, WORLD};
use crate::query::{AggFn, AggregateTable, Predicate, Query, aggregate};
use crate::summary::{self, Extremum, Summary};
use crate::table::Table;
use crate::viz::util::map_locale;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Number of top emitters compared by default.
pub const TOP_EMITTER_COUNT: usize = 5;

/// Energy segment whose leak causes are compared.
pub const PIPELINE_SEGMENT: &str = "Gas pipelines and LNG facilities";

/// Types compared head-to-head for the top emitters.
pub const HEADLINE_TYPES: [EmissionType; 2] = [EmissionType::Agriculture, EmissionType::Energy];

/// `segment = Total AND reason = All`: one row per (country, type).
fn totals_only() -> Predicate {
    Predicate::new()
        .eq(Column::Segment, TOTAL_SEGMENT)
        .eq(Column::Reason, ALL_REASONS)
}

fn type_names(kinds: &[EmissionType]) -> Vec<String> {
    kinds.iter().map(|k| k.as_str().to_string()).collect()
}

/// World total per emission type, largest first.
pub fn world_by_type(table: &Table) -> AggregateTable {
    let query = Query::new()
        .with_predicate(totals_only().eq(Column::Region, WORLD))
        .group_by(Column::Type);
    aggregate(table, &query).sorted_desc()
}

/// Per-region totals of one type (World excluded), largest first.
pub fn region_totals(table: &Table, kind: EmissionType) -> AggregateTable {
    let query = Query::new()
        .with_predicate(totals_only().eq(Column::Type, kind.as_str()))
        .group_by(Column::Region);
    aggregate(table, &query).sorted_desc()
}

/// The `n` countries with the highest all-type totals (World excluded).
pub fn top_emitters(table: &Table, n: usize) -> Vec<String> {
    let query = Query::new()
        .with_predicate(totals_only())
        .group_by(Column::Country);
    aggregate(table, &query).sorted_desc().head(n).labels()
}

/// Country × type totals for `countries`, restricted to `kinds`. Rows are
/// sorted by country name.
pub fn type_totals_for(table: &Table, countries: &[String], kinds: &[EmissionType]) -> CrossTab {
    let predicate = totals_only()
        .one_of(Column::Country, countries.iter().cloned())
        .one_of(Column::Type, type_names(kinds));
    cross_tab(table, &predicate, Column::Country, Column::Type, AggFn::Sum).sort_rows()
}

/// Highest emitter of `kind` among `countries`, considering only rows of
/// that type.
pub fn top_country_for(
    table: &Table,
    countries: &[String],
    kind: EmissionType,
) -> Result<Extremum, AnalysisError> {
    let query = Query::new()
        .with_predicate(
            totals_only()
                .eq(Column::Type, kind.as_str())
                .one_of(Column::Country, countries.iter().cloned()),
        )
        .group_by(Column::Country);
    summary::max(&aggregate(table, &query))
}

/// Type × country totals for `countries` (heat-map layout), columns sorted
/// by country name.
pub fn type_by_country(table: &Table, countries: &[String]) -> CrossTab {
    let predicate = totals_only().one_of(Column::Country, countries.iter().cloned());
    cross_tab(table, &predicate, Column::Type, Column::Country, AggFn::Sum).sort_columns()
}

/// Country × reason totals of one energy segment for `countries`.
pub fn segment_reasons(table: &Table, countries: &[String], segment: &str) -> CrossTab {
    let predicate = Predicate::new()
        .eq(Column::Type, EmissionType::Energy.as_str())
        .eq(Column::Segment, segment)
        .one_of(Column::Country, countries.iter().cloned());
    cross_tab(table, &predicate, Column::Country, Column::Reason, AggFn::Sum).sort_rows()
}

/// Per-country totals of one type with country names normalized for the
/// boundary join, smallest first.
pub fn country_totals(table: &Table, kind: EmissionType) -> AggregateTable {
    let normalized = normalize_countries(table);
    let query = Query::new()
        .with_predicate(totals_only().eq(Column::Type, kind.as_str()))
        .group_by(Column::Country);
    aggregate(&normalized, &query).sorted_asc()
}

/// Knobs for [`Report::build`].
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Countries to compare; `None` picks the top emitters.
    pub countries: Option<Vec<String>>,
    pub top_n: usize,
    pub segment: String,
    pub map_type: EmissionType,
    pub locale: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            countries: None,
            top_n: TOP_EMITTER_COUNT,
            segment: PIPELINE_SEGMENT.to_string(),
            map_type: EmissionType::Agriculture,
            locale: "en".to_string(),
        }
    }
}

/// Per-region totals of one type and their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBreakdown {
    pub kind: EmissionType,
    pub totals: AggregateTable,
    /// `None` when the type has no regional rows.
    pub summary: Option<Summary>,
}

/// Largest emitter of a type among the compared countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeLeader {
    pub kind: EmissionType,
    pub leader: Option<Extremum>,
}

/// All figures of the study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub world_by_type: AggregateTable,
    pub world_total: f64,
    pub regions: Vec<RegionBreakdown>,
    pub countries: Vec<String>,
    pub leaders: Vec<TypeLeader>,
    pub headline_types: CrossTab,
    pub type_by_country: CrossTab,
    pub segment: String,
    pub segment_reasons: CrossTab,
    pub map_type: EmissionType,
    pub country_totals: AggregateTable,
}

impl Report {
    pub fn build(table: &Table, opts: &ReportOptions) -> Report {
        let world = world_by_type(table);
        let world_total = world.total();

        let regions = HEADLINE_TYPES
            .iter()
            .map(|&kind| {
                let totals = region_totals(table, kind);
                let summary = summary::summarize(&totals).ok();
                RegionBreakdown {
                    kind,
                    totals,
                    summary,
                }
            })
            .collect();

        let countries = opts
            .countries
            .clone()
            .unwrap_or_else(|| top_emitters(table, opts.top_n));

        let leaders = HEADLINE_TYPES
            .iter()
            .map(|&kind| TypeLeader {
                kind,
                leader: top_country_for(table, &countries, kind).ok(),
            })
            .collect();

        Report {
            world_by_type: world,
            world_total,
            regions,
            leaders,
            headline_types: type_totals_for(table, &countries, &HEADLINE_TYPES),
            type_by_country: type_by_country(table, &countries),
            segment: opts.segment.clone(),
            segment_reasons: segment_reasons(table, &countries, &opts.segment),
            map_type: opts.map_type,
            country_totals: country_totals(table, opts.map_type),
            countries,
        }
    }

    /// Prose commentary with numbers formatted for `locale_tag`.
    pub fn render(&self, locale_tag: &str) -> String {
        let (locale, _) = map_locale(locale_tag);
        let kt = |v: f64| format_kt(v, locale);
        let mut out = String::new();

        // writes to a String cannot fail
        let _ = writeln!(out, "## World methane emissions by type");
        match summary::max(&self.world_by_type) {
            Ok(top) => {
                let _ = writeln!(
                    out,
                    "{} is the largest source at {} ({:.1}% of {}).",
                    top.label,
                    kt(top.value),
                    share(top.value, self.world_total),
                    kt(self.world_total)
                );
                for row in &self.world_by_type {
                    let _ = writeln!(
                        out,
                        "- {}: {} ({:.1}%)",
                        row.key,
                        kt(row.value),
                        share(row.value, self.world_total)
                    );
                }
            }
            Err(_) => {
                let _ = writeln!(out, "No world totals in the data.");
            }
        }

        for region in &self.regions {
            let _ = writeln!(out, "\n## {} emissions per region", region.kind);
            match &region.summary {
                Some(s) => {
                    let _ = writeln!(
                        out,
                        "{} emits the most ({}), {} the least ({}). \
                         Across {} regions the mean is {} and the median {}.",
                        s.max.label,
                        kt(s.max.value),
                        s.min.label,
                        kt(s.min.value),
                        s.count,
                        kt(s.mean),
                        kt(s.median)
                    );
                }
                None => {
                    let _ = writeln!(out, "No regional {} rows in the data.", region.kind);
                }
            }
        }

        let _ = writeln!(out, "\n## Compared countries");
        let _ = writeln!(out, "{}", self.countries.join(", "));
        for l in &self.leaders {
            match &l.leader {
                Some(e) => {
                    let _ = writeln!(out, "- Top {} emitter: {} ({})", l.kind, e.label, kt(e.value));
                }
                None => {
                    let _ = writeln!(out, "- Top {} emitter: no data", l.kind);
                }
            }
        }
        for (country, total) in self.headline_types.row_totals() {
            let _ = writeln!(out, "- {country}: {} from agriculture and energy", kt(total));
        }

        let _ = writeln!(out, "\n## Emission types of the compared countries");
        match self.type_by_country.max_cell() {
            Some(cell) => {
                let _ = writeln!(out, "Largest single figure: {} ({}).", cell.label, kt(cell.value));
            }
            None => {
                let _ = writeln!(out, "No type totals for the compared countries.");
            }
        }

        let _ = writeln!(out, "\n## {} by reason", self.segment);
        if self.segment_reasons.is_empty() {
            let _ = writeln!(out, "No rows for this segment.");
        }
        for (r, country) in self.segment_reasons.row_labels.iter().enumerate() {
            let parts: Vec<String> = self
                .segment_reasons
                .col_labels
                .iter()
                .zip(&self.segment_reasons.cells[r])
                .map(|(reason, cell)| match cell {
                    Some(v) => format!("{reason} {}", kt(*v)),
                    None => format!("{reason} n/a"),
                })
                .collect();
            let _ = writeln!(out, "- {country}: {}", parts.join(", "));
        }

        let _ = writeln!(out, "\n## {} emissions by country", self.map_type);
        match summary::max(&self.country_totals) {
            Ok(top) => {
                let _ = writeln!(
                    out,
                    "{} countries report {} emissions; {} leads with {}.",
                    self.country_totals.len(),
                    self.map_type.as_str().to_lowercase(),
                    top.label,
                    kt(top.value)
                );
            }
            Err(_) => {
                let _ = writeln!(out, "No country rows for {}.", self.map_type);
            }
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("en"))
    }
}

fn share(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}

/// Kilotons with thousands separators: whole numbers from 100 kt up, one
/// decimal below.
pub fn format_kt(v: f64, locale: &Locale) -> String {
    if !v.is_finite() {
        return "NA".to_string();
    }
    if v.abs() >= 100.0 {
        let n = v.round() as i64;
        format!("{} kt", n.to_formatted_string(locale))
    } else {
        let s = format!("{:.1}", v);
        let s = if locale.decimal() == "." {
            s
        } else {
            s.replace('.', locale.decimal())
        };
        format!("{s} kt")
    }
}
