//! Filter/aggregate engine.
//!
//! A [`Query`] is a conjunction of column conditions, a list of group-by
//! columns and an aggregation function. [`aggregate`] evaluates it over a
//! [`Table`] and returns an [`AggregateTable`] whose rows keep the order in
//! which each group was first seen in the source table.
//!
//! ### Example
//! ```
//! use methane_rs::models::{Column, Record, EmissionType};
//! use methane_rs::query::{aggregate, Query};
//! use methane_rs::table::Table;
//!
//! let rec = |region: &str, v: f64| Record {
//!     country: region.into(),
//!     region: region.into(),
//!     kind: EmissionType::Agriculture,
//!     segment: "Total".into(),
//!     reason: "All".into(),
//!     emissions: v,
//! };
//! let table = Table::new(vec![rec("World", 100.0), rec("Asia", 60.0), rec("Europe", 40.0)]);
//! let by_region = aggregate(
//!     &table,
//!     &Query::new()
//!         .filter_eq(Column::Type, "Agriculture")
//!         .group_by(Column::Region),
//! );
//! assert_eq!(by_region.len(), 2); // World is excluded
//! ```

use crate::error::AnalysisError;
use crate::models::{Column, GroupKey, Record, WORLD};
use crate::table::Table;
use ahash::AHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// One test over a text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// `column == value`
    Eq(Column, String),
    /// `column ∈ values`
    In(Column, Vec<String>),
}

impl Condition {
    pub fn column(&self) -> Column {
        match self {
            Condition::Eq(c, _) | Condition::In(c, _) => *c,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::Eq(c, v) => record.field(*c) == v,
            Condition::In(c, vs) => {
                let field = record.field(*c);
                vs.iter().any(|v| v == field)
            }
        }
    }
}

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_]+)\s*=\s*(.*?)\s*$").expect("static regex compiles")
});

/// Parses `column=value` or `column=v1|v2|v3`.
impl FromStr for Condition {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CONDITION_RE
            .captures(s)
            .ok_or_else(|| AnalysisError::InvalidPredicate(s.to_string()))?;
        let column: Column = caps[1].parse()?;
        let values: Vec<String> = caps[2]
            .split('|')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        match values.len() {
            0 => Err(AnalysisError::InvalidPredicate(s.to_string())),
            1 => Ok(Condition::Eq(column, values.into_iter().next().unwrap_or_default())),
            _ => Ok(Condition::In(column, values)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Eq(c, v) => write!(f, "{c}={v}"),
            Condition::In(c, vs) => write!(f, "{c}={}", vs.join("|")),
        }
    }
}

/// Conjunction of [`Condition`]s. The empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, column: Column, value: impl Into<String>) -> Self {
        self.and(Condition::Eq(column, value.into()))
    }

    pub fn one_of<I, S>(self, column: Column, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.and(Condition::In(
            column,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Parse a list of `column=value` expressions into a conjunction.
    pub fn parse_all<S: AsRef<str>>(exprs: &[S]) -> Result<Self, AnalysisError> {
        exprs
            .iter()
            .map(|e| e.as_ref().parse::<Condition>())
            .collect::<Result<Vec<_>, _>>()
            .map(|conditions| Predicate { conditions })
    }
}

impl FromIterator<Condition> for Predicate {
    fn from_iter<T: IntoIterator<Item = Condition>>(iter: T) -> Self {
        Predicate {
            conditions: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("(all rows)");
        }
        let parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join(" AND "))
    }
}

/// How the `emissions` values of a group are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    #[default]
    Sum,
    Mean,
    Count,
}

impl FromStr for AggFn {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggFn::Sum),
            "mean" | "avg" => Ok(AggFn::Mean),
            "count" => Ok(AggFn::Count),
            other => Err(AnalysisError::InvalidPredicate(format!("aggregation {other}"))),
        }
    }
}

/// Neumaier-compensated running sum, fed in a fixed order.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    sum: f64,
    compensation: f64,
    count: usize,
}

impl Accumulator {
    pub(crate) fn push(&mut self, v: f64) {
        let t = self.sum + v;
        if self.sum.abs() >= v.abs() {
            self.compensation += (self.sum - t) + v;
        } else {
            self.compensation += (v - t) + self.sum;
        }
        self.sum = t;
        self.count += 1;
    }

    pub(crate) fn total(&self) -> f64 {
        self.sum + self.compensation
    }

    pub(crate) fn finish(&self, agg: AggFn) -> f64 {
        match agg {
            AggFn::Sum => self.total(),
            AggFn::Mean => self.total() / self.count as f64,
            AggFn::Count => self.count as f64,
        }
    }
}

/// Compensated sum of `values` in iteration order.
pub fn stable_sum<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut acc = Accumulator::default();
    values.into_iter().for_each(|v| acc.push(v));
    acc.total()
}

/// Filter + group-by + aggregation specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub predicate: Predicate,
    pub group_by: Vec<Column>,
    pub agg: AggFn,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.predicate = self.predicate.and(condition);
        self
    }

    pub fn filter_eq(self, column: Column, value: impl Into<String>) -> Self {
        self.filter(Condition::Eq(column, value.into()))
    }

    pub fn filter_in<I, S>(self, column: Column, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(Condition::In(
            column,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn group_by(mut self, column: Column) -> Self {
        self.group_by.push(column);
        self
    }

    pub fn agg(mut self, agg: AggFn) -> Self {
        self.agg = agg;
        self
    }

    /// Caller predicate, then the `World` post-filter for every geographic
    /// grouping column.
    pub(crate) fn admits(&self, record: &Record) -> bool {
        self.predicate.matches(record) && !excluded_as_world(record, &self.group_by)
    }
}

/// True when a geographic column among `dims` holds the `World` sentinel.
pub(crate) fn excluded_as_world(record: &Record, dims: &[Column]) -> bool {
    dims.iter()
        .any(|c| c.is_geographic() && record.field(*c) == WORLD)
}

/// One group of an [`AggregateTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub value: f64,
}

/// Group key → aggregated value, in a defined order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTable {
    group_by: Vec<Column>,
    rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn new(group_by: Vec<Column>, rows: Vec<AggregateRow>) -> Self {
        Self { group_by, rows }
    }

    /// Single-column table from `(label, value)` pairs, in the given order.
    pub fn from_pairs<I, S>(column: Column, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let rows = pairs
            .into_iter()
            .map(|(label, value)| AggregateRow {
                key: GroupKey::single(label),
                value,
            })
            .collect();
        Self::new(vec![column], rows)
    }

    pub fn group_by(&self) -> &[Column] {
        &self.group_by
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AggregateRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &GroupKey) -> Option<f64> {
        self.rows.iter().find(|r| &r.key == key).map(|r| r.value)
    }

    /// Lookup by human label (see [`GroupKey::label`]).
    pub fn get_label(&self, label: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.key.label() == label)
            .map(|r| r.value)
    }

    /// The whole-set value of a query without group-by columns.
    pub fn scalar(&self) -> Option<f64> {
        if self.group_by.is_empty() {
            self.rows.first().map(|r| r.value)
        } else {
            None
        }
    }

    /// Compensated sum of all values in table order.
    pub fn total(&self) -> f64 {
        stable_sum(self.rows.iter().map(|r| r.value))
    }

    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.key.label()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.value).collect()
    }

    /// Largest first; ties keep their current relative order.
    pub fn sorted_desc(&self) -> AggregateTable {
        self.sorted_by(|a, b| cmp_f64(b, a))
    }

    /// Smallest first; ties keep their current relative order.
    pub fn sorted_asc(&self) -> AggregateTable {
        self.sorted_by(cmp_f64)
    }

    fn sorted_by<F>(&self, cmp: F) -> AggregateTable
    where
        F: Fn(&f64, &f64) -> Ordering,
    {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| cmp(&a.value, &b.value));
        AggregateTable::new(self.group_by.clone(), rows)
    }

    /// First `n` rows in the current order.
    pub fn head(&self, n: usize) -> AggregateTable {
        AggregateTable::new(
            self.group_by.clone(),
            self.rows.iter().take(n).cloned().collect(),
        )
    }
}

impl<'a> IntoIterator for &'a AggregateTable {
    type Item = &'a AggregateRow;
    type IntoIter = std::slice::Iter<'a, AggregateRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Evaluate `query` over `table`.
///
/// Rows are scanned in source order; groups appear in first-occurrence
/// order. An empty match yields an empty table; a query without group-by
/// columns yields one row keyed by the empty [`GroupKey`] when anything
/// matched.
pub fn aggregate(table: &Table, query: &Query) -> AggregateTable {
    let mut index: AHashMap<GroupKey, usize> = AHashMap::new();
    let mut groups: Vec<(GroupKey, Accumulator)> = Vec::new();

    for record in table.iter().filter(|r| query.admits(r)) {
        let key = GroupKey(
            query
                .group_by
                .iter()
                .map(|c| record.field(*c).to_string())
                .collect(),
        );
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                let i = groups.len();
                index.insert(key.clone(), i);
                groups.push((key, Accumulator::default()));
                i
            }
        };
        groups[slot].1.push(record.emissions);
    }

    let rows = groups
        .into_iter()
        .map(|(key, acc)| AggregateRow {
            key,
            value: acc.finish(query.agg),
        })
        .collect();
    AggregateTable::new(query.group_by.clone(), rows)
}

/// Positional form of [`aggregate`].
pub fn aggregate_with(
    table: &Table,
    predicate: &Predicate,
    group_by: &[Column],
    agg: AggFn,
) -> AggregateTable {
    let query = Query {
        predicate: predicate.clone(),
        group_by: group_by.to_vec(),
        agg,
    };
    aggregate(table, &query)
}
