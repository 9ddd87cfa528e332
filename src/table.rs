//! Loading and cleaning of the emissions CSV.
//!
//! Loading happens in three steps:
//! 1. [`load_csv`] reads every column as text into a [`RawTable`].
//! 2. [`clean`] drops the non-analytical `notes` and `source` columns.
//! 3. [`Table::try_from`] types the analytical columns into [`Record`]s.
//!
//! [`load`] runs all three.

use crate::error::AnalysisError;
use crate::models::{EmissionType, Record};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::path::Path;

/// Columns removed by [`clean`].
pub const DROPPED_COLUMNS: [&str; 2] = ["notes", "source"];

/// Columns [`Table::try_from`] needs.
pub const REQUIRED_COLUMNS: [&str; 6] =
    ["country", "region", "type", "segment", "reason", "emissions"];

/// Untyped table: header names plus string rows, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    /// Position of a column by exact (trimmed) header name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn missing_columns(&self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|n| self.column_index(n).is_none())
            .map(|n| n.to_string())
            .collect()
    }
}

/// Read a comma-delimited file with a header row.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        rows.push(rec.with_context(|| format!("reading row {} of {}", i + 1, path.display()))?);
    }
    let raw = RawTable { headers, rows };
    debug!(
        "loaded {} rows x {} columns from {}",
        raw.len(),
        raw.headers.len(),
        path.display()
    );
    Ok(raw)
}

/// Drop the free-text `notes` and constant `source` columns. No rows are dropped.
pub fn clean(raw: RawTable) -> Result<RawTable, AnalysisError> {
    let missing = raw.missing_columns(&DROPPED_COLUMNS);
    if !missing.is_empty() {
        return Err(AnalysisError::SchemaMismatch { missing });
    }
    let keep: Vec<usize> = raw
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !DROPPED_COLUMNS.contains(&h.as_str()))
        .map(|(i, _)| i)
        .collect();

    let headers = keep.iter().map(|&i| raw.headers[i].clone()).collect();
    let rows = raw
        .rows
        .iter()
        .map(|r| keep.iter().map(|&i| r.get(i).unwrap_or("")).collect())
        .collect();
    let cleaned = RawTable { headers, rows };
    debug!(
        "cleaned table: {} rows, columns [{}]",
        cleaned.len(),
        cleaned.headers.join(", ")
    );
    Ok(cleaned)
}

/// The cleaned, typed emissions table. Never mutated after construction;
/// every transformation returns a new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// New table with `f` applied to every record.
    pub fn map_records<F>(&self, f: F) -> Table
    where
        F: Fn(&Record) -> Record,
    {
        Table::new(self.records.iter().map(f).collect())
    }
}

impl TryFrom<RawTable> for Table {
    type Error = AnalysisError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let missing = raw.missing_columns(&REQUIRED_COLUMNS);
        if !missing.is_empty() {
            return Err(AnalysisError::SchemaMismatch { missing });
        }
        // All present, checked above.
        let idx = |name: &str| raw.column_index(name).unwrap_or_default();
        let (ci, ri, ti, si, rsi, ei) = (
            idx("country"),
            idx("region"),
            idx("type"),
            idx("segment"),
            idx("reason"),
            idx("emissions"),
        );

        let mut records = Vec::with_capacity(raw.rows.len());
        for (i, row) in raw.rows.iter().enumerate() {
            // 1-based data row number, header excluded
            let row_no = i + 1;
            let cell = |j: usize| row.get(j).unwrap_or("").trim();

            let kind: EmissionType =
                cell(ti)
                    .parse()
                    .map_err(|_| AnalysisError::UnknownEmissionType {
                        row: row_no,
                        value: cell(ti).to_string(),
                    })?;
            // NaN and inf parse as f64 but would poison every ordering downstream
            let emissions = cell(ei)
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| AnalysisError::InvalidNumber {
                    row: row_no,
                    value: cell(ei).to_string(),
                })?;

            records.push(Record {
                country: cell(ci).to_string(),
                region: cell(ri).to_string(),
                kind,
                segment: cell(si).to_string(),
                reason: cell(rsi).to_string(),
                emissions,
            });
        }
        Ok(Table::new(records))
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Load, clean, and type the emissions CSV at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let raw = load_csv(path)?;
    let cleaned = clean(raw).with_context(|| format!("cleaning {}", path.display()))?;
    let table = Table::try_from(cleaned).with_context(|| format!("typing {}", path.display()))?;
    debug!("{} records ready for analysis", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| StringRecord::from(r.to_vec())).collect(),
        }
    }

    #[test]
    fn clean_drops_notes_and_source_only() {
        let t = raw(
            &["region", "notes", "country", "source", "baseYear"],
            &[&["Asia", "n", "China", "IEA", "2022"]],
        );
        let c = clean(t).unwrap();
        assert_eq!(c.headers, vec!["region", "country", "baseYear"]);
        assert_eq!(c.rows[0], StringRecord::from(vec!["Asia", "China", "2022"]));
    }

    #[test]
    fn typing_reports_bad_number_with_row() {
        let t = raw(
            &["country", "region", "type", "segment", "reason", "emissions"],
            &[
                &["China", "Asia", "Energy", "Total", "All", "10.5"],
                &["India", "Asia", "Energy", "Total", "All", "n/a"],
            ],
        );
        let err = Table::try_from(t).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidNumber {
                row: 2,
                value: "n/a".into()
            }
        );
    }
}
