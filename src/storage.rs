//! Write aggregate results, cross-tabs and reports to CSV or JSON.
//!
//! Text cells that a spreadsheet would evaluate as a formula are prefixed
//! with `'`. Missing cross-tab cells are written as empty CSV fields and as
//! `null` in JSON.

use crate::analysis::Report;
use crate::crosstab::CrossTab;
use crate::query::AggregateTable;
use anyhow::Result;
use csv::WriterBuilder;
use log::info;
use serde::Serialize;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Guard a text cell against formula evaluation in spreadsheet tools.
pub fn sanitize_cell(s: &str) -> Cow<'_, str> {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@') => Cow::Owned(format!("'{s}")),
        _ => Cow::Borrowed(s),
    }
}

/// One column per grouping dimension plus `emissions`.
pub fn save_aggregate_csv<P: AsRef<Path>>(table: &AggregateTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header: Vec<&str> = table.group_by().iter().map(|c| c.name()).collect();
    if header.is_empty() {
        header.push("group");
    }
    header.push("emissions");
    wtr.write_record(&header)?;
    for row in table {
        let mut record: Vec<String> = if row.key.is_empty() {
            vec![row.key.label()]
        } else {
            row.key.0.iter().map(|k| sanitize_cell(k).into_owned()).collect()
        };
        record.push(row.value.to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Wide layout: the row dimension, then one column per column label.
pub fn save_crosstab_csv<P: AsRef<Path>>(tab: &CrossTab, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_path(path)?;
    let mut header = vec![tab.row_dim.name().to_string()];
    header.extend(tab.col_labels.iter().map(|l| sanitize_cell(l).into_owned()));
    wtr.write_record(&header)?;
    for (label, cells) in tab.row_labels.iter().zip(&tab.cells) {
        let mut record = vec![sanitize_cell(label).into_owned()];
        record.extend(cells.iter().map(|c| c.map(|v| v.to_string()).unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!(
        "wrote {}x{} cross-tab to {}",
        tab.row_labels.len(),
        tab.col_labels.len(),
        path.display()
    );
    Ok(())
}

pub fn save_aggregate_json<P: AsRef<Path>>(table: &AggregateTable, path: P) -> Result<()> {
    save_json(table, path.as_ref())
}

pub fn save_crosstab_json<P: AsRef<Path>>(tab: &CrossTab, path: P) -> Result<()> {
    save_json(tab, path.as_ref())
}

pub fn save_report_json<P: AsRef<Path>>(report: &Report, path: P) -> Result<()> {
    save_json(report, path.as_ref())
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut f, value)?;
    f.write_all(b"\n")?;
    f.flush()?;
    info!("wrote {}", path.display());
    Ok(())
}
