//! Two-dimensional aggregates (row dimension × column dimension).
//!
//! Cells without any contributing row are `None` ("no data"), which is not the
//! same as a zero total. Heat maps and stacked bars rely on the difference.

use crate::models::Column;
use crate::query::{Accumulator, AggFn, Predicate, excluded_as_world, stable_sum};
use crate::summary::Extremum;
use crate::table::Table;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTab {
    pub row_dim: Column,
    pub col_dim: Column,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `cells[r][c]`, `None` when no source row fell into the cell.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CrossTab {
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.col_labels.is_empty()
    }

    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.col_labels.iter().position(|l| l == col)?;
        self.cells[r][c]
    }

    /// Sum of the present cells of each row, in row order.
    pub fn row_totals(&self) -> Vec<(String, f64)> {
        self.row_labels
            .iter()
            .zip(&self.cells)
            .map(|(label, cells)| (label.clone(), stable_sum(cells.iter().flatten().copied())))
            .collect()
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> CrossTab {
        let cells = (0..self.col_labels.len())
            .map(|c| self.cells.iter().map(|row| row[c]).collect())
            .collect();
        CrossTab {
            row_dim: self.col_dim,
            col_dim: self.row_dim,
            row_labels: self.col_labels.clone(),
            col_labels: self.row_labels.clone(),
            cells,
        }
    }

    /// Rows in label order (alphabetical).
    pub fn sort_rows(&self) -> CrossTab {
        let mut order: Vec<usize> = (0..self.row_labels.len()).collect();
        order.sort_by(|&a, &b| self.row_labels[a].cmp(&self.row_labels[b]));
        CrossTab {
            row_labels: order.iter().map(|&i| self.row_labels[i].clone()).collect(),
            cells: order.iter().map(|&i| self.cells[i].clone()).collect(),
            ..self.clone()
        }
    }

    /// Columns in label order (alphabetical).
    pub fn sort_columns(&self) -> CrossTab {
        self.transpose().sort_rows().transpose()
    }

    /// Largest present cell, labelled "row / column". First in row-major order
    /// wins ties.
    pub fn max_cell(&self) -> Option<Extremum> {
        let mut best: Option<(usize, usize, f64)> = None;
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(v) = *cell {
                    let better = match best {
                        None => true,
                        Some((_, _, b)) => v.partial_cmp(&b) == Some(Ordering::Greater),
                    };
                    if better {
                        best = Some((r, c, v));
                    }
                }
            }
        }
        best.map(|(r, c, value)| Extremum {
            label: format!("{} / {}", self.row_labels[r], self.col_labels[c]),
            value,
        })
    }
}

fn intern(labels: &mut Vec<String>, index: &mut AHashMap<String, usize>, v: &str) -> usize {
    if let Some(&i) = index.get(v) {
        return i;
    }
    let i = labels.len();
    labels.push(v.to_string());
    index.insert(v.to_string(), i);
    i
}

/// Build a cross-tab of `emissions` for rows matching `predicate`.
///
/// Row and column labels appear in first-occurrence order. `World` rows are
/// excluded when either dimension is geographic.
pub fn cross_tab(
    table: &Table,
    predicate: &Predicate,
    row_dim: Column,
    col_dim: Column,
    agg: AggFn,
) -> CrossTab {
    let dims = [row_dim, col_dim];
    let mut row_labels: Vec<String> = Vec::new();
    let mut col_labels: Vec<String> = Vec::new();
    let mut row_index: AHashMap<String, usize> = AHashMap::new();
    let mut col_index: AHashMap<String, usize> = AHashMap::new();
    let mut acc: AHashMap<(usize, usize), Accumulator> = AHashMap::new();

    for record in table
        .iter()
        .filter(|r| predicate.matches(r) && !excluded_as_world(r, &dims))
    {
        let r = intern(&mut row_labels, &mut row_index, record.field(row_dim));
        let c = intern(&mut col_labels, &mut col_index, record.field(col_dim));
        acc.entry((r, c)).or_default().push(record.emissions);
    }

    let cells = (0..row_labels.len())
        .map(|r| {
            (0..col_labels.len())
                .map(|c| acc.get(&(r, c)).map(|a| a.finish(agg)))
                .collect()
        })
        .collect();

    CrossTab {
        row_dim,
        col_dim,
        row_labels,
        col_labels,
        cells,
    }
}
