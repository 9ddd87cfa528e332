use crate::error::AnalysisError;
use crate::query::{AggregateTable, stable_sum};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A group label together with its aggregated value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Extremum {
    pub label: String,
    pub value: f64,
}

/// Summary statistics over the values of an aggregate table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: Extremum,
    pub max: Extremum,
    pub mean: f64,
    pub median: f64,
}

/// Entry with the greatest value. On ties the first entry in table order wins.
pub fn max(table: &AggregateTable) -> Result<Extremum, AnalysisError> {
    extremum(table, Ordering::Greater)
}

/// Entry with the smallest value. On ties the first entry in table order wins.
pub fn min(table: &AggregateTable) -> Result<Extremum, AnalysisError> {
    extremum(table, Ordering::Less)
}

fn extremum(table: &AggregateTable, wanted: Ordering) -> Result<Extremum, AnalysisError> {
    let mut rows = table.iter();
    let mut best = rows.next().ok_or(AnalysisError::EmptyAggregate)?;
    for row in rows {
        // strict: an equal value never replaces an earlier winner
        if row.value.partial_cmp(&best.value) == Some(wanted) {
            best = row;
        }
    }
    Ok(Extremum {
        label: best.key.label(),
        value: best.value,
    })
}

/// Unweighted arithmetic mean of the aggregate values.
pub fn mean(table: &AggregateTable) -> Result<f64, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyAggregate);
    }
    Ok(table.total() / table.len() as f64)
}

/// Median of the aggregate values; the average of the two middle values
/// when the count is even.
pub fn median(table: &AggregateTable) -> Result<f64, AnalysisError> {
    let mut vals = table.values();
    if vals.is_empty() {
        return Err(AnalysisError::EmptyAggregate);
    }
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = vals.len();
    Ok(if n % 2 == 1 {
        vals[n / 2]
    } else {
        stable_sum([vals[n / 2 - 1], vals[n / 2]]) / 2.0
    })
}

/// All four figures at once.
pub fn summarize(table: &AggregateTable) -> Result<Summary, AnalysisError> {
    Ok(Summary {
        count: table.len(),
        min: min(table)?,
        max: max(table)?,
        mean: mean(table)?,
        median: median(table)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    #[test]
    fn ties_resolve_to_first_in_table_order() {
        let t = AggregateTable::from_pairs(
            Column::Region,
            [("B", 5.0), ("A", 9.0), ("C", 9.0), ("D", 5.0)],
        );
        assert_eq!(max(&t).unwrap().label, "A");
        assert_eq!(min(&t).unwrap().label, "B");

        // Reordering the table changes the winner among equals.
        let flipped = AggregateTable::from_pairs(
            Column::Region,
            [("D", 5.0), ("C", 9.0), ("A", 9.0), ("B", 5.0)],
        );
        assert_eq!(max(&flipped).unwrap().label, "C");
        assert_eq!(min(&flipped).unwrap().label, "D");
    }

    #[test]
    fn single_entry_is_everything() {
        let t = AggregateTable::from_pairs(Column::Country, [("Chad", 3.5)]);
        let s = summarize(&t).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.min, s.max);
        assert_eq!(s.mean, 3.5);
        assert_eq!(s.median, 3.5);
    }
}
