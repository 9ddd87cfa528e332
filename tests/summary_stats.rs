use methane_rs::summary::{self, max, mean, median, min};
use methane_rs::{AggregateTable, AnalysisError, Column};

fn table(pairs: &[(&str, f64)]) -> AggregateTable {
    AggregateTable::from_pairs(Column::Region, pairs.iter().map(|(l, v)| (*l, *v)))
}

#[test]
fn three_entries() {
    let t = table(&[("A", 10.0), ("B", 20.0), ("C", 30.0)]);
    assert_eq!(mean(&t).unwrap(), 20.0);
    assert_eq!(median(&t).unwrap(), 20.0);
    let top = max(&t).unwrap();
    assert_eq!((top.label.as_str(), top.value), ("C", 30.0));
    let bottom = min(&t).unwrap();
    assert_eq!((bottom.label.as_str(), bottom.value), ("A", 10.0));
}

#[test]
fn median_even_and_odd_counts() {
    // sorted: 1, 2, 3, 4 -> (2 + 3) / 2
    let even = table(&[("w", 4.0), ("x", 1.0), ("y", 3.0), ("z", 2.0)]);
    assert_eq!(median(&even).unwrap(), 2.5);

    let odd = table(&[("x", 9.0), ("y", -1.0), ("z", 5.0)]);
    assert_eq!(median(&odd).unwrap(), 5.0);
}

#[test]
fn mean_lies_between_extremes() {
    let samples = [
        vec![("a", 3.0)],
        vec![("a", -5.0), ("b", 5.0)],
        vec![("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 1e6)],
        vec![("a", 7.0), ("b", 7.0), ("c", 7.0)],
    ];
    for pairs in samples {
        let t = table(&pairs);
        let m = mean(&t).unwrap();
        assert!(min(&t).unwrap().value <= m, "{pairs:?}");
        assert!(m <= max(&t).unwrap().value, "{pairs:?}");
    }
}

#[test]
fn ties_resolve_to_first_in_table_order() {
    let t = table(&[("B", 5.0), ("A", 9.0), ("C", 9.0), ("D", 5.0)]);
    assert_eq!(max(&t).unwrap().label, "A");
    assert_eq!(min(&t).unwrap().label, "B");
}

#[test]
fn empty_table_signals_empty_aggregate() {
    let t = table(&[]);
    assert_eq!(max(&t), Err(AnalysisError::EmptyAggregate));
    assert_eq!(min(&t), Err(AnalysisError::EmptyAggregate));
    assert_eq!(mean(&t), Err(AnalysisError::EmptyAggregate));
    assert_eq!(median(&t), Err(AnalysisError::EmptyAggregate));
    assert!(summary::summarize(&t).is_err());
}

#[test]
fn summarize_collects_all_figures() {
    let t = table(&[("A", 1.0), ("B", 2.0), ("C", 6.0)]);
    let s = summary::summarize(&t).unwrap();
    assert_eq!(s.count, 3);
    assert_eq!(s.min.label, "A");
    assert_eq!(s.max.label, "C");
    assert_eq!(s.mean, 3.0);
    assert_eq!(s.median, 2.0);
}
