use methane_rs::models::Record;
use methane_rs::{AggFn, Column, EmissionType, Predicate, Table, cross_tab};

fn rec(country: &str, kind: EmissionType, reason: &str, emissions: f64) -> Record {
    Record {
        country: country.into(),
        region: if country == "World" { "World" } else { "Somewhere" }.into(),
        kind,
        segment: "Gas pipelines and LNG facilities".into(),
        reason: reason.into(),
        emissions,
    }
}

fn pipelines() -> Table {
    Table::new(vec![
        rec("World", EmissionType::Energy, "Fugitive", 999.0),
        rec("Russia", EmissionType::Energy, "Fugitive", 20.0),
        rec("Russia", EmissionType::Energy, "Vented", 18.0),
        rec("India", EmissionType::Energy, "Fugitive", 1.0),
        rec("China", EmissionType::Energy, "Vented", 1.5),
        rec("China", EmissionType::Energy, "Fugitive", 3.0),
        rec("China", EmissionType::Energy, "Fugitive", 0.5),
    ])
}

#[test]
fn missing_cells_are_none_not_zero() {
    let tab = cross_tab(
        &pipelines(),
        &Predicate::new(),
        Column::Country,
        Column::Reason,
        AggFn::Sum,
    );
    assert_eq!(tab.row_labels, vec!["Russia", "India", "China"]);
    assert_eq!(tab.col_labels, vec!["Fugitive", "Vented"]);
    assert_eq!(tab.get("India", "Vented"), None);
    assert_eq!(tab.get("India", "Fugitive"), Some(1.0));
    assert_eq!(tab.get("China", "Fugitive"), Some(3.5));
    assert_eq!(tab.get("World", "Fugitive"), None);
}

#[test]
fn totals_sorting_and_transpose() {
    let tab = cross_tab(
        &pipelines(),
        &Predicate::new().one_of(Column::Country, ["China", "India"]),
        Column::Country,
        Column::Reason,
        AggFn::Sum,
    );
    assert_eq!(
        tab.row_totals(),
        vec![("India".to_string(), 1.0), ("China".to_string(), 5.0)]
    );

    let sorted = tab.sort_rows();
    assert_eq!(sorted.row_labels, vec!["China", "India"]);
    assert_eq!(sorted.get("India", "Fugitive"), Some(1.0));

    let t = tab.transpose();
    assert_eq!(t.row_dim, Column::Reason);
    assert_eq!(t.col_labels, vec!["India", "China"]);
    assert_eq!(t.get("Vented", "China"), Some(1.5));
    assert_eq!(t.get("Vented", "India"), None);
}

#[test]
fn max_cell_reports_row_and_column() {
    let tab = cross_tab(
        &pipelines(),
        &Predicate::new(),
        Column::Reason,
        Column::Country,
        AggFn::Sum,
    );
    let top = tab.max_cell().unwrap();
    assert_eq!(top.label, "Fugitive / Russia");
    assert_eq!(top.value, 20.0);
}

#[test]
fn world_stays_when_neither_dimension_is_geographic() {
    let tab = cross_tab(
        &pipelines(),
        &Predicate::new(),
        Column::Type,
        Column::Reason,
        AggFn::Count,
    );
    assert_eq!(tab.get("Energy", "Fugitive"), Some(5.0));
    assert_eq!(tab.get("Energy", "Vented"), Some(2.0));
}

#[test]
fn empty_match_gives_empty_crosstab() {
    let tab = cross_tab(
        &pipelines(),
        &Predicate::new().eq(Column::Type, "Waste"),
        Column::Country,
        Column::Reason,
        AggFn::Sum,
    );
    assert!(tab.is_empty());
    assert!(tab.max_cell().is_none());
}
