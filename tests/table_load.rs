use std::fs;
use std::path::PathBuf;

use methane_rs::table::{self, RawTable, clean, load_csv};
use methane_rs::{AnalysisError, EmissionType, Table};
use tempfile::tempdir;

fn sample_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/methane_sample.csv")
}

#[test]
fn sample_loads_every_row_with_types() {
    let t = table::load(sample_csv()).unwrap();
    assert_eq!(t.len(), 41);
    let first = &t.records()[0];
    assert_eq!(first.region, "World");
    assert_eq!(first.kind, EmissionType::Agriculture);
    assert_eq!(first.emissions, 140000.0);
    assert!(t.iter().any(|r| r.reason == "Vented"));
}

#[test]
fn clean_drops_notes_and_source_only() {
    let raw = load_csv(sample_csv()).unwrap();
    let rows = raw.len();
    let cleaned = clean(raw).unwrap();
    assert_eq!(cleaned.len(), rows);
    assert_eq!(
        cleaned.headers,
        vec!["region", "country", "emissions", "type", "segment", "reason", "baseYear"]
    );
    assert!(cleaned.column_index("notes").is_none());
    assert!(cleaned.column_index("source").is_none());
}

fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let p = dir.path().join(name);
    fs::write(&p, text).unwrap();
    p
}

#[test]
fn missing_dropped_column_is_schema_mismatch() {
    let dir = tempdir().unwrap();
    let p = write(
        &dir,
        "no_source.csv",
        "region,country,emissions,type,segment,reason,notes\nAsia,China,1,Energy,Total,All,\n",
    );
    let raw = load_csv(&p).unwrap();
    assert_eq!(
        clean(raw),
        Err(AnalysisError::SchemaMismatch {
            missing: vec!["source".to_string()]
        })
    );

    let err = table::load(&p).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AnalysisError>(),
        Some(AnalysisError::SchemaMismatch { .. })
    ));
}

#[test]
fn missing_required_column_is_schema_mismatch() {
    let raw = RawTable {
        headers: vec!["country".into(), "emissions".into()],
        rows: vec![],
    };
    match Table::try_from(raw) {
        Err(AnalysisError::SchemaMismatch { missing }) => {
            assert_eq!(missing, vec!["region", "type", "segment", "reason"]);
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn bad_cells_report_their_row() {
    let dir = tempdir().unwrap();
    let header = "region,country,emissions,type,segment,reason,notes,source\n";

    let p = write(
        &dir,
        "bad_number.csv",
        &format!("{header}Asia,China,1,Energy,Total,All,,\nAsia,India,lots,Energy,Total,All,,\n"),
    );
    let err = table::load(&p).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AnalysisError>(),
        Some(&AnalysisError::InvalidNumber {
            row: 2,
            value: "lots".into()
        })
    );

    let p = write(
        &dir,
        "bad_type.csv",
        &format!("{header}Asia,China,1,Industry,Total,All,,\n"),
    );
    let err = table::load(&p).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AnalysisError>(),
        Some(&AnalysisError::UnknownEmissionType {
            row: 1,
            value: "Industry".into()
        })
    );
}

#[test]
fn non_finite_emissions_are_rejected() {
    let dir = tempdir().unwrap();
    let header = "region,country,emissions,type,segment,reason,notes,source\n";

    let p = write(&dir, "nan.csv", &format!("{header}Asia,China,NaN,Energy,Total,All,,\n"));
    let err = table::load(&p).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AnalysisError>(),
        Some(&AnalysisError::InvalidNumber {
            row: 1,
            value: "NaN".into()
        })
    );

    let p = write(
        &dir,
        "inf.csv",
        &format!("{header}Asia,China,1,Energy,Total,All,,\nAsia,India,inf,Energy,Total,All,,\n"),
    );
    let err = table::load(&p).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AnalysisError>(),
        Some(&AnalysisError::InvalidNumber {
            row: 2,
            value: "inf".into()
        })
    );
}
