use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn sample_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/methane_sample.csv")
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("aggregate"))
        .stdout(predicate::str::contains("report"));
}

#[test]
fn aggregate_by_region_with_stats() {
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("aggregate")
        .arg(sample_csv())
        .args([
            "--where", "type=Agriculture",
            "--where", "segment=Total",
            "--where", "reason=All",
            "--by", "region",
            "--sort", "desc",
            "--stats",
        ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("Asia Pacific\t45000\n"))
        .stdout(predicate::str::contains("World").not())
        .stdout(predicate::str::contains("max=45000 (Asia Pacific)"))
        .stdout(predicate::str::contains("median=6000"));
}

#[test]
fn aggregate_saves_csv() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("by_type.csv");
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("aggregate")
        .arg(sample_csv())
        .args(["-w", "region=World", "-w", "segment=Total", "--by", "type", "--out"])
        .arg(&out);
    cmd.assert().success();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("type,emissions\nAgriculture,140000\n"));
}

#[test]
fn crosstab_marks_missing_cells() {
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("crosstab")
        .arg(sample_csv())
        .args([
            "--rows", "country",
            "--cols", "reason",
            "--where", "segment=Gas pipelines and LNG facilities",
        ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("country\tFugitive\tVented"))
        .stdout(predicate::str::contains("India\t100\t-"));
}

#[test]
fn crosstab_with_no_matching_rows_prints_header_only() {
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("crosstab")
        .arg(sample_csv())
        .args(["--rows", "country", "--cols", "reason", "--where", "segment=Nowhere"]);
    cmd.assert().success().stdout("country\t\n");

    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("crosstab")
        .arg(sample_csv())
        .args(["--rows", "country", "--cols", "reason", "--where", "segment=Nowhere"])
        .arg("--plot")
        .arg(dir.path().join("empty.svg"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no data to plot"));
}

#[test]
fn report_prints_commentary() {
    let dir = tempdir().unwrap();
    let json = dir.path().join("report.json");
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("report").arg(sample_csv()).arg("--json").arg(&json);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("World methane emissions by type"))
        .stdout(predicate::str::contains("China, India, United States, Russia, Brazil"));
    assert!(json.exists());
}

#[test]
fn schema_mismatch_fails() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("bad.csv");
    std::fs::write(&p, "region,country,emissions,type,segment,reason\nAsia,China,1,Energy,Total,All\n").unwrap();
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("aggregate").arg(&p);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing expected column"));
}

#[test]
fn unknown_column_is_rejected() {
    let mut cmd = Command::cargo_bin("methane").unwrap();
    cmd.arg("aggregate").arg(sample_csv()).args(["--by", "colour"]);
    cmd.assert().failure();
}
