use std::path::PathBuf;

use methane_rs::analysis::{self, PIPELINE_SEGMENT, Report, ReportOptions};
use methane_rs::{EmissionType, Table};

fn sample() -> Table {
    let p = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/methane_sample.csv");
    methane_rs::load(p).unwrap()
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn world_totals_use_total_segment_only() {
    let world = analysis::world_by_type(&sample());
    assert_eq!(world.labels(), vec!["Agriculture", "Energy", "Waste", "Other"]);
    assert_eq!(world.values(), vec![140000.0, 135000.0, 30000.0, 9000.0]);
}

#[test]
fn region_breakdown_excludes_world() {
    let t = sample();
    let agri = analysis::region_totals(&t, EmissionType::Agriculture);
    assert_eq!(
        agri.labels(),
        vec![
            "Asia Pacific",
            "Central & South America",
            "North America",
            "Russia & Caspian",
            "Europe"
        ]
    );
    assert_eq!(agri.get_label("Asia Pacific"), Some(45000.0));
    assert_eq!(agri.get_label("Europe"), Some(1210.0));
    assert_eq!(agri.get_label("World"), None);

    let energy = analysis::region_totals(&t, EmissionType::Energy);
    assert_eq!(energy.get_label("Asia Pacific"), Some(37000.0));
    assert_eq!(energy.get_label("Europe"), Some(802.0));
}

#[test]
fn top_emitters_by_all_type_total() {
    assert_eq!(
        analysis::top_emitters(&sample(), 5),
        strings(&["China", "India", "United States", "Russia", "Brazil"])
    );
}

#[test]
fn energy_leader_considers_energy_rows_only() {
    let t = sample();
    let countries = strings(&["China", "India", "United States", "Russia", "Brazil"]);
    let energy = analysis::top_country_for(&t, &countries, EmissionType::Energy).unwrap();
    assert_eq!((energy.label.as_str(), energy.value), ("China", 28000.0));
    let agri = analysis::top_country_for(&t, &countries, EmissionType::Agriculture).unwrap();
    assert_eq!((agri.label.as_str(), agri.value), ("India", 30000.0));

    // India's agriculture outweighs every energy total, so it must not leak in
    let both = analysis::type_totals_for(
        &t,
        &countries,
        &[EmissionType::Agriculture, EmissionType::Energy],
    );
    assert_eq!(both.max_cell().unwrap().label, "India / Agriculture");
    assert_ne!(energy.label, "India");

    assert!(analysis::top_country_for(&t, &strings(&["Atlantis"]), EmissionType::Energy).is_err());
}

#[test]
fn segment_reasons_keep_missing_cells() {
    let t = sample();
    let countries = strings(&["China", "India", "Russia", "Brazil"]);
    let tab = analysis::segment_reasons(&t, &countries, PIPELINE_SEGMENT);
    assert_eq!(tab.row_labels, vec!["China", "India", "Russia"]);
    assert_eq!(tab.col_labels, vec!["Fugitive", "Vented"]);
    assert_eq!(tab.get("Russia", "Vented"), Some(1800.0));
    assert_eq!(tab.get("India", "Vented"), None);
}

#[test]
fn report_collects_every_figure() {
    let report = Report::build(&sample(), &ReportOptions::default());
    assert_eq!(report.world_total, 314000.0);
    assert_eq!(report.countries.len(), 5);
    assert_eq!(report.regions.len(), 2);

    let agri = report.regions[0].summary.as_ref().unwrap();
    assert_eq!(agri.max.label, "Asia Pacific");
    assert_eq!(agri.min.label, "Europe");
    assert_eq!(agri.mean, 13542.0);
    assert_eq!(agri.median, 6000.0);

    let leaders: Vec<(EmissionType, String)> = report
        .leaders
        .iter()
        .map(|l| (l.kind, l.leader.as_ref().unwrap().label.clone()))
        .collect();
    assert_eq!(
        leaders,
        vec![
            (EmissionType::Agriculture, "India".to_string()),
            (EmissionType::Energy, "China".to_string())
        ]
    );

    assert_eq!(
        report.headline_types.row_labels,
        vec!["Brazil", "China", "India", "Russia", "United States"]
    );
    assert_eq!(report.headline_types.get("Brazil", "Agriculture"), Some(13000.0));
    assert_eq!(
        report.type_by_country.col_labels,
        vec!["Brazil", "China", "India", "Russia", "United States"]
    );
    assert_eq!(report.type_by_country.max_cell().unwrap().label, "Agriculture / India");

    assert_eq!(report.country_totals.labels().first().map(String::as_str), Some("Iceland"));
    assert_eq!(report.country_totals.get_label("United States of America"), Some(6000.0));
    assert_eq!(report.country_totals.get_label("United States"), None);
}

#[test]
fn explicit_countries_override_top_emitters() {
    let opts = ReportOptions {
        countries: Some(strings(&["Germany", "Iceland"])),
        ..ReportOptions::default()
    };
    let report = Report::build(&sample(), &opts);
    assert_eq!(report.countries, strings(&["Germany", "Iceland"]));
    assert!(report.segment_reasons.is_empty());
    let energy = report.leaders[1].leader.as_ref().unwrap();
    assert_eq!(energy.label, "Germany");
}

#[test]
fn commentary_names_the_leaders() {
    let text = Report::build(&sample(), &ReportOptions::default()).render("en");
    assert!(text.contains("Agriculture is the largest source at 140,000 kt"));
    assert!(text.contains("Top Energy emitter: China (28,000 kt)"));
    assert!(text.contains("India: Fugitive 100 kt, Vented n/a"));

    let de = Report::build(&sample(), &ReportOptions::default()).render("de");
    assert!(de.contains("140.000 kt"));
}
