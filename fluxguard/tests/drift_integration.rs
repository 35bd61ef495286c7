//! Integration tests for distributional drift and the analysis runner.

use std::fs;

use fluxguard::analyzers::{
    CoherenceRunner, DriftEngine, DriftPrecision, DriftStatistic, DriftTest,
};
use fluxguard::sources::{read_table, ReadOptions};
use fluxguard::table::{row, Cell, Row};
use tempfile::TempDir;

fn linear_rows(n: usize, offset: f64) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let x = i as f64 + offset;
            row([
                ("x", Cell::from(x)),
                ("y", Cell::from(-0.5 * x)),
                ("tag", Cell::from(if i % 2 == 0 { "even" } else { "odd" })),
            ])
        })
        .collect()
}

#[test]
fn test_identical_tables_have_no_drift() {
    let rows = linear_rows(50, 0.0);
    for precision in [DriftPrecision::default(), DriftPrecision::Exact] {
        let report = DriftEngine::new(precision).unwrap().compare_rows(&rows, &rows);
        assert_eq!(report.columns.len(), 2);
        for drift in report.columns.values() {
            assert_eq!(drift.ks_statistic, 0.0);
            assert!(drift.wasserstein_distance.abs() < 1e-12);
        }
        assert_eq!(report.summary(DriftStatistic::MaxKs), 0.0);
    }
}

#[test]
fn test_shift_is_detected_by_both_precisions() {
    let baseline = linear_rows(100, 0.0);
    let current = linear_rows(100, 10.0);

    let exact = DriftEngine::new(DriftPrecision::Exact)
        .unwrap()
        .compare_rows(&baseline, &current);
    let approx = DriftEngine::default().compare_rows(&baseline, &current);

    // a shift by 10 of 100 evenly spaced points
    assert!((exact.columns["x"].ks_statistic - 0.1).abs() < 1e-12);
    assert!((exact.columns["x"].wasserstein_distance - 10.0).abs() < 1e-9);
    assert!((approx.columns["x"].wasserstein_distance - 10.0).abs() < 1e-9);
    assert_eq!(exact.columns["x"].ks_statistic, approx.columns["x"].ks_statistic);

    // y = -x / 2 moves by 5
    assert!((exact.columns["y"].wasserstein_distance - 5.0).abs() < 1e-9);
    assert!((exact.summary(DriftStatistic::MaxWasserstein) - 10.0).abs() < 1e-9);

    assert_eq!(exact.method, "ks+wasserstein_exact");
    assert_eq!(approx.method, "ks+wasserstein_quantile_grid");
}

#[test]
fn test_sparse_columns_are_skipped() {
    let baseline = vec![
        row([("a", Cell::from(1.0)), ("b", Cell::from(1.0))]),
        row([("a", Cell::from(2.0)), ("b", Cell::Missing)]),
    ];
    let current = vec![
        row([("a", Cell::from(5.0)), ("b", Cell::from(2.0))]),
        row([("a", Cell::from(6.0)), ("b", Cell::from(3.0))]),
    ];
    let report = DriftEngine::default().compare_rows(&baseline, &current);
    assert_eq!(report.columns.keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(report.skipped, vec!["b".to_string()]);
    assert_eq!(report.columns["a"].ks_statistic, 1.0);
}

#[derive(Debug)]
struct ConstantTest;

impl DriftTest for ConstantTest {
    fn method(&self) -> &str {
        "constant"
    }

    fn wasserstein_distance(&self, _xs: &[f64], _ys: &[f64]) -> f64 {
        42.0
    }
}

#[test]
fn test_custom_drift_test() {
    let rows = linear_rows(10, 0.0);
    let report = DriftEngine::with_test(Box::new(ConstantTest)).compare_rows(&rows, &rows);
    assert_eq!(report.method, "constant");
    assert_eq!(report.summary(DriftStatistic::MaxWasserstein), 42.0);
    assert_eq!(report.summary(DriftStatistic::MaxKs), 0.0);
}

#[test]
fn test_runner_over_csv_files() {
    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("baseline.csv");
    let current_path = dir.path().join("current.csv");

    let mut baseline = String::from("x,y,note\n");
    let mut current = String::from("x,y,note\n");
    for i in 0..20 {
        baseline.push_str(&format!("{i},{},ok\n", 3 * i));
        current.push_str(&format!("{},{},ok\n", i + 5, 3 * i));
    }
    fs::write(&baseline_path, baseline).unwrap();
    fs::write(&current_path, current).unwrap();

    let options = ReadOptions::default();
    let baseline = read_table(&baseline_path, &options).unwrap();
    let current = read_table(&current_path, &options).unwrap();

    let run = CoherenceRunner::new()
        .thresholds([0.9])
        .with_profile(true)
        .with_drift(DriftEngine::new(DriftPrecision::Exact).unwrap())
        .run(&current, Some(&baseline))
        .unwrap();

    let graph = &run.graphs[0];
    assert_eq!(graph.nodes, vec!["x".to_string(), "y".to_string()]);
    assert_eq!(graph.edge("x", "y").unwrap().correlation, 1.0);

    let drift = run.drift.unwrap();
    assert!((drift.columns["x"].wasserstein_distance - 5.0).abs() < 1e-9);
    assert_eq!(drift.columns["y"].ks_statistic, 0.0);

    let profile = run.profile.unwrap();
    assert_eq!(profile.rows, 20);
    assert!(run.options.profile && run.options.stat_tests);
}
