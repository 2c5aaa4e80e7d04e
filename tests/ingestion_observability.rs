use std::fs;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use coldata::ingestion::{
    ingest_from_path, CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionOptions,
    IngestionSeverity, IngestionStats,
};
use coldata::AnalysisError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &AnalysisError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &AnalysisError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    // Missing file -> Io error -> Critical
    let _ = ingest_from_path("tests/fixtures/does_not_exist.dat", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Critical]);
    assert_eq!(alerts, vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_format_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    // Column count mismatch -> Error severity (not Critical) -> should not alert
    let _ = ingest_from_path("tests/fixtures/bad_columns.dat", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn composite_observer_reports_success_to_every_observer() {
    let first = Arc::new(RecordingObserver::default());
    let second = Arc::new(RecordingObserver::default());
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let log_path = std::env::temp_dir().join(format!("coldata_ingest_{nanos}.log"));

    let composite = CompositeObserver::new(vec![
        first.clone(),
        second.clone(),
        Arc::new(FileObserver::new(&log_path)),
    ]);
    let opts = IngestionOptions {
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };

    ingest_from_path("tests/fixtures/forces.dat", &opts).unwrap();

    for obs in [&first, &second] {
        let successes = obs.successes.lock().unwrap().clone();
        assert_eq!(successes.len(), 1);
        assert_eq!(successes[0].rows, 9);
        assert_eq!(successes[0].columns, 3);
        assert_eq!(successes[0].timestep_column.as_deref(), Some("Timestep"));
    }

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("ok path=tests/fixtures/forces.dat rows=9 columns=3"));
    let _ = fs::remove_file(log_path);
}
