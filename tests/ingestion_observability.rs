use std::sync::{Arc, Mutex};

use futures::executor::block_on;

use datatree_ingest::ingestion::{
    CompositeObserver, FileFetcher, IngestionContext, IngestionObserver, IngestionPath, IngestionSeverity,
    IngestionStats, Loader, LoaderOptions, MemoryFetcher, TracingObserver,
};
use datatree_ingest::IngestionError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(String, IngestionStats)>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push((ctx.locator.clone(), stats));
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &IngestionError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn loader_with(obs: Arc<dyn IngestionObserver>, fetcher: MemoryFetcher) -> Loader {
    Loader::new(Arc::new(fetcher)).with_options(LoaderOptions {
        observer: Some(obs),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    })
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = Loader::new(Arc::new(FileFetcher::new())).with_options(LoaderOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    });

    // Missing file -> Io error -> Critical
    let _ = block_on(loader.load("tests/fixtures/does_not_exist.csv", None)).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_format_error() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = loader_with(obs.clone(), MemoryFetcher::new().with("bad.json", "{\"x\": "));

    let _ = block_on(loader.load("bad.json", None)).unwrap_err();

    assert_eq!(obs.failures.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn missing_decoder_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = loader_with(obs.clone(), MemoryFetcher::new().with("clip.wav", vec![0_u8; 8]));

    let _ = block_on(loader.load("clip.wav", None)).unwrap_err();

    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Critical]);
}

#[test]
fn success_reports_leaf_and_value_counts() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = loader_with(obs.clone(), MemoryFetcher::new().with("t.csv", "a,b\n1,2\n3,4\n5,6\n"));

    block_on(loader.load("t.csv", None)).unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![("t.csv".to_string(), IngestionStats { leaves: 2, values: 6 })]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn lower_threshold_alerts_on_errors() {
    let obs = Arc::new(RecordingObserver::default());
    let loader = Loader::new(Arc::new(MemoryFetcher::new().with("bad.json", "nope"))).with_options(LoaderOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Error,
        ..Default::default()
    });

    let _ = block_on(loader.load("bad.json", None)).unwrap_err();
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Error]);
}

#[test]
fn composite_observer_fans_out() {
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![a.clone(), b.clone(), Arc::new(TracingObserver)]);
    let ctx = IngestionContext {
        locator: "x.csv".to_string(),
        path: IngestionPath::Csv,
    };

    composite.on_success(&ctx, IngestionStats { leaves: 1, values: 1 });
    assert_eq!(a.successes.lock().unwrap().len(), 1);
    assert_eq!(b.successes.lock().unwrap().len(), 1);
}
