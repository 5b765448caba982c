use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use doc_convert::config::{ConvertOptions, StreamingLimits};
use doc_convert::conversion::{
    CompositeObserver, ConversionContext, ConversionObserver, ConversionSeverity, ConversionStats,
    FileObserver, StrategyRegistry, convert_file,
};
use doc_convert::types::FileInput;
use doc_convert::{ConversionError, FormatTag};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(String, ConversionStats)>>,
    failures: Mutex<Vec<ConversionSeverity>>,
    alerts: Mutex<Vec<ConversionSeverity>>,
    formats: Mutex<Vec<Option<FormatTag>>>,
}

impl ConversionObserver for RecordingObserver {
    fn on_success(&self, ctx: &ConversionContext, stats: ConversionStats) {
        self.successes.lock().unwrap().push((ctx.file_name.clone(), stats));
    }

    fn on_failure(&self, ctx: &ConversionContext, severity: ConversionSeverity, _error: &ConversionError) {
        self.failures.lock().unwrap().push(severity);
        self.formats.lock().unwrap().push(ctx.format);
    }

    fn on_alert(&self, _ctx: &ConversionContext, severity: ConversionSeverity, _error: &ConversionError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn tmp_log() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("doc-convert-observer-{nanos}.log"))
}

fn run(obs: Arc<dyn ConversionObserver>, input: FileInput) -> Result<(), ConversionError> {
    let options = ConvertOptions {
        observer: Some(obs),
        alert_at_or_above: ConversionSeverity::Critical,
        ..ConvertOptions::default()
    };
    let registry = StrategyRegistry::with_defaults();
    convert_file(0, input, &registry, &options).map(|_| ())
}

#[test]
fn success_reports_stats() {
    let obs = Arc::new(RecordingObserver::default());
    run(obs.clone(), FileInput::new("hello.txt", "hello")).unwrap();

    let successes = obs.successes.lock().unwrap();
    assert_eq!(successes.len(), 1);
    let (name, stats) = &successes[0];
    assert_eq!(name, "hello.txt");
    assert_eq!(stats.bytes, 5);
    assert_eq!(stats.text_chars, 5);
    assert_eq!(stats.sheets, 0);
    assert_eq!(stats.severity, ConversionSeverity::Info);
}

#[test]
fn truncated_success_reports_warning_severity() {
    let obs = Arc::new(RecordingObserver::default());
    let options = ConvertOptions {
        observer: Some(obs.clone() as Arc<dyn ConversionObserver>),
        limits: StreamingLimits {
            text_char_cap: 4,
            ..StreamingLimits::default()
        },
        ..ConvertOptions::default()
    };
    let registry = StrategyRegistry::with_defaults();
    convert_file(0, FileInput::new("long.txt", "longer than four"), &registry, &options).unwrap();

    let successes = obs.successes.lock().unwrap();
    assert_eq!(successes[0].1.severity, ConversionSeverity::Warning);
    assert_eq!(successes[0].1.text_chars, 4);
    assert!(obs.failures.lock().unwrap().is_empty());
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn decoder_failure_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    run(obs.clone(), FileInput::new("broken.json", "{")).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![ConversionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![ConversionSeverity::Critical]);
    assert_eq!(*obs.formats.lock().unwrap(), vec![Some(FormatTag::Json)]);
}

#[test]
fn validation_failure_does_not_alert() {
    let obs = Arc::new(RecordingObserver::default());
    run(obs.clone(), FileInput::new("nothing.txt", Vec::<u8>::new())).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![ConversionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
    assert_eq!(*obs.formats.lock().unwrap(), vec![None]);
}

#[test]
fn composite_fans_out_and_file_observer_appends() {
    let path = tmp_log();
    let recording = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![
        recording.clone() as Arc<dyn ConversionObserver>,
        Arc::new(FileObserver::new(&path)),
    ]);

    run(Arc::new(composite), FileInput::new("data.json", "[1, 2]")).unwrap();
    let _ = run(
        Arc::new(FileObserver::new(&path)),
        FileInput::new("bad.json", "]"),
    );

    assert_eq!(recording.successes.lock().unwrap().len(), 1);
    let log = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(" ok severity=Info") && lines[0].contains("file=data.json"));
    assert!(lines[1].contains(" fail severity=Critical"));
    assert!(lines[2].contains(" ALERT severity=Critical"));
    let _ = std::fs::remove_file(&path);
}
