use std::sync::{Arc, Mutex};
use std::time::Duration;

use doc_convert::config::{FailurePolicy, NodeParameters};
use doc_convert::execution::{Scheduler, SchedulerEvent, SchedulerObserver, TaskOutcome};
use doc_convert::pipeline::convert_batch;
use doc_convert::types::{FileEntry, FileInput};
use doc_convert::{ConvertOptions, ErrorKind};

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<SchedulerEvent>>,
}

impl SchedulerObserver for EventLog {
    fn on_event(&self, event: &SchedulerEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test(start_paused = true)]
async fn reversed_latency_keeps_input_order() {
    let scheduler = Scheduler::new(2, FailurePolicy::FailFast);
    let results = scheduler
        .try_run(vec!["r0", "r1", "r2", "r3", "r4"], |i, item| async move {
            tokio::time::sleep(Duration::from_millis(100 - 20 * i as u64)).await;
            Ok::<_, String>(item.to_string())
        })
        .await
        .unwrap();

    assert_eq!(results, vec!["r0", "r1", "r2", "r3", "r4"]);
    assert!(scheduler.metrics().snapshot().max_active_tasks <= 2);
}

#[tokio::test(start_paused = true)]
async fn scheduler_events_bracket_the_run() {
    let log = Arc::new(EventLog::default());
    let scheduler = Scheduler::new(3, FailurePolicy::Continue)
        .with_observer(Some(log.clone() as Arc<dyn SchedulerObserver>));

    let outcomes = scheduler
        .run(vec![1u32, 2, 3, 4], |_, n| async move {
            tokio::time::sleep(Duration::from_millis(u64::from(n))).await;
            if n == 3 { Err("odd one out") } else { Ok(n) }
        })
        .await;
    assert_eq!(outcomes[2], TaskOutcome::Failed("odd one out"));

    let events = log.events.lock().unwrap();
    assert!(matches!(
        events.first(),
        Some(SchedulerEvent::RunStarted { tasks: 4, max_concurrency: 3 })
    ));
    match events.last() {
        Some(SchedulerEvent::RunFinished { metrics, .. }) => {
            assert_eq!(metrics.tasks_started, 4);
            assert_eq!(metrics.tasks_finished, 4);
            assert_eq!(metrics.tasks_failed, 1);
            assert_eq!(metrics.max_active_tasks, 3);
        }
        other => panic!("expected RunFinished last, got {other:?}"),
    }
    let started = events
        .iter()
        .filter(|e| matches!(e, SchedulerEvent::TaskStarted { .. }))
        .count();
    assert_eq!(started, 4);
}

#[tokio::test]
async fn batch_output_follows_input_order() {
    let inputs: Vec<FileInput> = (0..8)
        .map(|i| FileInput::new(format!("file-{i}.txt"), format!("content {i}")))
        .collect();
    let options = ConvertOptions {
        max_concurrency: 3,
        ..ConvertOptions::default()
    };

    let out = convert_batch(inputs, &options).await.unwrap();
    let grouped = out.as_grouped().unwrap();
    assert_eq!(grouped.total_files, 8);
    for (i, entry) in grouped.files.iter().enumerate() {
        let r = entry.as_converted().unwrap();
        assert_eq!(r.metadata.file_name, format!("file-{i}.txt"));
        assert_eq!(r.content.as_text(), Some(format!("content {i}").as_str()));
    }
}

#[tokio::test]
async fn failed_item_fails_the_whole_batch_by_default() {
    let inputs = vec![
        FileInput::new("a.txt", "ok"),
        FileInput::new("b.json", "{broken"),
        FileInput::new("c.txt", "ok too"),
    ];
    let err = convert_batch(inputs, &ConvertOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessingError);
    assert!(err.to_string().starts_with("JSON processing error:"));
}

#[tokio::test]
async fn continue_policy_serializes_failed_entries() {
    let options = ConvertOptions {
        failure_policy: FailurePolicy::Continue,
        ..ConvertOptions::default()
    };
    let inputs = vec![
        FileInput::new("a.txt", "ok"),
        FileInput::new("legacy.ppt", doc_convert::format::CFB_SIGNATURE.to_vec()),
    ];

    let out = convert_batch(inputs, &options).await.unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["totalFiles"], 2);
    assert_eq!(json["files"][0]["text"], "ok");
    assert_eq!(json["files"][0]["metadata"]["fileType"], "txt");
    assert_eq!(json["files"][1]["error"]["kind"], "UnsupportedFormatError");
    assert_eq!(json["files"][1]["metadata"]["fileName"], "legacy.ppt");
    assert_eq!(json["files"][1]["metadata"]["index"], 1);
    assert!(matches!(
        out.as_grouped().unwrap().files[1],
        FileEntry::Failed(_)
    ));
}

#[tokio::test]
async fn host_parameters_drive_the_batch() {
    let params: NodeParameters = serde_json::from_str(
        r#"{"maxFileSize": 1, "maxConcurrency": 2, "outputSheetsAsSeparateItems": true}"#,
    )
    .unwrap();
    let options = params.into_options().unwrap();
    assert_eq!(options.max_concurrency, 2);

    let inputs = vec![FileInput::new("t.csv", "a,b\n1,2\n")];
    let out = convert_batch(inputs, &options).await.unwrap();
    let items = out.as_separate_items().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].sheet_name.as_deref(), Some("Sheet1"));

    let too_big = vec![FileInput::new("big.txt", vec![b'x'; 2 * 1024 * 1024])];
    let err = convert_batch(too_big, &options).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileTooLargeError);
}

#[test]
fn out_of_range_parameters_are_rejected() {
    let params: NodeParameters = serde_json::from_str(r#"{"maxConcurrency": 11}"#).unwrap();
    let err = params.into_options().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileTypeError);
    assert!(err.message().contains("maxConcurrency"));
}
