use doc_convert::config::{ConvertOptions, StreamingLimits};
use doc_convert::conversion::{StrategyRegistry, convert_file};
use doc_convert::streaming::{ReadPath, read_csv, read_text, select_path};
use doc_convert::types::FileInput;

fn options_with(limits: StreamingLimits) -> ConvertOptions {
    ConvertOptions {
        limits,
        ..ConvertOptions::default()
    }
}

#[test]
fn csv_just_under_and_just_over_threshold_yield_identical_rows() {
    let limits = StreamingLimits {
        stream_threshold_bytes: 4096,
        ..StreamingLimits::default()
    };

    let mut under = String::from("id,name\n");
    for i in 0..50 {
        under.push_str(&format!("{i},name-{i}\n"));
    }
    assert!(under.len() <= limits.stream_threshold_bytes);
    // Blank lines carry no records.
    let over = format!("{under}{}", "\n".repeat(limits.stream_threshold_bytes));
    assert_eq!(select_path(over.len(), &limits), ReadPath::Incremental);

    let whole = read_csv(under.as_bytes(), &limits).unwrap();
    let streamed = read_csv(over.as_bytes(), &limits).unwrap();
    assert_eq!(whole.path, ReadPath::WholeBuffer);
    assert_eq!(streamed.path, ReadPath::Incremental);
    let fields = |t: &doc_convert::streaming::CsvTable| -> Vec<Vec<String>> {
        t.records
            .iter()
            .map(|r| r.iter().map(str::to_string).collect())
            .collect()
    };
    assert_eq!(fields(&whole), fields(&streamed));

    let registry = StrategyRegistry::with_defaults();
    let options = options_with(limits);
    let a = convert_file(0, FileInput::new("a.csv", under), &registry, &options).unwrap();
    let b = convert_file(1, FileInput::new("b.csv", over), &registry, &options).unwrap();
    assert_eq!(
        a.content.as_sheets().unwrap()["Sheet1"].data,
        b.content.as_sheets().unwrap()["Sheet1"].data
    );
}

#[test]
fn long_plain_text_is_cut_to_the_character_cap() {
    let input = "abcdefghij".repeat(150_000);
    assert_eq!(input.len(), 1_500_000);

    let registry = StrategyRegistry::with_defaults();
    let r = convert_file(
        0,
        FileInput::new("long.txt", input),
        &registry,
        &ConvertOptions::default(),
    )
    .unwrap();

    assert_eq!(r.content.as_text().unwrap().chars().count(), 1_000_000);
    assert_eq!(
        r.warning.as_deref(),
        Some("Text truncated to 1000000 characters")
    );
}

#[test]
fn incremental_text_path_applies_the_same_cap() {
    let input = "line of text\n".repeat(1_000);
    let limits = StreamingLimits {
        stream_threshold_bytes: 1024,
        text_char_cap: 5_000,
        ..StreamingLimits::default()
    };

    let streamed = read_text(input.as_bytes(), &limits).unwrap();
    let whole = read_text(
        input.as_bytes(),
        &StreamingLimits {
            stream_threshold_bytes: usize::MAX,
            ..limits
        },
    )
    .unwrap();

    assert_eq!(streamed.path, ReadPath::Incremental);
    assert!(streamed.truncated && whole.truncated);
    assert_eq!(streamed.text.chars().count(), 5_000);
    assert_eq!(streamed.text, whole.text);
}

#[test]
fn multibyte_text_is_cut_on_character_boundaries() {
    let input = "日本語".repeat(10);
    let limits = StreamingLimits {
        stream_threshold_bytes: 8,
        text_char_cap: 7,
        ..StreamingLimits::default()
    };
    let out = read_text(input.as_bytes(), &limits).unwrap();
    assert_eq!(out.text, "日本語日本語日");
    assert!(out.truncated);
}
