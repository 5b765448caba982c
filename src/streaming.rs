//! Streaming fallback selection for plain and delimited text.
//!
//! Inputs at or below [`StreamingLimits::stream_threshold_bytes`] are decoded as one buffer;
//! larger inputs are decoded incrementally through [`DecodingReader`], line by line for text and
//! record by record for CSV. Both paths apply the same caps, so they agree on every input that
//! stays under them.

use std::io::{self, BufRead, BufReader, Read};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::config::StreamingLimits;
use crate::encoding::{self, DecodingReader};

/// Which decoding path was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPath {
    WholeBuffer,
    Incremental,
}

/// Choose the decoding path for an input of `len` bytes.
pub fn select_path(len: usize, limits: &StreamingLimits) -> ReadPath {
    if len > limits.stream_threshold_bytes {
        ReadPath::Incremental
    } else {
        ReadPath::WholeBuffer
    }
}

/// Decoded text, capped at [`StreamingLimits::text_char_cap`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappedText {
    pub text: String,
    pub truncated: bool,
    pub path: ReadPath,
}

/// Decode `content` as text, selecting the path by size.
pub fn read_text(content: &[u8], limits: &StreamingLimits) -> io::Result<CappedText> {
    let path = select_path(content.len(), limits);
    debug!(bytes = content.len(), ?path, "decoding text");

    let (text, truncated) = match path {
        ReadPath::WholeBuffer => {
            let decoded = encoding::decode(content);
            match decoded.char_indices().nth(limits.text_char_cap) {
                Some((cut, _)) => (decoded[..cut].to_string(), true),
                None => (decoded, false),
            }
        }
        ReadPath::Incremental => read_text_incremental(content, limits.text_char_cap)?,
    };

    if truncated {
        warn!(cap = limits.text_char_cap, "text truncated");
    }
    Ok(CappedText {
        text,
        truncated,
        path,
    })
}

fn read_text_incremental(content: &[u8], cap: usize) -> io::Result<(String, bool)> {
    let reader = DecodingReader::new(content, encoding::detect_encoding(content));
    let mut lines = BufReader::new(reader);

    let mut text = String::new();
    let mut kept_chars = 0usize;
    let mut truncated = false;
    let mut line = String::new();

    loop {
        line.clear();
        if lines.read_line(&mut line)? == 0 {
            break;
        }
        if truncated {
            // Past the cap: keep scanning only so the whole input is consumed.
            continue;
        }
        let room = cap - kept_chars;
        match line.char_indices().nth(room) {
            Some((cut, _)) => {
                text.push_str(&line[..cut]);
                kept_chars = cap;
                truncated = true;
            }
            None => {
                kept_chars += line.chars().count();
                text.push_str(&line);
            }
        }
    }
    Ok((text, truncated))
}

/// Delimited text: header record plus up to [`StreamingLimits::csv_row_cap`] non-blank records.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    /// Count of all non-blank data records, including those past the cap.
    pub total_records: usize,
    pub path: ReadPath,
}

impl CsvTable {
    pub fn truncated(&self) -> bool {
        self.total_records > self.records.len()
    }
}

/// Parse `content` as CSV, selecting the path by size.
pub fn read_csv(content: &[u8], limits: &StreamingLimits) -> csv::Result<CsvTable> {
    let path = select_path(content.len(), limits);
    debug!(bytes = content.len(), ?path, "parsing delimited text");

    let (headers, records, total_records) = match path {
        ReadPath::WholeBuffer => {
            let decoded = encoding::decode(content);
            collect_records(decoded.as_bytes(), limits.csv_row_cap)?
        }
        ReadPath::Incremental => {
            let reader = DecodingReader::new(content, encoding::detect_encoding(content));
            collect_records(reader, limits.csv_row_cap)?
        }
    };

    if total_records > records.len() {
        warn!(cap = limits.csv_row_cap, total_records, "csv truncated");
    }
    Ok(CsvTable {
        headers,
        records,
        total_records,
        path,
    })
}

fn collect_records<R: Read>(
    reader: R,
    cap: usize,
) -> csv::Result<(StringRecord, Vec<StringRecord>, usize)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    let mut total = 0usize;
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        total += 1;
        if records.len() < cap {
            records.push(record);
        }
    }
    Ok((headers, records, total))
}
