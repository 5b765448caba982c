//! Character-set detection and decoding.
//!
//! Detection priority:
//! 1. BOM
//! 2. NUL-byte pattern for BOM-less UTF-16
//! 3. UTF-8 validation over a leading sample
//! 4. chardetng statistical detection for legacy encodings
//!
//! [`decode`] converts a whole buffer; [`DecodingReader`] converts incrementally so the streaming
//! paths never hold a second full-size copy of the input.

use std::io::{self, Read};

use chardetng::EncodingDetector;
use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// Number of leading bytes inspected when guessing the encoding.
pub const DETECTION_SAMPLE_BYTES: usize = 64 * 1024;

/// Guess the encoding of `content` from its leading sample.
pub fn detect_encoding(content: &[u8]) -> &'static Encoding {
    let sample = &content[..content.len().min(DETECTION_SAMPLE_BYTES)];

    if let Some((encoding, _bom_len)) = Encoding::for_bom(sample) {
        return encoding;
    }

    if let Some(encoding) = detect_utf16_without_bom(sample) {
        return encoding;
    }

    match std::str::from_utf8(sample) {
        Ok(_) => return UTF_8,
        // A multi-byte sequence cut by the sample boundary is still UTF-8.
        Err(e) if e.error_len().is_none() => return UTF_8,
        Err(_) => {}
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == content.len());
    detector.guess(None, true)
}

/// ASCII-range UTF-16 puts a NUL in every other byte; NULs at odd offsets mean little-endian.
fn detect_utf16_without_bom(sample: &[u8]) -> Option<&'static Encoding> {
    let pairs = sample.len() / 2;
    if pairs <= 4 {
        return None;
    }

    let nulls_at_even = sample.iter().step_by(2).filter(|&&b| b == 0).count();
    let nulls_at_odd = sample.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();

    if nulls_at_odd > pairs * 3 / 4 && nulls_at_even < pairs / 4 {
        Some(UTF_16LE)
    } else if nulls_at_even > pairs * 3 / 4 && nulls_at_odd < pairs / 4 {
        Some(UTF_16BE)
    } else {
        None
    }
}

/// Decode the whole buffer to a `String`, replacing malformed sequences.
pub fn decode(content: &[u8]) -> String {
    let encoding = detect_encoding(content);
    let (text, _actual, _had_errors) = encoding.decode(content);
    text.into_owned()
}

/// A [`Read`] adapter that yields UTF-8 bytes decoded from an arbitrary source encoding.
pub struct DecodingReader<R> {
    inner: R,
    decoder: Decoder,
    input: Vec<u8>,
    input_pos: usize,
    input_len: usize,
    output: Vec<u8>,
    output_pos: usize,
    output_len: usize,
    eof: bool,
    finished: bool,
}

const READER_BUF: usize = 16 * 1024;

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder(),
            input: vec![0; READER_BUF],
            input_pos: 0,
            input_len: 0,
            output: vec![0; READER_BUF],
            output_pos: 0,
            output_len: 0,
            eof: false,
            finished: false,
        }
    }

    fn fill_output(&mut self) -> io::Result<()> {
        while self.output_pos == self.output_len && !self.finished {
            if self.input_pos == self.input_len && !self.eof {
                let n = self.inner.read(&mut self.input)?;
                self.input_pos = 0;
                self.input_len = n;
                self.eof = n == 0;
            }

            let last = self.eof;
            let (result, read, written, _) = self.decoder.decode_to_utf8(
                &self.input[self.input_pos..self.input_len],
                &mut self.output,
                last,
            );
            self.input_pos += read;
            self.output_pos = 0;
            self.output_len = written;

            if last && result == CoderResult::InputEmpty {
                self.finished = true;
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill_output()?;
        let available = &self.output[self.output_pos..self.output_len];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.output_pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_and_boms_are_detected() {
        assert_eq!(detect_encoding("héllo".as_bytes()), UTF_8);
        assert_eq!(detect_encoding(b"\xFF\xFEh\x00i\x00"), UTF_16LE);
        assert_eq!(decode(b"\xEF\xBB\xBFhi"), "hi");
    }

    #[test]
    fn utf16_without_bom_is_detected_from_nul_pattern() {
        let le: Vec<u8> = "hello world".encode_utf16().flat_map(u16::to_le_bytes).collect();
        let be: Vec<u8> = "hello world".encode_utf16().flat_map(u16::to_be_bytes).collect();
        assert_eq!(detect_encoding(&le), UTF_16LE);
        assert_eq!(detect_encoding(&be), UTF_16BE);
        assert_eq!(decode(&le), "hello world");
        assert_eq!(decode(&be), "hello world");

        // Too short to judge, and a lone NUL in UTF-8 text is not a pattern.
        assert_eq!(detect_encoding(b"h\x00i\x00"), UTF_8);
        assert_eq!(detect_encoding(b"plain text\x00with one nul"), UTF_8);
    }

    #[test]
    fn utf16_reader_matches_whole_buffer_decode() {
        let text = "row,value\n".repeat(3_000);
        let le: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let mut streamed = String::new();
        DecodingReader::new(le.as_slice(), detect_encoding(&le))
            .read_to_string(&mut streamed)
            .unwrap();
        assert_eq!(streamed, text);
    }

    #[test]
    fn legacy_single_byte_text_is_decoded() {
        // "café crème" in windows-1252.
        let bytes = b"caf\xE9 cr\xE8me, d\xE9j\xE0 vu, na\xEFve fa\xE7ade";
        let text = decode(bytes);
        assert!(text.starts_with("caf"), "{text}");
        assert!(!text.contains('\u{FFFD}'), "{text}");
    }

    #[test]
    fn reader_matches_whole_buffer_decode() {
        let mut bytes = Vec::new();
        for i in 0..5_000 {
            bytes.extend_from_slice(format!("line {i}: caf\u{e9} \u{2603}\n").as_bytes());
        }
        let mut streamed = String::new();
        DecodingReader::new(bytes.as_slice(), detect_encoding(&bytes))
            .read_to_string(&mut streamed)
            .unwrap();
        assert_eq!(streamed, decode(&bytes));
    }
}
