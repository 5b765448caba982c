//! Office document text extraction.
//!
//! [`extract_text`] is the generic extractor shared by the word-processing, presentation and
//! OpenDocument strategies: it opens the zip container, picks the text-bearing XML parts, and
//! streams them through `quick-xml`. The DOCX strategy falls back to `docx-rs` when the generic
//! path fails.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::types::Converted;

use super::registry::StrategyContext;

/// Part layout of a recognized container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    WordprocessingMl,
    PresentationMl,
    OpenDocument,
}

/// Extract plain text from an OOXML (`docx`/`pptx`) or ODF (`odt`/`odp`/`ods`) container.
///
/// Errors carry the decoder message and are labelled with `format`.
pub fn extract_text(content: &[u8], format: FormatTag) -> ConvertResult<String> {
    let fail = |e: &dyn std::fmt::Display| ConversionError::processing(format, e.to_string());

    let mut archive = ZipArchive::new(Cursor::new(content)).map_err(|e| fail(&e))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    let (container, parts) = if names.iter().any(|n| n == "word/document.xml") {
        (Container::WordprocessingMl, vec!["word/document.xml".to_string()])
    } else if let Some(slides) = slide_parts(&names) {
        (Container::PresentationMl, slides)
    } else if names.iter().any(|n| n == "content.xml") {
        (Container::OpenDocument, vec!["content.xml".to_string()])
    } else {
        return Err(ConversionError::processing(
            format,
            "unrecognized office container (no document, slide or content part)",
        ));
    };
    debug!(?container, parts = parts.len(), "extracting office text");

    let mut out = String::new();
    for part in parts {
        let mut xml = Vec::new();
        archive
            .by_name(&part)
            .map_err(|e| fail(&e))?
            .read_to_end(&mut xml)
            .map_err(|e| fail(&e))?;
        extract_part(&xml, container, &mut out).map_err(|e| fail(&e))?;
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    Ok(tidy_lines(&out))
}

/// `ppt/slides/slideN.xml`, ordered by N.
fn slide_parts(names: &[String]) -> Option<Vec<String>> {
    let mut slides: Vec<(u32, String)> = names
        .iter()
        .filter_map(|n| {
            let num = n
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((num, n.clone()))
        })
        .collect();
    if slides.is_empty() {
        return None;
    }
    slides.sort_by_key(|(num, _)| *num);
    Some(slides.into_iter().map(|(_, n)| n).collect())
}

fn extract_part(xml: &[u8], container: Container, out: &mut String) -> quick_xml::Result<()> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();

    // OOXML keeps character data in run elements; ODF keeps it in paragraphs and headings.
    let mut in_run = false;
    let mut para_depth = 0usize;
    let mut cell_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" | b"a:t" => in_run = true,
                b"text:p" | b"text:h" => para_depth += 1,
                b"table:table-cell" => cell_depth += 1,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" | b"text:tab" => out.push('\t'),
                b"w:br" | b"w:cr" | b"a:br" | b"text:line-break" => out.push('\n'),
                b"text:s" => out.push(' '),
                b"table:table-cell" if container == Container::OpenDocument => out.push('\t'),
                _ => {}
            },
            Event::Text(t) => {
                let collect = match container {
                    Container::OpenDocument => para_depth > 0,
                    _ => in_run,
                };
                if collect {
                    out.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_run => {
                out.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" | b"a:t" => in_run = false,
                b"w:p" | b"a:p" => out.push('\n'),
                b"text:p" | b"text:h" => {
                    para_depth = para_depth.saturating_sub(1);
                    out.push(if cell_depth == 0 { '\n' } else { ' ' });
                }
                b"table:table-cell" => {
                    cell_depth = cell_depth.saturating_sub(1);
                    trim_trailing_spaces(out);
                    out.push('\t');
                }
                b"table:table-row" => {
                    while out.ends_with('\t') {
                        out.pop();
                    }
                    out.push('\n');
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn trim_trailing_spaces(s: &mut String) {
    while s.ends_with(' ') {
        s.pop();
    }
}

/// Trim each line's trailing whitespace and drop leading/trailing blank lines.
fn tidy_lines(raw: &str) -> String {
    raw.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

/// Walk the `docx-rs` document model and join run text paragraph by paragraph.
fn extract_docx_model(content: &[u8]) -> Option<String> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let docx = docx_rs::read_docx(content).ok()?;
    let mut out = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(p) = child {
            for pc in &p.children {
                if let ParagraphChild::Run(run) = pc {
                    for rc in &run.children {
                        match rc {
                            RunChild::Text(t) => out.push_str(&t.text),
                            RunChild::Tab(_) => out.push('\t'),
                            _ => {}
                        }
                    }
                }
            }
            out.push('\n');
        }
    }
    Some(tidy_lines(&out))
}

/// Strategy for `.docx`: generic extractor first, `docx-rs` on failure.
pub fn convert_word_document(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    match extract_text(content, FormatTag::WordDocument) {
        Ok(text) => Ok(Converted::text(text)),
        Err(first) => {
            debug!(error = %first, "generic docx extraction failed, trying docx-rs");
            extract_docx_model(content)
                .map(Converted::text)
                .ok_or(first)
        }
    }
}

/// Strategy for `.doc`: only a modern container mislabelled as `.doc` reaches this point, since
/// true legacy binaries are rejected during format resolution.
pub fn convert_legacy_word_document(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    extract_text(content, FormatTag::LegacyWordDocument).map(Converted::text)
}

pub fn convert_presentation(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    extract_text(content, FormatTag::Presentation).map(Converted::text)
}

/// Strategy for `.ppt`, under the same constraint as [`convert_legacy_word_document`].
pub fn convert_legacy_presentation(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    extract_text(content, FormatTag::LegacyPresentation).map(Converted::text)
}

pub fn convert_open_document_text(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    extract_text(content, FormatTag::OpenDocumentText).map(Converted::text)
}

pub fn convert_open_document_presentation(
    content: &[u8],
    _ctx: &StrategyContext,
) -> ConvertResult<Converted> {
    extract_text(content, FormatTag::OpenDocumentPresentation).map(Converted::text)
}

/// OpenDocument spreadsheets are emitted as text: one line per row, cells tab-separated.
pub fn convert_open_document_spreadsheet(
    content: &[u8],
    _ctx: &StrategyContext,
) -> ConvertResult<Converted> {
    extract_text(content, FormatTag::OpenDocumentSpreadsheet).map(Converted::text)
}
