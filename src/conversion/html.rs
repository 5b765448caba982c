//! Web markup: visible body text, whitespace-collapsed and sanitized.

use scraper::{ElementRef, Html, Selector};

use crate::encoding;
use crate::error::ConvertResult;
use crate::types::Converted;

use super::registry::StrategyContext;

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(el) = ElementRef::wrap(child) {
            if !SKIPPED_ELEMENTS.contains(&el.value().name()) {
                collect_text(el, out);
            }
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip anything that still parses as markup after entity decoding.
fn sanitize(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    let mut out = String::new();
    collect_text(fragment.root_element(), &mut out);
    collapse_whitespace(&out)
}

/// Visible text of an HTML document.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut raw = String::new();

    match Selector::parse("body") {
        Ok(body_sel) => match doc.select(&body_sel).next() {
            Some(body) => collect_text(body, &mut raw),
            None => collect_text(doc.root_element(), &mut raw),
        },
        Err(_) => collect_text(doc.root_element(), &mut raw),
    }

    sanitize(&collapse_whitespace(&raw))
}

pub fn convert_html(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    let html = encoding::decode(content);
    Ok(Converted::text(html_to_text(&html)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_text_excludes_scripts_and_collapses_whitespace() {
        let html = r#"<html><head><title>T</title><style>p{}</style></head>
            <body>
              <h1>Hello</h1>
              <script>var x = 1;</script>
              <p>first   line<br>second&nbsp;line</p>
              <noscript>enable js</noscript>
            </body></html>"#;
        assert_eq!(html_to_text(html), "Hello first line second line");
    }

    #[test]
    fn escaped_markup_is_stripped() {
        let html = "<body><p>&lt;b&gt;bold&lt;/b&gt; text</p></body>";
        assert_eq!(html_to_text(html), "bold text");
    }
}
