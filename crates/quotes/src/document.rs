// ABOUTME: Document adapter wrapping scraper's HTML tree with lenient parsing and charset decoding.
// ABOUTME: Only binary-looking payloads fail; malformed markup degrades to a partial tree.

//! Parsed markup documents.
//!
//! A [`Document`] is built once per extraction call and only ever read.
//! Parsing goes through html5ever (via `scraper`), which recovers from
//! unclosed tags, stray end tags and similar damage the same way browsers do.

use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;

/// How far into the markup to look for NUL characters.
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// An immutable, parsed markup tree.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses markup text into a document.
    ///
    /// Fails only when the input looks like a binary payload rather than
    /// text, which is the single case html5ever cannot meaningfully recover.
    pub fn parse(markup: &str) -> Result<Self, ScrapeError> {
        if looks_binary(markup) {
            return Err(ScrapeError::parse(
                "",
                "Parse",
                Some(anyhow::anyhow!("payload is not text markup")),
            ));
        }
        Ok(Self {
            html: Html::parse_document(markup),
        })
    }

    /// Decodes raw body bytes and parses the result.
    ///
    /// The charset comes from the Content-Type header when present, else it
    /// is detected from the bytes.
    pub fn from_bytes(body: &[u8], content_type: Option<&str>) -> Result<Self, ScrapeError> {
        Self::parse(&decode_body(body, content_type))
    }

    /// First element matching `selector` in document order.
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// All elements matching `selector` in document order.
    pub fn select_all<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }
}

/// Concatenated text of all descendant text nodes, trimmed at both ends.
///
/// Interior whitespace is left as it appears in the markup.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn looks_binary(markup: &str) -> bool {
    markup
        .char_indices()
        .take_while(|(i, _)| *i < BINARY_SNIFF_LEN)
        .any(|(_, c)| c == '\0')
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub(crate) fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}
