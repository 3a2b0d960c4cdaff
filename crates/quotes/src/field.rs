// ABOUTME: Scalar field extraction: first match of a FieldDescriptor's selector, trimmed text.
// ABOUTME: A selector that matches nothing yields ScalarResult::Absent, never an error.

//! Scalar field extraction.
//!
//! Key behaviors:
//! - Only the first match in document order is read.
//! - Text is the concatenation of all descendant text nodes, trimmed.
//! - An element with no text yields `Present("")`.
//! - No match, or a selector that does not compile, yields `Absent`.

use tracing::trace;

use crate::descriptor::FieldDescriptor;
use crate::document::{element_text, Document};
use crate::result::ScalarResult;
use crate::selectors::get_or_compile;

/// Applies one field descriptor to a document.
pub fn extract_field(doc: &Document, fd: &FieldDescriptor) -> ScalarResult {
    let Some(selector) = get_or_compile(&fd.selector) else {
        trace!(field = %fd.name, selector = %fd.selector, "selector does not compile");
        return ScalarResult::Absent;
    };

    match doc.select_first(&selector) {
        Some(el) => ScalarResult::Present(element_text(el)),
        None => {
            trace!(field = %fd.name, selector = %fd.selector, "field absent");
            ScalarResult::Absent
        }
    }
}
