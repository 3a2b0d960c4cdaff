// ABOUTME: Table extraction: container, repeated rows and cells decoded into a fixed-width Record.
// ABOUTME: Rows with too few cells are dropped, extra cells are ignored, document order is kept.

//! Table extraction.
//!
//! Algorithm:
//! 1. The first node matching `container` is the table; no match gives an
//!    empty record.
//! 2. Rows are the container's descendants matching `rows`, in document order.
//! 3. Cells are each row's descendants matching `cells`, in document order.
//! 4. A row with at least `column_count` cells contributes its first
//!    `column_count` trimmed cell texts; shorter rows are skipped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::TableDescriptor;
use crate::document::{element_text, Document};
use crate::result::Record;
use crate::selectors::get_or_compile;

/// Row accounting for one table extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Rows that made it into the record.
    pub accepted: usize,
    /// Rows skipped for having fewer cells than declared columns.
    pub dropped: usize,
    /// Accepted rows that had cells beyond the declared columns.
    pub truncated: usize,
}

/// Applies one table descriptor to a document.
pub fn extract_table(doc: &Document, td: &TableDescriptor) -> Record {
    extract_table_with_stats(doc, td).0
}

/// Like [`extract_table`], also reporting how many rows were dropped or truncated.
pub fn extract_table_with_stats(doc: &Document, td: &TableDescriptor) -> (Record, TableStats) {
    let mut record = Record::empty(td.columns.clone());
    let mut stats = TableStats::default();
    let width = td.column_count();

    let (Some(container_sel), Some(row_sel), Some(cell_sel)) = (
        get_or_compile(&td.container),
        get_or_compile(&td.rows),
        get_or_compile(&td.cells),
    ) else {
        debug!(table = %td.name, "table selectors do not compile");
        return (record, stats);
    };

    let Some(container) = doc.select_first(&container_sel) else {
        debug!(table = %td.name, container = %td.container, "table container absent");
        return (record, stats);
    };

    for row in container.select(&row_sel) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < width {
            stats.dropped += 1;
            continue;
        }
        if cells.len() > width {
            stats.truncated += 1;
        }
        record
            .rows
            .push(cells.into_iter().take(width).map(element_text).collect());
        stats.accepted += 1;
    }

    if stats.dropped > 0 || stats.truncated > 0 {
        debug!(
            table = %td.name,
            accepted = stats.accepted,
            dropped = stats.dropped,
            truncated = stats.truncated,
            "table rows did not match declared columns"
        );
    }

    (record, stats)
}
