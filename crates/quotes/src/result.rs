// ABOUTME: Output values of extraction: ScalarResult, Record, failure sentinels and PageExtraction.
// ABOUTME: Includes lookup helpers and a plain-text rendering used by the CLI.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ScrapeError};

/// Value of a field extraction. `Absent` is never conflated with an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ScalarResult {
    Present(String),
    Absent,
}

impl ScalarResult {
    pub fn is_present(&self) -> bool {
        matches!(self, ScalarResult::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ScalarResult::Absent)
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            ScalarResult::Present(s) => Some(s),
            ScalarResult::Absent => None,
        }
    }
}

/// Rows accepted by a table extraction, in document order.
///
/// Every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Record {
    /// An empty record with the given column labels.
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<String>> {
        self.rows.iter()
    }

    /// Index of a column label.
    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Vec<String>;
    type IntoIter = std::slice::Iter<'a, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Why a whole page could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    Parse,
}

/// Sentinel standing in for every descriptor of a page that failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&ScrapeError> for Failure {
    fn from(err: &ScrapeError) -> Self {
        let kind = match err.code {
            ErrorCode::Parse => FailureKind::Parse,
            _ => FailureKind::Fetch,
        };
        Self {
            kind,
            message: err.cause(),
        }
    }
}

/// Either an extracted value or the page-level failure sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<T> {
    Extracted(T),
    Failed(Failure),
}

impl<T> Outcome<T> {
    pub fn extracted(&self) -> Option<&T> {
        match self {
            Outcome::Extracted(v) => Some(v),
            Outcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Extracted(_) => None,
            Outcome::Failed(f) => Some(f),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub outcome: Outcome<ScalarResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub outcome: Outcome<Record>,
}

/// Everything extracted from one page load, one entry per descriptor in
/// descriptor order.
///
/// A failed page carries its failure here as well as on every entry, so a
/// page with no descriptors still reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageExtraction {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    pub fields: Vec<FieldEntry>,
    pub tables: Vec<TableEntry>,
}

impl PageExtraction {
    pub fn field(&self, name: &str) -> Option<&Outcome<ScalarResult>> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.outcome)
    }

    pub fn table(&self, name: &str) -> Option<&Outcome<Record>> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .map(|t| &t.outcome)
    }

    /// True when the page failed to fetch or parse.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// The page-level failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Render the extraction as plain text.
    ///
    /// Fields print as `name: value`, absent fields as `name: (not found)`,
    /// tables as a tab-separated header line followed by their rows.
    pub fn format_text(&self) -> String {
        let mut parts = Vec::new();

        if !self.url.is_empty() {
            parts.push(format!("Source: {}", self.url));
        }

        if let Some(failure) = self.failure() {
            let label = match failure.kind {
                FailureKind::Fetch => "fetch failed",
                FailureKind::Parse => "parse failed",
            };
            parts.push(format!("{}: {}", label, failure.message));
            return parts.join("\n\n");
        }

        let mut fields = Vec::new();
        for entry in &self.fields {
            let value = match entry.outcome.extracted() {
                Some(ScalarResult::Present(v)) => v.as_str(),
                _ => "(not found)",
            };
            fields.push(format!("{}: {}", entry.name, value));
        }
        if !fields.is_empty() {
            parts.push(fields.join("\n"));
        }

        for entry in &self.tables {
            let Some(record) = entry.outcome.extracted() else {
                continue;
            };
            let mut lines = vec![format!("{} ({} rows)", entry.name, record.len())];
            if !record.columns.is_empty() {
                lines.push(record.columns.join("\t"));
            }
            for row in record {
                lines.push(row.join("\t"));
            }
            parts.push(lines.join("\n"));
        }

        parts.join("\n\n")
    }
}
