// ABOUTME: Declarative field and table descriptors naming what to pull out of a page.
// ABOUTME: Descriptors are serde data so profiles can be loaded from JSON and validated up front.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::selectors::compile;

fn default_cell_selector() -> String {
    "td".to_string()
}

/// A named selector whose first match provides a scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub selector: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
        }
    }
}

/// A named container/row/cell selector triple plus the expected columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    /// Selects the container; only the first match is used.
    pub container: String,
    /// Selects row nodes inside the container.
    pub rows: String,
    /// Selects cell nodes inside each row.
    #[serde(default = "default_cell_selector")]
    pub cells: String,
    /// Column labels; their count is the declared column count.
    pub columns: Vec<String>,
}

impl TableDescriptor {
    /// Creates a descriptor with the default `td` cell selector.
    pub fn new<I, S>(
        name: impl Into<String>,
        container: impl Into<String>,
        rows: impl Into<String>,
        columns: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            container: container.into(),
            rows: rows.into(),
            cells: default_cell_selector(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Overrides the cell selector.
    pub fn with_cells(mut self, cells: impl Into<String>) -> Self {
        self.cells = cells.into();
        self
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// The full set of descriptors applied to one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSet {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, fd: FieldDescriptor) -> Self {
        self.fields.push(fd);
        self
    }

    pub fn table(mut self, td: TableDescriptor) -> Self {
        self.tables.push(td);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tables.is_empty()
    }

    /// Every selector string referenced by the set.
    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|f| f.selector.as_str())
            .chain(self.tables.iter().flat_map(|t| {
                [t.container.as_str(), t.rows.as_str(), t.cells.as_str()]
            }))
    }

    /// Checks that all selectors compile, every table declares a column and
    /// no two descriptors share a name.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        for css in self.selectors() {
            compile(css)?;
        }

        if let Some(t) = self.tables.iter().find(|t| t.columns.is_empty()) {
            return Err(ScrapeError::profile(
                "Validate",
                Some(anyhow::anyhow!("table `{}` declares no columns", t.name)),
            ));
        }

        let mut seen = HashSet::new();
        let names = self
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.tables.iter().map(|t| t.name.as_str()));
        for name in names {
            if !seen.insert(name) {
                return Err(ScrapeError::profile(
                    "Validate",
                    Some(anyhow::anyhow!("duplicate descriptor name `{}`", name)),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dividends() -> TableDescriptor {
        TableDescriptor::new(
            "dividends",
            "#table-dividends-history",
            "tbody tr",
            ["Tipo", "Data Com", "Pagamento", "Valor"],
        )
    }

    #[test]
    fn test_table_defaults_to_td_cells() {
        let td = dividends();
        assert_eq!(td.cells, "td");
        assert_eq!(td.column_count(), 4);
    }

    #[test]
    fn test_deserialize_table_without_cells() {
        let json = r##"{
            "name": "dividends",
            "container": "#table-dividends-history",
            "rows": "tbody tr",
            "columns": ["Tipo", "Data Com", "Pagamento", "Valor"]
        }"##;
        let td: TableDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(td, dividends());
    }

    #[test]
    fn test_selectors_lists_every_selector() {
        let set = DescriptorSet::new()
            .field(FieldDescriptor::new("quote", "span.value"))
            .table(dividends().with_cells("td, th"));
        let all: Vec<&str> = set.selectors().collect();
        assert_eq!(
            all,
            vec!["span.value", "#table-dividends-history", "tbody tr", "td, th"]
        );
    }

    #[test]
    fn test_validate_accepts_good_set() {
        let set = DescriptorSet::new()
            .field(FieldDescriptor::new("quote", "div._card.cotacao span.value"))
            .table(dividends());
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_selector() {
        let set = DescriptorSet::new().field(FieldDescriptor::new("quote", "span..value"));
        assert!(set.validate().unwrap_err().is_selector());
    }

    #[test]
    fn test_validate_rejects_table_without_columns() {
        let set = DescriptorSet::new().table(TableDescriptor::new(
            "empty",
            "table",
            "tr",
            Vec::<String>::new(),
        ));
        assert!(set.validate().unwrap_err().is_profile());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let set = DescriptorSet::new()
            .field(FieldDescriptor::new("dividends", "span"))
            .table(dividends());
        let err = set.validate().unwrap_err();
        assert!(err.is_profile());
        assert!(err.to_string().contains("duplicate"));
    }
}
