// Record domain model - one parsed feed row
use std::sync::Arc;

/// A single feed row: the shared header row plus this row's cells, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Missing trailing cells become empty strings, surplus cells are dropped.
    pub fn new(headers: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.resize(headers.len(), String::new());
        Self { headers, values }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Value of a column. A duplicated header resolves to its last occurrence.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .rposition(|h| h == column)
            .map(|idx| self.values[idx].as_str())
    }

    /// Value of the first alias that exists as a column, even if that cell is empty.
    pub fn first_present(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| self.get(alias))
    }

    /// Value of the first alias whose cell is non-empty.
    pub fn first_non_empty(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .filter_map(|alias| self.get(alias))
            .find(|value| !value.is_empty())
    }

    /// Cell rendered for display; absent columns render as an empty string.
    pub fn cell(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }
}
