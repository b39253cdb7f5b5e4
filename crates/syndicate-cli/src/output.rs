// crates/syndicate-cli/src/output.rs
//
// Output formatting utilities for the Syndicate CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Render rows in the requested format.
pub fn render<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_table(rows),
        OutputFormat::Json => format_json(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Value")]
        value: u64,
    }

    fn rows() -> Vec<Row> {
        vec![Row {
            name: "blocks".to_string(),
            value: 42,
        }]
    }

    #[test]
    fn test_table_has_headers() {
        let table = render(&rows(), OutputFormat::Table);
        assert!(table.contains("Name"));
        assert!(table.contains("blocks"));
    }

    #[test]
    fn test_json_uses_field_names() {
        let json = render(&rows(), OutputFormat::from_json_flag(true));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["name"], "blocks");
        assert_eq!(parsed[0]["value"], 42);
    }
}
