// crates/v2x-cli/src/output.rs
//
// Output formatting utilities for the V2X CLI.
// Supports table and JSON output modes.

use clap::ValueEnum;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    #[default]
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Fixed-precision rendering for trust values and opinions.
pub fn format_score(value: f64) -> String {
    format!("{:.4}", value)
}

/// Shorten a hash for table display to its first 12 characters.
pub fn short_hash(hash: &str) -> String {
    let mut chars = hash.chars();
    let head: String = chars.by_ref().take(12).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        name: String,
        score: String,
    }

    #[test]
    fn table_contains_headers_and_values() {
        let rows = vec![Row {
            name: "vehicle_1".to_string(),
            score: format_score(0.5),
        }];
        let table = format_table(&rows);
        assert!(table.contains("name"));
        assert!(table.contains("vehicle_1"));
        assert!(table.contains("0.5000"));
    }

    #[test]
    fn json_is_pretty() {
        let row = Row {
            name: "rsu1".to_string(),
            score: "1".to_string(),
        };
        let json = format_json(&row);
        assert!(json.contains('\n'));
        assert!(json.contains("\"name\": \"rsu1\""));
    }

    #[test]
    fn short_hash_truncates_long_values_only() {
        assert_eq!(short_hash("0000"), "0000");
        assert_eq!(short_hash(&"a".repeat(64)), format!("{}…", "a".repeat(12)));
        assert_eq!(short_hash(&"a".repeat(12)), "a".repeat(12));
    }

    #[test]
    fn short_hash_respects_char_boundaries() {
        let value = "ééééééééééééé";
        assert_eq!(short_hash(value), format!("{}…", "é".repeat(12)));
    }
}
