pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Name of the first field of `result` holding a list of records
/// (`rows` for the debtor listing, `lines` for a balance breakdown).
pub fn record_list_key(result: &serde_json::Map<String, Value>) -> Option<&str> {
    ["rows", "lines"]
        .into_iter()
        .find(|k| matches!(result.get(*k), Some(Value::Array(_))))
}

/// Render a scalar cell; nested values fall back to compact JSON.
pub fn format_cell(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
