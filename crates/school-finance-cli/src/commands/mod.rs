pub mod balance;
pub mod debtors;
pub mod suspension;

use chrono::NaiveDate;
use serde_json::Value;

/// Apply `--as-of` to the input document. Without the flag the document's
/// own `referenceDate` is kept, and the engine falls back to today.
pub fn apply_reference_date(value: &mut Value, as_of: Option<NaiveDate>) {
    if let (Some(date), Value::Object(map)) = (as_of, value) {
        map.insert("referenceDate".into(), Value::String(date.to_string()));
    }
}
