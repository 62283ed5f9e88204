pub mod file;
pub mod stdin;

use serde_json::Value;

/// Load the command's input document from `--input`, or from stdin when
/// data is piped in.
pub fn load(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => file::read_value(path).map(Some),
        None => stdin::read_stdin(),
    }
}
