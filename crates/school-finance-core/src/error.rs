use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchoolFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for SchoolFinanceError {
    fn from(e: serde_json::Error) -> Self {
        SchoolFinanceError::SerializationError(e.to_string())
    }
}
