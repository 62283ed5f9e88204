pub mod error;
pub mod records;
pub mod types;

#[cfg(feature = "billing")]
pub mod billing;

#[cfg(feature = "reports")]
pub mod reports;

#[cfg(feature = "workflows")]
pub mod workflows;

pub use error::SchoolFinanceError;
pub use types::*;

/// Standard result type for all school-finance operations
pub type SchoolFinanceResult<T> = Result<T, SchoolFinanceError>;
