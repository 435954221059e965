pub mod amortization;
pub mod calendar;
pub mod error;
pub mod time_value;
pub mod types;

pub use error::MortgageError;
pub use types::*;

/// Standard result type for all mortgage-core operations
pub type MortgageResult<T> = Result<T, MortgageError>;
