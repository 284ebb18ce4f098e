pub mod errors;
pub mod format;
pub mod months;
pub mod retry;

pub use errors::{extract_clean_error, AppError, ChartError};
pub use format::{fmt_change, fmt_decimal, fmt_money, fmt_percent, paint};
pub use months::month_abbreviation;
pub use retry::RetryConfig;
