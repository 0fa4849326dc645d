// UI module - Presentation layer

pub mod formatters;
pub mod report;

// Re-export commonly used functions
pub use formatters::{format_hours, format_percent, format_temperature, format_timestamp};
pub use report::print_report;
