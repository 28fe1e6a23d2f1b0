use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid month range: start {start} is after end {end}")]
    InvalidMonthRange { start: String, end: String },

    #[error("Invalid window size {0}: must be zero or positive")]
    NegativeWindow(i32),

    #[error("Trailing month window must cover at least one month")]
    EmptyWindow,

    #[error("Shifting {month} by {delta} months leaves the supported calendar")]
    MonthOutOfRange { month: String, delta: i64 },

    #[error("Invalid month key '{0}': expected YYYY-MM")]
    InvalidMonthKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Table '{0}' has no header row")]
    MissingHeader(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
