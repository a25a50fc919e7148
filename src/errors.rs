use chrono::NaiveDateTime;
use thiserror::Error;

/// Failure at the HTTP seam. The marketing client never surfaces these to
/// its callers; they are logged and turned into "no data".
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ReshapeError {
    #[error("record is missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` is not numeric: {value}")]
    NonNumeric { field: String, value: String },

    #[error("cannot parse timestamp `{0}`")]
    BadTimestamp(String),

    #[error("entity {entity} has more than one record at {timestamp}")]
    DuplicateTimestamp {
        entity: usize,
        timestamp: NaiveDateTime,
    },

    #[error("expected {expected} entities, got {actual} for {input}")]
    EntityCountMismatch {
        input: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("entity {entity}: `{metric}` timeline does not match impressions timeline")]
    IndexMismatch { entity: usize, metric: &'static str },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("series are not aligned on a common timeline")]
    Misaligned,

    #[error("{legends} legends supplied for {series} series")]
    LegendCount { legends: usize, series: usize },
}
