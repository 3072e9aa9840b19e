use thiserror::Error;

/// Fatal errors raised while loading a filesystem summary.
///
/// Any of these aborts the run before checking begins. Inconsistencies
/// discovered after a successful load are reported as findings and never
/// terminate the audit.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: expected a record, found none")]
    MissingRecord { file: String },

    #[error("{file} line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{file} line {line} field {field}: {value:?} is not a valid number")]
    BadNumber {
        file: String,
        line: usize,
        field: usize,
        value: String,
    },

    #[error("{file} line {line} field {field}: {value} is out of range (max {max})")]
    ValueOutOfRange {
        file: String,
        line: usize,
        field: usize,
        value: u64,
        max: u64,
    },
}
