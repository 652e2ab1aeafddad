//! Error types for the retail sales ETL pipeline.
//!
//! - [`CsvError`] - reading, decoding and writing delimited tables
//! - [`StageError`] - a stage could not run on its input
//! - [`ValidationError`] - schema validation of sales records
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Lower-level errors convert into [`PipelineError`] through `From`,
//! so `?` works across stage boundaries.

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a CSV table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write the file.
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Malformed CSV record.
    #[error("Invalid CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Failed to serialize a table.
    #[error("Failed to write CSV: {0}")]
    Write(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(io) => CsvError::Io(io),
            kind => CsvError::Parse {
                line,
                message: format!("{:?}", kind),
            },
        }
    }
}

// =============================================================================
// Stage Errors
// =============================================================================

/// Errors raised by a stage over a table it was given.
#[derive(Debug, Error)]
pub enum StageError {
    /// A column required by a downstream consumer is absent.
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },
}

impl StageError {
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        StageError::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors during sales record validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema could not be compiled or an instance failed it.
    #[error("Validation failed: {errors:?}")]
    SchemaError { errors: Vec<String> },

    /// Some rows of a table failed validation.
    #[error("{invalid} of {total} rows failed validation")]
    InvalidRows { invalid: usize, total: usize },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the functions in [`crate::pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Stage error.
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Filesystem error outside of table IO.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let stage_err = StageError::missing_column("product_summary", "PRODUCTLINE");
        let pipeline_err: PipelineError = stage_err.into();
        assert!(pipeline_err.to_string().contains("PRODUCTLINE"));
    }

    #[test]
    fn test_missing_column_format() {
        let err = StageError::missing_column("customer_summary", "LifetimeValue");
        let msg = err.to_string();
        assert!(msg.contains("customer_summary"));
        assert!(msg.contains("LifetimeValue"));
    }

    #[test]
    fn test_invalid_rows_format() {
        let err = ValidationError::InvalidRows { invalid: 2, total: 10 };
        assert_eq!(err.to_string(), "2 of 10 rows failed validation");
    }
}
