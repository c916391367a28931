//! ## Custom Errors for Trip Insights
//!
//! This module defines the error type shared by the whole library.
//! It uses the `thiserror` crate to derive the `Error` trait.
//! The `TripInsightsError` enum covers the failure scenarios of loading a trip dataset
//! and answering catalog questions over it. Per-row problems in the source data are
//! never errors: those values are coerced to nulls or to the `"Unknown"` label instead.
//!
//! The `TripInsightsResult` type alias simplifies error handling by providing a convenient
//! alias for results returned by the library.
//!
//! ### Example
//!
//! ```rust
//! use trip_insights::exceptions::{TripInsightsError, TripInsightsResult};
//!
//! fn pick(label: &str) -> TripInsightsResult<()> {
//!     Err(TripInsightsError::UnknownQuestion(label.into()))
//! }
//! ```

use thiserror::Error;

/// Errors specific to the Trip Insights library.
#[derive(Debug, Error)]
pub enum TripInsightsError {
    /// Wraps underlying I/O errors (e.g., the dataset file does not exist).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] datafusion::arrow::error::ArrowError),

    /// Indicates that an invalid parameter was provided (e.g., a quantile outside `[0, 1]`).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Indicates that the dataset file has an extension the loader cannot read.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Indicates that the specified column does not exist in the DataFrame.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Indicates that a column exists but holds a different type than a recipe expects.
    #[error("Unexpected type: {0}")]
    UnexpectedType(String),

    /// Indicates that no catalog question matches the requested label.
    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    /// Indicates the transform method was called before calling fit for a stateful transformer.
    #[error("Transform called before fit for stateful transformer")]
    FitNotCalled,
}

/// A convenient result type for Trip Insights operations.
pub type TripInsightsResult<T> = std::result::Result<T, TripInsightsError>;
