//! ## Transformers for handling outliers
//!
//! - **UpperTailSelector:** Keeps only the rows whose value lies strictly above a quantile of its column.
//!
//! The threshold is an exact quantile computed during `fit` (linear interpolation between
//! the closest ranks), not an approximate sketch, so small tables select exactly the rows
//! one would expect by hand.
//! Errors are returned as `TripInsightsError` and results are wrapped in `TripInsightsResult`.

use crate::batches::f64_values;
use crate::exceptions::{TripInsightsError, TripInsightsResult};
use crate::impl_transformer;
use crate::stats::quantile;
use datafusion::arrow::datatypes::DataType;
use datafusion::logical_expr::{col, lit};
use datafusion::prelude::*;
use tracing::debug;

/// Validates that a column exists and is numeric.
fn validate_numeric_column(df: &DataFrame, col_name: &str) -> TripInsightsResult<()> {
    let field = df.schema().field_with_name(None, col_name).map_err(|_| {
        TripInsightsError::MissingColumn(format!("Column '{}' not found", col_name))
    })?;
    match field.data_type() {
        DataType::Float32
        | DataType::Float64
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Ok(()),
        dt => Err(TripInsightsError::UnexpectedType(format!(
            "Column '{}' must be numeric, but found {:?}",
            col_name, dt
        ))),
    }
}

/// Fitted state of an [`UpperTailSelector`].
#[derive(Debug, Clone, Copy, PartialEq)]
enum Threshold {
    Unfitted,
    /// Fitted on a column without any values.
    Empty,
    At(f64),
}

/// Selects the rows of `column` strictly above its `quantile`.
pub struct UpperTailSelector {
    pub column: String,
    pub quantile: f64,
    threshold: Threshold,
}

impl UpperTailSelector {
    pub fn new(column: impl Into<String>, quantile: f64) -> Self {
        Self {
            column: column.into(),
            quantile,
            threshold: Threshold::Unfitted,
        }
    }

    /// Computes the quantile over the non-null values of the column.
    pub async fn fit(&mut self, df: &DataFrame) -> TripInsightsResult<()> {
        if !(0.0..=1.0).contains(&self.quantile) {
            return Err(TripInsightsError::InvalidParameter(format!(
                "Quantile {} must be between 0 and 1",
                self.quantile
            )));
        }
        validate_numeric_column(df, &self.column)?;
        let batches = df
            .clone()
            .select(vec![col(&self.column)])?
            .filter(col(&self.column).is_not_null())?
            .collect()
            .await?;
        let values: Vec<f64> = f64_values(&batches, &self.column)?
            .into_iter()
            .flatten()
            .collect();
        self.threshold = match quantile(&values, self.quantile)? {
            Some(threshold) => Threshold::At(threshold),
            None => Threshold::Empty,
        };
        debug!(
            column = %self.column,
            quantile = self.quantile,
            threshold = ?self.threshold,
            "fitted upper tail threshold"
        );
        Ok(())
    }

    /// The fitted threshold, or `None` if the column had no values.
    pub fn threshold(&self) -> TripInsightsResult<Option<f64>> {
        match self.threshold {
            Threshold::Unfitted => Err(TripInsightsError::FitNotCalled),
            Threshold::Empty => Ok(None),
            Threshold::At(threshold) => Ok(Some(threshold)),
        }
    }

    pub fn transform(&self, df: DataFrame) -> TripInsightsResult<DataFrame> {
        let predicate = match self.threshold()? {
            Some(threshold) => col(&self.column).gt(lit(threshold)),
            None => lit(false),
        };
        df.filter(predicate).map_err(TripInsightsError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl_transformer!(UpperTailSelector);
