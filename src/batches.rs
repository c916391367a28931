//! Helpers for reading typed values back out of collected record batches.
//!
//! Each column is cast to the requested Arrow type first, so callers do not depend on
//! whether the engine produced, say, `Int32` or `Int64`, or `Utf8` or `Utf8View`.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use datafusion::arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;

fn column_as(batch: &RecordBatch, name: &str, target: &DataType) -> TripInsightsResult<ArrayRef> {
    let array = batch.column_by_name(name).ok_or_else(|| {
        TripInsightsError::MissingColumn(format!("Column '{}' not found in result", name))
    })?;
    Ok(cast(array, target)?)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> TripInsightsResult<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        TripInsightsError::UnexpectedType(format!(
            "Column '{}' could not be read as {:?}",
            name,
            array.data_type()
        ))
    })
}

/// Values of `name` across all batches as `f64`, with nulls as `None`.
pub fn f64_values(batches: &[RecordBatch], name: &str) -> TripInsightsResult<Vec<Option<f64>>> {
    let mut out = Vec::new();
    for batch in batches {
        let array = column_as(batch, name, &DataType::Float64)?;
        out.extend(downcast::<Float64Array>(&array, name)?.iter());
    }
    Ok(out)
}

/// Values of `name` across all batches as `i64`, with nulls as `None`.
pub fn i64_values(batches: &[RecordBatch], name: &str) -> TripInsightsResult<Vec<Option<i64>>> {
    let mut out = Vec::new();
    for batch in batches {
        let array = column_as(batch, name, &DataType::Int64)?;
        out.extend(downcast::<Int64Array>(&array, name)?.iter());
    }
    Ok(out)
}

/// Values of `name` across all batches as strings, with nulls as `None`.
pub fn string_values(
    batches: &[RecordBatch],
    name: &str,
) -> TripInsightsResult<Vec<Option<String>>> {
    let mut out = Vec::new();
    for batch in batches {
        let array = column_as(batch, name, &DataType::Utf8)?;
        let strings = downcast::<StringArray>(&array, name)?;
        out.extend(strings.iter().map(|v| v.map(str::to_string)));
    }
    Ok(out)
}
