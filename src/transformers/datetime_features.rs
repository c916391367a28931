//! ## Transformers for extracting datetime-based features
//!
//! - **PickupTimeFeatures:** Derives the hour of day, weekday name and month from a timestamp column.
//!
//! The derived values of a row are either all present or all null: they come from the
//! same timestamp, and a null timestamp yields nulls for every derived column.
//! Errors are returned as `TripInsightsError` and results are wrapped in `TripInsightsResult`.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use crate::impl_transformer;
use datafusion::arrow::datatypes::DataType;
use datafusion::prelude::*;
use datafusion_expr::{case, cast, col, lit, Expr};
use datafusion_functions::datetime::date_part;

/// Weekday names indexed by `date_part('dow', ..)`, which counts from Sunday = 0.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Validates that a column exists and is of a datetime type (Timestamp, Date32, or Date64).
fn validate_datetime_column(df: &DataFrame, col_name: &str) -> TripInsightsResult<()> {
    let field = df.schema().field_with_name(None, col_name).map_err(|_| {
        TripInsightsError::MissingColumn(format!("Column '{}' not found", col_name))
    })?;
    match field.data_type() {
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => Ok(()),
        dt => Err(TripInsightsError::UnexpectedType(format!(
            "Column '{}' must be a datetime type (Timestamp, Date32, or Date64), but found {:?}",
            col_name, dt
        ))),
    }
}

fn part_expr(part: &str, base: Expr) -> Expr {
    cast(date_part().call(vec![lit(part), base]), DataType::Int32)
}

fn weekday_name_expr(base: Expr) -> TripInsightsResult<Expr> {
    let mut builder = case(part_expr("dow", base));
    for (dow, name) in WEEKDAY_NAMES.iter().enumerate() {
        builder = builder.when(lit(dow as i32), lit(*name));
    }
    // No ELSE branch: a null timestamp maps to a null name.
    builder.end().map_err(TripInsightsError::from)
}

/// Appends `<prefix>_hour` (0-23), `<prefix>_day_name` (`Monday`..`Sunday`) and
/// `<prefix>_month` (1-12) computed from the timestamp column `column`.
pub struct PickupTimeFeatures {
    pub column: String,
    pub prefix: String,
}

impl PickupTimeFeatures {
    pub fn new(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            prefix: prefix.into(),
        }
    }

    /// Stateless transformer: fit does nothing.
    pub async fn fit(&mut self, _df: &DataFrame) -> TripInsightsResult<()> {
        Ok(())
    }

    /// Names of the three derived columns, in the order they are appended.
    pub fn output_columns(&self) -> [String; 3] {
        [
            format!("{}_hour", self.prefix),
            format!("{}_day_name", self.prefix),
            format!("{}_month", self.prefix),
        ]
    }

    pub fn transform(&self, df: DataFrame) -> TripInsightsResult<DataFrame> {
        validate_datetime_column(&df, &self.column)?;
        // Retain all original columns.
        let mut exprs: Vec<Expr> = df.schema().fields().iter().map(|f| col(f.name())).collect();

        let base = col(&self.column);
        let [hour_name, day_name, month_name] = self.output_columns();
        exprs.push(part_expr("hour", base.clone()).alias(hour_name));
        exprs.push(weekday_name_expr(base.clone())?.alias(day_name));
        exprs.push(part_expr("month", base).alias(month_name));

        df.select(exprs).map_err(TripInsightsError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(PickupTimeFeatures);
