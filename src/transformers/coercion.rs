//! ## Transformers for coercing raw text columns into typed columns
//!
//! - **TypeCoercer:** Converts text columns to timestamps, floats or integers on a best-effort basis.
//!
//! A value that cannot be converted becomes null rather than failing the whole
//! DataFrame, which is how malformed cells in the trip source are absorbed.
//! Numeric text that parses to a non-finite float (`"NaN"`, `"inf"`) is treated as missing
//! too, so it never reaches a mean, a sum or a quantile. Integer coercion parses the text as
//! a float first and truncates it: `"2.5"` passengers count as 2.
//! Errors are returned as `TripInsightsError` and results are wrapped in `TripInsightsResult`.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use crate::impl_transformer;
use datafusion::arrow::datatypes::{DataType, TimeUnit};
use datafusion::prelude::*;
use datafusion::logical_expr::Case as DFCase;
use datafusion::scalar::ScalarValue;
use datafusion_expr::{col, lit, try_cast, Expr};
use datafusion_functions::math::{abs, isnan};
use datafusion_functions::string::btrim;

/// Target type of a coerced column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Nanosecond timestamp without time zone.
    Timestamp,
    Float,
    /// Whole number. Decimal text such as `"2.0"` is accepted and truncated.
    Integer,
}

impl Coercion {
    fn expr_for(&self, source: &str) -> Expr {
        let trimmed = btrim().call(vec![col(source)]);
        match self {
            Coercion::Timestamp => {
                try_cast(trimmed, DataType::Timestamp(TimeUnit::Nanosecond, None))
            }
            Coercion::Float => finite_float(trimmed),
            Coercion::Integer => try_cast(finite_float(trimmed), DataType::Int64),
        }
    }
}

/// `CASE WHEN isnan(x) OR abs(x) = inf THEN NULL ELSE x END` over `x = TRY_CAST(text AS DOUBLE)`
fn finite_float(text: Expr) -> Expr {
    let value = try_cast(text, DataType::Float64);
    let non_finite = isnan()
        .call(vec![value.clone()])
        .or(abs().call(vec![value.clone()]).eq(lit(f64::INFINITY)));
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(
            Box::new(non_finite),
            Box::new(lit(ScalarValue::Float64(None))),
        )],
        else_expr: Some(Box::new(value)),
    })
}

/// Replaces each source column by its coerced (and possibly renamed) counterpart.
/// `casts` holds `(source_column, output_column, coercion)` triples; all other columns
/// are kept as they are.
pub struct TypeCoercer {
    pub casts: Vec<(String, String, Coercion)>,
}

impl TypeCoercer {
    pub fn new(casts: Vec<(String, String, Coercion)>) -> Self {
        Self { casts }
    }

    /// Validates that every source column exists and holds text.
    pub async fn fit(&mut self, df: &DataFrame) -> TripInsightsResult<()> {
        for (source, _, _) in &self.casts {
            validate_text_column(df, source)?;
        }
        Ok(())
    }

    pub fn transform(&self, df: DataFrame) -> TripInsightsResult<DataFrame> {
        let mut exprs: Vec<Expr> = Vec::new();
        for field in df.schema().fields() {
            let name = field.name();
            match self.casts.iter().find(|(source, _, _)| source == name) {
                Some((source, output, coercion)) => {
                    exprs.push(coercion.expr_for(source).alias(output));
                }
                None => exprs.push(col(name)),
            }
        }
        for (source, _, _) in &self.casts {
            validate_text_column(&df, source)?;
        }
        df.select(exprs).map_err(TripInsightsError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(TypeCoercer);

fn validate_text_column(df: &DataFrame, col_name: &str) -> TripInsightsResult<()> {
    let field = df.schema().field_with_name(None, col_name).map_err(|_| {
        TripInsightsError::MissingColumn(format!("Column '{}' not found", col_name))
    })?;
    match field.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Ok(()),
        dt => Err(TripInsightsError::UnexpectedType(format!(
            "Column '{}' must hold text before coercion, but found {:?}",
            col_name, dt
        ))),
    }
}
