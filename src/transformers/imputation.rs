//! ## Transformers for imputing missing values
//!
//! - **CategoricalImputer**: Replaces missing values of categorical columns with a fixed label.
//!
//! A value counts as missing when it is null or contains only whitespace, the two ways an
//! absent cell shows up after reading delimited text. Whitespace-only categories are
//! therefore filled as well, rather than kept as a category of their own.
//! Errors are returned as `TripInsightsError` and results are wrapped in `TripInsightsResult`.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use crate::impl_transformer;
use crate::schema::UNKNOWN_LABEL;
use datafusion::logical_expr::{col, lit, Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion_functions::string::btrim;

/// Validates that every column in `target_cols` exists in the DataFrame.
fn validate_columns(df: &DataFrame, target_cols: &[String]) -> TripInsightsResult<()> {
    let schema = df.schema();
    for col_name in target_cols {
        if schema.field_with_name(None, col_name).is_err() {
            return Err(TripInsightsError::MissingColumn(format!(
                "Column '{}' not found in DataFrame",
                col_name
            )));
        }
    }
    Ok(())
}

/// `CASE WHEN col IS NOT NULL AND btrim(col) <> '' THEN col ELSE fallback END`
fn fill_expr_for(name: &str, fallback: Expr) -> Expr {
    let present = col(name)
        .is_not_null()
        .and(btrim().call(vec![col(name)]).not_eq(lit("")));
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(Box::new(present), Box::new(col(name)))],
        else_expr: Some(Box::new(fallback)),
    })
}

/// Replaces each target column by its filled counterpart and keeps all other columns.
fn apply_imputation(
    df: DataFrame,
    target_cols: &[String],
    fallback: &str,
) -> TripInsightsResult<DataFrame> {
    let exprs: Vec<Expr> = df
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            if target_cols.contains(name) {
                fill_expr_for(name, lit(fallback)).alias(name)
            } else {
                col(name)
            }
        })
        .collect();
    df.select(exprs).map_err(TripInsightsError::from)
}

/// Replaces missing categorical values with `default`.
pub struct CategoricalImputer {
    pub columns: Vec<String>,
    pub default: String,
}

impl CategoricalImputer {
    pub fn new(columns: Vec<String>, default: impl Into<String>) -> Self {
        Self {
            columns,
            default: default.into(),
        }
    }

    /// Imputer that fills with the `"Unknown"` label.
    pub fn unknown(columns: Vec<String>) -> Self {
        Self::new(columns, UNKNOWN_LABEL)
    }

    /// This transformer is stateless; fit only validates the target columns.
    pub async fn fit(&mut self, df: &DataFrame) -> TripInsightsResult<()> {
        validate_columns(df, &self.columns)
    }

    pub fn transform(&self, df: DataFrame) -> TripInsightsResult<DataFrame> {
        validate_columns(&df, &self.columns)?;
        apply_imputation(df, &self.columns, &self.default)
    }

    fn inherent_is_stateful(&self) -> bool {
        false
    }
}

impl_transformer!(CategoricalImputer);
