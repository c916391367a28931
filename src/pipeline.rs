//! ## Preparation Pipeline
//!
//! Core abstractions for turning the raw trip source into the prepared trip table
//! through a chain of DataFrame transformers.
//!
//! ### Overview
//!
//! - The [`Transformer`] trait defines a common interface for a preparation step,
//!   covering both stateful steps (which must be fitted first) and stateless ones.
//! - The [`Pipeline`] struct chains transformers; each step only extends the logical plan,
//!   nothing executes until the result is collected or cached.
//! - Macros [`crate::impl_transformer`] and [`crate::make_pipeline`] remove the boilerplate
//!   of implementing the trait and boxing the steps.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use async_trait::async_trait;
use datafusion::prelude::*;
use std::time::Instant;
use tracing::debug;

/// Trait for steps of the preparation pipeline.
///
/// `fit` may look at the data to compute parameters; `transform` only updates the
/// DataFrame's logical plan without triggering execution.
#[async_trait]
pub trait Transformer {
    /// Fit the transformer given a DataFrame.
    async fn fit(&mut self, df: &DataFrame) -> TripInsightsResult<()>;

    /// Transform the input DataFrame, returning a new DataFrame with the step applied.
    fn transform(&self, df: DataFrame) -> TripInsightsResult<DataFrame>;

    /// Returns true if `fit` must be called before `transform`.
    fn is_stateful(&self) -> bool;
}

/// Implements [`Transformer`] for a type that already has the inherent methods
/// `async fn fit(&mut self, &DataFrame)`, `fn transform(&self, DataFrame)` and
/// `fn inherent_is_stateful(&self) -> bool`.
///
/// ```rust,no_run
/// use datafusion::prelude::DataFrame;
/// use trip_insights::exceptions::TripInsightsResult;
/// use trip_insights::impl_transformer;
///
/// pub struct Passthrough;
///
/// impl Passthrough {
///     pub async fn fit(&mut self, _df: &DataFrame) -> TripInsightsResult<()> {
///         Ok(())
///     }
///
///     pub fn transform(&self, df: DataFrame) -> TripInsightsResult<DataFrame> {
///         Ok(df)
///     }
///
///     pub fn inherent_is_stateful(&self) -> bool {
///         false
///     }
/// }
///
/// impl_transformer!(Passthrough);
/// ```
#[macro_export]
macro_rules! impl_transformer {
    ($ty:ty) => {
        #[async_trait::async_trait]
        impl $crate::pipeline::Transformer for $ty {
            async fn fit(
                &mut self,
                df: &datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::TripInsightsResult<()> {
                <$ty>::fit(self, df).await
            }
            fn transform(
                &self,
                df: datafusion::prelude::DataFrame,
            ) -> $crate::exceptions::TripInsightsResult<datafusion::prelude::DataFrame> {
                <$ty>::transform(self, df)
            }
            fn is_stateful(&self) -> bool {
                <$ty>::inherent_is_stateful(self)
            }
        }
    };
}

/// A pipeline that chains a sequence of transformers.
///
/// Each transformer's output plan is the next transformer's input.
pub struct Pipeline {
    steps: Vec<(String, Box<dyn Transformer + Send + Sync>)>,
}

impl Pipeline {
    /// Creates a new pipeline from (name, transformer) pairs.
    pub fn new(steps: Vec<(String, Box<dyn Transformer + Send + Sync>)>) -> Self {
        Self { steps }
    }

    /// Names of the steps, in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Fits each transformer in turn against the output of the previous one
    /// and returns the final DataFrame.
    pub async fn fit_transform(&mut self, df: &DataFrame) -> TripInsightsResult<DataFrame> {
        if self.steps.is_empty() {
            return Err(TripInsightsError::InvalidParameter(
                "Pipeline must have at least one transformer.".to_string(),
            ));
        }
        let mut current_df = df.clone();
        for (name, step) in self.steps.iter_mut() {
            let start = Instant::now();
            step.fit(&current_df).await.map_err(|e| {
                TripInsightsError::InvalidParameter(format!(
                    "Error fitting transformer '{}': {}",
                    name, e
                ))
            })?;
            current_df = step.transform(current_df).map_err(|e| {
                TripInsightsError::InvalidParameter(format!(
                    "Error transforming in '{}': {}",
                    name, e
                ))
            })?;
            debug!(step = %name, elapsed = ?start.elapsed(), "pipeline step planned");
        }
        Ok(current_df)
    }

    /// Applies every transformer without fitting. Fails if a stateful step
    /// has not been fitted yet.
    pub fn transform(&self, df: DataFrame) -> TripInsightsResult<DataFrame> {
        if self.steps.is_empty() {
            return Err(TripInsightsError::InvalidParameter(
                "Pipeline must have at least one transformer.".to_string(),
            ));
        }
        let mut current_df = df;
        for (name, step) in self.steps.iter() {
            current_df = step.transform(current_df).map_err(|e| match e {
                TripInsightsError::FitNotCalled => TripInsightsError::FitNotCalled,
                other => TripInsightsError::InvalidParameter(format!(
                    "Error in transformer '{}': {}",
                    name, other
                )),
            })?;
        }
        Ok(current_df)
    }
}

/// Builds a [`Pipeline`] from `(name, transformer)` pairs, boxing each transformer.
///
/// ```rust,no_run
/// use trip_insights::make_pipeline;
/// use trip_insights::transformers::imputation::CategoricalImputer;
///
/// let pipeline = make_pipeline!(
///     ("impute", CategoricalImputer::unknown(vec!["payment".to_string()])),
/// );
/// ```
#[macro_export]
macro_rules! make_pipeline {
    ($(($name:expr, $transformer:expr)),+ $(,)?) => {
        {
            let steps: Vec<(String, Box<dyn $crate::pipeline::Transformer + Send + Sync>)> = vec![
                $(
                    ($name.to_string(), Box::new($transformer)),
                )+
            ];
            $crate::pipeline::Pipeline::new(steps)
        }
    };
}
