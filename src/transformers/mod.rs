//! # Transformer Implementations
//!
//! The submodules contain the DataFrame transformers used to prepare and query trip data.

pub mod coercion;
pub mod datetime_features;
pub mod imputation;
pub mod outlier_handling;
