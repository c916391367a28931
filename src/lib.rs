//! # Trip Insights
//!
//! Exploratory analysis over a static ride-sharing trip dataset, powered by Apache DataFusion.
//!
//! The library has two parts that run strictly in sequence:
//!
//! 1. [`dataset`] prepares the raw records once: timestamps are parsed, the pickup hour,
//!    weekday name and month are derived, and missing categories become `"Unknown"`.
//!    The result is an immutable [`dataset::TripTable`].
//! 2. [`catalog`] lists twenty canned questions, each bound to a declarative recipe, and
//!    [`recipes`] answers any of them against the table as an [`answer::Answer`].
//!
//! ```rust,no_run
//! use trip_insights::dataset::TripTable;
//! use trip_insights::recipes;
//! use trip_insights::settings::Settings;
//!
//! # async fn demo() -> trip_insights::exceptions::TripInsightsResult<()> {
//! let table = TripTable::load(&Settings::from_env()?).await?;
//! let answer = recipes::run("Top 10 pickup zones", &table).await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod answer;
pub mod batches;
pub mod catalog;
pub mod dataset;
pub mod exceptions;
mod logging;
pub mod pipeline;
pub mod recipes;
pub mod schema;
pub mod settings;
pub mod stats;
pub mod transformers;
