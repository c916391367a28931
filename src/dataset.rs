//! ## Trip Dataset Preparation
//!
//! Turns raw trip records into the prepared, read-only [`TripTable`] that every catalog
//! question runs against.
//!
//! Preparation never rejects a row. Unparsable timestamps and numbers become nulls, and
//! missing payment methods or zones become `"Unknown"`. The only failures are the ones
//! that make the whole source unusable: the file is absent, has an unreadable format,
//! or lacks one of the required columns.
//!
//! ### Example
//!
//! ```rust,no_run
//! use trip_insights::dataset::TripTable;
//! use trip_insights::settings::Settings;
//!
//! # async fn demo() -> trip_insights::exceptions::TripInsightsResult<()> {
//! let table = TripTable::load(&Settings::from_env()?).await?;
//! println!("{} trips", table.num_rows());
//! # Ok(())
//! # }
//! ```

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use crate::make_pipeline;
use crate::schema::{raw, raw_text_schema, trip};
use crate::settings::Settings;
use crate::transformers::coercion::{Coercion, TypeCoercer};
use crate::transformers::datetime_features::PickupTimeFeatures;
use crate::transformers::imputation::CategoricalImputer;
use datafusion::arrow::array::{ArrayRef, StringArray, UInt64Array};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::logical_expr::{cast, col, Expr};
use datafusion::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One raw trip record as it appears in the source, before any coercion.
///
/// Every field is optional text; numbers are given in their textual form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrip {
    pub pickup: Option<String>,
    pub dropoff: Option<String>,
    pub payment: Option<String>,
    pub pickup_zone: Option<String>,
    pub dropoff_zone: Option<String>,
    pub distance: Option<String>,
    pub fare: Option<String>,
    pub passengers: Option<String>,
}

impl RawTrip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pickup(mut self, value: impl ToString) -> Self {
        self.pickup = Some(value.to_string());
        self
    }

    pub fn dropoff(mut self, value: impl ToString) -> Self {
        self.dropoff = Some(value.to_string());
        self
    }

    pub fn payment(mut self, value: impl ToString) -> Self {
        self.payment = Some(value.to_string());
        self
    }

    pub fn pickup_zone(mut self, value: impl ToString) -> Self {
        self.pickup_zone = Some(value.to_string());
        self
    }

    pub fn dropoff_zone(mut self, value: impl ToString) -> Self {
        self.dropoff_zone = Some(value.to_string());
        self
    }

    pub fn distance(mut self, value: impl ToString) -> Self {
        self.distance = Some(value.to_string());
        self
    }

    pub fn fare(mut self, value: impl ToString) -> Self {
        self.fare = Some(value.to_string());
        self
    }

    pub fn passengers(mut self, value: impl ToString) -> Self {
        self.passengers = Some(value.to_string());
        self
    }
}

/// The prepared trip table.
///
/// The underlying plan is materialised once in memory; cloning the handle or calling
/// [`TripTable::frame`] never recomputes the preparation. Nothing mutates it afterwards,
/// so it can be shared freely between concurrent readers.
#[derive(Clone)]
pub struct TripTable {
    df: DataFrame,
    rows: usize,
}

impl std::fmt::Debug for TripTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripTable")
            .field("rows", &self.rows)
            .field("columns", &trip::ALL)
            .finish()
    }
}

impl TripTable {
    /// Reads the dataset named by `settings` and prepares it.
    ///
    /// `.csv`, `.tsv` and `.txt` files are read as delimited text, `.parquet` files as Parquet.
    pub async fn load(settings: &Settings) -> TripInsightsResult<Self> {
        let start = Instant::now();
        let path = &settings.data_path;
        info!(path = %path.display(), "loading trip dataset");
        std::fs::metadata(path).map_err(|e| {
            TripInsightsError::IoError(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;

        let ctx = session_context();
        let raw_df = read_source(&ctx, path, settings).await?;
        let table = Self::prepare_frame(raw_df).await?;
        info!(rows = table.rows, elapsed = ?start.elapsed(), "trip dataset ready");
        Ok(table)
    }

    /// Prepares a table from in-memory raw records, one output row per record.
    pub async fn prepare(records: Vec<RawTrip>) -> TripInsightsResult<Self> {
        let schema = raw_text_schema();
        let text_column = |get: fn(&RawTrip) -> &Option<String>| -> ArrayRef {
            Arc::new(
                records
                    .iter()
                    .map(|r| get(r).as_deref())
                    .collect::<StringArray>(),
            )
        };
        let columns = vec![
            text_column(|r| &r.pickup),
            text_column(|r| &r.dropoff),
            text_column(|r| &r.payment),
            text_column(|r| &r.pickup_zone),
            text_column(|r| &r.dropoff_zone),
            text_column(|r| &r.distance),
            text_column(|r| &r.fare),
            text_column(|r| &r.passengers),
        ];
        let batch = RecordBatch::try_new(schema, columns)?;
        let ctx = session_context();
        let df = ctx.read_batch(batch)?;
        Self::prepare_frame(df).await
    }

    /// Prepares a table from a DataFrame holding the raw source columns.
    ///
    /// Extra columns are ignored. Source columns of any type are first read back as text,
    /// so typed sources (e.g. Parquet) go through the same coercion as delimited text.
    pub async fn prepare_frame(raw_df: DataFrame) -> TripInsightsResult<Self> {
        for name in raw::ALL {
            if raw_df.schema().field_with_name(None, name).is_err() {
                return Err(TripInsightsError::MissingColumn(format!(
                    "Column '{}' not found in trip source",
                    name
                )));
            }
        }
        let text_exprs: Vec<Expr> = raw::ALL
            .iter()
            .map(|name| cast(col(*name), DataType::Utf8).alias(*name))
            .collect();
        let text_df = raw_df.select(text_exprs)?;

        let indexed = with_trip_index(text_df).await?;

        let mut pipeline = make_pipeline!(
            (
                "coerce_types",
                TypeCoercer::new(vec![
                    (raw::PICKUP.into(), trip::PICKUP_TIME.into(), Coercion::Timestamp),
                    (raw::DROPOFF.into(), trip::DROPOFF_TIME.into(), Coercion::Timestamp),
                    (raw::DISTANCE.into(), trip::DISTANCE.into(), Coercion::Float),
                    (raw::FARE.into(), trip::FARE.into(), Coercion::Float),
                    (raw::PASSENGERS.into(), trip::PASSENGER_COUNT.into(), Coercion::Integer),
                ])
            ),
            (
                "pickup_time_features",
                PickupTimeFeatures::new(trip::PICKUP_TIME, "pickup")
            ),
            (
                "impute_categories",
                CategoricalImputer::unknown(vec![
                    raw::PAYMENT.into(),
                    raw::PICKUP_ZONE.into(),
                    raw::DROPOFF_ZONE.into(),
                ])
            ),
        );
        let prepared = pipeline.fit_transform(&indexed).await?;

        let projection: Vec<Expr> = trip::ALL
            .iter()
            .map(|name| match *name {
                trip::PAYMENT_METHOD => col(raw::PAYMENT).alias(trip::PAYMENT_METHOD),
                other => col(other),
            })
            .collect();
        let df = prepared.select(projection)?.cache().await?;
        let rows = df.clone().count().await?;
        debug!(rows, "trip table materialised");
        Ok(Self { df, rows })
    }

    /// A fresh handle on the prepared data. Queries built on it never affect the table.
    pub fn frame(&self) -> DataFrame {
        self.df.clone()
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Collects the whole table ordered by source position.
    pub async fn collect(&self) -> TripInsightsResult<Vec<RecordBatch>> {
        Ok(self
            .frame()
            .sort(vec![col(trip::TRIP_INDEX).sort(true, false)])?
            .collect()
            .await?)
    }
}

/// File scans stay in a single partition so rows come back in file order.
fn session_context() -> SessionContext {
    SessionContext::new_with_config(SessionConfig::new().with_repartition_file_scans(false))
}

async fn read_source(
    ctx: &SessionContext,
    path: &Path,
    settings: &Settings,
) -> TripInsightsResult<DataFrame> {
    let path_str = path.to_string_lossy().to_string();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" | "tsv" | "txt" => {
            let file_extension = format!(".{}", extension);
            let options = || {
                CsvReadOptions::new()
                    .has_header(settings.has_header)
                    .delimiter(settings.delimiter)
                    .file_extension(&file_extension)
            };
            // Take the column names from the file, but read every column as text so a
            // malformed cell anywhere in the file cannot fail the read.
            let inferred = ctx.read_csv(path_str.as_str(), options()).await?;
            let text_schema = Schema::new(
                inferred
                    .schema()
                    .fields()
                    .iter()
                    .map(|f| Field::new(f.name(), DataType::Utf8, true))
                    .collect::<Vec<_>>(),
            );
            Ok(ctx
                .read_csv(path_str.as_str(), options().schema(&text_schema))
                .await?)
        }
        "parquet" => Ok(ctx
            .read_parquet(path_str.as_str(), ParquetReadOptions::default())
            .await?),
        _ => Err(TripInsightsError::UnsupportedFormat(format!(
            "{} (expected .csv, .tsv, .txt or .parquet)",
            path.display()
        ))),
    }
}

/// Appends `trip_index`, the 0-based position of each row in `df`, and materialises
/// the result in memory.
async fn with_trip_index(df: DataFrame) -> TripInsightsResult<DataFrame> {
    let source_schema: SchemaRef = Arc::new(df.schema().as_arrow().clone());
    let mut fields: Vec<Field> = source_schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(Field::new(trip::TRIP_INDEX, DataType::UInt64, false));
    let schema = Arc::new(Schema::new(fields));

    let mut offset = 0u64;
    let mut indexed = Vec::new();
    for batch in df.collect().await? {
        let rows = batch.num_rows() as u64;
        let mut columns = batch.columns().to_vec();
        columns.push(Arc::new(UInt64Array::from_iter_values(offset..offset + rows)));
        indexed.push(RecordBatch::try_new(schema.clone(), columns)?);
        offset += rows;
    }

    let table = MemTable::try_new(schema, vec![indexed])?;
    let ctx = session_context();
    Ok(ctx.read_table(Arc::new(table))?)
}
