//! ## Recipe Evaluation
//!
//! One interpreter for every catalog [`Recipe`]. Each evaluation builds a fresh query on
//! the prepared [`TripTable`] and only reads from it, so the same question asked twice
//! yields the same answer, and questions can be answered concurrently.
//!
//! Grouped recipes keep ties stable by carrying, for every group, the smallest
//! `trip_index` it contains and using it as the last sort key.

use crate::answer::{Answer, Cell, ChartKind, GroupKey, Histogram, RowSample, Series, SeriesPoint};
use crate::batches::{f64_values, i64_values, string_values};
use crate::catalog::{
    self, Aggregate, Order, Presentation, Question, Recipe, ScalarAggregate, Unit, DENSITY_POINTS,
};
use crate::dataset::TripTable;
use crate::exceptions::{TripInsightsError, TripInsightsResult};
use crate::schema::trip;
use crate::stats::{gaussian_kde, histogram};
use crate::transformers::outlier_handling::UpperTailSelector;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::functions_aggregate::expr_fn::{avg, count, min, sum};
use datafusion::logical_expr::{col, lit, Expr, SortExpr};
use datafusion::prelude::*;
use futures::future::try_join_all;
use std::time::Instant;
use tracing::{debug, info};

const VALUE_COLUMN: &str = "value";
const FIRST_SEEN_COLUMN: &str = "first_seen";

/// Answers the question with the given label, title or menu number.
pub async fn run(label: &str, table: &TripTable) -> TripInsightsResult<Answer> {
    let question = catalog::find(label)?;
    answer(question, table).await
}

/// Answers every catalog question, in menu order.
pub async fn run_all(table: &TripTable) -> TripInsightsResult<Vec<(&'static Question, Answer)>> {
    let answers = try_join_all(catalog::questions().iter().map(|q| answer(q, table))).await?;
    Ok(catalog::questions().iter().zip(answers).collect())
}

/// Answers one catalog question.
pub async fn answer(question: &Question, table: &TripTable) -> TripInsightsResult<Answer> {
    let start = Instant::now();
    let result = evaluate(&question.recipe, question.presentation, table).await?;
    info!(
        question = question.label,
        elapsed = ?start.elapsed(),
        "answered question"
    );
    Ok(result)
}

/// Evaluates a recipe against the table.
pub async fn evaluate(
    recipe: &Recipe,
    presentation: Presentation,
    table: &TripTable,
) -> TripInsightsResult<Answer> {
    match *recipe {
        Recipe::Scalar {
            aggregate,
            caption,
            unit,
        } => scalar(table, aggregate, caption, unit).await,
        Recipe::Grouped {
            keys,
            aggregate,
            order,
            limit,
        } => {
            let chart = match presentation {
                Presentation::Line => ChartKind::Line,
                Presentation::Table => ChartKind::Table,
                _ => ChartKind::Bar,
            };
            grouped(table, keys, aggregate, order, limit, chart)
                .await
                .map(Answer::Series)
        }
        Recipe::Histogram { column, bins } => {
            distribution(table, column, bins).await.map(Answer::Histogram)
        }
        Recipe::Outliers {
            column,
            quantile,
            projection,
            sample_rows,
        } => outliers(table, column, quantile, projection, sample_rows)
            .await
            .map(Answer::Sample),
    }
}

fn column_type(df: &DataFrame, name: &str) -> TripInsightsResult<DataType> {
    df.schema()
        .field_with_name(None, name)
        .map(|field| field.data_type().clone())
        .map_err(|_| TripInsightsError::MissingColumn(format!("Column '{}' not found", name)))
}

fn require_numeric(df: &DataFrame, name: &str) -> TripInsightsResult<()> {
    let data_type = column_type(df, name)?;
    if data_type.is_numeric() {
        Ok(())
    } else {
        Err(TripInsightsError::UnexpectedType(format!(
            "Column '{}' must be numeric, but found {:?}",
            name, data_type
        )))
    }
}

async fn single_value(df: DataFrame, aggregate: Expr) -> TripInsightsResult<Option<f64>> {
    let batches = df
        .aggregate(vec![], vec![aggregate.alias(VALUE_COLUMN)])?
        .collect()
        .await?;
    Ok(f64_values(&batches, VALUE_COLUMN)?.into_iter().next().flatten())
}

async fn scalar(
    table: &TripTable,
    aggregate: ScalarAggregate,
    caption: &str,
    unit: Unit,
) -> TripInsightsResult<Answer> {
    let df = table.frame();
    let value = match aggregate {
        ScalarAggregate::RowCount => df.count().await? as f64,
        ScalarAggregate::Mean(column) => {
            require_numeric(&df, column)?;
            single_value(df, avg(col(column))).await?.unwrap_or(f64::NAN)
        }
        ScalarAggregate::Sum(column) => {
            require_numeric(&df, column)?;
            // The sum over no values is zero, not undefined.
            single_value(df, sum(col(column))).await?.unwrap_or(0.0)
        }
    };
    let text = match unit {
        Unit::Count => format!("{}: {}", caption, value),
        Unit::Miles => format!("{}: {:.2} miles", caption, value),
        Unit::Currency => format!("{}: ${:.2}", caption, value),
    };
    Ok(Answer::Scalar { value, text })
}

fn sort_exprs(keys: &[&str], order: Order) -> Vec<SortExpr> {
    let by_first_seen = col(FIRST_SEEN_COLUMN).sort(true, false);
    match order {
        Order::KeyAscending => keys
            .iter()
            .map(|key| col(*key).sort(true, false))
            .collect(),
        Order::ValueAscending => vec![col(VALUE_COLUMN).sort(true, false), by_first_seen],
        Order::ValueDescending => vec![col(VALUE_COLUMN).sort(false, false), by_first_seen],
    }
}

fn group_keys(
    batches: &[RecordBatch],
    df_keys: &[(&str, DataType)],
) -> TripInsightsResult<Vec<GroupKey>> {
    match df_keys {
        [(name, data_type)] if data_type.is_integer() => Ok(i64_values(batches, name)?
            .into_iter()
            .map(|v| GroupKey::Integer(v.unwrap_or_default()))
            .collect()),
        [(name, _)] => Ok(string_values(batches, name)?
            .into_iter()
            .map(|v| GroupKey::Text(v.unwrap_or_default()))
            .collect()),
        [(first, _), (second, _)] => {
            let firsts = string_values(batches, first)?;
            let seconds = string_values(batches, second)?;
            Ok(firsts
                .into_iter()
                .zip(seconds)
                .map(|(a, b)| GroupKey::Pair(a.unwrap_or_default(), b.unwrap_or_default()))
                .collect())
        }
        _ => Err(TripInsightsError::InvalidParameter(format!(
            "Grouping needs one or two key columns, got {}",
            df_keys.len()
        ))),
    }
}

async fn grouped(
    table: &TripTable,
    keys: &[&str],
    aggregate: Aggregate,
    order: Order,
    limit: Option<usize>,
    chart: ChartKind,
) -> TripInsightsResult<Series> {
    let mut df = table.frame();
    let mut typed_keys = Vec::with_capacity(keys.len());
    for key in keys {
        typed_keys.push((*key, column_type(&df, key)?));
        // Null keys (e.g. an unknown pickup time) do not form a group.
        df = df.filter(col(*key).is_not_null())?;
    }
    let (value_expr, value_name) = match aggregate {
        Aggregate::Count => (count(lit(1i64)), "count".to_string()),
        Aggregate::Mean(column) => {
            require_numeric(&df, column)?;
            (avg(col(column)), format!("mean {}", column))
        }
    };

    let group_exprs: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    let mut result = df
        .aggregate(
            group_exprs,
            vec![
                value_expr.alias(VALUE_COLUMN),
                min(col(trip::TRIP_INDEX)).alias(FIRST_SEEN_COLUMN),
            ],
        )?
        .sort(sort_exprs(keys, order))?;
    if let Some(n) = limit {
        result = result.limit(0, Some(n))?;
    }
    let batches = result.collect().await?;

    let group_keys = group_keys(&batches, &typed_keys)?;
    let values = f64_values(&batches, VALUE_COLUMN)?;
    let points: Vec<SeriesPoint> = group_keys
        .into_iter()
        .zip(values)
        .map(|(key, value)| SeriesPoint {
            key,
            value: value.unwrap_or(f64::NAN),
        })
        .collect();
    debug!(groups = points.len(), ?order, "grouped recipe evaluated");

    Ok(Series {
        key_columns: keys.iter().map(|k| k.to_string()).collect(),
        value_name,
        chart,
        points,
    })
}

async fn distribution(
    table: &TripTable,
    column: &str,
    bins: usize,
) -> TripInsightsResult<Histogram> {
    let df = table.frame();
    require_numeric(&df, column)?;
    let batches = df
        .filter(col(column).is_not_null())?
        .sort(vec![col(trip::TRIP_INDEX).sort(true, false)])?
        .select(vec![col(column)])?
        .collect()
        .await?;
    let values: Vec<f64> = f64_values(&batches, column)?
        .into_iter()
        .flatten()
        .collect();

    let binned = histogram(&values, bins)?;
    // Scale the density to the count axis so it overlays the bars.
    let scale = binned.bin_width().unwrap_or(0.0) * values.len() as f64;
    let density = gaussian_kde(&values, DENSITY_POINTS)
        .into_iter()
        .map(|(x, d)| (x, d * scale))
        .collect();

    Ok(Histogram {
        column: column.to_string(),
        values,
        bins,
        edges: binned.edges,
        counts: binned.counts,
        density,
    })
}

async fn outliers(
    table: &TripTable,
    column: &str,
    quantile: f64,
    projection: &[&str],
    sample_rows: usize,
) -> TripInsightsResult<RowSample> {
    let df = table.frame();
    let mut selector = UpperTailSelector::new(column, quantile);
    selector.fit(&df).await?;
    let selected = selector.transform(df)?;
    let total = selected.clone().count().await?;

    let mut typed_columns = Vec::with_capacity(projection.len());
    for name in projection {
        typed_columns.push((*name, column_type(&selected, name)?));
    }
    let batches = selected
        .sort(vec![col(trip::TRIP_INDEX).sort(true, false)])?
        .limit(0, Some(sample_rows))?
        .select(projection.iter().map(|name| col(*name)).collect::<Vec<Expr>>())?
        .collect()
        .await?;

    let mut cells_by_column: Vec<Vec<Cell>> = Vec::with_capacity(projection.len());
    for (name, data_type) in &typed_columns {
        let cells = if data_type.is_numeric() {
            f64_values(&batches, name)?
                .into_iter()
                .map(|v| v.map_or(Cell::Null, Cell::Number))
                .collect()
        } else {
            string_values(&batches, name)?
                .into_iter()
                .map(|v| v.map_or(Cell::Null, Cell::Text))
                .collect()
        };
        cells_by_column.push(cells);
    }
    let row_total = cells_by_column.first().map_or(0, Vec::len);
    let rows = (0..row_total)
        .map(|i| cells_by_column.iter().map(|cells| cells[i].clone()).collect())
        .collect();

    let percent = ((1.0 - quantile) * 100.0).round();
    Ok(RowSample {
        caption: format!(
            "Outliers (top {}% of trip {}s): {} trips",
            percent, column, total
        ),
        total,
        columns: projection.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}
