use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::memory::MemTable;
use datafusion::prelude::*;

use trip_insights::batches::{f64_values, i64_values, string_values};
use trip_insights::exceptions::{TripInsightsError, TripInsightsResult};
use trip_insights::transformers::coercion::{Coercion, TypeCoercer};
use trip_insights::transformers::datetime_features::PickupTimeFeatures;
use trip_insights::transformers::imputation::CategoricalImputer;
use trip_insights::transformers::outlier_handling::UpperTailSelector;

/// Creates an in-memory DataFrame with text columns "when", "amount" and "zone".
async fn create_text_df() -> DataFrame {
    let schema = Arc::new(Schema::new(vec![
        Field::new("when", DataType::Utf8, true),
        Field::new("amount", DataType::Utf8, true),
        Field::new("zone", DataType::Utf8, true),
    ]));
    let when: ArrayRef = Arc::new(StringArray::from(vec![
        Some("2019-03-23 20:21:09"),
        Some(" 2019-03-04T16:11:55 "),
        Some("31/02/2019"),
        None,
    ]));
    let amount: ArrayRef = Arc::new(StringArray::from(vec![
        Some("7.5"),
        Some(" 3 "),
        Some("seven"),
        None,
    ]));
    let zone: ArrayRef = Arc::new(StringArray::from(vec![
        Some("Midtown"),
        Some(""),
        None,
        Some("Harlem"),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), vec![when, amount, zone]).unwrap();
    let mem_table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    let ctx = SessionContext::new();
    ctx.register_table("t", Arc::new(mem_table)).unwrap();
    ctx.table("t").await.unwrap()
}

/// Creates a DataFrame with a single Float64 column "value".
async fn create_numeric_df(values: Vec<f64>) -> DataFrame {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "value",
        DataType::Float64,
        false,
    )]));
    let array: ArrayRef = Arc::new(Float64Array::from(values));
    let batch = RecordBatch::try_new(schema.clone(), vec![array]).unwrap();
    let mem_table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    let ctx = SessionContext::new();
    ctx.register_table("t", Arc::new(mem_table)).unwrap();
    ctx.table("t").await.unwrap()
}

fn coercer() -> TypeCoercer {
    TypeCoercer::new(vec![
        ("when".into(), "when_time".into(), Coercion::Timestamp),
        ("amount".into(), "amount".into(), Coercion::Float),
    ])
}

#[tokio::test]
async fn test_type_coercer_nulls_malformed_values() -> TripInsightsResult<()> {
    let df = create_text_df().await;
    let mut coercer = coercer();
    coercer.fit(&df).await?;
    let batches = coercer.transform(df)?.collect().await?;

    let times = i64_values(&batches, "when_time")?;
    assert!(times[0].is_some());
    assert!(times[1].is_some(), "surrounding whitespace should be ignored");
    assert_eq!(times[2], None);
    assert_eq!(times[3], None);

    let amounts = f64_values(&batches, "amount")?;
    assert_eq!(amounts, vec![Some(7.5), Some(3.0), None, None]);

    // Untouched columns are kept.
    assert_eq!(string_values(&batches, "zone")?.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_type_coercer_rejects_missing_column() {
    let df = create_text_df().await;
    let mut coercer = TypeCoercer::new(vec![(
        "missing".into(),
        "missing".into(),
        Coercion::Integer,
    )]);
    let result = coercer.fit(&df).await;
    assert!(matches!(result, Err(TripInsightsError::MissingColumn(_))));
}

#[tokio::test]
async fn test_pickup_time_features() -> TripInsightsResult<()> {
    let df = coercer().transform(create_text_df().await)?;
    let mut features = PickupTimeFeatures::new("when_time", "when");
    features.fit(&df).await?;
    let batches = features.transform(df)?.collect().await?;

    assert_eq!(
        i64_values(&batches, "when_hour")?,
        vec![Some(20), Some(16), None, None]
    );
    assert_eq!(
        string_values(&batches, "when_day_name")?,
        vec![
            Some("Saturday".to_string()),
            Some("Monday".to_string()),
            None,
            None
        ]
    );
    assert_eq!(
        i64_values(&batches, "when_month")?,
        vec![Some(3), Some(3), None, None]
    );
    Ok(())
}

#[tokio::test]
async fn test_pickup_time_features_requires_datetime() {
    let df = create_text_df().await;
    let features = PickupTimeFeatures::new("when", "when");
    let result = features.transform(df);
    assert!(matches!(result, Err(TripInsightsError::UnexpectedType(_))));
}

#[tokio::test]
async fn test_categorical_imputer_fills_null_and_blank() -> TripInsightsResult<()> {
    let df = create_text_df().await;
    let mut imputer = CategoricalImputer::unknown(vec!["zone".to_string()]);
    imputer.fit(&df).await?;
    let batches = imputer.transform(df)?.collect().await?;
    assert_eq!(
        string_values(&batches, "zone")?,
        vec![
            Some("Midtown".to_string()),
            Some("Unknown".to_string()),
            Some("Unknown".to_string()),
            Some("Harlem".to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_categorical_imputer_custom_default() -> TripInsightsResult<()> {
    let df = create_text_df().await;
    let imputer = CategoricalImputer::new(vec!["zone".to_string()], "N/A");
    let batches = imputer.transform(df)?.collect().await?;
    assert_eq!(string_values(&batches, "zone")?[2].as_deref(), Some("N/A"));
    Ok(())
}

#[tokio::test]
async fn test_upper_tail_selector() -> TripInsightsResult<()> {
    let df = create_numeric_df(vec![1.0, 1.0, 1.0, 1.0, 100.0]).await;
    let mut selector = UpperTailSelector::new("value", 0.95);
    selector.fit(&df).await?;
    let threshold = selector.threshold()?.expect("Expected a threshold");
    assert!((threshold - 80.2).abs() < 1e-9, "threshold was {}", threshold);

    let batches = selector.transform(df)?.collect().await?;
    assert_eq!(f64_values(&batches, "value")?, vec![Some(100.0)]);
    Ok(())
}

#[tokio::test]
async fn test_upper_tail_selector_requires_fit() {
    let df = create_numeric_df(vec![1.0, 2.0]).await;
    let selector = UpperTailSelector::new("value", 0.95);
    assert!(matches!(
        selector.transform(df),
        Err(TripInsightsError::FitNotCalled)
    ));
}

#[tokio::test]
async fn test_upper_tail_selector_invalid_quantile() {
    let df = create_numeric_df(vec![1.0, 2.0]).await;
    let mut selector = UpperTailSelector::new("value", 1.5);
    assert!(matches!(
        selector.fit(&df).await,
        Err(TripInsightsError::InvalidParameter(_))
    ));
}

#[tokio::test]
async fn test_upper_tail_selector_fitted_on_no_values() -> TripInsightsResult<()> {
    let df = create_numeric_df(Vec::new()).await;
    let mut selector = UpperTailSelector::new("value", 0.95);
    selector.fit(&df).await?;
    // Fitted, but there is no threshold to compare against.
    assert_eq!(selector.threshold()?, None);
    let batches = selector.transform(df)?.collect().await?;
    assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 0);
    Ok(())
}

#[tokio::test]
async fn test_type_coercer_treats_non_finite_as_missing() -> TripInsightsResult<()> {
    let schema = Arc::new(Schema::new(vec![Field::new("amount", DataType::Utf8, true)]));
    let amount: ArrayRef = Arc::new(StringArray::from(vec![
        Some("NaN"),
        Some("inf"),
        Some("-inf"),
        Some("2.5"),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), vec![amount])?;
    let ctx = SessionContext::new();
    ctx.register_table("t", Arc::new(MemTable::try_new(schema, vec![vec![batch]])?))?;
    let df = ctx.table("t").await?;

    let coercer = TypeCoercer::new(vec![
        ("amount".into(), "as_float".into(), Coercion::Float),
    ]);
    let floats = coercer.transform(df.clone())?.collect().await?;
    assert_eq!(f64_values(&floats, "as_float")?, vec![None, None, None, Some(2.5)]);

    // Integer coercion truncates decimal text.
    let coercer = TypeCoercer::new(vec![
        ("amount".into(), "as_int".into(), Coercion::Integer),
    ]);
    let ints = coercer.transform(df)?.collect().await?;
    assert_eq!(i64_values(&ints, "as_int")?, vec![None, None, None, Some(2)]);
    Ok(())
}
