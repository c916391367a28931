//! Column names of the raw trip source and of the prepared trip table.

use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

/// Label substituted for missing categorical values.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Columns of the raw delimited source, in source order.
pub mod raw {
    pub const PICKUP: &str = "pickup";
    pub const DROPOFF: &str = "dropoff";
    pub const PAYMENT: &str = "payment";
    pub const PICKUP_ZONE: &str = "pickup_zone";
    pub const DROPOFF_ZONE: &str = "dropoff_zone";
    pub const DISTANCE: &str = "distance";
    pub const FARE: &str = "fare";
    pub const PASSENGERS: &str = "passengers";

    pub const ALL: [&str; 8] = [
        PICKUP,
        DROPOFF,
        PAYMENT,
        PICKUP_ZONE,
        DROPOFF_ZONE,
        DISTANCE,
        FARE,
        PASSENGERS,
    ];
}

/// Columns of the prepared trip table.
pub mod trip {
    /// Position of the row in the source, starting at zero.
    pub const TRIP_INDEX: &str = "trip_index";
    pub const PICKUP_TIME: &str = "pickup_time";
    pub const DROPOFF_TIME: &str = "dropoff_time";
    pub const PICKUP_HOUR: &str = "pickup_hour";
    pub const PICKUP_DAY_NAME: &str = "pickup_day_name";
    pub const PICKUP_MONTH: &str = "pickup_month";
    pub const PAYMENT_METHOD: &str = "payment_method";
    pub const PICKUP_ZONE: &str = "pickup_zone";
    pub const DROPOFF_ZONE: &str = "dropoff_zone";
    pub const DISTANCE: &str = "distance";
    pub const FARE: &str = "fare";
    pub const PASSENGER_COUNT: &str = "passenger_count";

    pub const ALL: [&str; 12] = [
        TRIP_INDEX,
        PICKUP_TIME,
        DROPOFF_TIME,
        PICKUP_HOUR,
        PICKUP_DAY_NAME,
        PICKUP_MONTH,
        PAYMENT_METHOD,
        PICKUP_ZONE,
        DROPOFF_ZONE,
        DISTANCE,
        FARE,
        PASSENGER_COUNT,
    ];
}

/// Schema used to read the raw source: every column is nullable text, so that
/// a malformed cell is coerced later instead of failing the whole read.
pub fn raw_text_schema() -> SchemaRef {
    Arc::new(Schema::new(
        raw::ALL
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ))
}
