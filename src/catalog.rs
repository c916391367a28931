//! ## Question Catalog
//!
//! The fixed, ordered registry of the twenty analysis questions. Each [`Question`] pairs a
//! label with a declarative [`Recipe`] and a [`Presentation`]; [`crate::recipes`] evaluates
//! any recipe generically, so adding a question means adding an entry here, not code.
//!
//! Time-based groupings leave out trips whose pickup time is unknown. More generally, a
//! row whose group key is null never forms a group of its own.

use crate::exceptions::{TripInsightsError, TripInsightsResult};
use crate::schema::trip;

/// Number of entries kept by the "top" questions.
pub const TOP_N: usize = 10;
pub const HISTOGRAM_BINS: usize = 30;
/// Grid size of the density overlay drawn over the histogram.
pub const DENSITY_POINTS: usize = 200;
pub const OUTLIER_QUANTILE: f64 = 0.95;
pub const OUTLIER_SAMPLE_ROWS: usize = 10;

/// Shape of a question's result, as consumed by the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Scalar,
    Bar,
    Line,
    Table,
    Histogram,
    Sample,
}

/// How a scalar is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Whole number, e.g. a count of trips.
    Count,
    Miles,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarAggregate {
    RowCount,
    Mean(&'static str),
    Sum(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Mean(&'static str),
}

/// Ordering of grouped results. Ties on the aggregate keep the order in which the
/// groups first appear in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    KeyAscending,
    ValueAscending,
    ValueDescending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recipe {
    Scalar {
        aggregate: ScalarAggregate,
        caption: &'static str,
        unit: Unit,
    },
    Grouped {
        keys: &'static [&'static str],
        aggregate: Aggregate,
        order: Order,
        limit: Option<usize>,
    },
    Histogram {
        column: &'static str,
        bins: usize,
    },
    /// Rows strictly above a quantile of `column`.
    Outliers {
        column: &'static str,
        quantile: f64,
        projection: &'static [&'static str],
        sample_rows: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Question {
    /// 1-based position in the menu.
    pub number: usize,
    pub label: &'static str,
    /// Longer wording used as the heading of the analysis.
    pub title: &'static str,
    pub recipe: Recipe,
    pub presentation: Presentation,
}

const fn scalar(
    number: usize,
    label: &'static str,
    title: &'static str,
    aggregate: ScalarAggregate,
    unit: Unit,
) -> Question {
    Question {
        number,
        label,
        title,
        recipe: Recipe::Scalar {
            aggregate,
            caption: title,
            unit,
        },
        presentation: Presentation::Scalar,
    }
}

const fn question(
    number: usize,
    label: &'static str,
    title: &'static str,
    recipe: Recipe,
    presentation: Presentation,
) -> Question {
    Question {
        number,
        label,
        title,
        recipe,
        presentation,
    }
}

pub static QUESTIONS: [Question; 20] = [
    scalar(
        1,
        "Total trips",
        "Total number of trips",
        ScalarAggregate::RowCount,
        Unit::Count,
    ),
    scalar(
        2,
        "Average distance",
        "Average trip distance",
        ScalarAggregate::Mean(trip::DISTANCE),
        Unit::Miles,
    ),
    scalar(
        3,
        "Average fare",
        "Average trip fare",
        ScalarAggregate::Mean(trip::FARE),
        Unit::Currency,
    ),
    scalar(
        4,
        "Total revenue",
        "Total revenue generated",
        ScalarAggregate::Sum(trip::FARE),
        Unit::Currency,
    ),
    question(
        5,
        "Trips per weekday",
        "Trips per day of the week",
        Recipe::Grouped {
            keys: &[trip::PICKUP_DAY_NAME],
            aggregate: Aggregate::Count,
            order: Order::ValueDescending,
            limit: None,
        },
        Presentation::Bar,
    ),
    question(
        6,
        "Trips per hour",
        "Trips per hour of the day",
        Recipe::Grouped {
            keys: &[trip::PICKUP_HOUR],
            aggregate: Aggregate::Count,
            order: Order::KeyAscending,
            limit: None,
        },
        Presentation::Bar,
    ),
    question(
        7,
        "Trips per month",
        "Trips per month",
        Recipe::Grouped {
            keys: &[trip::PICKUP_MONTH],
            aggregate: Aggregate::Count,
            order: Order::KeyAscending,
            limit: None,
        },
        Presentation::Bar,
    ),
    question(
        8,
        "Avg fare per weekday",
        "Average trip fare by day of the week",
        Recipe::Grouped {
            keys: &[trip::PICKUP_DAY_NAME],
            aggregate: Aggregate::Mean(trip::FARE),
            order: Order::ValueAscending,
            limit: None,
        },
        Presentation::Bar,
    ),
    question(
        9,
        "Avg distance per hour",
        "Average trip distance by hour of the day",
        Recipe::Grouped {
            keys: &[trip::PICKUP_HOUR],
            aggregate: Aggregate::Mean(trip::DISTANCE),
            order: Order::KeyAscending,
            limit: None,
        },
        Presentation::Line,
    ),
    question(
        10,
        "Top 10 pickup zones",
        "Top 10 busiest pickup zones",
        Recipe::Grouped {
            keys: &[trip::PICKUP_ZONE],
            aggregate: Aggregate::Count,
            order: Order::ValueDescending,
            limit: Some(TOP_N),
        },
        Presentation::Bar,
    ),
    question(
        11,
        "Top 10 dropoff zones",
        "Top 10 busiest dropoff zones",
        Recipe::Grouped {
            keys: &[trip::DROPOFF_ZONE],
            aggregate: Aggregate::Count,
            order: Order::ValueDescending,
            limit: Some(TOP_N),
        },
        Presentation::Bar,
    ),
    question(
        12,
        "Top 10 pickup→dropoff pairs",
        "Most common pickup-dropoff zone pairs",
        Recipe::Grouped {
            keys: &[trip::PICKUP_ZONE, trip::DROPOFF_ZONE],
            aggregate: Aggregate::Count,
            order: Order::ValueDescending,
            limit: Some(TOP_N),
        },
        Presentation::Table,
    ),
    question(
        13,
        "Avg fare by pickup zone",
        "Average fare by pickup zone",
        Recipe::Grouped {
            keys: &[trip::PICKUP_ZONE],
            aggregate: Aggregate::Mean(trip::FARE),
            order: Order::ValueDescending,
            limit: Some(TOP_N),
        },
        Presentation::Bar,
    ),
    question(
        14,
        "Avg fare by dropoff zone",
        "Average fare by dropoff zone",
        Recipe::Grouped {
            keys: &[trip::DROPOFF_ZONE],
            aggregate: Aggregate::Mean(trip::FARE),
            order: Order::ValueDescending,
            limit: Some(TOP_N),
        },
        Presentation::Bar,
    ),
    question(
        15,
        "Passenger count distribution",
        "Distribution of the number of passengers",
        Recipe::Grouped {
            keys: &[trip::PASSENGER_COUNT],
            aggregate: Aggregate::Count,
            order: Order::ValueDescending,
            limit: None,
        },
        Presentation::Bar,
    ),
    question(
        16,
        "Avg fare per passenger count",
        "Average fare per passenger count",
        Recipe::Grouped {
            keys: &[trip::PASSENGER_COUNT],
            aggregate: Aggregate::Mean(trip::FARE),
            order: Order::KeyAscending,
            limit: None,
        },
        Presentation::Line,
    ),
    question(
        17,
        "Payment method distribution",
        "Distribution of payment methods",
        Recipe::Grouped {
            keys: &[trip::PAYMENT_METHOD],
            aggregate: Aggregate::Count,
            order: Order::ValueDescending,
            limit: None,
        },
        Presentation::Bar,
    ),
    question(
        18,
        "Avg fare per payment method",
        "Average fare by payment method",
        Recipe::Grouped {
            keys: &[trip::PAYMENT_METHOD],
            aggregate: Aggregate::Mean(trip::FARE),
            order: Order::KeyAscending,
            limit: None,
        },
        Presentation::Bar,
    ),
    Question {
        number: 19,
        label: "Distance distribution",
        title: "Distribution of trip distances",
        recipe: Recipe::Histogram {
            column: trip::DISTANCE,
            bins: HISTOGRAM_BINS,
        },
        presentation: Presentation::Histogram,
    },
    Question {
        number: 20,
        label: "Distance outliers",
        title: "Outliers in trip distances and their characteristics",
        recipe: Recipe::Outliers {
            column: trip::DISTANCE,
            quantile: OUTLIER_QUANTILE,
            projection: &[trip::PICKUP_ZONE, trip::DROPOFF_ZONE, trip::DISTANCE, trip::FARE],
            sample_rows: OUTLIER_SAMPLE_ROWS,
        },
        presentation: Presentation::Sample,
    },
];

/// Every question, in menu order.
pub fn questions() -> &'static [Question] {
    &QUESTIONS
}

/// Menu labels, in order.
pub fn labels() -> Vec<&'static str> {
    QUESTIONS.iter().map(|q| q.label).collect()
}

/// Finds a question by its label, its title or its 1-based menu number.
///
/// Labels and titles match exactly first, then ignoring case and surrounding whitespace.
pub fn find(query: &str) -> TripInsightsResult<&'static Question> {
    if let Some(question) = QUESTIONS.iter().find(|q| q.label == query || q.title == query) {
        return Ok(question);
    }
    let wanted = query.trim();
    if let Some(question) = QUESTIONS.iter().find(|q| {
        q.label.eq_ignore_ascii_case(wanted) || q.title.eq_ignore_ascii_case(wanted)
    }) {
        return Ok(question);
    }
    wanted
        .parse::<usize>()
        .ok()
        .and_then(|number| QUESTIONS.iter().find(|q| q.number == number))
        .ok_or_else(|| TripInsightsError::UnknownQuestion(query.to_string()))
}
