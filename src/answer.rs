//! ## Question results
//!
//! An [`Answer`] is what a catalog question hands to the presentation surface: a formatted
//! scalar, an ordered series for a bar/line chart or table, a histogram with its density
//! overlay, or a sample of rows. Nothing here draws anything; `Display` renders a plain
//! text version for terminals and logs.

use std::fmt;

/// How a series is meant to be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Table,
}

/// The group a series point belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Text(String),
    Integer(i64),
    /// Two-column grouping, e.g. a pickup zone and a dropoff zone.
    Pair(String, String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Text(text) => write!(f, "{}", text),
            GroupKey::Integer(value) => write!(f, "{}", value),
            GroupKey::Pair(first, second) => write!(f, "{} -> {}", first, second),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub key: GroupKey,
    /// Count or mean of the group. `NaN` when the group has no values to average.
    pub value: f64,
}

/// An ordered categorical series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key_columns: Vec<String>,
    pub value_name: String,
    pub chart: ChartKind,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn keys(&self) -> Vec<&GroupKey> {
        self.points.iter().map(|p| &p.key).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Value of the point with the given key.
    pub fn get(&self, key: &GroupKey) -> Option<f64> {
        self.points.iter().find(|p| &p.key == key).map(|p| p.value)
    }
}

/// A binned distribution ready for external plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub column: String,
    /// The raw non-null values the histogram was built from.
    pub values: Vec<f64>,
    pub bins: usize,
    /// `bins + 1` edges, or none when there were no values.
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    /// Smoothed density evaluated on a grid, scaled to the count axis.
    pub density: Vec<(f64, f64)>,
}

/// One cell of a row sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => write!(f, "{}", text),
            Cell::Number(value) => write!(f, "{:.2}", value),
            Cell::Null => write!(f, "null"),
        }
    }
}

/// Rows selected by a filter, truncated to the first few in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSample {
    pub caption: String,
    /// Number of rows matching the filter, before truncation.
    pub total: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Scalar { value: f64, text: String },
    Series(Series),
    Histogram(Histogram),
    Sample(RowSample),
}

impl Answer {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Answer::Scalar { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Answer::Series(series) => Some(series),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            Answer::Histogram(histogram) => Some(histogram),
            _ => None,
        }
    }

    pub fn as_sample(&self) -> Option<&RowSample> {
        match self {
            Answer::Sample(sample) => Some(sample),
            _ => None,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Scalar { text, .. } => writeln!(f, "{}", text),
            Answer::Series(series) => {
                writeln!(f, "{}\t{}", series.key_columns.join(", "), series.value_name)?;
                for point in &series.points {
                    if point.value.fract() == 0.0 {
                        writeln!(f, "{}\t{}", point.key, point.value)?;
                    } else {
                        writeln!(f, "{}\t{:.2}", point.key, point.value)?;
                    }
                }
                Ok(())
            }
            Answer::Histogram(histogram) => {
                writeln!(
                    f,
                    "{}: {} values in {} bins",
                    histogram.column,
                    histogram.values.len(),
                    histogram.bins
                )?;
                for (i, count) in histogram.counts.iter().enumerate() {
                    writeln!(
                        f,
                        "[{:.2}, {:.2}{}\t{}",
                        histogram.edges[i],
                        histogram.edges[i + 1],
                        if i + 1 == histogram.counts.len() { "]" } else { ")" },
                        count
                    )?;
                }
                Ok(())
            }
            Answer::Sample(sample) => {
                writeln!(f, "{}", sample.caption)?;
                writeln!(f, "{}", sample.columns.join("\t"))?;
                for row in &sample.rows {
                    let cells: Vec<String> = row.iter().map(Cell::to_string).collect();
                    writeln!(f, "{}", cells.join("\t"))?;
                }
                Ok(())
            }
        }
    }
}
