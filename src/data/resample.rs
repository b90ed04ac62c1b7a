use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Frequency – calendar bucket size
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Day,
        Frequency::Week,
        Frequency::Month,
        Frequency::Year,
    ];

    /// Short resampling code: D, W, M or Y.
    pub fn code(self) -> &'static str {
        match self {
            Frequency::Day => "D",
            Frequency::Week => "W",
            Frequency::Month => "M",
            Frequency::Year => "Y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Frequency::Day => "Day",
            Frequency::Week => "Week",
            Frequency::Month => "Month",
            Frequency::Year => "Year",
        }
    }

    /// The calendar bucket containing `date`.
    pub fn bucket(self, date: NaiveDate) -> Bucket {
        match self {
            Frequency::Day => Bucket {
                start: date,
                end: date,
            },
            Frequency::Week => {
                let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
                Bucket {
                    start,
                    end: start + Duration::days(6),
                }
            }
            Frequency::Month => {
                let start = date.with_day(1).unwrap_or(date);
                let (y, m) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                let next = NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(NaiveDate::MAX);
                Bucket {
                    start,
                    end: next.pred_opt().unwrap_or(next),
                }
            }
            Frequency::Year => Bucket {
                start: NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
                end: NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date),
            },
        }
    }
}

/// A contiguous, calendar-aligned span of days (both ends inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Bucket {
    /// Chart label: the day itself for daily buckets, the last day of the
    /// span for weekly, monthly and yearly ones.
    pub fn label(&self) -> NaiveDate {
        self.end
    }
}

// ---------------------------------------------------------------------------
// Series / Resampled – aggregated output
// ---------------------------------------------------------------------------

/// One named numeric series aligned with [`Resampled::buckets`].
/// `None` marks an undefined value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resampled {
    pub buckets: Vec<Bucket>,
    pub series: Vec<Series>,
}

impl Resampled {
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    pub fn labels(&self) -> Vec<NaiveDate> {
        self.buckets.iter().map(Bucket::label).collect()
    }
}

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// Group rows into calendar buckets and average every numeric column.
///
/// * Buckets with no rows are omitted; output is ordered by bucket start.
/// * Empty cells are skipped; a bucket with no numbers for a column is `None`.
/// * Columns holding text (and the date column itself) are dropped.
pub fn resample_mean(dataset: &Dataset, date_column: &str, frequency: Frequency) -> Resampled {
    let Some(dates) = dataset.column(date_column) else {
        return Resampled::default();
    };

    let mut groups: BTreeMap<Bucket, Vec<usize>> = BTreeMap::new();
    for (row, value) in dates.values.iter().enumerate() {
        if let Some(dt) = value.as_datetime() {
            groups.entry(frequency.bucket(dt.date())).or_default().push(row);
        }
    }

    let numeric: Vec<_> = dataset
        .columns
        .iter()
        .filter(|c| c.name != date_column)
        .filter(|c| {
            let keep = c.is_numeric();
            if !keep {
                log::debug!("Dropping non-numeric column '{}' from resampling", c.name);
            }
            keep
        })
        .collect();

    let series = numeric
        .iter()
        .map(|column| Series {
            name: column.name.clone(),
            values: groups
                .values()
                .map(|rows| mean(rows.iter().filter_map(|&r| column.values[r].as_f64())))
                .collect(),
        })
        .collect();

    Resampled {
        buckets: groups.into_keys().collect(),
        series,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
