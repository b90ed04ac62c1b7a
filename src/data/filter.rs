use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::model::Dataset;

// ---------------------------------------------------------------------------
// DateRange – inclusive calendar window
// ---------------------------------------------------------------------------

/// Inclusive window of calendar dates. Rows are compared by the date part of
/// their timestamp, so `end` covers the whole of its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// `start <= end`. An invalid range selects nothing.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamp both ends into `bounds`, keeping their order as given.
    pub fn clamp_to(self, bounds: DateRange) -> DateRange {
        DateRange {
            start: self.start.clamp(bounds.start, bounds.end),
            end: self.end.clamp(bounds.start, bounds.end),
        }
    }
}

/// Observed min/max calendar date of a date column, `None` when the column is
/// missing or holds no dates.
pub fn date_bounds(dataset: &Dataset, date_column: &str) -> Option<DateRange> {
    let column = dataset.column(date_column)?;
    let mut dates = column
        .values
        .iter()
        .filter_map(|v| v.as_datetime())
        .map(|dt| dt.date());

    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(DateRange { start, end })
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Return indices of rows whose date lies inside `range`.
///
/// Rows without a date value never pass. An invalid range yields no rows.
pub fn filtered_indices(dataset: &Dataset, date_column: &str, range: &DateRange) -> Vec<usize> {
    if !range.is_valid() {
        log::warn!(
            "Date range start {} is after end {}; nothing selected",
            range.start,
            range.end
        );
        return Vec::new();
    }

    let Some(column) = dataset.column(date_column) else {
        return Vec::new();
    };

    column
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.as_datetime().is_some_and(|dt| range.contains(dt.date())))
        .map(|(i, _)| i)
        .collect()
}

/// New dataset holding the rows inside `range`; the input is left untouched.
pub fn filter_by_range(dataset: &Dataset, date_column: &str, range: &DateRange) -> Dataset {
    let rows = filtered_indices(dataset, date_column, range);
    log::debug!(
        "Range {}..={} keeps {} of {} rows",
        range.start,
        range.end,
        rows.len(),
        dataset.len()
    );
    dataset.take_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Column};
    use chrono::NaiveTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(n: u32) -> Dataset {
        let dates = (1..=n)
            .map(|i| CellValue::DateTime(d(2024, 1, i).and_hms_opt(12, 30, 0).unwrap()))
            .collect();
        let values = (1..=n).map(|i| CellValue::Number(i as f64)).collect();
        Dataset::from_columns(vec![Column::new("date", dates), Column::new("value", values)])
    }

    #[test]
    fn keeps_exactly_the_rows_inside_the_window() {
        let ds = daily(10);
        let range = DateRange::new(d(2024, 1, 3), d(2024, 1, 6));
        let out = filter_by_range(&ds, "date", &range);

        assert_eq!(out.len(), 4);
        for v in &out.columns[0].values {
            assert!(range.contains(v.as_datetime().unwrap().date()));
        }
        let kept: Vec<f64> = out.columns[1].values.iter().filter_map(|v| v.as_f64()).collect();
        assert_eq!(kept, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn end_day_includes_times_after_midnight() {
        let ds = daily(3);
        let out = filter_by_range(&ds, "date", &DateRange::new(d(2024, 1, 3), d(2024, 1, 3)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn inverted_range_selects_nothing() {
        let ds = daily(5);
        let range = DateRange::new(d(2024, 1, 4), d(2024, 1, 2));
        assert!(!range.is_valid());
        assert!(filter_by_range(&ds, "date", &range).is_empty());
        // Input untouched.
        assert_eq!(ds.len(), 5);
    }

    #[test]
    fn bounds_and_clamping() {
        let ds = daily(5);
        let bounds = date_bounds(&ds, "date").unwrap();
        assert_eq!(bounds, DateRange::new(d(2024, 1, 1), d(2024, 1, 5)));

        let wide = DateRange::new(d(2023, 12, 1), d(2024, 2, 1)).clamp_to(bounds);
        assert_eq!(wide, bounds);

        assert!(date_bounds(&ds, "value").is_none());
        assert!(date_bounds(&ds, "missing").is_none());
    }

    #[test]
    fn midnight_rows_on_both_edges_are_kept() {
        let dates = vec![
            CellValue::DateTime(d(2024, 1, 1).and_time(NaiveTime::MIN)),
            CellValue::DateTime(d(2024, 1, 2).and_time(NaiveTime::MIN)),
            CellValue::DateTime(d(2024, 1, 3).and_time(NaiveTime::MIN)),
        ];
        let ds = Dataset::from_columns(vec![Column::new("date", dates)]);
        let out = filtered_indices(&ds, "date", &DateRange::new(d(2024, 1, 1), d(2024, 1, 2)));
        assert_eq!(out, vec![0, 1]);
    }
}
