use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Date/time string parsing
// ---------------------------------------------------------------------------

/// Date-time layouts tried in order; `%.f` also accepts "no fraction".
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y.%m.%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
];

/// Date-only layouts. `%b` only takes abbreviated month names, `%B` full ones.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Parse a textual date or date-time.
///
/// Offsets are normalised to UTC. Bare numbers are never treated as dates,
/// so a numeric column can not shadow the real date column.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() || s.parse::<f64>().is_ok() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }

    // Year-month only, e.g. "2024-03" → first day of the month.
    if s.len() != 7 || s.as_bytes()[4] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn cell_as_datetime(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(d) => Some(*d),
        CellValue::Text(s) => parse_datetime(s),
        CellValue::Number(_) | CellValue::Null => None,
    }
}

// ---------------------------------------------------------------------------
// Date column detection
// ---------------------------------------------------------------------------

/// Find the leftmost column whose every cell parses as a date/time, coerce it
/// in place to [`CellValue::DateTime`] and return its name.
///
/// A single unparseable or empty cell disqualifies a column. A dataset with
/// no rows has no date column.
pub fn detect_date_column(dataset: &mut Dataset) -> Option<String> {
    if dataset.is_empty() {
        return None;
    }

    for column in &mut dataset.columns {
        let parsed: Option<Vec<NaiveDateTime>> =
            column.values.iter().map(cell_as_datetime).collect();

        if let Some(parsed) = parsed {
            log::debug!("Detected date column '{}'", column.name);
            column.values = parsed.into_iter().map(CellValue::DateTime).collect();
            return Some(column.name.clone());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_csv_reader;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn parses_common_layouts() {
        assert_eq!(parse_datetime("2024-01-05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_datetime("2024/01/05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_datetime("01/05/2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_datetime("05.01.2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_datetime("5 Jan 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_datetime("January 5, 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_datetime("2024-01"), Some(ymd(2024, 1, 1)));

        let with_time = parse_datetime("2024-01-05 13:45:10").unwrap();
        assert_eq!(with_time.format("%H:%M:%S").to_string(), "13:45:10");

        let fractional = parse_datetime("2024-01-05T13:45:10.250").unwrap();
        assert_eq!(fractional.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn parses_full_month_names() {
        assert_eq!(parse_datetime("05 January 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_datetime("September 30, 2023"), Some(ymd(2023, 9, 30)));
        assert_eq!(parse_datetime("March 1 2024"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_datetime("Mar 1 2024"), Some(ymd(2024, 3, 1)));

        let with_time = parse_datetime("5 March 2024 14:30").unwrap();
        assert_eq!(with_time, ymd(2024, 3, 5) + chrono::Duration::minutes(14 * 60 + 30));
        let dotted = parse_datetime("2024.03.05 14:30").unwrap();
        assert_eq!(dotted, with_time);
        let with_seconds = parse_datetime("Jan 5, 2024 08:00:15").unwrap();
        assert_eq!(with_seconds.format("%H:%M:%S").to_string(), "08:00:15");
    }

    #[test]
    fn spelled_out_dates_are_detected_as_the_date_column() {
        let text = "day;v\n04 January 2024;1\n05 January 2024;2\n";
        let mut ds = load_csv_reader(text.as_bytes(), b';').unwrap();
        assert_eq!(detect_date_column(&mut ds).as_deref(), Some("day"));
        assert_eq!(ds.columns[0].values[1], CellValue::DateTime(ymd(2024, 1, 5)));
    }

    #[test]
    fn offsets_are_normalised_to_utc() {
        let dt = parse_datetime("2024-01-05T02:00:00+03:00").unwrap();
        assert_eq!(dt, ymd(2024, 1, 4) + chrono::Duration::hours(23));
    }

    #[test]
    fn rejects_numbers_and_garbage() {
        assert_eq!(parse_datetime("20240105"), None);
        assert_eq!(parse_datetime("42"), None);
        assert_eq!(parse_datetime("1.5"), None);
        assert_eq!(parse_datetime("north"), None);
        assert_eq!(parse_datetime("2024-13-01"), None);
        assert_eq!(parse_datetime("1-2"), None);
        assert_eq!(parse_datetime(""), None);
    }

    #[test]
    fn picks_leftmost_date_column_and_coerces_it() {
        let text = "id,first,second,value\n\
                    a,2024-01-01,2023-05-05,1\n\
                    b,2024-01-02,2023-05-06,2\n";
        let mut ds = load_csv_reader(text.as_bytes(), b',').unwrap();

        assert_eq!(detect_date_column(&mut ds).as_deref(), Some("first"));
        assert_eq!(ds.columns[1].values[1], CellValue::DateTime(ymd(2024, 1, 2)));
        // The other candidate is left untouched.
        assert_eq!(ds.columns[2].values[0], CellValue::Text("2023-05-05".into()));
    }

    #[test]
    fn one_bad_cell_disqualifies_a_column() {
        let text = "maybe,date,v\n2024-01-01,2024-01-01,1\nsoon,2024-01-02,2\n";
        let mut ds = load_csv_reader(text.as_bytes(), b',').unwrap();
        assert_eq!(detect_date_column(&mut ds).as_deref(), Some("date"));
    }

    #[test]
    fn empty_cells_disqualify_a_column() {
        let text = "blank,date\n,2024-01-01\n,2024-01-02\n";
        let mut ds = load_csv_reader(text.as_bytes(), b',').unwrap();
        assert_eq!(detect_date_column(&mut ds).as_deref(), Some("date"));

        let text = "date,v\n2024-01-01,1\n,2\n";
        let mut ds = load_csv_reader(text.as_bytes(), b',').unwrap();
        assert_eq!(detect_date_column(&mut ds), None);
    }

    #[test]
    fn numeric_only_table_has_no_date_column() {
        let text = "a,b\n1,10\n2,20\n3,30\n";
        let mut ds = load_csv_reader(text.as_bytes(), b',').unwrap();
        let before = ds.clone();
        assert_eq!(detect_date_column(&mut ds), None);
        assert_eq!(ds, before);
    }

    #[test]
    fn detection_is_stable_on_an_already_coerced_table() {
        let text = "date,v\n2024-01-01,1\n";
        let mut ds = load_csv_reader(text.as_bytes(), b',').unwrap();
        detect_date_column(&mut ds);
        let once = ds.clone();
        assert_eq!(detect_date_column(&mut ds).as_deref(), Some("date"));
        assert_eq!(ds, once);
    }
}
