use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::ChartSpec;

// ---------------------------------------------------------------------------
// Chart export
// ---------------------------------------------------------------------------

/// Write the plotted data as CSV: the date column, then one column per series.
/// Undefined values are written as empty cells.
pub fn write_chart_csv<W: Write>(chart: &ChartSpec, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec![chart.x_label.as_str()];
    header.extend(chart.series.iter().map(|s| s.name.as_str()));
    out.write_record(&header).context("writing CSV header")?;

    for (i, date) in chart.x.iter().enumerate() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(chart.series.iter().map(|s| {
            s.values
                .get(i)
                .copied()
                .flatten()
                .map_or_else(String::new, |v| v.to_string())
        }));
        out.write_record(&record)
            .with_context(|| format!("writing CSV row {i}"))?;
    }

    out.flush().context("flushing CSV")?;
    Ok(())
}

pub fn save_chart_csv(path: &Path, chart: &ChartSpec) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_chart_csv(chart, file)
}

pub fn save_chart_json(path: &Path, chart: &ChartSpec) -> Result<()> {
    let json = chart.to_json().context("serializing chart")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::resample::{Frequency, Series};
    use chrono::NaiveDate;

    fn chart() -> ChartSpec {
        ChartSpec {
            title: "Time series with indicator: Simple moving average (SMA)".into(),
            x_label: "date".into(),
            frequency: Frequency::Day,
            x: vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ],
            series: vec![
                Series { name: "value".into(), values: vec![Some(1.0), Some(2.5)] },
                Series { name: "SMA_2_value".into(), values: vec![None, Some(1.75)] },
            ],
        }
    }

    #[test]
    fn csv_has_date_column_and_blank_undefined_cells() {
        let mut buf = Vec::new();
        write_chart_csv(&chart(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "date,value,SMA_2_value\n2024-01-01,1,\n2024-01-02,2.5,1.75\n"
        );
    }

    #[test]
    fn json_spells_out_undefined_values_as_null() {
        let json = chart().to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["x"][0], "2024-01-01");
        assert_eq!(parsed["frequency"], "Day");
        assert!(parsed["series"][1]["values"][0].is_null());
        assert_eq!(parsed["series"][1]["values"][1], 1.75);
    }
}
