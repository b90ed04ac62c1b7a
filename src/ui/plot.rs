use chrono::{Duration, NaiveDate};
use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoint, PlotPoints};

use crate::pipeline::Stage;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Date ↔ plot coordinate
// ---------------------------------------------------------------------------

/// Plot x coordinates are days since 1970-01-01.
fn date_to_x(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::default().checked_add_signed(Duration::days(x.round() as i64))
}

fn format_x(x: f64) -> String {
    x_to_date(x).map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string())
}

/// Split a series into runs of defined values so gaps are drawn as gaps.
fn segments(x: &[f64], values: &[Option<f64>]) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (&xi, yi) in x.iter().zip(values) {
        match yi {
            Some(y) => current.push([xi, *y]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

// ---------------------------------------------------------------------------
// Time-series chart (central panel)
// ---------------------------------------------------------------------------

/// Render the chart, or the message explaining why there is none.
pub fn time_series_plot(ui: &mut Ui, state: &AppState) {
    let message = match state.stage() {
        Stage::AwaitingFile | Stage::FileLoaded => {
            Some("Load a CSV file to begin  (File → Open… or drop a file here)".to_string())
        }
        Stage::NoDateColumn => {
            Some("No chart: the file has no detectable date column.".to_string())
        }
        Stage::DateResolved => state
            .chart
            .as_ref()
            .and_then(|c| c.as_ref().err())
            .map(|e| e.to_string()),
        Stage::Rendered => None,
    };
    if let Some(message) = message {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(message);
        });
        return;
    }

    let Some(chart) = state.chart() else {
        return;
    };
    let indicator = state.controls.indicator();
    let features = state.resolved().map(|r| r.features.as_slice()).unwrap_or_default();

    ui.label(RichText::new(&chart.title).heading());

    let x: Vec<f64> = chart.x.iter().copied().map(date_to_x).collect();

    Plot::new("time_series_plot")
        .legend(Legend::default())
        .x_axis_label(chart.x_label.as_str())
        .x_axis_formatter(|mark: GridMark, _range| format_x(mark.value))
        .label_formatter(|name, value: &PlotPoint| {
            let date = format_x(value.x);
            if name.is_empty() {
                date
            } else {
                format!("{name}\n{date}\n{:.4}", value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                // Raw features use the feature colour; derived series a
                // lighter shade of their source feature's colour.
                let color = if features.contains(&series.name) {
                    state.colors.raw(&series.name)
                } else {
                    features
                        .iter()
                        .find(|f| indicator.series_name(f).as_deref() == Some(series.name.as_str()))
                        .map_or(Color32::GRAY, |f| state.colors.derived(f))
                };

                for points in segments(&x, &series.values) {
                    let line = Line::new(PlotPoints::from(points))
                        .name(&series.name)
                        .color(color)
                        .width(1.5);
                    plot_ui.line(line);
                }
            }
        });
}
