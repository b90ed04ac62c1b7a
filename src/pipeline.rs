use std::num::NonZeroUsize;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::dates::detect_date_column;
use crate::data::filter::{DateRange, date_bounds, filter_by_range};
use crate::data::indicator::{Indicator, IndicatorKind, apply_indicator};
use crate::data::model::Dataset;
use crate::data::resample::{Frequency, Series, resample_mean};

/// Window size offered when an indicator is first selected.
pub const DEFAULT_WINDOW: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(w) => w,
    None => unreachable!(),
};

// ---------------------------------------------------------------------------
// Errors – every recoverable way a run can stop short of a chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Could not detect a date column. Make sure the file has one.")]
    NoDateColumn,

    #[error("Please select at least one feature to display.")]
    NoFeaturesSelected,

    #[error("No rows in the selected date range {start} – {end}.")]
    EmptySelection { start: NaiveDate, end: NaiveDate },

    #[error("The selected features hold no numeric data: {}", .0.join(", "))]
    NoNumericFeatures(Vec<String>),
}

// ---------------------------------------------------------------------------
// Controls – every user choice, passed explicitly into the pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    /// Selected features, in display order.
    pub features: Vec<String>,
    /// `None` means the full observed range.
    pub range: Option<DateRange>,
    pub frequency: Frequency,
    pub indicator: IndicatorKind,
    /// Only consulted when `indicator` is not `None`.
    pub window: NonZeroUsize,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            range: None,
            frequency: Frequency::Day,
            indicator: IndicatorKind::None,
            window: DEFAULT_WINDOW,
        }
    }
}

impl Controls {
    /// Defaults for a freshly resolved file: every feature, the whole range.
    pub fn defaults_for(resolved: &Resolved) -> Self {
        Self {
            features: resolved.features.clone(),
            range: Some(resolved.bounds),
            ..Self::default()
        }
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator.with_window(self.window)
    }
}

// ---------------------------------------------------------------------------
// Resolved – a dataset with its date axis identified
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The dataset with the date column coerced to date/time cells.
    pub dataset: Dataset,
    pub date_column: String,
    /// Every non-date column, in file order.
    pub features: Vec<String>,
    /// Observed min/max date.
    pub bounds: DateRange,
}

/// Detect the date column and gather what the controls need.
pub fn resolve(mut dataset: Dataset) -> Result<Resolved, PipelineError> {
    let date_column = detect_date_column(&mut dataset).ok_or(PipelineError::NoDateColumn)?;
    let bounds = date_bounds(&dataset, &date_column).ok_or(PipelineError::NoDateColumn)?;
    let features = dataset
        .columns
        .iter()
        .filter(|c| c.name != date_column)
        .map(|c| c.name.clone())
        .collect();

    log::debug!(
        "Resolved date column '{date_column}' spanning {} – {}",
        bounds.start,
        bounds.end
    );

    Ok(Resolved {
        dataset,
        date_column,
        features,
        bounds,
    })
}

// ---------------------------------------------------------------------------
// ChartSpec – everything the renderer needs, nothing it has to compute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    /// Name of the date column, used as the x-axis label.
    pub x_label: String,
    pub frequency: Frequency,
    /// Bucket labels, one per point.
    pub x: Vec<NaiveDate>,
    /// Raw features first, then derived indicator series.
    pub series: Vec<Series>,
}

impl ChartSpec {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Filter, resample and apply the indicator for one set of controls.
pub fn build_chart(resolved: &Resolved, controls: &Controls) -> Result<ChartSpec, PipelineError> {
    let selected: Vec<String> = controls
        .features
        .iter()
        .filter(|f| resolved.features.contains(f))
        .cloned()
        .collect();
    if selected.is_empty() {
        return Err(PipelineError::NoFeaturesSelected);
    }

    let range = controls.range.unwrap_or(resolved.bounds);
    let filtered = filter_by_range(&resolved.dataset, &resolved.date_column, &range);
    if filtered.is_empty() {
        return Err(PipelineError::EmptySelection {
            start: range.start,
            end: range.end,
        });
    }

    let mut resampled = resample_mean(&filtered, &resolved.date_column, controls.frequency);

    let (numeric, dropped): (Vec<String>, Vec<String>) = selected
        .into_iter()
        .partition(|f| resampled.series(f).is_some());
    if !dropped.is_empty() {
        log::warn!("Skipping non-numeric features: {dropped:?}");
    }
    if numeric.is_empty() {
        return Err(PipelineError::NoNumericFeatures(dropped));
    }

    let indicator = controls.indicator();
    let derived = apply_indicator(&mut resampled, &numeric, indicator);

    let x = resampled.labels();
    let series = numeric
        .iter()
        .chain(&derived)
        .filter_map(|name| resampled.series(name).cloned())
        .collect();

    log::debug!(
        "Chart: {} buckets ({}), {} raw + {} derived series",
        x.len(),
        controls.frequency.code(),
        numeric.len(),
        derived.len()
    );

    Ok(ChartSpec {
        title: format!("Time series with indicator: {indicator}"),
        x_label: resolved.date_column.clone(),
        frequency: controls.frequency,
        x,
        series,
    })
}

/// The whole pipeline as one pure function of its inputs.
pub fn run(dataset: Dataset, controls: &Controls) -> Result<ChartSpec, PipelineError> {
    let resolved = resolve(dataset)?;
    build_chart(&resolved, controls)
}

// ---------------------------------------------------------------------------
// Stage – where the orchestrator currently stands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingFile,
    FileLoaded,
    /// Date axis known, but no chart (e.g. no features selected).
    DateResolved,
    /// Terminal until another file is loaded.
    NoDateColumn,
    Rendered,
}
