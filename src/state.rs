use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::color::SeriesColors;
use crate::data::filter::DateRange;
use crate::data::loader;
use crate::data::model::Dataset;
use crate::pipeline::{self, ChartSpec, Controls, PipelineError, Resolved, Stage};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Name of the loaded file.
    pub file_name: Option<String>,

    /// The dataset as loaded, before date detection (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Outcome of date detection for the current dataset.
    pub resolved: Option<Result<Resolved, PipelineError>>,

    /// Current widget values.
    pub controls: Controls,

    /// Outcome of the last full pipeline run.
    pub chart: Option<Result<ChartSpec, PipelineError>>,

    /// Colours per feature of the loaded file.
    pub colors: SeriesColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Where the pipeline currently stands.
    pub fn stage(&self) -> Stage {
        match (&self.dataset, &self.resolved, &self.chart) {
            (None, _, _) => Stage::AwaitingFile,
            (Some(_), None, _) => Stage::FileLoaded,
            (Some(_), Some(Err(_)), _) => Stage::NoDateColumn,
            (Some(_), Some(Ok(_)), Some(Ok(_))) => Stage::Rendered,
            (Some(_), Some(Ok(_)), _) => Stage::DateResolved,
        }
    }

    pub fn resolved(&self) -> Option<&Resolved> {
        self.resolved.as_ref().and_then(|r| r.as_ref().ok())
    }

    /// Load a file from disk and ingest it; errors end up in `status_message`.
    pub fn load_path(&mut self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest(name, loader::load_file(path));
    }

    /// Load a file handed over as raw bytes (drag-and-drop without a path).
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) {
        self.ingest(name.to_string(), loader::load_bytes(name, bytes));
    }

    fn ingest(&mut self, name: String, loaded: Result<Dataset>) {
        match loaded {
            Ok(dataset) => {
                log::info!(
                    "Loaded {name}: {} rows with columns {:?}",
                    dataset.len(),
                    dataset.column_names()
                );
                self.set_dataset(name, dataset);
            }
            Err(e) => {
                log::error!("Failed to load {name}: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset: reset controls to their defaults and
    /// run the pipeline once.
    pub fn set_dataset(&mut self, name: String, dataset: Dataset) {
        self.file_name = Some(name);
        self.dataset = Some(dataset);
        self.resolved = None;
        self.chart = None;
        self.status_message = None;

        self.recompute();

        match &self.resolved {
            Some(Ok(resolved)) => {
                self.controls = Controls::defaults_for(resolved);
                self.colors = SeriesColors::new(&resolved.features);
                self.recompute();
            }
            Some(Err(e)) => {
                log::warn!("{e}");
                self.controls = Controls::default();
                self.colors = SeriesColors::default();
            }
            None => {}
        }
    }

    /// Re-run the whole pipeline from the loaded dataset with the current
    /// controls.
    pub fn recompute(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.resolved = None;
            self.chart = None;
            return;
        };

        let resolved = pipeline::resolve(dataset.clone());
        self.chart = match &resolved {
            Ok(r) => Some(pipeline::build_chart(r, &self.controls)),
            Err(_) => None,
        };
        self.resolved = Some(resolved);
    }

    /// Toggle a single feature, keeping the file's column order.
    pub fn toggle_feature(&mut self, feature: &str) {
        let Some(resolved) = self.resolved() else {
            return;
        };
        let mut selected = self.controls.features.clone();
        if let Some(pos) = selected.iter().position(|f| f == feature) {
            selected.remove(pos);
        } else {
            selected.push(feature.to_string());
        }
        self.controls.features = resolved
            .features
            .iter()
            .filter(|f| selected.contains(f))
            .cloned()
            .collect();
        self.recompute();
    }

    /// Select every feature.
    pub fn select_all_features(&mut self) {
        if let Some(resolved) = self.resolved() {
            self.controls.features = resolved.features.clone();
            self.recompute();
        }
    }

    /// Deselect every feature.
    pub fn select_no_features(&mut self) {
        self.controls.features.clear();
        self.recompute();
    }

    /// Set the date window, clamped into the observed bounds.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) {
        let Some(bounds) = self.resolved().map(|r| r.bounds) else {
            return;
        };
        let range = DateRange::new(start, end).clamp_to(bounds);
        if !range.is_valid() {
            log::warn!("Start date {} is after end date {}", range.start, range.end);
        }
        self.controls.range = Some(range);
        self.recompute();
    }

    /// The chart to draw, if the last run produced one.
    pub fn chart(&self) -> Option<&ChartSpec> {
        self.chart.as_ref().and_then(|c| c.as_ref().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::indicator::IndicatorKind;
    use crate::data::resample::Frequency;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn load(state: &mut AppState, text: &str) {
        state.load_bytes("upload.csv", text.as_bytes());
    }

    const TWO_FEATURES: &str = "date,a,b\n2024-01-01,1,10\n2024-01-02,2,20\n2024-01-03,3,30\n";

    #[test]
    fn starts_awaiting_a_file() {
        let state = AppState::default();
        assert_eq!(state.stage(), Stage::AwaitingFile);
        assert!(state.chart().is_none());
    }

    #[test]
    fn loading_a_dated_file_renders_with_defaults() {
        let mut state = AppState::default();
        load(&mut state, TWO_FEATURES);

        assert_eq!(state.stage(), Stage::Rendered);
        assert_eq!(state.file_name.as_deref(), Some("upload.csv"));
        assert_eq!(state.controls.features, vec!["a", "b"]);
        assert_eq!(state.controls.range, Some(DateRange::new(d(2024, 1, 1), d(2024, 1, 3))));
        assert_eq!(state.controls.frequency, Frequency::Day);
        assert_eq!(state.controls.indicator, IndicatorKind::None);
        assert_eq!(state.controls.window.get(), 5);
        assert_eq!(state.chart().unwrap().series.len(), 2);
    }

    #[test]
    fn numeric_only_file_halts_without_a_chart() {
        let mut state = AppState::default();
        load(&mut state, "a,b\n1,2\n3,4\n");

        assert_eq!(state.stage(), Stage::NoDateColumn);
        assert!(state.chart.is_none());
        assert_eq!(
            state.resolved.as_ref().unwrap().as_ref().unwrap_err(),
            &PipelineError::NoDateColumn
        );
    }

    #[test]
    fn deselecting_everything_stays_date_resolved() {
        let mut state = AppState::default();
        load(&mut state, TWO_FEATURES);

        state.select_no_features();
        assert_eq!(state.stage(), Stage::DateResolved);
        assert_eq!(
            state.chart.as_ref().unwrap().as_ref().unwrap_err(),
            &PipelineError::NoFeaturesSelected
        );

        state.toggle_feature("b");
        state.toggle_feature("a");
        assert_eq!(state.controls.features, vec!["a", "b"]);
        assert_eq!(state.stage(), Stage::Rendered);

        state.toggle_feature("a");
        assert_eq!(state.controls.features, vec!["b"]);
    }

    #[test]
    fn range_is_clamped_to_observed_bounds() {
        let mut state = AppState::default();
        load(&mut state, TWO_FEATURES);

        state.set_range(d(2023, 1, 1), d(2024, 1, 2));
        assert_eq!(state.controls.range, Some(DateRange::new(d(2024, 1, 1), d(2024, 1, 2))));
        assert_eq!(state.chart().unwrap().x.len(), 2);

        state.set_range(d(2024, 1, 3), d(2024, 1, 1));
        assert!(matches!(
            state.chart,
            Some(Err(PipelineError::EmptySelection { .. }))
        ));
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = AppState::default();
        load(&mut state, TWO_FEATURES);
        state.load_bytes("broken.csv", b"a,b\n1,2\n3\n");

        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
        assert_eq!(state.file_name.as_deref(), Some("upload.csv"));
        assert_eq!(state.stage(), Stage::Rendered);
    }

    #[test]
    fn new_upload_resets_controls() {
        let mut state = AppState::default();
        load(&mut state, TWO_FEATURES);
        state.controls.indicator = IndicatorKind::Ema;
        state.select_no_features();

        load(&mut state, "when,x\n2024-05-01,1\n");
        assert_eq!(state.controls.features, vec!["x"]);
        assert_eq!(state.controls.indicator, IndicatorKind::None);
        assert_eq!(state.stage(), Stage::Rendered);
    }
}
