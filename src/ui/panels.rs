use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::indicator::IndicatorKind;
use crate::data::resample::Frequency;
use crate::export;
use crate::pipeline::Stage;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – settings widgets
// ---------------------------------------------------------------------------

/// "rusty-trends 0.1.0", shown under the panel heading.
fn version_label() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Render the left settings panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Settings");
    ui.label(RichText::new(version_label()).small().weak());
    ui.separator();

    match state.stage() {
        Stage::AwaitingFile | Stage::FileLoaded => {
            ui.label("Load a CSV file to begin.");
            return;
        }
        Stage::NoDateColumn => {
            if let Some(Err(e)) = &state.resolved {
                ui.label(RichText::new(e.to_string()).color(Color32::RED));
            }
            return;
        }
        Stage::DateResolved | Stage::Rendered => {}
    }

    let Some(resolved) = state.resolved() else {
        return;
    };
    // Clone what we need so we can mutate state inside the closures.
    let features = resolved.features.clone();
    let bounds = resolved.bounds;
    let date_column = resolved.date_column.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(format!("Date column: {date_column}"));
            ui.separator();

            // ---- Feature multi-select ----
            let n_selected = state.controls.features.len();
            let header_text = format!("Features  ({n_selected}/{})", features.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("features")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_features();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_features();
                        }
                    });

                    for feature in &features {
                        let mut checked = state.controls.features.contains(feature);
                        let text = RichText::new(feature).color(state.colors.raw(feature));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_feature(feature);
                        }
                    }
                });
            ui.separator();

            // ---- Date range ----
            ui.strong("Date range");
            let range = state.controls.range.unwrap_or(bounds);
            let (mut start, mut end) = (range.start, range.end);
            let mut range_changed = false;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("From");
                range_changed |= ui
                    .add(DatePickerButton::new(&mut start).id_salt("range_start"))
                    .changed();
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("To");
                range_changed |= ui
                    .add(DatePickerButton::new(&mut end).id_salt("range_end"))
                    .changed();
            });
            if ui.small_button("Full range").clicked() {
                (start, end) = (bounds.start, bounds.end);
                range_changed = true;
            }
            if range_changed {
                state.set_range(start, end);
            }
            ui.separator();

            // ---- Resampling frequency ----
            ui.strong("Frequency");
            let mut frequency = state.controls.frequency;
            egui::ComboBox::from_id_salt("frequency")
                .selected_text(frequency.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for f in Frequency::ALL {
                        let text = format!("{} ({})", f.label(), f.code());
                        ui.selectable_value(&mut frequency, f, text);
                    }
                });
            if frequency != state.controls.frequency {
                state.controls.frequency = frequency;
                state.recompute();
            }
            ui.separator();

            // ---- Indicator ----
            ui.strong("Indicator");
            let mut indicator = state.controls.indicator;
            egui::ComboBox::from_id_salt("indicator")
                .selected_text(indicator.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in IndicatorKind::ALL {
                        ui.selectable_value(&mut indicator, kind, kind.label());
                    }
                });
            let mut indicator_changed = indicator != state.controls.indicator;
            state.controls.indicator = indicator;

            if indicator != IndicatorKind::None {
                let mut window = state.controls.window.get();
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("Window size");
                    ui.add(DragValue::new(&mut window).range(1..=10_000));
                });
                if let Some(w) = std::num::NonZeroUsize::new(window) {
                    if w != state.controls.window {
                        state.controls.window = w;
                        indicator_changed = true;
                    }
                }
            }
            if indicator_changed {
                state.recompute();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let has_chart = state.chart().is_some();
            if ui
                .add_enabled(has_chart, egui::Button::new("Export chart data (CSV)…"))
                .clicked()
            {
                export_dialog(state, ExportFormat::Csv);
                ui.close_menu();
            }
            if ui
                .add_enabled(has_chart, egui::Button::new("Export chart spec (JSON)…"))
                .clicked()
            {
                export_dialog(state, ExportFormat::Json);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(name), Some(ds)) = (&state.file_name, &state.dataset) {
            ui.label(format!("{name}: {} rows, {} columns", ds.len(), ds.columns.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open time-series data")
        .add_filter("Supported files", &["csv", "tsv", "txt"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("TSV", &["tsv"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

#[derive(Debug, Clone, Copy)]
enum ExportFormat {
    Csv,
    Json,
}

fn export_dialog(state: &mut AppState, format: ExportFormat) {
    let Some(chart) = state.chart() else {
        return;
    };
    let (ext, label) = match format {
        ExportFormat::Csv => ("csv", "CSV"),
        ExportFormat::Json => ("json", "JSON"),
    };
    let stem = state
        .file_name
        .as_deref()
        .and_then(|n| n.rsplit_once('.').map(|(s, _)| s))
        .unwrap_or("chart");

    let Some(path) = rfd::FileDialog::new()
        .set_title("Export chart")
        .add_filter(label, &[ext])
        .set_file_name(format!("{stem}_chart.{ext}"))
        .save_file()
    else {
        return;
    };

    let result = match format {
        ExportFormat::Csv => export::save_chart_csv(&path, chart),
        ExportFormat::Json => export::save_chart_json(&path, chart),
    };
    match result {
        Ok(()) => {
            log::info!("Exported chart to {}", path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
