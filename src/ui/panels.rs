use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::Region;
use crate::data::selector::{cycle_hour, extract_date_key};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – datasets, legend, layer options
// ---------------------------------------------------------------------------

/// Render the left dataset panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Datasets");
    ui.label(RichText::new(state.data_dir.display().to_string()).weak());
    ui.separator();

    if state.candidates.is_empty() {
        ui.label("No datasets found.");
    } else {
        dataset_table(ui, state);
    }

    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new(RichText::new("Wind speed").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| legend(ui, state));

            egui::CollapsingHeader::new(RichText::new("Layer options").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| layer_options(ui, state));
        });
}

fn dataset_table(ui: &mut Ui, state: &mut AppState) {
    let mut clicked: Option<String> = None;

    TableBuilder::new(ui)
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::remainder())
        .column(Column::auto())
        .column(Column::auto())
        .max_scroll_height(260.0)
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("File");
            });
            header.col(|ui| {
                ui.strong("Date");
            });
            header.col(|ui| {
                ui.strong("Cycle");
            });
        })
        .body(|mut body| {
            for name in &state.candidates {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        let mut text = RichText::new(name);
                        if state.latest.as_deref() == Some(name.as_str()) {
                            text = text.strong();
                        }
                        let shown = state.shown.as_deref() == Some(name.as_str());
                        if ui.selectable_label(shown, text).clicked() {
                            clicked = Some(name.clone());
                        }
                    });
                    row.col(|ui| {
                        let date = extract_date_key(name)
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "–".to_string());
                        ui.label(date);
                    });
                    row.col(|ui| {
                        let cycle = cycle_hour(name)
                            .map(|h| format!("{h:02}z"))
                            .unwrap_or_default();
                        ui.label(cycle);
                    });
                });
            }
        });

    if let Some(name) = clicked {
        state.load_dataset(&name);
    }
}

fn legend(ui: &mut Ui, state: &AppState) {
    for (label, color) in state.color_scale.legend_entries() {
        ui.horizontal(|ui: &mut Ui| {
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
            ui.painter().rect_filled(rect, 2.0, color);
            ui.label(label);
        });
    }

    if let Some((lo, hi)) = state.field.as_ref().and_then(|f| f.speed_range()) {
        ui.add_space(4.0);
        ui.label(format!("Field range {lo:.1} – {hi:.1} m/s"));
    }
}

fn layer_options(ui: &mut Ui, state: &AppState) {
    let wind = &state.config.wind;
    let boundary = &state.config.boundary;

    egui::Grid::new("layer_options")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            let mut row = |key: &str, value: String| {
                ui.label(key);
                ui.label(value);
                ui.end_row();
            };
            row("Velocity", format!("{} – {} m/s", wind.min_velocity, wind.max_velocity));
            row("Velocity scale", wind.velocity_scale.to_string());
            row("Paths", wind.paths.to_string());
            row("Line width", wind.line_width.to_string());
            row("Opacity", wind.opacity.to_string());
            row("Global alpha", wind.global_alpha.to_string());
            row("Particle age", wind.particle_age.to_string());
            row("Max age", wind.max_age.to_string());
            row("Frame rate", wind.frame_rate.to_string());
            row("Stride", state.stride.to_string());
            row("Vectors", state.vectors.len().to_string());
            row("Boundary layer", boundary.source_layer.clone());
            row("Boundary visible", boundary.visible.to_string());
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.refresh();
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(name), Some(field)) = (&state.shown, &state.field) {
            ui.label(format!(
                "{name}  {}x{} ({} points)  {}",
                field.nx(),
                field.ny(),
                field.point_count(),
                field.reference_time().unwrap_or("")
            ));
        }

        let behind = state.latest.is_some() && state.latest != state.shown;
        if behind && ui.button("Show latest").clicked() {
            if let Some(latest) = state.latest.clone() {
                state.load_dataset(&latest);
            }
        }

        ui.separator();

        if ui.button("Reset view").clicked() {
            let map = &state.config.map;
            let region = Region::around(map.center, map.zoom);
            state.set_region(region);
            state.reset_view = true;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open wind dataset folder")
        .set_directory(&state.data_dir)
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Switching dataset directory to {}", dir.display());
        state.set_data_dir(dir);
    }
}
