use eframe::egui::{Color32, Ui};
use egui_plot::{Arrows, Plot, PlotBounds, PlotPoints};

use crate::config::Projection;
use crate::data::filter::Region;
use crate::state::AppState;

/// Web-mercator latitude limit.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// `velocityScale` at which an arrow for `maxVelocity` spans one cell.
const REFERENCE_VELOCITY_SCALE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Projection helpers
// ---------------------------------------------------------------------------

/// Latitude → plot y. Mercator y is scaled to degrees at the equator.
pub fn project_lat(lat: f64, projection: Projection) -> f64 {
    match projection {
        Projection::Equirectangular => lat,
        Projection::Mercator => {
            let phi = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
            (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln().to_degrees()
        }
    }
}

pub fn unproject_y(y: f64, projection: Projection) -> f64 {
    match projection {
        Projection::Equirectangular => y,
        Projection::Mercator => {
            (2.0 * y.to_radians().exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees()
        }
    }
}

/// Arrow offset in plot units, linear in `velocity_scale`.
fn arrow_offset(u: f64, v: f64, cell: f64, max_velocity: f64, velocity_scale: f64) -> [f64; 2] {
    let gain =
        cell / max_velocity.max(f64::EPSILON) * (velocity_scale / REFERENCE_VELOCITY_SCALE);
    [u * gain, v * gain]
}

// ---------------------------------------------------------------------------
// Wind plot (central panel)
// ---------------------------------------------------------------------------

/// Render the wind vectors in the central panel.
pub fn wind_plot(ui: &mut Ui, state: &mut AppState) {
    let Some(field) = &state.field else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No wind dataset loaded  (File → Open folder…)");
        });
        return;
    };

    let projection = state.config.map.projection;
    let wind = &state.config.wind;
    let cell = state.stride as f64 * field.header.dx.abs();

    // One arrow series per colour stop.
    let mut series: Vec<(Vec<[f64; 2]>, Vec<[f64; 2]>)> =
        vec![(Vec::new(), Vec::new()); state.color_scale.stop_count()];
    for vec in &state.vectors {
        let origin = [vec.lon, project_lat(vec.lat, projection)];
        let [dx, dy] = arrow_offset(vec.u, vec.v, cell, wind.max_velocity, wind.velocity_scale);
        let (origins, tips) = &mut series[state.color_scale.index_for(vec.speed)];
        origins.push(origin);
        tips.push([origin[0] + dx, origin[1] + dy]);
    }

    let region = state.region;
    let reset_view = std::mem::take(&mut state.reset_view);
    let background = state.config.map.style.background();
    // the plot frame is filled with extreme_bg_color
    ui.visuals_mut().extreme_bg_color = background;

    let response = Plot::new("wind_plot")
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .y_axis_formatter(move |mark, _range| {
            format!("{:.0}°", unproject_y(mark.value, projection))
        })
        .label_formatter(move |_name, point| {
            format!(
                "lon {:.2}°\nlat {:.2}°",
                point.x,
                unproject_y(point.y, projection)
            )
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if reset_view {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [region.min_lon, project_lat(region.min_lat, projection)],
                    [region.max_lon, project_lat(region.max_lat, projection)],
                ));
            }

            let legend = state.color_scale.legend_entries();
            for (i, (origins, tips)) in series.into_iter().enumerate() {
                if origins.is_empty() {
                    continue;
                }
                let color = legend.get(i).map(|(_, c)| *c).unwrap_or(Color32::LIGHT_BLUE);
                let name = legend.get(i).map(|(l, _)| l.clone()).unwrap_or_default();
                plot_ui.arrows(
                    Arrows::new(PlotPoints::from(origins), PlotPoints::from(tips))
                        .color(color)
                        .name(name)
                        .tip_length(4.0),
                );
            }

            plot_ui.plot_bounds()
        });

    let bounds = response.inner;
    let visible = Region {
        min_lon: bounds.min()[0].max(Region::WORLD.min_lon),
        max_lon: bounds.max()[0].min(Region::WORLD.max_lon),
        min_lat: unproject_y(bounds.min()[1], projection).max(Region::WORLD.min_lat),
        max_lat: unproject_y(bounds.max()[1], projection).min(Region::WORLD.max_lat),
    };
    if !reset_view && region_moved(&region, &visible) {
        state.set_region(visible);
    }
}

fn region_moved(a: &Region, b: &Region) -> bool {
    const EPS: f64 = 1e-6;
    (a.min_lon - b.min_lon).abs() > EPS
        || (a.max_lon - b.max_lon).abs() > EPS
        || (a.min_lat - b.min_lat).abs() > EPS
        || (a.max_lat - b.max_lat).abs() > EPS
}
