//! Annotated 3D globe.
//!
//! Shows a textured, sunlit globe behind a loading overlay that fades out
//! once its assets are in. Landmarks are pinned to the surface with callouts
//! that open on hover to show a picture.

mod callouts;
mod camera;
mod globe;
mod landmarks;
mod launch_params;
mod loading;
mod paint;
mod time_of_day;

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use callouts::CalloutPlugin;
use camera::OrbitCameraPlugin;
use globe::GlobePlugin;
use loading::LoadingOverlayPlugin;
use time_of_day::TimeOfDayPlugin;

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::srgb(0.01, 0.01, 0.02)))
            .add_plugins(EguiPlugin::default())
            .add_plugins((
                LoadingOverlayPlugin,
                GlobePlugin,
                OrbitCameraPlugin,
                TimeOfDayPlugin,
                CalloutPlugin,
            ))
            .add_systems(Startup, log_controls);
    }
}

fn log_controls() {
    tracing::info!("Scene setup complete - drag to rotate, scroll to zoom, hover a callout to open it");
}

fn main() {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = launch_params::parse();
    tracing::info!(
        "Annotating {} landmarks (overlay delay {}s, fade {}s)",
        params.landmarks.len(),
        params.overlay_delay,
        params.fade_duration
    );

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "globe-viewer".to_string(),
        resolution: (1600, 900).into(),
        position: WindowPosition::Centered(MonitorSelection::Primary),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }));

    app.insert_resource(params).add_plugins(AppPlugin).run();
}
