//! Full-screen loading overlay.
//!
//! Every asset the scene waits on is registered with [`TrackedAssets`]. Each
//! frame their load states are folded into a single [`LoadSignal`] that drives
//! the overlay machine. Failed assets count as settled so a missing texture
//! never leaves the overlay up forever.

use bevy::{
    asset::{LoadState, UntypedHandle},
    camera::Exposure,
    prelude::*,
    window::PrimaryWindow,
};
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};
use globe_anim::{
    ExposureRamp, FrameClock, LoadSignal, OverlayConfig, OverlayFrame, OverlayPhaseMachine,
};
use glam::Vec2;

use crate::{launch_params::LaunchParams, paint};

/// Scene exposure while the overlay is opaque, relative to the final exposure.
const EXPOSURE_WHILE_LOADING: f32 = 0.35;
/// Guards the log2 in the exposure conversion.
const MIN_EXPOSURE: f32 = 1e-3;
/// Gap between the progress bar and the labels around it.
const LABEL_GAP: f32 = 10.0;

pub struct LoadingOverlayPlugin;

impl Plugin for LoadingOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrackedAssets>()
            .add_systems(Startup, setup_overlay)
            .add_systems(
                Update,
                advance_overlay.run_if(resource_exists::<LoadingOverlay>),
            )
            .add_systems(
                EguiPrimaryContextPass,
                draw_overlay.run_if(resource_exists::<LoadingOverlay>),
            );
    }
}

struct TrackedAsset {
    label: String,
    handle: UntypedHandle,
    settled: bool,
}

/// Assets the loading overlay waits for.
#[derive(Resource, Default)]
pub struct TrackedAssets {
    entries: Vec<TrackedAsset>,
}

impl TrackedAssets {
    pub fn track(&mut self, label: impl Into<String>, handle: impl Into<UntypedHandle>) {
        self.entries.push(TrackedAsset {
            label: label.into(),
            handle: handle.into(),
            settled: false,
        });
    }

    /// Refreshes load states and reports overall progress.
    pub fn poll(&mut self, asset_server: &AssetServer) -> LoadSignal {
        for entry in self.entries.iter_mut().filter(|entry| !entry.settled) {
            match asset_server.load_state(entry.handle.id()) {
                LoadState::Loaded => {
                    tracing::debug!("Loaded {}", entry.label);
                    entry.settled = true;
                }
                LoadState::Failed(err) => {
                    tracing::warn!("Failed to load {}: {err}", entry.label);
                    entry.settled = true;
                }
                _ => {}
            }
        }

        let settled = self.entries.iter().filter(|entry| entry.settled).count();
        load_signal(settled, self.entries.len())
    }
}

/// Folds settled/total counts into a load signal.
#[allow(clippy::cast_precision_loss)]
pub fn load_signal(settled: usize, total: usize) -> LoadSignal {
    if settled >= total {
        LoadSignal::idle()
    } else {
        LoadSignal::loading(settled as f32 / total as f32 * 100.0)
    }
}

/// The overlay machine and its most recent frame.
///
/// Removed from the world once the overlay finishes, unless it is configured
/// to stay mounted.
#[derive(Resource)]
pub struct LoadingOverlay {
    machine: OverlayPhaseMachine<FrameClock>,
    frame: OverlayFrame,
}

impl LoadingOverlay {
    pub fn new(config: OverlayConfig) -> Self {
        let machine = OverlayPhaseMachine::new(config, FrameClock::new());
        let frame = machine.snapshot();
        Self { machine, frame }
    }

    /// Whether the overlay currently hides the scene.
    pub fn blocks_input(&self) -> bool {
        self.frame.phase.is_opaque()
    }
}

/// Camera ev100 for a linear exposure multiplier.
fn ev100_for(exposure: f32) -> f32 {
    Exposure::default().ev100 - exposure.max(MIN_EXPOSURE).log2()
}

fn setup_overlay(mut commands: Commands, params: Res<LaunchParams>) {
    let config = OverlayConfig {
        delay: params.overlay_delay,
        fade_duration: params.fade_duration,
        unmount_on_end: !params.keep_overlay,
        exposure: Some(ExposureRamp {
            from: EXPOSURE_WHILE_LOADING,
            to: 1.0,
        }),
        ..default()
    };
    commands.insert_resource(LoadingOverlay::new(config));
}

fn advance_overlay(
    mut commands: Commands,
    time: Res<Time>,
    asset_server: Res<AssetServer>,
    mut tracked: ResMut<TrackedAssets>,
    mut overlay: ResMut<LoadingOverlay>,
    mut exposures: Query<&mut Exposure>,
) {
    let signal = tracked.poll(&asset_server);

    let overlay = &mut *overlay;
    overlay.machine.clock_mut().tick(time.delta_secs());
    let frame = overlay.machine.update(signal);
    overlay.frame = frame;

    if let Some(exposure) = frame.exposure {
        for mut camera_exposure in &mut exposures {
            camera_exposure.ev100 = ev100_for(exposure);
        }
    }

    if frame.finished && !frame.mounted {
        commands.remove_resource::<LoadingOverlay>();
    }
}

fn draw_overlay(
    mut contexts: EguiContexts,
    overlay: Res<LoadingOverlay>,
    window_query: Query<&Window, With<PrimaryWindow>>,
) -> Result {
    let frame = overlay.frame;
    if frame.phase == globe_anim::OverlayPhase::Done {
        return Ok(());
    }

    let window = window_query.single()?;
    let ctx = contexts.ctx_mut()?;
    let config = overlay.machine.config();
    let alpha = frame.alpha;

    let screen = egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(window.width(), window.height()),
    );
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("loading_overlay"),
    ));

    painter.rect_filled(screen, 0.0, paint::color32(config.color, alpha));

    let bar_size = config.bar_size.max(Vec2::ZERO);
    let track = egui::Rect::from_center_size(screen.center(), paint::vec2(bar_size));
    let rounding = bar_size.y / 2.0;
    painter.rect_filled(track, rounding, paint::color32(config.bar_track_color, alpha));

    let fill = egui::Rect::from_min_size(
        track.min,
        egui::vec2(track.width() * frame.display_progress, track.height()),
    );
    painter.rect_filled(fill, rounding, paint::color32(config.bar_color, alpha));

    painter.text(
        track.center_top() - egui::vec2(0.0, LABEL_GAP),
        egui::Align2::CENTER_BOTTOM,
        "Loading",
        egui::FontId::proportional(15.0),
        paint::color32(config.bar_color, alpha),
    );

    if let Some(percent) = frame.percent {
        painter.text(
            track.center_bottom() + egui::vec2(0.0, LABEL_GAP),
            egui::Align2::CENTER_TOP,
            format!("{percent}%"),
            egui::FontId::monospace(12.0),
            paint::color32(config.bar_color, alpha * 0.8),
        );
    }

    Ok(())
}
