//! Orbit camera around the globe.
//!
//! Dragging with the left mouse button rotates the view, the wheel zooms. The
//! camera drifts slowly westward when left alone. Both position and zoom are
//! damped so input never produces a visible jump.

use bevy::{
    camera::Exposure,
    core_pipeline::tonemapping::Tonemapping,
    input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
};
use globe_anim::{Damped, GeoCoordinate, project};

use crate::{globe::GLOBE_RADIUS, loading::LoadingOverlay};

/// Degrees of rotation per pixel of mouse drag.
const DRAG_SENSITIVITY: f32 = 0.25;
/// Latitude limit that keeps the camera off the poles.
const MAX_LATITUDE: f32 = 80.0;
/// Idle drift in degrees of longitude per second.
const DRIFT_SPEED: f32 = 2.0;
/// Seconds without input before the idle drift starts.
const DRIFT_DELAY: f32 = 4.0;
/// Zoom factor per wheel line.
const ZOOM_STEP: f32 = 1.12;
/// Pixels of trackpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;
const MIN_DISTANCE: f32 = GLOBE_RADIUS * 1.3;
const MAX_DISTANCE: f32 = GLOBE_RADIUS * 6.0;
/// Rate constants for the orbit and zoom smoothing.
const ORBIT_RATE: f32 = 10.0;
const ZOOM_RATE: f32 = 8.0;

/// Starting view: over the Atlantic, facing the Americas and Europe.
const START_VIEW: GeoCoordinate = GeoCoordinate::new(20.0, -40.0);
const START_DISTANCE: f32 = GLOBE_RADIUS * 3.2;

pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, (orbit_input, apply_orbit).chain());
    }
}

/// Orbit state, as the latitude/longitude the camera hovers over.
#[derive(Component, Debug)]
pub struct OrbitCamera {
    /// (latitude, longitude) in degrees.
    view: Damped<Vec2>,
    distance: Damped<f32>,
    idle_time: f32,
}

impl Default for OrbitCamera {
    #[allow(clippy::cast_possible_truncation)]
    fn default() -> Self {
        let view = Vec2::new(START_VIEW.latitude as f32, START_VIEW.longitude as f32);
        Self {
            view: Damped::new(view, ORBIT_RATE),
            distance: Damped::new(START_DISTANCE, ZOOM_RATE),
            idle_time: 0.0,
        }
    }
}

impl OrbitCamera {
    /// Rotates by a drag of `delta` logical pixels.
    pub fn drag(&mut self, delta: Vec2) {
        let mut target = self.view.target();
        target.x = (target.x + delta.y * DRAG_SENSITIVITY).clamp(-MAX_LATITUDE, MAX_LATITUDE);
        target.y -= delta.x * DRAG_SENSITIVITY;
        self.view.set_target(target);
        self.idle_time = 0.0;
    }

    /// Zooms by `lines` wheel lines; positive zooms in.
    pub fn zoom(&mut self, lines: f32) {
        let distance = self.distance.target() * ZOOM_STEP.powf(-lines);
        self.distance
            .set_target(distance.clamp(MIN_DISTANCE, MAX_DISTANCE));
        self.idle_time = 0.0;
    }

    /// Advances the smoothing and idle drift by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.idle_time += dt;
        if self.idle_time > DRIFT_DELAY {
            let mut target = self.view.target();
            target.y -= DRIFT_SPEED * dt;
            self.view.set_target(target);
        }
        self.view.tick(dt);
        self.distance.tick(dt);
    }

    /// World-space camera position.
    pub fn position(&self) -> Vec3 {
        let view = self.view.value();
        project(
            f64::from(view.x),
            f64::from(view.y),
            f64::from(self.distance.value()),
            0.0,
        )
        .as_vec3()
    }
}

fn spawn_camera(mut commands: Commands) {
    let orbit = OrbitCamera::default();
    commands.spawn((
        Camera3d::default(),
        Camera::default(),
        Transform::from_translation(orbit.position()).looking_at(Vec3::ZERO, Vec3::Y),
        Projection::Perspective(PerspectiveProjection {
            fov: std::f32::consts::FRAC_PI_4,
            near: 0.01,
            far: 100.0,
            ..Default::default()
        }),
        Tonemapping::AcesFitted,
        // Driven by the loading overlay until it finishes.
        Exposure::default(),
        orbit,
    ));
}

fn orbit_input(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    overlay: Option<Res<LoadingOverlay>>,
    mut camera_query: Query<&mut OrbitCamera>,
) {
    if overlay.is_some_and(|overlay| overlay.blocks_input()) {
        return;
    }
    let Ok(mut orbit) = camera_query.single_mut() else {
        return;
    };

    if buttons.pressed(MouseButton::Left) && motion.delta != Vec2::ZERO {
        orbit.drag(motion.delta);
    }

    if scroll.delta.y != 0.0 {
        let lines = match scroll.unit {
            MouseScrollUnit::Line => scroll.delta.y,
            MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
        };
        orbit.zoom(lines);
    }
}

fn apply_orbit(time: Res<Time>, mut camera_query: Query<(&mut OrbitCamera, &mut Transform)>) {
    let Ok((mut orbit, mut transform)) = camera_query.single_mut() else {
        return;
    };
    orbit.tick(time.delta_secs());
    *transform = Transform::from_translation(orbit.position()).looking_at(Vec3::ZERO, Vec3::Y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_on_orbit() {
        let orbit = OrbitCamera::default();
        assert!((orbit.position().length() - START_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut orbit = OrbitCamera::default();
        for _ in 0..100 {
            orbit.zoom(1.0);
        }
        for _ in 0..600 {
            orbit.tick(1.0 / 60.0);
        }
        assert!((orbit.distance.value() - MIN_DISTANCE).abs() < 1e-3);

        for _ in 0..100 {
            orbit.zoom(-1.0);
        }
        for _ in 0..600 {
            orbit.tick(1.0 / 60.0);
        }
        assert!((orbit.distance.value() - MAX_DISTANCE).abs() < 1e-3);
    }

    #[test]
    fn test_drag_clamps_latitude() {
        let mut orbit = OrbitCamera::default();
        orbit.drag(Vec2::new(0.0, 10_000.0));
        for _ in 0..120 {
            orbit.tick(1.0 / 60.0);
        }
        let position = orbit.position();
        let latitude = (position.y / position.length()).asin().to_degrees();
        assert!((latitude - MAX_LATITUDE).abs() < 0.01, "{latitude}");
    }

    #[test]
    fn test_idle_drift_waits() {
        let mut orbit = OrbitCamera::default();
        let start = orbit.view.target();
        orbit.tick(DRIFT_DELAY * 0.5);
        assert_eq!(orbit.view.target(), start);
        orbit.tick(DRIFT_DELAY);
        assert!(orbit.view.target().y < start.y);
    }
}
