//! Time of day driving the sun.
//!
//! Time is either the wall clock or an override that starts at a chosen UTC
//! hour and advances at a speed multiplier. The sun light is pointed from the
//! subsolar point every frame, so the terminator sweeps across the globe.

use bevy::prelude::*;
use globe_anim::sun::{SECONDS_PER_DAY, SECONDS_PER_HOUR, day_of_year_from_epoch_days, sun_direction};
use web_time::{Instant, SystemTime};

use crate::launch_params::LaunchParams;

/// Plugin for the time-of-day system.
pub struct TimeOfDayPlugin;

impl Plugin for TimeOfDayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TimeOfDayState>()
            .add_systems(Startup, apply_launch_params)
            .add_systems(Update, update_sun_direction);
    }
}

/// Marker component for the sun directional light.
#[derive(Component)]
pub struct Sun;

/// Time mode: realtime (synced to wall clock) or override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeMode {
    /// Time is synced to the real-world wall clock.
    #[default]
    Realtime,
    /// Time starts from a chosen hour and advances at the speed multiplier.
    Override,
}

/// State for the time-of-day system.
#[derive(Resource, Debug)]
pub struct TimeOfDayState {
    /// Current time mode.
    pub mode: TimeMode,
    /// Speed multiplier for time progression (1.0 = realtime).
    pub speed_multiplier: f32,
    /// Reference instant for elapsed time calculations.
    reference_instant: Instant,
    /// Simulation time at the reference instant, in seconds since the Unix epoch.
    reference_sim_time: f64,
}

impl Default for TimeOfDayState {
    fn default() -> Self {
        Self {
            mode: TimeMode::Realtime,
            speed_multiplier: 1.0,
            reference_instant: Instant::now(),
            reference_sim_time: current_epoch_seconds(),
        }
    }
}

impl TimeOfDayState {
    /// Current simulation time in seconds since the Unix epoch.
    pub fn epoch_seconds(&self) -> f64 {
        match self.mode {
            TimeMode::Realtime => current_epoch_seconds(),
            TimeMode::Override => {
                let elapsed = self.reference_instant.elapsed().as_secs_f64();
                self.reference_sim_time + elapsed * f64::from(self.speed_multiplier)
            }
        }
    }

    /// Seconds since midnight UTC (0-86400).
    pub fn utc_seconds(&self) -> f64 {
        self.epoch_seconds().rem_euclid(SECONDS_PER_DAY)
    }

    /// Day of year (1-366).
    pub fn day_of_year(&self) -> u32 {
        #[allow(clippy::cast_possible_truncation)]
        let days = (self.epoch_seconds() / SECONDS_PER_DAY).floor() as i64;
        day_of_year_from_epoch_days(days)
    }

    /// Sets the time speed without causing time jumps.
    pub fn set_speed(&mut self, speed: f32) {
        let now = self.epoch_seconds();
        self.mode = TimeMode::Override;
        self.reference_instant = Instant::now();
        self.reference_sim_time = now;
        self.speed_multiplier = speed;
    }

    /// Jumps to `hour` UTC on the current simulated day.
    pub fn set_override_hour(&mut self, hour: f64) {
        let now = self.epoch_seconds();
        let midnight = now - now.rem_euclid(SECONDS_PER_DAY);
        self.mode = TimeMode::Override;
        self.reference_instant = Instant::now();
        self.reference_sim_time = midnight + hour.rem_euclid(24.0) * SECONDS_PER_HOUR;
    }
}

fn current_epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[allow(clippy::float_cmp)]
fn apply_launch_params(params: Res<LaunchParams>, mut state: ResMut<TimeOfDayState>) {
    if let Some(hour) = params.utc_hour {
        state.set_override_hour(hour);
    }
    if params.time_scale != 1.0 {
        state.set_speed(params.time_scale);
    }
    if state.mode == TimeMode::Override {
        tracing::info!(
            "Time override: {:.2}h UTC, day {}, speed {}x",
            state.utc_seconds() / SECONDS_PER_HOUR,
            state.day_of_year(),
            state.speed_multiplier
        );
    }
}

/// Points the sun light away from the subsolar point.
fn update_sun_direction(
    state: Res<TimeOfDayState>,
    mut sun_query: Query<&mut Transform, With<Sun>>,
) {
    let direction = sun_direction(state.utc_seconds(), state.day_of_year()).as_vec3();
    for mut transform in &mut sun_query {
        *transform = Transform::default().looking_to(-direction, Vec3::Y);
    }
}
