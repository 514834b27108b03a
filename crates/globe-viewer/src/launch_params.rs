//! Launch parameter parsing for the viewer.
//!
//! On native, parameters are parsed from command-line arguments using clap.
//! On WASM, defaults are used (CLI argument parsing is not available).

use bevy::prelude::*;

use crate::landmarks::{self, Landmark};

/// Default seconds to hold the loading overlay after assets finish.
const DEFAULT_OVERLAY_DELAY: f32 = 0.35;
/// Default seconds for the loading overlay to fade out.
const DEFAULT_FADE_DURATION: f32 = 0.9;
/// Default sun speed (1.0 = realtime).
const DEFAULT_TIME_SCALE: f32 = 1.0;

/// Launch parameters for the viewer.
#[derive(Resource, Debug)]
pub struct LaunchParams {
    /// Landmarks to annotate.
    pub landmarks: Vec<Landmark>,
    /// Seconds to hold the overlay after loading stops.
    pub overlay_delay: f32,
    /// Seconds for the overlay fade.
    pub fade_duration: f32,
    /// Leave the faded overlay mounted instead of removing it.
    pub keep_overlay: bool,
    /// Sun speed multiplier.
    pub time_scale: f32,
    /// Optional UTC hour override (puts the time system in override mode).
    pub utc_hour: Option<f64>,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            landmarks: landmarks::builtin(),
            overlay_delay: DEFAULT_OVERLAY_DELAY,
            fade_duration: DEFAULT_FADE_DURATION,
            keep_overlay: false,
            time_scale: DEFAULT_TIME_SCALE,
            utc_hour: None,
        }
    }
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;

    /// Parse an hour of the day in [0, 24).
    pub(super) fn parse_hour(s: &str) -> Result<f64, String> {
        let hour = s
            .parse::<f64>()
            .map_err(|e| format!("invalid hour: {e}"))?;
        if !(0.0..24.0).contains(&hour) {
            return Err(format!("hour out of range: {hour}"));
        }
        Ok(hour)
    }

    /// Parse a non-negative duration in seconds.
    pub(super) fn parse_seconds(s: &str) -> Result<f32, String> {
        let seconds = s
            .parse::<f32>()
            .map_err(|e| format!("invalid duration: {e}"))?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("duration must be non-negative: {seconds}"));
        }
        Ok(seconds)
    }

    fn parse_landmark(s: &str) -> Result<Landmark, String> {
        s.parse()
    }

    #[derive(Parser)]
    #[command(about = "Annotated 3D globe viewer")]
    struct CliArgs {
        /// JSON file of landmarks, replacing the built-in set.
        #[arg(long)]
        landmarks: Option<PathBuf>,

        /// Extra landmark (format: NAME@LAT,LON). May be repeated.
        #[arg(long = "landmark", value_parser = parse_landmark)]
        extra_landmarks: Vec<Landmark>,

        /// Seconds to hold the loading overlay after assets finish.
        #[arg(long, default_value_t = DEFAULT_OVERLAY_DELAY, value_parser = parse_seconds)]
        overlay_delay: f32,

        /// Seconds for the loading overlay to fade out.
        #[arg(long, default_value_t = DEFAULT_FADE_DURATION, value_parser = parse_seconds)]
        fade_duration: f32,

        /// Keep the overlay mounted (fully transparent) after it fades.
        #[arg(long)]
        keep_overlay: bool,

        /// Sun speed multiplier (1.0 = realtime).
        #[arg(long, default_value_t = DEFAULT_TIME_SCALE)]
        time_scale: f32,

        /// UTC hour override, e.g. 13.5 for 13:30.
        #[arg(long, value_parser = parse_hour)]
        utc_hour: Option<f64>,
    }

    pub fn parse() -> LaunchParams {
        let args = CliArgs::parse();

        let mut landmarks = match &args.landmarks {
            Some(path) => landmarks::load_file(path).unwrap_or_else(|e| {
                tracing::warn!("{e}; using built-in landmarks");
                landmarks::builtin()
            }),
            None => landmarks::builtin(),
        };
        landmarks.extend(args.extra_landmarks);

        LaunchParams {
            landmarks,
            overlay_delay: args.overlay_delay,
            fade_duration: args.fade_duration,
            keep_overlay: args.keep_overlay,
            time_scale: args.time_scale,
            utc_hour: args.utc_hour,
        }
    }
}

/// Parse launch parameters from CLI args (native) or use defaults (WASM).
pub fn parse() -> LaunchParams {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        LaunchParams::default()
    }
}

#[cfg(all(test, not(target_family = "wasm")))]
mod tests {
    use super::native::{parse_hour, parse_seconds};

    #[test]
    fn test_parse_hour() {
        assert_eq!(parse_hour("13.5"), Ok(13.5));
        assert_eq!(parse_hour("0"), Ok(0.0));
        assert!(parse_hour("24").is_err());
        assert!(parse_hour("-1").is_err());
        assert!(parse_hour("noon").is_err());
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("0.35"), Ok(0.35));
        assert_eq!(parse_seconds("0"), Ok(0.0));
        assert!(parse_seconds("-0.5").is_err());
        assert!(parse_seconds("inf").is_err());
    }
}
