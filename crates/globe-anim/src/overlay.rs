//! Loading overlay lifecycle.
//!
//! The overlay covers the scene while assets load, holds briefly once loading
//! stops, then fades out. Progress is smoothed and capped so the bar never
//! reads 100% while something is still loading.
//!
//! `Done` is terminal: a finished overlay stays finished even if loading
//! starts again. `Hold` and `Fading` return to `Loading` when the load signal
//! becomes active, and every return discards the previous hold deadline.

use glam::{Vec2, Vec4};

use crate::clock::{FrameClock, FrameTime, TimeSource};
use crate::damp::{Damped, rate_for_duration};

/// Alpha below which a fading overlay is considered gone.
const DONE_ALPHA: f32 = 0.01;

/// Phase of the overlay lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayPhase {
    /// Assets are loading; the overlay is opaque.
    #[default]
    Loading,
    /// Loading has stopped; waiting out the delay before fading.
    Hold,
    /// Fading out.
    Fading,
    /// Fully faded. Terminal.
    Done,
}

impl OverlayPhase {
    /// Whether the overlay should be heading toward full opacity.
    pub fn is_opaque(self) -> bool {
        matches!(self, Self::Loading | Self::Hold)
    }
}

/// Couples scene exposure to the overlay fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureRamp {
    /// Exposure while the overlay is opaque.
    pub from: f32,
    /// Exposure once the overlay is gone.
    pub to: f32,
}

impl ExposureRamp {
    /// Exposure for the given overlay alpha.
    pub fn at(&self, alpha: f32) -> f32 {
        self.from + (self.to - self.from) * (1.0 - alpha)
    }
}

/// Overlay configuration. Set once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Seconds to hold after loading stops, before fading.
    pub delay: f32,
    /// Seconds for the fade to settle.
    pub fade_duration: f32,
    /// Background colour (linear RGBA).
    pub color: Vec4,
    /// Progress bar size in logical pixels.
    pub bar_size: Vec2,
    /// Progress bar fill colour.
    pub bar_color: Vec4,
    /// Progress bar track colour.
    pub bar_track_color: Vec4,
    /// Whether to show a percentage under the bar.
    pub show_percent: bool,
    /// Whether the overlay is removed once it finishes.
    pub unmount_on_end: bool,
    /// Rate constant (1/s) for the displayed progress.
    pub smoothing_rate: f32,
    /// Highest progress shown while assets are still loading.
    pub loading_cap: f32,
    /// Optional exposure coupling.
    pub exposure: Option<ExposureRamp>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            delay: 0.35,
            fade_duration: 0.9,
            color: Vec4::new(0.02, 0.02, 0.04, 1.0),
            bar_size: Vec2::new(220.0, 4.0),
            bar_color: Vec4::new(1.0, 1.0, 1.0, 0.9),
            bar_track_color: Vec4::new(1.0, 1.0, 1.0, 0.15),
            show_percent: true,
            unmount_on_end: true,
            smoothing_rate: 8.0,
            loading_cap: 0.96,
            exposure: None,
        }
    }
}

/// Latest status reported by the asset loader.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadSignal {
    /// True while any tracked resource is still loading.
    pub active: bool,
    /// Raw progress in [0, 100].
    pub progress: f32,
}

impl LoadSignal {
    /// Still loading, at `progress` out of 100.
    pub fn loading(progress: f32) -> Self {
        Self {
            active: true,
            progress,
        }
    }

    /// Nothing left to load.
    pub fn idle() -> Self {
        Self {
            active: false,
            progress: 100.0,
        }
    }
}

/// Snapshot produced by one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayFrame {
    pub phase: OverlayPhase,
    /// Smoothed progress in [0, 1].
    pub display_progress: f32,
    /// Overlay opacity in [0, 1].
    pub alpha: f32,
    /// Scene exposure, if an exposure ramp is configured.
    pub exposure: Option<f32>,
    /// True only on the update that entered `Done`.
    pub finished: bool,
    /// False once finished when configured to unmount.
    pub mounted: bool,
    /// Rounded percentage, if enabled.
    pub percent: Option<u8>,
}

/// Drives the overlay from the load signal.
#[derive(Debug, Clone)]
pub struct OverlayPhaseMachine<C = FrameClock> {
    config: OverlayConfig,
    clock: C,
    phase: OverlayPhase,
    hold_deadline: Option<f64>,
    display: Damped<f32>,
    alpha: Damped<f32>,
    /// Highest raw progress since the source last went backwards.
    peak_progress: f32,
    last_raw: f32,
}

impl<C: TimeSource> OverlayPhaseMachine<C> {
    /// An opaque overlay in the `Loading` phase.
    pub fn new(config: OverlayConfig, clock: C) -> Self {
        let smoothing_rate = if config.smoothing_rate > 0.0 {
            config.smoothing_rate
        } else {
            f32::INFINITY
        };
        let fade_rate = rate_for_duration(config.fade_duration);
        Self {
            clock,
            phase: OverlayPhase::Loading,
            hold_deadline: None,
            display: Damped::new(0.0, smoothing_rate),
            alpha: Damped::new(1.0, fade_rate),
            peak_progress: 0.0,
            last_raw: 0.0,
            config,
        }
    }

    /// Configuration given at construction.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// The injected time source.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the time source, e.g. to tick a [`FrameClock`].
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    /// Whether the overlay has fully faded out.
    pub fn is_done(&self) -> bool {
        self.phase == OverlayPhase::Done
    }

    /// Samples the clock once and advances everything by that frame.
    pub fn update(&mut self, signal: LoadSignal) -> OverlayFrame {
        let FrameTime { now, delta } = self.clock.sample();
        let raw = normalize_progress(signal.progress);

        self.advance_phase(signal.active, now);
        self.advance_progress(signal.active, raw, delta);

        let alpha_target = if self.phase.is_opaque() { 1.0 } else { 0.0 };
        self.alpha.follow(alpha_target, delta);

        let finished = self.phase == OverlayPhase::Fading && self.alpha.value() < DONE_ALPHA;
        if finished {
            // Land on fully transparent so the exposure ends exactly on its ramp.
            self.alpha.snap(0.0);
            self.set_phase(OverlayPhase::Done);
            tracing::info!("Loading overlay finished");
        }

        self.frame(finished)
    }

    /// The current outputs without advancing.
    pub fn snapshot(&self) -> OverlayFrame {
        self.frame(false)
    }

    fn frame(&self, finished: bool) -> OverlayFrame {
        let alpha = self.alpha.value();
        let display_progress = self.display.value();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = self
            .config
            .show_percent
            .then(|| (display_progress.clamp(0.0, 1.0) * 100.0).round() as u8);
        OverlayFrame {
            phase: self.phase,
            display_progress,
            alpha,
            exposure: self.config.exposure.map(|ramp| ramp.at(alpha)),
            finished,
            mounted: !(self.is_done() && self.config.unmount_on_end),
            percent,
        }
    }

    fn advance_phase(&mut self, active: bool, now: f64) {
        match self.phase {
            OverlayPhase::Loading if !active => {
                let delay = if self.config.delay > 0.0 {
                    f64::from(self.config.delay)
                } else {
                    0.0
                };
                self.hold_deadline = Some(now + delay);
                self.set_phase(OverlayPhase::Hold);
            }
            OverlayPhase::Hold | OverlayPhase::Fading if active => {
                self.hold_deadline = None;
                self.set_phase(OverlayPhase::Loading);
            }
            _ => {}
        }

        if self.phase == OverlayPhase::Hold && self.hold_deadline.is_some_and(|d| now >= d) {
            self.hold_deadline = None;
            self.set_phase(OverlayPhase::Fading);
        }
    }

    fn advance_progress(&mut self, active: bool, raw: f32, delta: f32) {
        if raw < self.last_raw {
            // The source went backwards, e.g. a new batch of loads started.
            self.peak_progress = raw;
        } else {
            self.peak_progress = self.peak_progress.max(raw);
        }
        self.last_raw = raw;

        let target = if active {
            self.peak_progress.min(self.config.loading_cap.clamp(0.0, 1.0))
        } else {
            1.0
        };
        self.display.follow(target, delta);
    }

    fn set_phase(&mut self, phase: OverlayPhase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "Overlay phase change");
        self.phase = phase;
    }
}

/// Maps raw [0, 100] progress to [0, 1]; anything unusable reads as zero.
fn normalize_progress(progress: f32) -> f32 {
    if progress.is_nan() {
        0.0
    } else {
        (progress / 100.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn machine(config: OverlayConfig) -> OverlayPhaseMachine {
        OverlayPhaseMachine::new(config, FrameClock::new())
    }

    fn step(m: &mut OverlayPhaseMachine, dt: f32, signal: LoadSignal) -> OverlayFrame {
        m.clock_mut().tick(dt);
        m.update(signal)
    }

    #[test]
    fn test_hold_then_fade_then_done() {
        let config = OverlayConfig {
            delay: 0.5,
            fade_duration: 0.5,
            ..OverlayConfig::default()
        };
        let mut m = machine(config);

        for _ in 0..60 {
            let f = step(&mut m, FRAME, LoadSignal::loading(50.0));
            assert_eq!(f.phase, OverlayPhase::Loading);
            assert_eq!(f.alpha, 1.0);
        }

        m.clock_mut().tick(FRAME);
        let t0 = m.clock().now();
        let f = m.update(LoadSignal::idle());
        assert_eq!(f.phase, OverlayPhase::Hold);
        let deadline = t0 + 0.5;

        let mut finished_count = 0;
        let mut saw_fading = false;
        for _ in 0..600 {
            let f = step(&mut m, FRAME, LoadSignal::idle());
            let now = m.clock().now();
            if now < deadline {
                assert_eq!(f.phase, OverlayPhase::Hold, "at {now}");
                assert!(f.alpha > 0.99);
            } else {
                assert!(matches!(f.phase, OverlayPhase::Fading | OverlayPhase::Done));
            }
            saw_fading |= f.phase == OverlayPhase::Fading;
            if f.finished {
                finished_count += 1;
                assert_eq!(f.phase, OverlayPhase::Done);
                assert!(f.alpha < 0.01);
                assert!(!f.mounted);
            }
        }
        assert!(saw_fading);
        assert_eq!(finished_count, 1);
        assert!(m.is_done());
    }

    #[test]
    fn test_progress_never_decreases_while_loading() {
        let mut m = machine(OverlayConfig::default());
        let mut last = 0.0;
        for i in 0..300_u16 {
            // Non-decreasing with plateaus, like a loader that reports in bursts.
            let raw = f32::from(i / 4);
            let f = step(&mut m, FRAME, LoadSignal::loading(raw));
            assert!(f.display_progress >= last, "{} < {last}", f.display_progress);
            last = f.display_progress;
        }
        assert!(last > 0.5);
    }

    #[test]
    fn test_source_reset_lets_bar_drop() {
        let mut m = machine(OverlayConfig::default());
        for _ in 0..240 {
            step(&mut m, FRAME, LoadSignal::loading(90.0));
        }
        let high = m.snapshot().display_progress;
        for _ in 0..240 {
            step(&mut m, FRAME, LoadSignal::loading(10.0));
        }
        let low = m.snapshot().display_progress;
        assert!(low < high);
        assert!((low - 0.1).abs() < 0.01, "{low}");
    }

    #[test]
    fn test_progress_capped_while_active() {
        let mut m = machine(OverlayConfig::default());
        let mut f = m.snapshot();
        for _ in 0..2_000 {
            f = step(&mut m, FRAME, LoadSignal::loading(100.0));
            assert!(f.display_progress <= 0.96);
        }
        assert!((f.display_progress - 0.96).abs() < 1e-3);
        assert_eq!(f.percent, Some(96));

        // Releasing the cap lets the bar complete.
        for _ in 0..2_000 {
            f = step(&mut m, FRAME, LoadSignal::idle());
        }
        assert!((f.display_progress - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_reentry_from_hold_discards_deadline() {
        let config = OverlayConfig {
            delay: 1.0,
            ..OverlayConfig::default()
        };
        let mut m = machine(config);
        step(&mut m, FRAME, LoadSignal::loading(10.0));
        assert_eq!(step(&mut m, FRAME, LoadSignal::idle()).phase, OverlayPhase::Hold);

        // Loading resumes halfway through the hold.
        step(&mut m, 0.5, LoadSignal::idle());
        let f = step(&mut m, FRAME, LoadSignal::loading(20.0));
        assert_eq!(f.phase, OverlayPhase::Loading);

        // Stays loading well past the original deadline.
        let f = step(&mut m, 2.0, LoadSignal::loading(30.0));
        assert_eq!(f.phase, OverlayPhase::Loading);

        // A fresh hold gets a fresh deadline.
        assert_eq!(step(&mut m, FRAME, LoadSignal::idle()).phase, OverlayPhase::Hold);
        assert_eq!(step(&mut m, 0.9, LoadSignal::idle()).phase, OverlayPhase::Hold);
        assert_eq!(step(&mut m, 0.2, LoadSignal::idle()).phase, OverlayPhase::Fading);
    }

    #[test]
    fn test_reentry_from_fading_restores_alpha() {
        let config = OverlayConfig {
            delay: 0.0,
            fade_duration: 2.0,
            ..OverlayConfig::default()
        };
        let mut m = machine(config);
        let f = step(&mut m, FRAME, LoadSignal::idle());
        assert_eq!(f.phase, OverlayPhase::Fading);
        let faded = step(&mut m, 0.3, LoadSignal::idle());
        assert!(faded.alpha < 1.0);

        let f = step(&mut m, FRAME, LoadSignal::loading(5.0));
        assert_eq!(f.phase, OverlayPhase::Loading);
        let mut alpha = f.alpha;
        for _ in 0..600 {
            alpha = step(&mut m, FRAME, LoadSignal::loading(5.0)).alpha;
        }
        assert_eq!(alpha, 1.0);
    }

    #[test]
    fn test_done_is_terminal() {
        let config = OverlayConfig {
            delay: 0.0,
            fade_duration: 0.0,
            ..OverlayConfig::default()
        };
        let mut m = machine(config);
        let f = step(&mut m, FRAME, LoadSignal::idle());
        assert_eq!(f.phase, OverlayPhase::Done);
        assert!(f.finished);
        assert_eq!(f.alpha, 0.0);

        let f = step(&mut m, FRAME, LoadSignal::loading(0.0));
        assert_eq!(f.phase, OverlayPhase::Done);
        assert!(!f.finished);
    }

    #[test]
    fn test_keep_mounted_when_not_unmounting() {
        let config = OverlayConfig {
            delay: 0.0,
            fade_duration: 0.0,
            unmount_on_end: false,
            ..OverlayConfig::default()
        };
        let mut m = machine(config);
        let f = step(&mut m, FRAME, LoadSignal::idle());
        assert!(f.finished);
        assert!(f.mounted);
    }

    #[test]
    fn test_exposure_follows_alpha() {
        let config = OverlayConfig {
            delay: 0.0,
            fade_duration: 1.0,
            exposure: Some(ExposureRamp { from: 0.4, to: 1.0 }),
            ..OverlayConfig::default()
        };
        let mut m = machine(config);
        assert_eq!(m.snapshot().exposure, Some(0.4));

        let f = step(&mut m, 0.2, LoadSignal::idle());
        let exposure = f.exposure.unwrap();
        let expected = 0.4 + 0.6 * (1.0 - f.alpha);
        assert!((exposure - expected).abs() < 1e-6);
        assert!(exposure > 0.4 && exposure < 1.0);
    }

    #[test]
    fn test_exposure_settles_on_finish() {
        let config = OverlayConfig {
            delay: 0.0,
            fade_duration: 0.5,
            unmount_on_end: false,
            exposure: Some(ExposureRamp { from: 0.35, to: 1.0 }),
            ..OverlayConfig::default()
        };
        let mut m = machine(config);
        let mut f = step(&mut m, FRAME, LoadSignal::idle());
        let mut frames = 0;
        while !f.finished {
            f = step(&mut m, FRAME, LoadSignal::idle());
            frames += 1;
            assert!(frames < 1_000, "never finished");
        }
        assert_eq!(f.alpha, 0.0);
        let exposure = f.exposure.unwrap();
        assert!((exposure - 1.0).abs() < 1e-6, "{exposure}");

        // No dip on the frames after finishing.
        for _ in 0..10 {
            let next = step(&mut m, FRAME, LoadSignal::idle());
            assert_eq!(next.alpha, 0.0);
            assert_eq!(next.exposure, Some(exposure));
        }
    }

    #[test]
    fn test_garbage_progress_is_clamped() {
        let mut m = machine(OverlayConfig {
            smoothing_rate: 0.0,
            ..OverlayConfig::default()
        });
        assert_eq!(step(&mut m, FRAME, LoadSignal::loading(f32::NAN)).display_progress, 0.0);
        assert_eq!(step(&mut m, FRAME, LoadSignal::loading(-20.0)).display_progress, 0.0);
        assert_eq!(step(&mut m, FRAME, LoadSignal::loading(50.0)).display_progress, 0.5);
        assert_eq!(step(&mut m, FRAME, LoadSignal::loading(500.0)).display_progress, 0.96);
    }

    #[test]
    fn test_percent_hidden_when_disabled() {
        let m = machine(OverlayConfig {
            show_percent: false,
            ..OverlayConfig::default()
        });
        assert_eq!(m.snapshot().percent, None);
    }
}
