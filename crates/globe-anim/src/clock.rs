//! Time sources that drive the machines.
//!
//! Machines never read a global clock. They are handed a [`TimeSource`] at
//! construction and sample it once per update.

use web_time::Instant;

/// Time for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the source started.
    pub now: f64,
    /// Seconds since the previous sample.
    pub delta: f32,
}

/// Something that can report the current frame's time.
pub trait TimeSource {
    /// Reads the time for the current frame. Called exactly once per update.
    fn sample(&mut self) -> FrameTime;
}

/// A clock advanced explicitly by the render loop (or a test).
///
/// Each [`tick`](FrameClock::tick) queues a delta that the next sample
/// consumes, so sampling twice without ticking reports a zero delta.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    now: f64,
    pending_delta: f32,
    frame: u64,
}

impl FrameClock {
    /// A clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `delta` seconds. Negative or NaN deltas count as
    /// zero.
    pub fn tick(&mut self, delta: f32) {
        let delta = if delta > 0.0 { delta } else { 0.0 };
        self.now += f64::from(delta);
        self.pending_delta += delta;
        self.frame += 1;
    }

    /// Seconds ticked so far.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of ticks so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl TimeSource for FrameClock {
    fn sample(&mut self) -> FrameTime {
        let delta = std::mem::take(&mut self.pending_delta);
        FrameTime {
            now: self.now,
            delta,
        }
    }
}

/// A monotonic wall clock, for hosts that don't have a frame clock of their
/// own.
#[derive(Debug, Clone)]
pub struct WallClock {
    start: Instant,
    last: f64,
}

impl Default for WallClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            last: 0.0,
        }
    }
}

impl TimeSource for WallClock {
    fn sample(&mut self) -> FrameTime {
        let now = self.start.elapsed().as_secs_f64();
        #[allow(clippy::cast_possible_truncation)]
        let delta = (now - self.last) as f32;
        self.last = now;
        FrameTime { now, delta }
    }
}
