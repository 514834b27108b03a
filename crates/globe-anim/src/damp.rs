//! Frame-rate independent exponential damping.
//!
//! A damped value approaches its target as `target + (current - target) *
//! exp(-rate * dt)`. Splitting a step into two shorter steps gives the same
//! result as one long step, so the animation looks the same at any frame rate,
//! and the value never overshoots.

use glam::{Vec2, Vec3, Vec4};

/// Distance below which a damped value is considered to have arrived.
pub const CONVERGENCE_EPSILON: f32 = 1e-4;

/// Number of time constants treated as "fully settled" (~95%).
const SETTLE_TIME_CONSTANTS: f32 = 3.0;

/// Converts a settle duration in seconds into a rate constant.
///
/// Non-positive (or NaN) durations yield an infinite rate, which snaps.
pub fn rate_for_duration(duration: f32) -> f32 {
    if duration > 0.0 {
        SETTLE_TIME_CONSTANTS / duration
    } else {
        f32::INFINITY
    }
}

/// Fraction of the remaining distance left after `dt` seconds at `rate`.
fn remaining_fraction(rate: f32, dt: f32) -> f32 {
    if rate.is_infinite() && rate > 0.0 {
        return 0.0;
    }
    if !(rate > 0.0 && dt > 0.0) {
        return 1.0;
    }
    (-rate * dt).exp()
}

/// Moves `current` toward `target` by `dt` seconds at `rate` (1/s).
pub fn damp(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    target + (current - target) * remaining_fraction(rate, dt)
}

/// A quantity that can be exponentially damped component-wise.
pub trait Dampable: Copy + PartialEq {
    /// Returns `target + (self - target) * remaining`.
    fn damp_towards(self, target: Self, remaining: f32) -> Self;

    /// Largest per-component distance to `other`.
    fn distance(self, other: Self) -> f32;
}

impl Dampable for f32 {
    fn damp_towards(self, target: Self, remaining: f32) -> Self {
        target + (self - target) * remaining
    }

    fn distance(self, other: Self) -> f32 {
        (self - other).abs()
    }
}

macro_rules! impl_dampable_vec {
    ($($ty:ty),*) => {
        $(
            impl Dampable for $ty {
                fn damp_towards(self, target: Self, remaining: f32) -> Self {
                    target + (self - target) * remaining
                }

                fn distance(self, other: Self) -> f32 {
                    (self - other).abs().max_element()
                }
            }
        )*
    };
}

impl_dampable_vec!(Vec2, Vec3, Vec4);

/// A value that approaches a target a little more every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damped<T> {
    current: T,
    target: T,
    rate: f32,
}

impl<T: Dampable> Damped<T> {
    /// Creates a settled value with the given rate constant (1/s).
    pub fn new(initial: T, rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            rate,
        }
    }

    /// Creates a settled value that takes roughly `duration` seconds to
    /// follow a change of target.
    pub fn with_duration(initial: T, duration: f32) -> Self {
        Self::new(initial, rate_for_duration(duration))
    }

    /// Current (smoothed) value.
    pub fn value(&self) -> T {
        self.current
    }

    /// Value being approached.
    pub fn target(&self) -> T {
        self.target
    }

    /// Rate constant in 1/s. Infinite means snap.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Changes the target without moving the value. The next
    /// [`tick`](Self::tick) starts heading there.
    pub fn set_target(&mut self, target: T) {
        self.target = target;
    }

    /// Jumps straight to `value` and stops there.
    pub fn snap(&mut self, value: T) {
        self.current = value;
        self.target = value;
    }

    /// Whether the value has landed on its target.
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Advances by `dt` seconds. Returns whether the value changed.
    ///
    /// Once within [`CONVERGENCE_EPSILON`] of the target the value lands on it
    /// exactly, so a settled value stops producing writes.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.is_settled() {
            return false;
        }
        let mut next = self
            .current
            .damp_towards(self.target, remaining_fraction(self.rate, dt));
        if next.distance(self.target) < CONVERGENCE_EPSILON {
            next = self.target;
        }
        let changed = next != self.current;
        self.current = next;
        changed
    }

    /// Sets the target, advances by `dt` and returns the new value.
    pub fn follow(&mut self, target: T, dt: f32) -> T {
        self.set_target(target);
        self.tick(dt);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_rate_for_duration() {
        assert!((rate_for_duration(0.5) - 6.0).abs() < 1e-6);
        assert_eq!(rate_for_duration(0.0), f32::INFINITY);
        assert_eq!(rate_for_duration(-1.0), f32::INFINITY);
        assert_eq!(rate_for_duration(f32::NAN), f32::INFINITY);
    }

    #[test]
    fn test_infinite_rate_snaps() {
        assert_eq!(damp(0.0, 1.0, f32::INFINITY, 0.016), 1.0);
        assert_eq!(damp(0.0, 1.0, f32::INFINITY, 0.0), 1.0);

        let mut v = Damped::with_duration(1.0_f32, 0.0);
        v.set_target(0.0);
        assert!(v.tick(0.016));
        assert_eq!(v.value(), 0.0);
    }

    #[test]
    fn test_zero_dt_holds_value() {
        assert_eq!(damp(0.25, 1.0, 6.0, 0.0), 0.25);
        assert_eq!(damp(0.25, 1.0, 6.0, -0.1), 0.25);
        assert_eq!(damp(0.25, 1.0, 6.0, f32::NAN), 0.25);
    }

    #[test]
    fn test_three_time_constants_reach_95_percent() {
        let duration = 0.8;
        let v = damp(0.0, 1.0, rate_for_duration(duration), duration);
        assert!(v > 0.95 && v < 1.0, "{v}");
    }

    #[test]
    fn test_settles_exactly_and_stops_changing() {
        let mut v = Damped::new(0.0_f32, 10.0);
        v.set_target(1.0);
        let mut frames = 0;
        while v.tick(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 10_000, "never settled");
        }
        assert!(v.is_settled());
        assert_eq!(v.value(), 1.0);
        assert!(!v.tick(1.0 / 60.0));
    }

    #[test]
    fn test_vector_damps_component_wise() {
        let mut v = Damped::new(Vec3::ZERO, 5.0);
        let out = v.follow(Vec3::new(1.0, -2.0, 0.0), 0.1);
        let f = (-0.5_f32).exp();
        assert!((out.x - (1.0 - f)).abs() < 1e-6);
        assert!((out.y - (-2.0 * (1.0 - f))).abs() < 1e-6);
        assert_eq!(out.z, 0.0);
    }

    #[test]
    fn test_vector_settles_on_largest_component() {
        let mut v = Damped::new(Vec2::new(0.0, 0.0), 4.0);
        v.set_target(Vec2::new(1.0, 1e-5));
        v.tick(0.01);
        // y is already within epsilon but x is not.
        assert!(!v.is_settled());
    }

    proptest! {
        #[test]
        fn prop_converges_without_overshoot(
            start in -10.0f32..10.0,
            target in -10.0f32..10.0,
            rate in 0.5f32..20.0,
            dt in 0.004f32..0.1,
        ) {
            let mut current = start;
            let side = (start - target).signum();
            let mut previous_gap = (current - target).abs();
            let mut steps = 0;
            while previous_gap > 1e-2 {
                current = damp(current, target, rate, dt);
                let gap = (current - target).abs();
                prop_assert!(gap < previous_gap, "gap {gap} >= {previous_gap}");
                prop_assert!((current - target).signum() == side || gap == 0.0);
                previous_gap = gap;
                steps += 1;
                prop_assert!(steps < 100_000);
            }
        }

        #[test]
        fn prop_split_step_matches_single_step(
            current in -100.0f32..100.0,
            target in -100.0f32..100.0,
            rate in 0.1f32..20.0,
            a in 0.0f32..0.5,
            b in 0.0f32..0.5,
        ) {
            let once = damp(current, target, rate, a + b);
            let twice = damp(damp(current, target, rate, a), target, rate, b);
            let tolerance = 1e-4 * (1.0 + (current - target).abs());
            prop_assert!((once - twice).abs() <= tolerance, "{once} vs {twice}");
        }
    }
}
