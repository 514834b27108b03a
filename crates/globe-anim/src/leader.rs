//! Leader line geometry joining a callout's anchor to its label.

use glam::Vec3;

/// A bowed line from a surface anchor out to the label point.
///
/// The label sits `offset` above the anchor along the surface normal. The
/// line is a quadratic curve whose control point is pushed toward local north
/// by `bow * offset`, so neighbouring callouts don't draw overlapping
/// straight spokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderLine {
    pub anchor: Vec3,
    pub label: Vec3,
    pub control: Vec3,
}

impl LeaderLine {
    /// Builds the line for `anchor`, with the label `offset` out along the
    /// surface normal.
    pub fn new(anchor: Vec3, offset: f32, bow: f32) -> Self {
        let normal = anchor.normalize_or(Vec3::Y);
        let label = anchor + normal * offset;
        // Local north; undefined at the poles, where any tangent will do.
        let north = (Vec3::Y - normal * normal.dot(Vec3::Y)).normalize_or(Vec3::X);
        let control = (anchor + label) * 0.5 + north * (bow * offset);
        Self {
            anchor,
            label,
            control,
        }
    }

    /// Point at `t` in [0, 1] along the curve.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        self.anchor * (u * u) + self.control * (2.0 * u * t) + self.label * (t * t)
    }

    /// `segments + 1` evenly spaced points, anchor first.
    #[allow(clippy::cast_precision_loss)]
    pub fn points(&self, segments: usize) -> Vec<Vec3> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f32 / segments as f32))
            .collect()
    }
}
