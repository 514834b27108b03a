//! Animation core for an annotated 3D globe.
//!
//! Everything in this crate is plain arithmetic over owned state. Machines are
//! advanced once per rendered frame and return a snapshot that a renderer
//! applies to its own draw state.

pub mod callout;
pub mod clock;
pub mod damp;
pub mod geo;
pub mod leader;
pub mod overlay;
pub mod sun;

pub use callout::{
    CalloutConfig, CalloutExpansionMachine, CalloutFrame, PanelGeometry, PanelLayout, TextBounds,
    panel_geometry,
};
pub use clock::{FrameClock, FrameTime, TimeSource, WallClock};
pub use damp::{Damped, Dampable, damp, rate_for_duration};
pub use geo::{AnchorCache, GeoCoordinate, GeoParseError, project};
pub use leader::LeaderLine;
pub use overlay::{
    ExposureRamp, LoadSignal, OverlayConfig, OverlayFrame, OverlayPhase, OverlayPhaseMachine,
};
