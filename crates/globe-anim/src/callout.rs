//! Hover expansion for annotation callouts.
//!
//! A collapsed callout shows a title in a small panel. Hovering opens the
//! panel downward to make room for an image, fades and scales the image in,
//! enlarges the title and dims the leader line. Everything is driven by damped
//! values so the panel never jumps, whatever the frame rate.

use glam::{Vec2, Vec3, Vec4};

use crate::damp::Damped;
use crate::leader::LeaderLine;

/// Rate constant for the open amount.
pub const OPEN_RATE: f32 = 6.0;
/// Rate constant for image opacity and scale.
pub const IMAGE_RATE: f32 = 10.0;
/// Rate constant for the title scale.
pub const TITLE_RATE: f32 = 8.0;
/// Rate constant for the line and pin opacity.
pub const LINE_RATE: f32 = 8.0;
/// Rate constant for the panel geometry smoothing pass.
pub const PANEL_RATE: f32 = 12.0;

pub const TITLE_SCALE_IDLE: f32 = 1.0;
pub const TITLE_SCALE_HOVERED: f32 = 1.22;
pub const LINE_OPACITY_IDLE: f32 = 0.9;
pub const LINE_OPACITY_HOVERED: f32 = 0.45;

/// Smallest image scale handed to a renderer.
pub const MIN_IMAGE_SCALE: f32 = 1e-3;

/// Aspect ratio (width / height) used until the image reports its size.
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// Smallest base panel extent, so scale factors never divide by zero.
const MIN_PANEL_EXTENT: f32 = 1.0;

/// Measured bounds of the laid-out text block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl TextBounds {
    /// Bounds of a block of `size` with its origin at zero.
    pub fn from_size(size: Vec2) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: size.x,
            max_y: size.y,
        }
    }

    /// Width, never negative.
    pub fn width(&self) -> f32 {
        (self.max_x - self.min_x).max(0.0)
    }

    /// Height, never negative.
    pub fn height(&self) -> f32 {
        (self.max_y - self.min_y).max(0.0)
    }
}

/// Fixed spacing around the panel contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    /// Horizontal and vertical padding around the text block.
    pub padding: Vec2,
    /// Horizontal padding either side of the image.
    pub side_padding: f32,
    /// Gap between the text block and the image.
    pub gap: f32,
    /// Padding below the image.
    pub bottom_padding: f32,
    pub min_image_width: f32,
    pub max_image_width: f32,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            padding: Vec2::new(14.0, 10.0),
            side_padding: 14.0,
            gap: 10.0,
            bottom_padding: 14.0,
            min_image_width: 160.0,
            max_image_width: 260.0,
        }
    }
}

impl PanelLayout {
    /// Collapsed panel size for a text block.
    pub fn base_size(&self, text: TextBounds) -> Vec2 {
        let size = Vec2::new(text.width(), text.height()) + self.padding * 2.0;
        size.max(Vec2::splat(MIN_PANEL_EXTENT))
    }

    /// Image size inside a panel of the given base size.
    pub fn image_size(&self, base: Vec2, aspect: f32) -> Vec2 {
        let content_width = base.x - self.side_padding * 2.0;
        // max/min rather than clamp: a misconfigured min > max must not panic.
        let width = content_width
            .max(self.min_image_width)
            .min(self.max_image_width)
            .max(0.0);
        Vec2::new(width, width / sanitize_aspect(aspect))
    }
}

/// Per-callout configuration. Set once when the callout is created.
#[derive(Debug, Clone, PartialEq)]
pub struct CalloutConfig {
    /// Globe radius the anchor is projected onto.
    pub radius: f64,
    /// Anchor height above the surface.
    pub altitude: f64,
    /// Distance from anchor to label along the surface normal.
    pub label_offset: f32,
    /// Sideways bow of the leader line, as a fraction of `label_offset`.
    pub bow: f32,
    pub panel_color: Vec4,
    pub panel_opacity: f32,
    pub line_color: Vec4,
    pub pin_color: Vec4,
    pub title_color: Vec4,
    pub corner_radius: f32,
    pub layout: PanelLayout,
}

impl Default for CalloutConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            altitude: 0.015,
            label_offset: 0.35,
            bow: 0.25,
            panel_color: Vec4::new(0.03, 0.04, 0.06, 1.0),
            panel_opacity: 0.82,
            line_color: Vec4::ONE,
            pin_color: Vec4::new(1.0, 0.78, 0.35, 1.0),
            title_color: Vec4::ONE,
            corner_radius: 8.0,
            layout: PanelLayout::default(),
        }
    }
}

impl CalloutConfig {
    /// Leader line for an anchor projected with this config.
    pub fn leader_line(&self, anchor: Vec3) -> LeaderLine {
        LeaderLine::new(anchor, self.label_offset, self.bow)
    }

    /// A collapsed machine using this config's layout.
    pub fn machine(&self) -> CalloutExpansionMachine {
        CalloutExpansionMachine::new(self.layout)
    }
}

/// Panel geometry for a given open amount, before smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    /// Height added below the text block.
    pub extra_height: f32,
    /// Fully-open width.
    pub target_width: f32,
    pub width_scale: f32,
    pub height_scale: f32,
    /// Vertical offset of the panel centre (Y up). Keeps the top edge fixed.
    pub offset_y: f32,
}

/// Computes the panel geometry for `open` in [0, 1].
pub fn panel_geometry(base: Vec2, image: Vec2, layout: &PanelLayout, open: f32) -> PanelGeometry {
    let open = open.clamp(0.0, 1.0);
    let base = base.max(Vec2::splat(MIN_PANEL_EXTENT));

    let extra_height = ((image.y + layout.gap + layout.bottom_padding) * open).max(0.0);
    let target_width = base.x.max(image.x + layout.side_padding * 2.0);
    let width = base.x + (target_width - base.x) * open;

    PanelGeometry {
        extra_height,
        target_width,
        width_scale: width / base.x,
        height_scale: (base.y + extra_height) / base.y,
        offset_y: -extra_height / 2.0,
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        DEFAULT_ASPECT
    }
}

/// Outputs of one callout update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalloutFrame {
    /// How far open the panel is, in [0, 1].
    pub open_amount: f32,
    pub image_opacity: f32,
    /// Never below [`MIN_IMAGE_SCALE`].
    pub image_scale: f32,
    /// Title scale, from 1.0 collapsed to 1.22 hovered.
    pub title_scale: f32,
    pub line_opacity: f32,
    /// Follows `line_opacity`.
    pub pin_opacity: f32,
    /// Collapsed panel size.
    pub base_size: Vec2,
    /// Panel scale relative to `base_size`. Both components are at least 1.
    pub panel_scale: Vec2,
    /// Vertical offset of the panel centre (Y up).
    pub panel_offset_y: f32,
    /// Unscaled image size.
    pub image_size: Vec2,
}

impl CalloutFrame {
    /// Panel size to draw this frame.
    pub fn panel_size(&self) -> Vec2 {
        self.base_size * self.panel_scale
    }
}

/// One step of the per-tick evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Open amount follows the hover state.
    Open,
    /// Image opacity and scale follow the open amount.
    Image,
    /// Panel geometry follows the open amount.
    Panel,
    /// Title scale and line opacity follow the hover state.
    Accents,
}

/// Each stage only reads values produced by stages before it.
const TICK_ORDER: [Stage; 4] = [Stage::Open, Stage::Image, Stage::Panel, Stage::Accents];

/// Animates one callout between collapsed and expanded.
#[derive(Debug, Clone)]
pub struct CalloutExpansionMachine {
    layout: PanelLayout,
    text_bounds: TextBounds,
    aspect: Option<f32>,
    hovered: bool,
    open: Damped<f32>,
    image_opacity: Damped<f32>,
    image_scale: Damped<f32>,
    title_scale: Damped<f32>,
    line_opacity: Damped<f32>,
    panel_width_scale: Damped<f32>,
    panel_height_scale: Damped<f32>,
    panel_offset_y: Damped<f32>,
}

impl Default for CalloutExpansionMachine {
    fn default() -> Self {
        Self::new(PanelLayout::default())
    }
}

impl CalloutExpansionMachine {
    /// Creates a collapsed callout.
    pub fn new(layout: PanelLayout) -> Self {
        Self {
            layout,
            text_bounds: TextBounds::default(),
            aspect: None,
            hovered: false,
            open: Damped::new(0.0, OPEN_RATE),
            image_opacity: Damped::new(0.0, IMAGE_RATE),
            image_scale: Damped::new(0.0, IMAGE_RATE),
            title_scale: Damped::new(TITLE_SCALE_IDLE, TITLE_RATE),
            line_opacity: Damped::new(LINE_OPACITY_IDLE, LINE_RATE),
            panel_width_scale: Damped::new(1.0, PANEL_RATE),
            panel_height_scale: Damped::new(1.0, PANEL_RATE),
            panel_offset_y: Damped::new(0.0, PANEL_RATE),
        }
    }

    /// Spacing the panel is laid out with.
    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    /// Hover state from the latest update.
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Feeds new text measurements. The base panel size follows.
    pub fn set_text_bounds(&mut self, bounds: TextBounds) {
        self.text_bounds = bounds;
    }

    /// Feeds the natural size of the loaded image. Degenerate sizes are
    /// ignored and the current aspect is kept.
    pub fn set_image_size(&mut self, width: f32, height: f32) {
        let aspect = width / height;
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = Some(aspect);
        } else {
            tracing::debug!(width, height, "Ignoring degenerate image size");
        }
    }

    /// Aspect ratio in use: the image's once known, otherwise 16:9.
    pub fn image_aspect(&self) -> f32 {
        self.aspect.unwrap_or(DEFAULT_ASPECT)
    }

    /// Collapsed panel size for the current text.
    pub fn base_size(&self) -> Vec2 {
        self.layout.base_size(self.text_bounds)
    }

    /// Unscaled image size for the current text and aspect.
    pub fn image_size(&self) -> Vec2 {
        self.layout.image_size(self.base_size(), self.image_aspect())
    }

    /// Advances by `dt` seconds with the current hover state.
    pub fn update(&mut self, hovered: bool, dt: f32) -> CalloutFrame {
        if hovered != self.hovered {
            tracing::debug!(hovered, "Callout hover changed");
            self.hovered = hovered;
        }
        for stage in TICK_ORDER {
            self.run_stage(stage, dt);
        }
        self.snapshot()
    }

    fn run_stage(&mut self, stage: Stage, dt: f32) {
        match stage {
            Stage::Open => {
                let target = if self.hovered { 1.0 } else { 0.0 };
                self.open.follow(target, dt);
            }
            Stage::Image => {
                let open = self.open.value();
                self.image_opacity.follow(open, dt);
                self.image_scale.follow(open, dt);
            }
            Stage::Panel => {
                let geometry = panel_geometry(
                    self.base_size(),
                    self.image_size(),
                    &self.layout,
                    self.open.value(),
                );
                self.panel_width_scale.follow(geometry.width_scale, dt);
                self.panel_height_scale.follow(geometry.height_scale, dt);
                self.panel_offset_y.follow(geometry.offset_y, dt);
            }
            Stage::Accents => {
                let (title, line) = if self.hovered {
                    (TITLE_SCALE_HOVERED, LINE_OPACITY_HOVERED)
                } else {
                    (TITLE_SCALE_IDLE, LINE_OPACITY_IDLE)
                };
                self.title_scale.follow(title, dt);
                self.line_opacity.follow(line, dt);
            }
        }
    }

    /// Current outputs without advancing.
    pub fn snapshot(&self) -> CalloutFrame {
        let line_opacity = self.line_opacity.value();
        CalloutFrame {
            open_amount: self.open.value(),
            image_opacity: self.image_opacity.value(),
            image_scale: self.image_scale.value().max(MIN_IMAGE_SCALE),
            title_scale: self.title_scale.value(),
            line_opacity,
            pin_opacity: line_opacity,
            base_size: self.base_size(),
            panel_scale: Vec2::new(
                self.panel_width_scale.value().max(1.0),
                self.panel_height_scale.value().max(1.0),
            ),
            panel_offset_y: self.panel_offset_y.value(),
            image_size: self.image_size(),
        }
    }
}
