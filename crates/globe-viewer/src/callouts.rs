//! Landmark callouts painted over the globe.
//!
//! Each landmark gets a pin on the surface, a bowed leader line out to its
//! label, and a panel with the title. Hovering the panel or pin opens it to
//! reveal the landmark's image. Callouts on the far side of the globe are
//! hidden and collapse.

use bevy::{asset::LoadState, prelude::*};
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};
use globe_anim::{AnchorCache, CalloutConfig, CalloutExpansionMachine, GeoCoordinate, TextBounds};

use crate::{
    camera::OrbitCamera,
    globe::GLOBE_RADIUS,
    landmarks::Landmark,
    launch_params::LaunchParams,
    loading::{LoadingOverlay, TrackedAssets},
    paint,
};

const TITLE_FONT_SIZE: f32 = 15.0;
const SUBTITLE_FONT_SIZE: f32 = 11.0;
/// Vertical gap between title and subtitle.
const TEXT_GAP: f32 = 2.0;
const LEADER_SEGMENTS: usize = 16;
const LEADER_WIDTH: f32 = 1.5;
const PIN_RADIUS: f32 = 3.5;
/// Pointer distance from the pin that still counts as hovering.
const PIN_HIT_RADIUS: f32 = 10.0;
/// Slack around the panel for hover testing.
const PANEL_HIT_MARGIN: f32 = 4.0;
/// Gap between the label point and the panel's left edge.
const PANEL_NUDGE: f32 = 6.0;
/// Image opacity below which the image is not drawn at all.
const MIN_VISIBLE_OPACITY: f32 = 0.01;
const IMAGE_CORNER_RADIUS: f32 = 4.0;
const PLACEHOLDER_COLOR: Vec4 = Vec4::new(1.0, 1.0, 1.0, 0.08);

pub struct CalloutPlugin;

impl Plugin for CalloutPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_callouts)
            .add_systems(EguiPrimaryContextPass, draw_callouts);
    }
}

/// Texture state for a callout's image.
enum CalloutImage {
    None,
    Pending(Handle<Image>),
    Ready(egui::TextureHandle),
    /// Failed to load or in a format egui can't take.
    Unavailable,
}

/// A landmark annotation.
#[derive(Component)]
pub struct Callout {
    title: String,
    subtitle: String,
    coordinate: GeoCoordinate,
    config: CalloutConfig,
    machine: CalloutExpansionMachine,
    anchor: AnchorCache,
    image: CalloutImage,
    /// Unscaled title height, once the text has been laid out.
    title_height: Option<f32>,
    /// Where the panel and pin were drawn last frame, for hover testing.
    panel_rect: Option<egui::Rect>,
    pin: Option<egui::Pos2>,
}

impl Callout {
    fn new(landmark: &Landmark, config: CalloutConfig, image: Option<Handle<Image>>) -> Self {
        Self {
            title: landmark.name.clone(),
            subtitle: landmark.subtitle.clone(),
            coordinate: landmark.coordinate,
            machine: config.machine(),
            config,
            anchor: AnchorCache::default(),
            image: image.map_or(CalloutImage::None, CalloutImage::Pending),
            title_height: None,
            panel_rect: None,
            pin: None,
        }
    }

    /// Anchor position on the globe.
    fn anchor(&mut self) -> Vec3 {
        self.anchor
            .resolve(self.coordinate, self.config.radius, self.config.altitude)
            .as_vec3()
    }

    fn hit_test(&self, pointer: egui::Pos2) -> bool {
        let over_panel = self
            .panel_rect
            .is_some_and(|rect| rect.expand(PANEL_HIT_MARGIN).contains(pointer));
        let over_pin = self
            .pin
            .is_some_and(|pin| pin.distance(pointer) <= PIN_HIT_RADIUS);
        over_panel || over_pin
    }

    /// Lays out the text once and hands its bounds to the machine.
    fn measure_text(&mut self, painter: &egui::Painter) {
        if self.title_height.is_some() {
            return;
        }
        let title = painter.layout_no_wrap(
            self.title.clone(),
            title_font(1.0),
            egui::Color32::WHITE,
        );
        let mut size = title.size();
        if !self.subtitle.is_empty() {
            let subtitle = painter.layout_no_wrap(
                self.subtitle.clone(),
                subtitle_font(),
                egui::Color32::WHITE,
            );
            size.x = size.x.max(subtitle.size().x);
            size.y += TEXT_GAP + subtitle.size().y;
        }
        self.machine
            .set_text_bounds(TextBounds::from_size(Vec2::new(size.x, size.y)));
        self.title_height = Some(title.size().y);
    }

    /// Picks up the image once it has loaded.
    #[allow(clippy::cast_precision_loss)]
    fn refresh_image(&mut self, ctx: &egui::Context, images: &Assets<Image>, asset_server: &AssetServer) {
        let CalloutImage::Pending(handle) = &self.image else {
            return;
        };
        if let Some(image) = images.get(handle) {
            self.machine
                .set_image_size(image.width() as f32, image.height() as f32);
            self.image = upload_texture(ctx, &self.title, image)
                .map_or(CalloutImage::Unavailable, CalloutImage::Ready);
        } else if matches!(asset_server.load_state(handle.id()), LoadState::Failed(_)) {
            self.image = CalloutImage::Unavailable;
        }
    }
}

fn title_font(scale: f32) -> egui::FontId {
    egui::FontId::proportional(TITLE_FONT_SIZE * scale)
}

fn subtitle_font() -> egui::FontId {
    egui::FontId::proportional(SUBTITLE_FONT_SIZE)
}

/// Copies a loaded RGBA8 image into an egui texture.
fn upload_texture(ctx: &egui::Context, name: &str, image: &Image) -> Option<egui::TextureHandle> {
    let size = [image.width() as usize, image.height() as usize];
    let data = image.data.as_ref()?;
    if data.len() != size[0] * size[1] * 4 {
        tracing::warn!(
            "Image for {name} is not RGBA8 ({} bytes for {}x{}); showing a placeholder",
            data.len(),
            size[0],
            size[1]
        );
        return None;
    }
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, data);
    Some(ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR))
}

/// Whether a point on the globe's surface is on the hemisphere facing the
/// camera.
fn faces_camera(anchor: Vec3, camera_position: Vec3) -> bool {
    anchor.normalize_or_zero().dot(camera_position - anchor) > 0.0
}

fn spawn_callouts(
    mut commands: Commands,
    params: Res<LaunchParams>,
    asset_server: Res<AssetServer>,
    mut tracked: ResMut<TrackedAssets>,
) {
    let config = CalloutConfig {
        radius: f64::from(GLOBE_RADIUS),
        ..default()
    };

    for landmark in &params.landmarks {
        let image = landmark.image.as_ref().map(|path| {
            let handle: Handle<Image> = asset_server.load(path.clone());
            tracked.track(path.clone(), handle.clone());
            handle
        });
        commands.spawn(Callout::new(landmark, config.clone(), image));
    }

    tracing::info!("Spawned {} callouts", params.landmarks.len());
}

#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
fn draw_callouts(
    mut contexts: EguiContexts,
    time: Res<Time>,
    images: Res<Assets<Image>>,
    asset_server: Res<AssetServer>,
    overlay: Option<Res<LoadingOverlay>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<OrbitCamera>>,
    mut callouts: Query<&mut Callout>,
) -> Result {
    let ctx = contexts.ctx_mut()?.clone();
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return Ok(());
    };

    let dt = time.delta_secs();
    let input_blocked = overlay.is_some_and(|overlay| overlay.blocks_input());
    let pointer = ctx.pointer_hover_pos();
    let camera_position = camera_transform.translation();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("callouts"),
    ));
    let to_screen = |point: Vec3| {
        camera
            .world_to_viewport(camera_transform, point)
            .ok()
            .map(paint::pos2)
    };

    let mut any_hovered = false;
    for mut callout in &mut callouts {
        let callout = &mut *callout;
        callout.refresh_image(&ctx, &images, &asset_server);
        callout.measure_text(&painter);

        let anchor = callout.anchor();
        let line = callout.config.leader_line(anchor);
        let label = if faces_camera(anchor, camera_position) {
            to_screen(line.label)
        } else {
            None
        };

        let hovered = !input_blocked
            && label.is_some()
            && pointer.is_some_and(|pointer| callout.hit_test(pointer));
        any_hovered |= hovered;
        let frame = callout.machine.update(hovered, dt);

        let Some(label) = label else {
            callout.panel_rect = None;
            callout.pin = None;
            continue;
        };
        let config = &callout.config;

        let leader: Option<Vec<egui::Pos2>> = line
            .points(LEADER_SEGMENTS)
            .into_iter()
            .map(&to_screen)
            .collect();
        if let Some(points) = leader {
            painter.add(egui::Shape::line(
                points,
                egui::Stroke::new(LEADER_WIDTH, paint::color32(config.line_color, frame.line_opacity)),
            ));
        }

        callout.pin = to_screen(line.anchor);
        if let Some(pin) = callout.pin {
            painter.circle_filled(pin, PIN_RADIUS, paint::color32(config.pin_color, frame.pin_opacity));
        }

        // The panel's left edge stays on the label. Y is up in panel space.
        let size = frame.panel_size();
        let panel = egui::Rect::from_center_size(
            egui::pos2(label.x + PANEL_NUDGE + size.x / 2.0, label.y - frame.panel_offset_y),
            paint::vec2(size),
        );
        painter.rect_filled(
            panel,
            config.corner_radius,
            paint::color32(config.panel_color, config.panel_opacity),
        );
        callout.panel_rect = Some(panel);

        let layout = callout.machine.layout();
        let text_origin = panel.min + paint::vec2(layout.padding);
        let title_color = paint::color32(config.title_color, 1.0);
        painter.text(
            text_origin,
            egui::Align2::LEFT_TOP,
            &callout.title,
            title_font(frame.title_scale),
            title_color,
        );
        if !callout.subtitle.is_empty() {
            let title_height = callout.title_height.unwrap_or(TITLE_FONT_SIZE);
            painter.text(
                text_origin + egui::vec2(0.0, title_height * frame.title_scale + TEXT_GAP),
                egui::Align2::LEFT_TOP,
                &callout.subtitle,
                subtitle_font(),
                title_color.gamma_multiply(0.7),
            );
        }

        if frame.image_opacity > MIN_VISIBLE_OPACITY {
            let slot = egui::Rect::from_min_size(
                egui::pos2(
                    panel.left() + layout.side_padding,
                    panel.top() + frame.base_size.y + layout.gap,
                ),
                paint::vec2(frame.image_size),
            );
            let rect = egui::Rect::from_center_size(slot.center(), slot.size() * frame.image_scale);
            let clipped = painter.with_clip_rect(panel);
            match &callout.image {
                CalloutImage::Ready(texture) => {
                    clipped.image(
                        texture.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE.gamma_multiply(frame.image_opacity),
                    );
                }
                _ => {
                    clipped.rect_filled(
                        rect,
                        IMAGE_CORNER_RADIUS,
                        paint::color32(PLACEHOLDER_COLOR, frame.image_opacity),
                    );
                }
            }
        }
    }

    if any_hovered {
        ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    Ok(())
}
