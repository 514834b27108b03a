//! Shared egui painting helpers.

use bevy_egui::egui;
use glam::Vec4;

/// Converts a linear RGBA colour to egui, scaling its alpha by `opacity`.
pub fn color32(color: Vec4, opacity: f32) -> egui::Color32 {
    let alpha = (color.w * opacity).clamp(0.0, 1.0);
    egui::Rgba::from_rgba_unmultiplied(color.x, color.y, color.z, alpha).into()
}

pub fn pos2(v: glam::Vec2) -> egui::Pos2 {
    egui::pos2(v.x, v.y)
}

pub fn vec2(v: glam::Vec2) -> egui::Vec2 {
    egui::vec2(v.x, v.y)
}
