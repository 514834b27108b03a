//! The textured globe and its sun.

use std::f32::consts::PI;

use bevy::{light::light_consts::lux, prelude::*};

use crate::{loading::TrackedAssets, time_of_day::Sun};

/// Globe radius in world units. Callout anchors are projected onto this.
pub const GLOBE_RADIUS: f32 = 2.0;

/// Equirectangular day texture.
const DAY_TEXTURE: &str = "textures/earth_day.jpg";

pub struct GlobePlugin;

impl Plugin for GlobePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_globe);
    }
}

/// UV sphere resolution.
const SECTORS: u32 = 96;
const STACKS: u32 = 48;

/// Marker for the globe mesh.
#[derive(Component)]
pub struct Globe;

/// Turns the UV sphere (poles on ±Z, texture seam on +X) into the projection
/// frame: north on +Y, seam on -X. Maps +X to -X, +Y to +Z and +Z to +Y.
pub fn globe_rotation() -> Quat {
    Quat::from_axis_angle(Vec3::new(0.0, 1.0, 1.0).normalize(), PI)
}

fn globe_mesh() -> Mesh {
    Sphere::new(GLOBE_RADIUS).mesh().uv(SECTORS, STACKS)
}

fn spawn_globe(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut tracked: ResMut<TrackedAssets>,
) {
    let day_texture: Handle<Image> = asset_server.load(DAY_TEXTURE);
    tracked.track(DAY_TEXTURE, day_texture.clone());

    commands.spawn((
        Globe,
        Mesh3d(meshes.add(globe_mesh())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color_texture: Some(day_texture),
            perceptual_roughness: 0.85,
            reflectance: 0.2,
            ..default()
        })),
        Transform::from_rotation(globe_rotation()),
    ));

    // The direction is set each frame by the time-of-day system.
    commands.spawn((
        Sun,
        DirectionalLight {
            color: Color::WHITE,
            illuminance: lux::AMBIENT_DAYLIGHT,
            ..default()
        },
        Transform::default(),
    ));
}

#[cfg(test)]
mod tests {
    use bevy::mesh::VertexAttributeValues;
    use globe_anim::project;

    use super::*;
    use crate::landmarks;

    /// Rotated vertex whose texture coordinate is nearest `uv`.
    fn vertex_at_uv(mesh: &Mesh, uv: Vec2) -> Vec3 {
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("sphere mesh has no positions");
        };
        let Some(VertexAttributeValues::Float32x2(uvs)) = mesh.attribute(Mesh::ATTRIBUTE_UV_0)
        else {
            panic!("sphere mesh has no uvs");
        };
        let nearest = uvs
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = Vec2::from(**a).distance_squared(uv);
                let db = Vec2::from(**b).distance_squared(uv);
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
            .unwrap();
        globe_rotation() * Vec3::from(positions[nearest])
    }

    #[test]
    fn test_rotation_maps_axes() {
        let rotation = globe_rotation();
        assert!((rotation * Vec3::X + Vec3::X).length() < 1e-6);
        assert!((rotation * Vec3::Y - Vec3::Z).length() < 1e-6);
        assert!((rotation * Vec3::Z - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_north_pole_is_up() {
        let mesh = globe_mesh();
        let pole = vertex_at_uv(&mesh, Vec2::new(0.5, 0.0));
        assert!((pole - Vec3::Y * GLOBE_RADIUS).length() < 1e-4, "{pole}");
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn test_texture_matches_projection() {
        // One-degree grid, so the nearest vertex is well within a degree.
        let mesh = Sphere::new(GLOBE_RADIUS).mesh().uv(360, 180);
        for landmark in landmarks::builtin() {
            let coordinate = landmark.coordinate;
            let uv = Vec2::new(
                ((coordinate.longitude + 180.0) / 360.0) as f32,
                ((90.0 - coordinate.latitude) / 180.0) as f32,
            );
            let on_mesh = vertex_at_uv(&mesh, uv);
            let anchor = project(
                coordinate.latitude,
                coordinate.longitude,
                f64::from(GLOBE_RADIUS),
                0.0,
            )
            .as_vec3();
            let degrees = on_mesh.angle_between(anchor).to_degrees();
            assert!(degrees < 1.0, "{}: {degrees} degrees off", landmark.name);
        }
    }
}
