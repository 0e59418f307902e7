//! Scenes that ship with the renderer, addressed as `builtin:<name>`.

use lux_math::Vec3;

use crate::loader::{
    BackgroundDesc, CameraSettings, LightDesc, MaterialDesc, MeshSource, ObjectDesc, Primitive,
    SceneFile, TransformDesc,
};

/// Names accepted by [`builtin_scene`].
pub const BUILTIN_SCENES: &[&str] = &["cornell"];

/// Look up a built-in scene by name.
pub fn builtin_scene(name: &str) -> Option<SceneFile> {
    match name {
        "cornell" => Some(cornell_box()),
        _ => None,
    }
}

fn object(
    name: &str,
    primitive: Primitive,
    translation: Vec3,
    rotation_degrees: Vec3,
    scale: Vec3,
    color: Vec3,
) -> ObjectDesc {
    ObjectDesc {
        name: Some(name.to_string()),
        mesh: MeshSource::Primitive(primitive),
        transform: TransformDesc {
            translation,
            rotation_degrees,
            scale,
        },
        material: MaterialDesc {
            color: Some(color),
            texture: None,
            two_sided: primitive == Primitive::Quad,
        },
    }
}

/// A 2x2x2 room open towards +Z with a red left wall, a green right wall,
/// two boxes and a point light under the ceiling.
pub fn cornell_box() -> SceneFile {
    let white = Vec3::splat(0.73);
    let red = Vec3::new(0.65, 0.05, 0.05);
    let green = Vec3::new(0.12, 0.45, 0.15);
    let wall = Vec3::new(2.0, 2.0, 1.0);

    let objects = vec![
        object("floor", Primitive::Quad, Vec3::ZERO, Vec3::new(-90.0, 0.0, 0.0), wall, white),
        object(
            "ceiling",
            Primitive::Quad,
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(90.0, 0.0, 0.0),
            wall,
            white,
        ),
        object("back", Primitive::Quad, Vec3::new(0.0, 1.0, -1.0), Vec3::ZERO, wall, white),
        object(
            "left",
            Primitive::Quad,
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(0.0, 90.0, 0.0),
            wall,
            red,
        ),
        object(
            "right",
            Primitive::Quad,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, -90.0, 0.0),
            wall,
            green,
        ),
        object(
            "tall_box",
            Primitive::Cube,
            Vec3::new(-0.35, 0.6, -0.35),
            Vec3::new(0.0, 20.0, 0.0),
            Vec3::new(0.6, 1.2, 0.6),
            white,
        ),
        object(
            "short_box",
            Primitive::Cube,
            Vec3::new(0.4, 0.3, 0.3),
            Vec3::new(0.0, -18.0, 0.0),
            Vec3::splat(0.6),
            white,
        ),
    ];

    SceneFile {
        name: Some("cornell".to_string()),
        camera: CameraSettings {
            position: Vec3::new(0.0, 1.0, 3.4),
            target: Vec3::new(0.0, 1.0, 0.0),
            fov_y: 0.8,
            ..CameraSettings::default()
        },
        background: BackgroundDesc::Color(Vec3::ZERO),
        lights: vec![LightDesc::Point {
            position: Vec3::new(0.0, 1.9, 0.0),
            color: Vec3::splat(2.5),
            radius: 4.0,
        }],
        objects,
        render: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_cornell_builds() {
        let scene = builtin_scene("cornell").unwrap().build(Path::new(".")).unwrap();
        assert_eq!(scene.objects.len(), 7);
        // One quad and one cube in the arena
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.total_triangle_count(), 5 * 2 + 2 * 12);
        assert_eq!(scene.lights.len(), 1);
        assert!(scene.validate().is_ok());

        let bounds = scene.world_bounds();
        assert!((bounds.min() - Vec3::new(-1.0, 0.0, -1.0)).abs().max_element() < 1e-3);
        assert!((bounds.max() - Vec3::new(1.0, 2.0, 1.0)).abs().max_element() < 1e-3);
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_scene("sponza").is_none());
    }
}
