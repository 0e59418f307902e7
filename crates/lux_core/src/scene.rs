//! Scene types consumed by the ray tracer.
//!
//! Meshes live in an arena owned by [`Scene`]; objects point into it with
//! [`MeshId`] and add a world transform and a material. Lights and the
//! background complete the description.

use std::f32::consts::PI;
use std::sync::Arc;

use lux_math::{Aabb, Mat4, Mat4Ext, Quat, Vec2, Vec3};
use thiserror::Error;

use crate::mesh::{Mesh, MeshError};
use crate::texture::Texture;

/// Index of a mesh in [`Scene::meshes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// Inconsistencies reported by [`Scene::validate`].
#[derive(Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("object {object} references unknown mesh {mesh}")]
    UnknownMesh { object: usize, mesh: usize },

    #[error("mesh {mesh} is invalid: {source}")]
    InvalidMesh {
        mesh: usize,
        #[source]
        source: MeshError,
    },
}

/// Surface description: a base color texture and two-sidedness.
#[derive(Clone, Debug)]
pub struct Material {
    /// Material name
    pub name: String,

    /// Base color texture, sRGB-encoded
    pub base_color: Arc<Texture>,

    /// Shade back faces with the flipped normal instead of leaving them dark
    pub two_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", Vec3::splat(0.5))
    }
}

impl Material {
    /// Create a new material with a constant (sRGB-encoded) base color.
    pub fn new(name: impl Into<String>, base_color: Vec3) -> Self {
        Self::textured(name, Arc::new(Texture::solid_color(base_color)))
    }

    /// Create a material sampling a base color texture.
    pub fn textured(name: impl Into<String>, base_color: Arc<Texture>) -> Self {
        Self {
            name: name.into(),
            base_color,
            two_sided: false,
        }
    }

    /// Set the two-sided flag.
    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation (as quaternion)
    pub rotation: Quat,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// A placed mesh: mesh reference, object-to-world matrix, material.
#[derive(Clone, Debug)]
pub struct Object {
    pub name: String,
    pub mesh: MeshId,
    pub transform: Mat4,
    pub material: Material,
}

impl Object {
    pub fn new(name: impl Into<String>, mesh: MeshId, transform: Mat4, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform,
            material,
        }
    }
}

/// Light descriptor. Visibility is evaluated by the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    /// Infinitely distant light shining along `direction`.
    Directional { direction: Vec3, color: Vec3 },

    /// Omni light with a finite sphere of influence of `radius`.
    Point {
        position: Vec3,
        color: Vec3,
        radius: f32,
    },
}

impl Light {
    /// Directional light travelling along `direction` (normalized here).
    pub fn directional(direction: Vec3, color: Vec3) -> Self {
        Light::Directional {
            direction: direction.normalize_or_zero(),
            color,
        }
    }

    pub fn point(position: Vec3, color: Vec3, radius: f32) -> Self {
        Light::Point {
            position,
            color,
            radius,
        }
    }

    /// RGB intensity of the light.
    pub fn intensity(&self) -> Vec3 {
        match *self {
            Light::Directional { color, .. } | Light::Point { color, .. } => color,
        }
    }
}

/// What a camera ray sees when it leaves the scene.
#[derive(Clone, Debug)]
pub enum Background {
    /// Constant linear radiance.
    Color(Vec3),

    /// Equirectangular environment image, sRGB-encoded.
    Image(Arc<Texture>),
}

impl Default for Background {
    fn default() -> Self {
        Background::Color(Vec3::ZERO)
    }
}

impl Background {
    /// Linear radiance seen along the unit `direction`.
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        match self {
            Background::Color(color) => *color,
            Background::Image(texture) => texture.sample_linear(equirectangular_uv(direction)),
        }
    }
}

/// Longitude/latitude parameterization: -Z at the horizontal center, +Y at the top.
pub fn equirectangular_uv(direction: Vec3) -> Vec2 {
    let d = direction.normalize_or_zero();
    let u = 0.5 + d.x.atan2(-d.z) / (2.0 * PI);
    let v = 0.5 + d.y.clamp(-1.0, 1.0).asin() / PI;
    Vec2::new(u, v)
}

/// A complete scene: mesh arena, objects, lights and background.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Scene name (usually from filename)
    pub name: String,

    /// Mesh arena, indexed by [`MeshId`]
    pub meshes: Vec<Mesh>,

    /// Placed meshes
    pub objects: Vec<Object>,

    pub lights: Vec<Light>,

    pub background: Background,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a mesh to the arena and return its id.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    /// Add an object and return its index.
    pub fn add_object(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Get a mesh by id.
    ///
    /// Panics on an id that does not come from this scene.
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0]
    }

    /// Check that every object references a valid mesh and that every
    /// mesh is well-formed.
    pub fn validate(&self) -> Result<(), SceneError> {
        for (index, mesh) in self.meshes.iter().enumerate() {
            mesh.validate()
                .map_err(|source| SceneError::InvalidMesh { mesh: index, source })?;
        }
        for (index, object) in self.objects.iter().enumerate() {
            if object.mesh.0 >= self.meshes.len() {
                return Err(SceneError::UnknownMesh {
                    object: index,
                    mesh: object.mesh.0,
                });
            }
        }
        Ok(())
    }

    /// Get total triangle count across all objects.
    pub fn total_triangle_count(&self) -> usize {
        self.objects
            .iter()
            .filter_map(|object| self.meshes.get(object.mesh.0))
            .map(Mesh::triangle_count)
            .sum()
    }

    /// Compute the world-space bounding box of all objects.
    pub fn world_bounds(&self) -> Aabb {
        self.objects
            .iter()
            .filter_map(|object| {
                let mesh = self.meshes.get(object.mesh.0)?;
                Some(object.transform.transform_aabb(&mesh.bounds))
            })
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_mesh() -> Mesh {
        Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]], None)
    }

    #[test]
    fn test_scene_creation() {
        let mut scene = Scene::new("test");
        let mesh = scene.add_mesh(triangle_mesh());
        assert_eq!(mesh, MeshId(0));

        scene.add_object(Object::new("a", mesh, Mat4::IDENTITY, Material::default()));
        scene.add_object(Object::new(
            "b",
            mesh,
            Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)),
            Material::default(),
        ));

        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.total_triangle_count(), 2);
        assert!(scene.validate().is_ok());

        let bounds = scene.world_bounds();
        assert!((bounds.x.max - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_validate_unknown_mesh() {
        let mut scene = Scene::new("broken");
        scene.add_object(Object::new("a", MeshId(3), Mat4::IDENTITY, Material::default()));

        assert_eq!(
            scene.validate(),
            Err(SceneError::UnknownMesh { object: 0, mesh: 3 })
        );
    }

    #[test]
    fn test_empty_scene_bounds() {
        assert!(Scene::new("empty").world_bounds().is_empty());
    }

    #[test]
    fn test_transform_scales_then_rotates_then_translates() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::new(2.0, 1.0, 1.0),
        };

        let moved = transform.to_matrix().transform_point3(Vec3::X);
        assert!((moved - Vec3::new(1.0, 2.0, 1.0)).length() < 0.001);
        assert_eq!(Transform::default().to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_light_intensity_and_normalization() {
        let light = Light::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::ONE);
        assert_eq!(light.intensity(), Vec3::ONE);
        match light {
            Light::Directional { direction, .. } => assert_eq!(direction, -Vec3::Y),
            Light::Point { .. } => unreachable!(),
        }

        let point = Light::point(Vec3::ZERO, Vec3::new(2.0, 1.0, 0.5), 4.0);
        assert_eq!(point.intensity(), Vec3::new(2.0, 1.0, 0.5));
    }

    #[test]
    fn test_equirectangular_uv() {
        let forward = equirectangular_uv(-Vec3::Z);
        assert!((forward - Vec2::new(0.5, 0.5)).length() < 1e-5);

        let up = equirectangular_uv(Vec3::Y);
        assert!((up.y - 1.0).abs() < 1e-5);

        let right = equirectangular_uv(Vec3::X);
        assert!((right.x - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_background_color_is_exact() {
        let background = Background::Color(Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(background.sample(Vec3::X), Vec3::new(0.1, 0.2, 0.3));
    }
}
