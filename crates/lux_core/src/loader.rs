//! JSON scene descriptions.
//!
//! A scene file lists objects (OBJ files or built-in primitives with a
//! transform and material), lights, the background, the camera and optional
//! render settings:
//!
//! ```json
//! {
//!   "camera": { "position": [0, 1, 2.5], "target": [0, 1, 1.5], "fov_y": 1.3 },
//!   "background": { "color": [0.1, 0.1, 0.15] },
//!   "lights": [ { "type": "point", "position": [0, 1.9, 0], "color": [2, 2, 2], "radius": 4 } ],
//!   "objects": [
//!     { "mesh": { "obj": "bunny.obj" }, "material": { "color": [0.8, 0.8, 0.8] } },
//!     { "mesh": { "primitive": "quad" }, "transform": { "scale": [4, 4, 1] },
//!       "material": { "texture": "floor.png", "two_sided": true } }
//!   ],
//!   "render": { "width": 640, "height": 480, "samples": 16, "depth": 5 }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lux_math::{Camera, EulerRot, Quat, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::mesh::{Mesh, MeshError};
use crate::obj::load_obj;
use crate::scene::{Background, Light, Material, MeshId, Object, Scene, Transform};
use crate::texture::{TextureCache, TextureError};

/// Errors that can occur while loading scene assets.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse OBJ {path}: {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("Mesh '{name}' is invalid: {source}")]
    InvalidMesh {
        name: String,
        #[source]
        source: MeshError,
    },

    #[error("No geometry found in {0}")]
    NoGeometry(String),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Top-level scene file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub background: BackgroundDesc,
    #[serde(default)]
    pub lights: Vec<LightDesc>,
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
    #[serde(default)]
    pub render: RenderSettings,
}

/// Camera pose and lens. `fov_y` is the vertical field of view in radians.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSettings {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 2.5),
            target: Vec3::new(0.0, 1.0, 1.5),
            up: Vec3::Y,
            fov_y: 1.3,
            near: 0.01,
            far: 100.0,
        }
    }
}

impl CameraSettings {
    /// Build a camera for an image of the given aspect ratio.
    pub fn to_camera(&self, aspect: f32) -> Camera {
        Camera::new(self.position, self.target, aspect)
            .pose(self.position, self.target, self.up)
            .projection(aspect, self.fov_y, self.near, self.far)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum BackgroundDesc {
    Color(Vec3),
    Image(String),
}

impl Default for BackgroundDesc {
    fn default() -> Self {
        BackgroundDesc::Color(Vec3::ZERO)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum LightDesc {
    Directional {
        direction: Vec3,
        color: Vec3,
    },
    Point {
        position: Vec3,
        color: Vec3,
        radius: f32,
    },
}

impl From<&LightDesc> for Light {
    fn from(desc: &LightDesc) -> Self {
        match *desc {
            LightDesc::Directional { direction, color } => Light::directional(direction, color),
            LightDesc::Point {
                position,
                color,
                radius,
            } => Light::point(position, color, radius),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDesc {
    #[serde(default)]
    pub name: Option<String>,
    pub mesh: MeshSource,
    #[serde(default)]
    pub transform: TransformDesc,
    #[serde(default)]
    pub material: MaterialDesc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum MeshSource {
    /// Path to an OBJ file, relative to the scene file
    Obj(String),
    Primitive(Primitive),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Quad,
    Cube,
    Sphere,
}

impl Primitive {
    pub fn mesh(self) -> Mesh {
        match self {
            Primitive::Quad => Mesh::quad(),
            Primitive::Cube => Mesh::cube(),
            Primitive::Sphere => Mesh::uv_sphere(32, 16),
        }
    }
}

/// Scale, then rotate (XYZ Euler angles in degrees), then translate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformDesc {
    pub translation: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl From<&TransformDesc> for Transform {
    fn from(desc: &TransformDesc) -> Self {
        let r = desc.rotation_degrees;
        Transform {
            translation: desc.translation,
            rotation: Quat::from_euler(
                EulerRot::XYZ,
                r.x.to_radians(),
                r.y.to_radians(),
                r.z.to_radians(),
            ),
            scale: desc.scale,
        }
    }
}

/// Constant color (sRGB-encoded) or texture path; texture wins when both are set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaterialDesc {
    pub color: Option<Vec3>,
    pub texture: Option<String>,
    pub two_sided: bool,
}

/// Optional render parameters; command-line flags override them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub samples: Option<u32>,
    pub depth: Option<u32>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
}

impl SceneFile {
    /// Read and parse a scene file.
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut file = Self::parse(&text)?;
        if file.name.is_none() {
            file.name = path.file_stem().map(|s| s.to_string_lossy().to_string());
        }
        Ok(file)
    }

    /// Parse a scene description from JSON text.
    pub fn parse(text: &str) -> LoadResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load the referenced assets and assemble a [`Scene`].
    ///
    /// Relative paths resolve against `base_dir`. Each OBJ file and each
    /// primitive kind is loaded once and shared by every object using it.
    pub fn build(&self, base_dir: &Path) -> LoadResult<Scene> {
        let mut scene = Scene::new(self.name.clone().unwrap_or_else(|| "unnamed".to_string()));
        let mut textures = TextureCache::with_base_dir(base_dir);
        let mut mesh_cache: HashMap<MeshSource, Vec<MeshId>> = HashMap::new();

        for (index, desc) in self.objects.iter().enumerate() {
            let name = desc.name.clone().unwrap_or_else(|| format!("object{index}"));

            let mesh_ids = match mesh_cache.get(&desc.mesh) {
                Some(ids) => ids.clone(),
                None => {
                    let meshes = match &desc.mesh {
                        MeshSource::Obj(path) => load_obj(base_dir.join(path))?,
                        MeshSource::Primitive(primitive) => vec![primitive.mesh()],
                    };
                    let mut ids = Vec::with_capacity(meshes.len());
                    for mesh in meshes {
                        mesh.validate().map_err(|source| LoadError::InvalidMesh {
                            name: name.clone(),
                            source,
                        })?;
                        ids.push(scene.add_mesh(mesh));
                    }
                    mesh_cache.insert(desc.mesh.clone(), ids.clone());
                    ids
                }
            };

            let material = match (&desc.material.texture, desc.material.color) {
                (Some(path), _) => Material::textured(name.clone(), textures.load(path)?),
                (None, Some(color)) => Material::new(name.clone(), color),
                (None, None) => Material {
                    name: name.clone(),
                    ..Material::default()
                },
            }
            .with_two_sided(desc.material.two_sided);

            let transform = Transform::from(&desc.transform).to_matrix();
            for mesh in mesh_ids {
                scene.add_object(Object::new(name.clone(), mesh, transform, material.clone()));
            }
        }

        scene.lights = self.lights.iter().map(Light::from).collect();
        scene.background = match &self.background {
            BackgroundDesc::Color(color) => Background::Color(*color),
            BackgroundDesc::Image(path) => Background::Image(textures.load(path)?),
        };

        log::info!(
            "Built scene '{}': {} meshes, {} objects, {} triangles, {} lights, {} textures",
            scene.name,
            scene.meshes.len(),
            scene.objects.len(),
            scene.total_triangle_count(),
            scene.lights.len(),
            textures.len()
        );

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE_JSON: &str = r#"{
        "name": "test",
        "camera": { "position": [0, 0, 3], "target": [0, 0, 0] },
        "background": { "color": [0.1, 0.2, 0.3] },
        "lights": [
            { "type": "directional", "direction": [0, 0, -1], "color": [1, 1, 1] },
            { "type": "point", "position": [0, 2, 0], "color": [3, 3, 3], "radius": 5 }
        ],
        "objects": [
            { "name": "floor", "mesh": { "primitive": "quad" },
              "transform": { "rotation_degrees": [-90, 0, 0], "scale": [4, 4, 1] },
              "material": { "color": [0.8, 0.8, 0.8], "two_sided": true } },
            { "mesh": { "primitive": "cube" }, "transform": { "translation": [0, 0.5, 0] } },
            { "mesh": { "primitive": "cube" }, "transform": { "translation": [2, 0.5, 0] } }
        ],
        "render": { "width": 64, "samples": 4 }
    }"#;

    #[test]
    fn test_parse_and_build() {
        let file = SceneFile::parse(SCENE_JSON).unwrap();
        assert_eq!(file.camera.position, Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(file.camera.fov_y, CameraSettings::default().fov_y);
        assert_eq!(file.render.width, Some(64));
        assert_eq!(file.render.height, None);

        let scene = file.build(Path::new(".")).unwrap();
        assert_eq!(scene.name, "test");
        assert_eq!(scene.objects.len(), 3);
        // Both cubes share one arena entry
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.objects[1].mesh, scene.objects[2].mesh);
        assert_eq!(scene.objects[1].name, "object1");
        assert!(scene.objects[0].material.two_sided);
        assert_eq!(scene.lights.len(), 2);
        assert!(matches!(scene.background, Background::Color(c) if c == Vec3::new(0.1, 0.2, 0.3)));
        assert!(scene.validate().is_ok());

        // The floor quad was rotated to face +Y
        let floor = &scene.objects[0];
        let n = floor.transform.transform_vector3(Vec3::Z).normalize();
        assert!((n - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = SceneFile::parse(r#"{ "objets": [] }"#);
        assert!(matches!(result, Err(LoadError::Json(_))));
    }

    #[test]
    fn test_missing_texture_is_reported() {
        let file = SceneFile::parse(
            r#"{ "objects": [ { "mesh": { "primitive": "quad" }, "material": { "texture": "nope.png" } } ] }"#,
        )
        .unwrap();
        let result = file.build(Path::new("/nonexistent-lux-dir"));
        assert!(matches!(result, Err(LoadError::Texture(_))));
    }

    #[test]
    fn test_camera_settings_to_camera() {
        let camera = CameraSettings::default().to_camera(2.0);
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(camera.fov_y, 1.3);
        assert_eq!(camera.position, Vec3::new(0.0, 1.0, 2.5));
    }
}
