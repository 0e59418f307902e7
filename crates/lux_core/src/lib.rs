//! Lux Core - scene description and asset loading for the Lux path tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Mesh`, `Object`, `Material`, `Light`, `Background`
//! - **Assets**: OBJ meshes (via `tobj`) and textures (via `image`)
//! - **Scene files**: JSON scene descriptions and built-in scenes
//!
//! # Example
//!
//! ```ignore
//! use lux_core::SceneFile;
//!
//! let file = SceneFile::load("scenes/bunny.json")?;
//! let scene = file.build(Path::new("scenes"))?;
//! println!("Loaded {} objects, {} triangles",
//!     scene.objects.len(),
//!     scene.total_triangle_count());
//! ```

pub mod builtin;
pub mod loader;
pub mod mesh;
pub mod obj;
mod primitives;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use builtin::builtin_scene;
pub use loader::{CameraSettings, LoadError, LoadResult, RenderSettings, SceneFile};
pub use mesh::{Mesh, MeshError};
pub use obj::load_obj;
pub use scene::{Background, Light, Material, MeshId, Object, Scene, SceneError, Transform};
pub use texture::{decode_gamma, encode_gamma, Texture, TextureCache, TextureError};
