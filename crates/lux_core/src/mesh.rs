//! Mesh geometry representation for the Lux scene.
//!
//! Meshes are plain CPU buffers populated by loaders (OBJ, procedural
//! primitives) and read by the ray tracer. They are stored once in the
//! scene's mesh arena and referenced by [`MeshId`](crate::MeshId).

use lux_math::{Aabb, Vec2, Vec3};
use thiserror::Error;

/// Structural problems detected by [`Mesh::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh has {found} {attribute} for {expected} vertices")]
    AttributeCount {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
}

/// A mesh consisting of vertex positions, optional normals and UVs, and triangles.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional, one per vertex)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional, one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangles as three vertex indices
    pub triangles: Vec<[u32; 3]>,

    /// Axis-aligned bounding box in object space
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and triangles, optionally with normals.
    ///
    /// If normals are not provided, they will NOT be automatically computed.
    /// Call `compute_normals()` explicitly if you need them.
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>, normals: Option<Vec<Vec3>>) -> Self {
        Self::new_with_uvs(positions, triangles, normals, None)
    }

    /// Create a new mesh with UV coordinates.
    pub fn new_with_uvs(
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
    ) -> Self {
        let bounds = Aabb::from_iter_points(positions.iter().copied());
        Self {
            positions,
            normals,
            uvs,
            triangles,
            bounds,
        }
    }

    /// Check indices and attribute lengths.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.positions.len();

        if let Some(normals) = &self.normals {
            if normals.len() != vertex_count {
                return Err(MeshError::AttributeCount {
                    attribute: "normals",
                    expected: vertex_count,
                    found: normals.len(),
                });
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != vertex_count {
                return Err(MeshError::AttributeCount {
                    attribute: "uvs",
                    expected: vertex_count,
                    found: uvs.len(),
                });
            }
        }

        for (triangle, indices) in self.triangles.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(())
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Face normals follow counter-clockwise winding and are weighted by
    /// triangle area. Vertices only touched by degenerate triangles get +Y.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for &[i0, i1, i2] in &self.triangles {
            let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Check if the mesh has UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Ensure the mesh has normals, computing them if necessary.
    /// Also recomputes if existing normals don't match vertex count.
    pub fn ensure_normals(&mut self) {
        let mismatch = match &self.normals {
            None => None,
            Some(normals) if normals.len() != self.positions.len() => Some(normals.len()),
            Some(_) => return,
        };

        if let Some(count) = mismatch {
            log::debug!(
                "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                count,
                self.positions.len()
            );
        }
        self.compute_normals();
    }

    /// Reverse the winding of every triangle and negate the normals,
    /// turning an outward-facing closed mesh into an inward-facing one.
    pub fn flip(&mut self) {
        for triangle in &mut self.triangles {
            triangle.swap(1, 2);
        }
        if let Some(normals) = &mut self.normals {
            for normal in normals {
                *normal = -*normal;
            }
        }
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        if self.bounds.is_empty() {
            0.0
        } else {
            (self.bounds.max() - self.bounds.min()).length()
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Object-space corner positions of triangle `index`.
    pub fn triangle_positions(&self, index: usize) -> [Vec3; 3] {
        self.triangles[index].map(|i| self.positions[i as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
            None,
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = single_triangle();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.has_normals());
        assert!(!mesh.has_uvs());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_compute_normals_ccw() {
        let mut mesh = single_triangle();
        mesh.compute_normals();

        // Counter-clockwise when viewed from +Z
        for normal in mesh.normals.as_ref().unwrap() {
            assert!((*normal - Vec3::Z).length() < 0.001);
        }
    }

    #[test]
    fn test_degenerate_triangle_normals_default_up() {
        let mut mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0], vec![[0, 1, 2]], None);
        mesh.compute_normals();
        assert_eq!(mesh.normals.unwrap()[0], Vec3::Y);
    }

    #[test]
    fn test_ensure_normals_replaces_mismatched() {
        let mut mesh = single_triangle();
        mesh.normals = Some(vec![Vec3::X]);
        mesh.ensure_normals();
        assert_eq!(mesh.normals.as_ref().unwrap().len(), 3);

        // Matching normals are kept untouched
        mesh.normals = Some(vec![Vec3::X; 3]);
        mesh.ensure_normals();
        assert_eq!(mesh.normals.unwrap()[0], Vec3::X);
    }

    #[test]
    fn test_flip() {
        let mut mesh = single_triangle();
        mesh.compute_normals();
        mesh.flip();

        assert_eq!(mesh.triangles[0], [0, 2, 1]);
        assert!((mesh.normals.as_ref().unwrap()[0] + Vec3::Z).length() < 0.001);
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = Mesh::new(
            vec![
                Vec3::new(-1.0, -2.0, -3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
            None,
        );

        assert!((mesh.bounds.x.min - (-1.0)).abs() < 0.001);
        assert!((mesh.bounds.x.max - 4.0).abs() < 0.001);
        assert!((mesh.bounds.z.min - (-3.0)).abs() < 0.001);
        assert!((mesh.bounds.z.max - 6.0).abs() < 0.001);
    }

    #[test]
    fn test_validate_index_out_of_range() {
        let mut mesh = single_triangle();
        mesh.triangles.push([0, 1, 7]);

        assert_eq!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange {
                triangle: 1,
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_validate_attribute_count() {
        let mut mesh = single_triangle();
        mesh.uvs = Some(vec![Vec2::ZERO; 2]);

        assert!(matches!(
            mesh.validate(),
            Err(MeshError::AttributeCount { attribute: "uvs", .. })
        ));
    }

    #[test]
    fn test_triangle_positions() {
        let mesh = single_triangle();
        assert_eq!(mesh.triangle_positions(0), [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }
}
