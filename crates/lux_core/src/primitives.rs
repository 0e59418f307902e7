//! Procedural meshes used by built-in scenes and tests.

use std::f32::consts::PI;

use lux_math::{Vec2, Vec3};

use crate::mesh::Mesh;

impl Mesh {
    /// Unit quad in the XY plane, centered at the origin, facing +Z.
    pub fn quad() -> Self {
        let positions = vec![
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ];
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        Mesh::new_with_uvs(
            positions,
            vec![[0, 1, 2], [0, 2, 3]],
            Some(vec![Vec3::Z; 4]),
            Some(uvs),
        )
    }

    /// Unit cube centered at the origin with flat, outward-facing normals.
    pub fn cube() -> Self {
        // (normal, u, v) with u x v == normal
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            let center = 0.5 * normal;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                positions.push(center + su * u + sv * v);
                normals.push(normal);
                uvs.push(Vec2::new(su + 0.5, sv + 0.5));
            }
            triangles.push([base, base + 1, base + 2]);
            triangles.push([base, base + 2, base + 3]);
        }

        Mesh::new_with_uvs(positions, triangles, Some(normals), Some(uvs))
    }

    /// Unit sphere centered at the origin with smooth normals.
    ///
    /// `segments` divide the longitude, `rings` the latitude; both are
    /// raised to a usable minimum.
    pub fn uv_sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let stride = segments + 1;

        let mut positions = Vec::with_capacity((stride * (rings + 1)) as usize);
        let mut uvs = Vec::with_capacity(positions.capacity());
        for i in 0..=rings {
            let theta = PI * i as f32 / rings as f32;
            let (ring_radius, y) = theta.sin_cos();
            for j in 0..=segments {
                let phi = 2.0 * PI * j as f32 / segments as f32;
                positions.push(Vec3::new(ring_radius * phi.sin(), y, ring_radius * phi.cos()));
                uvs.push(Vec2::new(
                    j as f32 / segments as f32,
                    1.0 - i as f32 / rings as f32,
                ));
            }
        }

        let mut triangles = Vec::with_capacity((2 * segments * rings) as usize);
        for i in 0..rings {
            for j in 0..segments {
                let a = i * stride + j;
                let b = a + stride;
                // Pole rings collapse to a point; skip the zero-area half.
                if i != rings - 1 {
                    triangles.push([a, b, b + 1]);
                }
                if i != 0 {
                    triangles.push([a, b + 1, a + 1]);
                }
            }
        }

        let normals = positions.clone();
        Mesh::new_with_uvs(positions, triangles, Some(normals), Some(uvs))
    }
}
