//! Ray queries against a scene.
//!
//! [`Raycaster`] transforms every object to world space once, builds the
//! BVH over all triangles and answers nearest-hit and any-hit queries. It
//! only reads the scene and is shared by all render threads.

use lux_core::{Material, Scene};
use lux_math::{Aabb, Interval, Mat4Ext, Ray, Vec2, Vec3};

use crate::bvh::{Bvh, PrimitiveInfo, PrimitiveRef};

/// Determinant threshold below which a ray is treated as parallel to a triangle.
const DET_EPSILON: f32 = 1e-8;

/// Squared length of the edge cross product below which a triangle has no area.
const DEGENERATE_AREA: f32 = 1e-20;

/// Nearest intersection along a ray.
///
/// Vertex weights are `(1 - u - v, u, v)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f32,
    pub object: u32,
    pub triangle: u32,
    pub u: f32,
    pub v: f32,
}

impl RayHit {
    /// Barycentric weights of the three triangle vertices.
    #[inline]
    pub fn weights(&self) -> Vec3 {
        Vec3::new(1.0 - self.u - self.v, self.u, self.v)
    }
}

/// World-space copy of one object's vertex data.
struct ObjectGeometry<'a> {
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    uvs: Option<&'a [Vec2]>,
    triangles: &'a [[u32; 3]],
}

impl ObjectGeometry<'_> {
    #[inline]
    fn triangle(&self, index: u32) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index as usize];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }
}

/// Intersection engine over a borrowed scene.
pub struct Raycaster<'a> {
    scene: &'a Scene,
    objects: Vec<ObjectGeometry<'a>>,
    bvh: Bvh,
}

impl<'a> Raycaster<'a> {
    /// Transform every object to world space and build the BVH.
    ///
    /// Objects referencing an unknown mesh and triangles with out-of-range
    /// indices are skipped with a warning.
    pub fn new(scene: &'a Scene) -> Self {
        let mut objects = Vec::with_capacity(scene.objects.len());
        let mut primitives = Vec::with_capacity(scene.total_triangle_count());

        for (object_index, object) in scene.objects.iter().enumerate() {
            let Some(mesh) = scene.meshes.get(object.mesh.0) else {
                log::warn!(
                    "Object '{}' references unknown mesh {}, skipping",
                    object.name,
                    object.mesh.0
                );
                objects.push(ObjectGeometry {
                    positions: Vec::new(),
                    normals: None,
                    uvs: None,
                    triangles: &[],
                });
                continue;
            };

            let transform = object.transform;
            let positions: Vec<Vec3> = mesh
                .positions
                .iter()
                .map(|&p| transform.transform_point3(p))
                .collect();
            let vertex_count = mesh.positions.len();
            let normal_matrix = transform.normal_matrix();
            let normals = mesh
                .normals
                .as_ref()
                .filter(|normals| normals.len() == vertex_count)
                .map(|normals| {
                    normals
                        .iter()
                        .map(|&n| (normal_matrix * n).normalize_or_zero())
                        .collect()
                });

            let mut skipped = 0;
            for (triangle_index, tri) in mesh.triangles.iter().enumerate() {
                if tri.iter().any(|&i| i as usize >= positions.len()) {
                    skipped += 1;
                    continue;
                }
                let bounds = Aabb::from_iter_points(tri.iter().map(|&i| positions[i as usize]));
                primitives.push(PrimitiveInfo::new(
                    PrimitiveRef {
                        object: object_index as u32,
                        triangle: triangle_index as u32,
                    },
                    bounds,
                ));
            }
            if skipped > 0 {
                log::warn!(
                    "Object '{}': skipped {} triangles with out-of-range indices",
                    object.name,
                    skipped
                );
            }

            objects.push(ObjectGeometry {
                positions,
                normals,
                uvs: mesh.uvs.as_deref().filter(|uvs| uvs.len() == vertex_count),
                triangles: &mesh.triangles,
            });
        }

        let bvh = Bvh::build(primitives);
        Self {
            scene,
            objects,
            bvh,
        }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    /// Number of triangles in the acceleration structure.
    pub fn primitive_count(&self) -> usize {
        self.bvh.primitives().len()
    }

    /// Nearest hit within the ray's interval.
    pub fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        self.bvh
            .intersect(ray, |prim, range| self.intersect_primitive(ray, prim, range))
    }

    /// Nearest hit found by testing every triangle. Reference for the BVH path.
    pub fn intersect_linear(&self, ray: &Ray) -> Option<RayHit> {
        let mut closest = ray.t.max;
        let mut best = None;
        for info in self.bvh.primitives() {
            let range = Interval::new(ray.t.min, closest);
            if let Some(hit) = self.intersect_primitive(ray, info.prim, range) {
                if hit.t < closest {
                    closest = hit.t;
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// True if anything lies within the ray's interval.
    pub fn occluded(&self, ray: &Ray) -> bool {
        self.bvh.any_hit(ray, |prim, range| {
            self.intersect_primitive(ray, prim, range).is_some()
        })
    }

    fn intersect_primitive(&self, ray: &Ray, prim: PrimitiveRef, range: Interval) -> Option<RayHit> {
        let geometry = &self.objects[prim.object as usize];
        let (t, u, v) = intersect_triangle(ray, geometry.triangle(prim.triangle), range)?;
        Some(RayHit {
            t,
            object: prim.object,
            triangle: prim.triangle,
            u,
            v,
        })
    }

    /// World-space position of a hit.
    pub fn hit_point(&self, ray: &Ray, hit: &RayHit) -> Vec3 {
        ray.at(hit.t)
    }

    /// Material of the object that was hit.
    pub fn material(&self, hit: &RayHit) -> &'a Material {
        &self.scene.objects[hit.object as usize].material
    }

    /// Unit face normal following the triangle winding (counter-clockwise front).
    pub fn geometric_normal(&self, hit: &RayHit) -> Vec3 {
        let [a, b, c] = self.objects[hit.object as usize].triangle(hit.triangle);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Shading normal: vertex normals blended with the hit's weights.
    ///
    /// Falls back to the geometric normal when the mesh has no normals or
    /// the blend cancels out.
    pub fn interpolate_normal(&self, hit: &RayHit) -> Vec3 {
        let geometry = &self.objects[hit.object as usize];
        let Some(normals) = &geometry.normals else {
            return self.geometric_normal(hit);
        };

        let [a, b, c] = geometry.triangles[hit.triangle as usize];
        let w = hit.weights();
        let n = w.x * normals[a as usize] + w.y * normals[b as usize] + w.z * normals[c as usize];
        let n = n.normalize_or_zero();
        if n == Vec3::ZERO {
            self.geometric_normal(hit)
        } else {
            n
        }
    }

    /// Texture coordinates at the hit, zero when the mesh has none.
    pub fn interpolate_uv(&self, hit: &RayHit) -> Vec2 {
        let geometry = &self.objects[hit.object as usize];
        let Some(uvs) = geometry.uvs else {
            return Vec2::ZERO;
        };

        let [a, b, c] = geometry.triangles[hit.triangle as usize];
        let w = hit.weights();
        w.x * uvs[a as usize] + w.y * uvs[b as usize] + w.z * uvs[c as usize]
    }
}

/// Möller-Trumbore ray-triangle intersection.
///
/// Returns `(t, u, v)` for a hit strictly inside `range`. Rays parallel to
/// the triangle, zero-area triangles and non-finite results are misses.
pub fn intersect_triangle(ray: &Ray, [a, b, c]: [Vec3; 3], range: Interval) -> Option<(f32, f32, f32)> {
    let edge1 = b - a;
    let edge2 = c - a;

    if edge1.cross(edge2).length_squared() <= DEGENERATE_AREA {
        return None;
    }

    let h = ray.direction().cross(edge2);
    let det = edge1.dot(h);

    // Parallel, or NaN
    if !(det.abs() >= DET_EPSILON) {
        return None;
    }

    let f = 1.0 / det;
    let s = ray.origin() - a;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction().dot(q);
    if !(v >= 0.0 && u + v <= 1.0) {
        return None;
    }

    let t = f * edge2.dot(q);
    if !t.is_finite() || !range.surrounds(t) {
        return None;
    }

    Some((t, u, v))
}
