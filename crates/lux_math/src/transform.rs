// Transform utilities for Mat4
//
// Extends glam::Mat4 with what the ray tracer needs on top of
// transform_point3() / transform_vector3() / inverse().

use crate::Aabb;
use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Matrix that maps object-space normals to world space
    /// (inverse transpose of the upper 3x3).
    fn normal_matrix(&self) -> Mat3;

    /// Transform a normal and renormalize it. Returns zero for a
    /// degenerate (zero-length) result.
    fn transform_normal(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        (self.normal_matrix() * normal).normalize_or_zero()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let min = aabb.min();
        let max = aabb.max();
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        });

        Aabb::from_iter_points(corners.map(|corner| self.transform_point3(corner)))
    }
}
