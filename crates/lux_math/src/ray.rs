use crate::{Interval, Vec3};

/// A ray in 3D space with origin, unit direction, and a parameter range.
///
/// Callers may pass any non-zero direction; it is normalized on construction
/// so that `t` is always a world-space distance. A zero direction stays zero
/// and such a ray never hits anything.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Valid hit distances, `[0, +inf)` by default.
    pub t: Interval,
    inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray covering `[0, +inf)`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_interval(origin, direction, Interval::FORWARD)
    }

    /// Create a ray restricted to the distances in `t`.
    pub fn with_interval(origin: Vec3, direction: Vec3, t: Interval) -> Self {
        let direction = direction.normalize_or_zero();
        Self {
            origin,
            direction,
            t,
            inv_direction: direction.recip(),
        }
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the (unit) direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Component-wise reciprocal of the direction, used by the slab test.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}
