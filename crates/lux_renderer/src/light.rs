//! Light visibility queries.

use lux_core::Light;
use lux_math::{Interval, Ray, Vec3};

use crate::raycaster::Raycaster;

/// Start distance of shadow and bounce rays, keeps them off the surface they leave.
pub const RAY_EPSILON: f32 = 1e-4;

/// A light that reaches a point unoccluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit direction from the point towards the light.
    pub direction: Vec3,
    /// Falloff factor in `(0, 1]`.
    pub attenuation: f32,
}

/// Check whether `light` reaches `point`.
///
/// Returns `None` when the light is occluded, out of range or fully
/// attenuated. Directional lights do not attenuate; point lights fall off
/// as `(1 - (d / radius)^2)^2` and reach nothing beyond `radius`.
pub fn light_visibility(light: &Light, point: Vec3, raycaster: &Raycaster) -> Option<LightSample> {
    let (direction, attenuation, max_distance) = match *light {
        Light::Directional { direction, .. } => {
            (-direction.normalize_or_zero(), 1.0, f32::INFINITY)
        }
        Light::Point {
            position, radius, ..
        } => {
            let to_light = position - point;
            let distance = to_light.length();
            if !(distance < radius) {
                return None;
            }
            let falloff = (1.0 - (distance / radius).powi(2)).clamp(0.0, 1.0);
            (to_light / distance, falloff * falloff, distance)
        }
    };

    if !(attenuation > 0.0) || direction == Vec3::ZERO || !direction.is_finite() {
        return None;
    }

    let shadow_ray = Ray::with_interval(point, direction, Interval::new(RAY_EPSILON, max_distance));
    if raycaster.occluded(&shadow_ray) {
        return None;
    }

    Some(LightSample {
        direction,
        attenuation,
    })
}
