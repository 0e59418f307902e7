//! Lux Renderer - CPU path tracing
//!
//! A Monte Carlo path tracer over triangle meshes:
//! - flat BVH with explicit-stack traversal
//! - directional and point lights with shadow rays
//! - diffuse bounces with next-event estimation
//! - row-parallel rendering on a rayon pool, deterministic per seed

mod buffer;
mod bvh;
mod error;
mod integrator;
mod light;
mod raycaster;
mod renderer;
mod sampling;
mod scheduler;

pub use buffer::{color_to_rgb8, ImageBuffer};
pub use bvh::{Bvh, BvhNode, PrimitiveInfo, PrimitiveRef, LEAF_MAX_SIZE, MAX_DEPTH};
pub use error::{BvhError, RenderError};
pub use integrator::PathTracer;
pub use light::{light_visibility, LightSample, RAY_EPSILON};
pub use raycaster::{intersect_triangle, RayHit, Raycaster};
pub use renderer::{render, Render, RenderConfig, RenderStats};
pub use sampling::{diffuse_direction, random_unit_vector, row_rng};
pub use scheduler::RowScheduler;

/// Re-export common math types from lux_math
pub use lux_math::{Aabb, Camera, Interval, Ray, Vec3};
