//! Error types for the renderer.

use lux_core::SceneError;
use thiserror::Error;

use crate::bvh::PrimitiveRef;

/// Errors that can stop a render before it starts.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid scene: {0}")]
    Scene(#[from] SceneError),
}

/// A violated BVH containment invariant, reported by [`Bvh::validate`](crate::Bvh::validate).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    #[error("node {node}: child {child} is not contained in its parent's bounds")]
    ChildOutside { node: usize, child: usize },

    #[error("leaf {node}: primitive {primitive:?} is not contained in the leaf bounds")]
    PrimitiveOutside { node: usize, primitive: PrimitiveRef },

    #[error("node {node}: primitive range {start}..{end} exceeds {len} primitives")]
    RangeOutOfBounds {
        node: usize,
        start: usize,
        end: usize,
        len: usize,
    },
}
