//! Render entry point.
//!
//! [`render`] builds the acceleration structure, runs the path integrator
//! over every row in parallel, then normalizes and gamma-encodes the image
//! in a second parallel pass.

use std::time::{Duration, Instant};

use lux_core::{encode_gamma, RenderSettings, Scene};
use lux_math::{Camera, Vec3};
use rand::Rng;

use crate::buffer::ImageBuffer;
use crate::error::RenderError;
use crate::integrator::PathTracer;
use crate::raycaster::Raycaster;
use crate::sampling::row_rng;
use crate::scheduler::RowScheduler;

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum number of path segments
    pub max_depth: u32,
    /// Worker threads, one per CPU when `None`
    pub threads: Option<usize>,
    /// Base seed; drawn at random when `None`
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            samples_per_pixel: 8,
            max_depth: 5,
            threads: None,
            seed: None,
        }
    }
}

impl RenderConfig {
    /// Defaults overridden by whatever a scene file sets.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let defaults = Self::default();
        Self {
            width: settings.width.unwrap_or(defaults.width),
            height: settings.height.unwrap_or(defaults.height),
            samples_per_pixel: settings.samples.unwrap_or(defaults.samples_per_pixel),
            max_depth: settings.depth.unwrap_or(defaults.max_depth),
            threads: settings.threads,
            seed: settings.seed,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Width over height, 1 for a degenerate resolution.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Statistics for a finished render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    pub elapsed: Duration,
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub primitive_count: usize,
    pub bvh_nodes: usize,
    pub bvh_depth: usize,
    pub threads: usize,
    pub seed: u64,
}

/// A finished, gamma-encoded image and how it was made.
#[derive(Debug, Clone)]
pub struct Render {
    pub image: ImageBuffer,
    pub stats: RenderStats,
}

/// Render `scene` as seen from `camera`.
///
/// The camera's aspect ratio is replaced by the configured resolution's.
/// With a fixed seed the result is identical for any thread count.
pub fn render(scene: &Scene, camera: &Camera, config: &RenderConfig) -> Result<Render, RenderError> {
    scene.validate()?;
    let scheduler = RowScheduler::new(config.threads)?;
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());

    let start = Instant::now();

    let raycaster = Raycaster::new(scene);
    let bvh = raycaster.bvh();
    log::info!(
        "Built BVH over {} triangles in {:.1} ms ({} nodes, depth {})",
        raycaster.primitive_count(),
        start.elapsed().as_secs_f64() * 1000.0,
        bvh.node_count(),
        bvh.depth()
    );

    let mut camera = *camera;
    camera.set_aspect(config.aspect());
    let tracer = PathTracer::new(&raycaster, &camera, config.max_depth);

    let (width, height) = (config.width as usize, config.height as usize);
    let samples = config.samples_per_pixel;
    let mut image = ImageBuffer::new(config.width, config.height);

    scheduler.for_each_row(&mut image, |y, row| {
        let mut rng = row_rng(seed, y);
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel += tracer.render_pixel(x, y, width, height, samples, &mut rng);
        }
    });

    scheduler.for_each_row(&mut image, |_, row| {
        for pixel in row.iter_mut() {
            *pixel = if samples == 0 {
                Vec3::ZERO
            } else {
                encode_gamma(*pixel / samples as f32)
            };
        }
    });

    let stats = RenderStats {
        elapsed: start.elapsed(),
        width: config.width,
        height: config.height,
        samples_per_pixel: samples,
        max_depth: config.max_depth,
        primitive_count: raycaster.primitive_count(),
        bvh_nodes: bvh.node_count(),
        bvh_depth: bvh.depth(),
        threads: scheduler.threads(),
        seed,
    };

    log::info!(
        "Generation took {} ms at {}x{} ({} spp, depth {}, {} threads, seed {})",
        stats.elapsed.as_millis(),
        stats.width,
        stats.height,
        stats.samples_per_pixel,
        stats.max_depth,
        stats.threads,
        stats.seed
    );

    Ok(Render { image, stats })
}
