//! Row-parallel execution on a fixed-size rayon pool.

use lux_math::Vec3;
use rayon::prelude::*;

use crate::error::RenderError;
use crate::buffer::ImageBuffer;

/// Runs a worker once per image row across a fixed set of threads.
pub struct RowScheduler {
    pool: rayon::ThreadPool,
}

impl RowScheduler {
    /// Create a scheduler with `threads` workers, or one per CPU when `None`.
    pub fn new(threads: Option<usize>) -> Result<Self, RenderError> {
        let threads = threads.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lux-row-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Call `worker(y, row)` for every row of `image`, in no particular
    /// order. Each call gets that row's pixels. Returns once all rows are done.
    pub fn for_each_row<F>(&self, image: &mut ImageBuffer, worker: F)
    where
        F: Fn(usize, &mut [Vec3]) + Sync,
    {
        let width = image.width as usize;
        if width == 0 {
            return;
        }

        self.pool.install(|| {
            image
                .pixels
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| worker(y, row));
        });
    }
}
