//! Fixed-size worker pool that fills the frame in horizontal bands
//!
//! Every worker walks the whole job list but only writes rows inside its
//! own band, so the color and depth buffers are split into disjoint
//! mutable slices and no locking is needed. A pass returns once every band
//! is finished, which is the frame barrier.

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::framebuffer::{BandBounds, DepthBuffer, FrameBand, Framebuffer};
use crate::error::RenderError;

/// Name prefix of the worker threads
pub const WORKER_NAME: &str = "pixel-processor";

pub struct PixelScheduler {
    pool: ThreadPool,
    workers: usize,
}

impl PixelScheduler {
    /// Start `workers` threads. The count is fixed for the life of the pool.
    pub fn new(workers: usize) -> Result<Self, RenderError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("{}-{}", WORKER_NAME, i))
            .build()?;
        log::info!("Started {} {} threads", workers, WORKER_NAME);
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Band layout used for a frame of `height` rows
    pub fn partition(&self, height: usize) -> Vec<BandBounds> {
        BandBounds::partition(height, self.workers)
    }

    /// Run `job` once per band, in parallel, and wait for all of them.
    ///
    /// `job` only ever sees its own band; bands whose rows hold no geometry
    /// simply finish early.
    pub fn run<F>(&self, color: &mut Framebuffer, depth: &mut DepthBuffer, job: F) -> Result<(), RenderError>
    where
        F: Fn(&mut FrameBand<'_>) + Sync,
    {
        let partition = self.partition(color.height);
        let bands = FrameBand::split(color, depth, &partition)?;
        let job = &job;

        self.pool.scope(|scope| {
            for mut band in bands {
                scope.spawn(move |_| job(&mut band));
            }
        });

        Ok(())
    }
}

impl Drop for PixelScheduler {
    fn drop(&mut self) {
        log::debug!("Stopping {} {} threads", self.workers, WORKER_NAME);
    }
}
