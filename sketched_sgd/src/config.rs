use std::num::NonZeroUsize;

/// Sketch geometry plus the hash-family seed shared by every worker.
///
/// The seed travels inside the config instead of living in global state:
/// every table on every worker derives the same hash family from it, which
/// is what makes independently built tables summable.
#[derive(Debug, Clone, Copy)]
pub struct SketchConfig {
    rows: NonZeroUsize,
    cols: NonZeroUsize,
    seed: u64,
}

impl SketchConfig {
    /// Creates a new sketch configuration.
    ///
    /// # Args
    /// * `rows` - Number of independent hash rows per table.
    /// * `cols` - Number of buckets per row.
    /// * `seed` - Hash family seed, identical on all workers.
    ///
    /// # Returns
    /// A `SketchConfig` instance.
    pub fn new(rows: NonZeroUsize, cols: NonZeroUsize, seed: u64) -> Self {
        Self { rows, cols, seed }
    }

    /// Returns the number of hash rows per table.
    pub fn rows(&self) -> NonZeroUsize {
        self.rows
    }

    /// Returns the number of buckets per row.
    pub fn cols(&self) -> NonZeroUsize {
        self.cols
    }

    /// Returns the hash family seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Knobs of the sketched optimizer itself.
#[derive(Debug, Clone, Copy)]
pub struct SketchedSgdConfig {
    k: NonZeroUsize,
    num_workers: NonZeroUsize,
    accumulate_error: bool,
    momentum: f32,
    p1: usize,
    p2: usize,
}

impl SketchedSgdConfig {
    /// Creates a new sketched optimizer configuration.
    ///
    /// # Args
    /// * `k` - Sparsity budget recovered and applied per step.
    /// * `num_workers` - Number of gradient producers per step.
    /// * `accumulate_error` - Enables the per-worker feedback buffers.
    /// * `momentum` - Decay applied to retained residuals each step; `0.0`
    ///   gives plain accumulation.
    /// * `p1` - Compensation phase. Accepted but currently inert.
    /// * `p2` - Enables second-round refinement of recovered values when
    ///   nonzero.
    ///
    /// # Returns
    /// A `SketchedSgdConfig` instance.
    pub fn new(
        k: NonZeroUsize,
        num_workers: NonZeroUsize,
        accumulate_error: bool,
        momentum: f32,
        p1: usize,
        p2: usize,
    ) -> Self {
        Self {
            k,
            num_workers,
            accumulate_error,
            momentum,
            p1,
            p2,
        }
    }

    /// Returns the per-step sparsity budget.
    pub fn k(&self) -> usize {
        self.k.get()
    }

    /// Returns the expected number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers.get()
    }

    /// Returns whether residual mass is carried across steps.
    pub fn accumulate_error(&self) -> bool {
        self.accumulate_error
    }

    /// Returns the residual momentum factor.
    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    /// Returns the reserved compensation phase.
    pub fn p1(&self) -> usize {
        self.p1
    }

    /// Returns the refinement toggle.
    pub fn p2(&self) -> usize {
        self.p2
    }
}
