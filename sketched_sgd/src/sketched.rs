use count_sketch::{Recovered, recover_top_k, top_k_dense};
use log::debug;

use crate::{
    aggregator::{Aggregate, AggregationMode, GradientAggregator},
    config::{SketchConfig, SketchedSgdConfig},
    error::{OptimErr, Result},
    feedback::ErrorFeedbackBuffer,
    optimization::Optimizer,
};

/// Sketched distributed optimizer wrapping a base update rule.
///
/// Per step, every worker's gradient is folded into its feedback buffer,
/// the buffers are sketched and summed, and only the top-k coordinates of
/// the aggregate are recovered and applied through the inner optimizer.
/// Applied coordinates are then masked out of the buffers; everything else
/// stays buffered for later steps.
pub struct SketchedSgd<O: Optimizer> {
    inner: O,
    config: SketchedSgdConfig,
    dim: usize,
    aggregator: GradientAggregator,
    buffers: Vec<ErrorFeedbackBuffer>,
}

impl<O: Optimizer> SketchedSgd<O> {
    /// Creates a new `SketchedSgd` around a base optimizer.
    ///
    /// # Args
    /// * `inner` - The update rule applied to recovered coordinates.
    /// * `sketch` - Table geometry and hash seed shared by all workers.
    /// * `config` - Sparsity budget, worker count and feedback knobs.
    /// * `dim` - Length of the flattened parameter vector.
    /// * `mode` - Sketched compression or the exact debug path.
    ///
    /// # Errors
    /// Fails when the sparsity budget `k` exceeds the parameter count.
    pub fn new(
        inner: O,
        sketch: SketchConfig,
        config: SketchedSgdConfig,
        dim: usize,
        mode: AggregationMode,
    ) -> Result<Self> {
        if config.k() > dim {
            return Err(OptimErr::SparsityOverBudget { k: config.k(), dim });
        }

        if config.p1() > 0 {
            debug!("p1={} accepted; candidate over-selection is not applied", config.p1());
        }

        let aggregator = GradientAggregator::new(sketch, config.num_workers(), dim, mode);

        let buffers = if config.accumulate_error() {
            (0..config.num_workers())
                .map(|_| ErrorFeedbackBuffer::new(dim, config.momentum()))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            inner,
            config,
            dim,
            aggregator,
            buffers,
        })
    }

    /// Returns the optimizer configuration.
    pub fn config(&self) -> &SketchedSgdConfig {
        &self.config
    }

    /// Returns the parameter count this optimizer was built for.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the wrapped base optimizer.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Runs one full optimization step.
    ///
    /// Absorbs each worker's gradient, aggregates the effective vectors,
    /// recovers the top-k coordinates, applies them through the inner
    /// optimizer and masks the applied mass out of the feedback buffers.
    ///
    /// # Args
    /// * `params` - The parameters to update in place.
    /// * `grads` - One dense gradient per worker, indexed by worker id.
    ///
    /// # Returns
    /// The sparse update that was applied, ordered by descending magnitude.
    ///
    /// # Errors
    /// Fails on a parameter or gradient length mismatch, or on a worker
    /// count disagreeing with the configuration; the parameters are left
    /// untouched in every error case.
    pub fn step(&mut self, params: &mut [f32], grads: &[Vec<f32>]) -> Result<Vec<Recovered>> {
        if params.len() != self.dim {
            return Err(OptimErr::ParamsLengthMismatch {
                got: params.len(),
                expected: self.dim,
            });
        }

        if grads.len() != self.config.num_workers() {
            return Err(OptimErr::WorkerCountMismatch {
                got: grads.len(),
                expected: self.config.num_workers(),
            });
        }

        for (buffer, grad) in self.buffers.iter_mut().zip(grads) {
            buffer.absorb(grad)?;
        }

        let effective: Vec<&[f32]> = if self.config.accumulate_error() {
            self.buffers.iter().map(|b| b.as_slice()).collect()
        } else {
            grads.iter().map(|g| g.as_slice()).collect()
        };

        self.aggregator.begin_step();
        self.aggregator.ingest_all(&effective)?;

        let recovered = match self.aggregator.finalize_step()? {
            Aggregate::Sketched(table) => recover_top_k(&table, self.dim, self.config.k()),
            Aggregate::Exact(dense) => top_k_dense(&dense, self.config.k()),
        };

        let update = if self.config.p2() > 0 && self.aggregator.mode() == AggregationMode::Sketched
        {
            self.refine(&recovered, grads)
        } else {
            recovered
        };

        self.inner.update_sparse(params, &update);

        for buffer in &mut self.buffers {
            buffer.mask(&update);
        }

        debug!(recovered = update.len(); "applied sparse update");
        Ok(update)
    }

    /// Second recovery round: re-reads the chosen coordinates from the
    /// exact per-worker vectors, so the applied values carry no sketch
    /// estimation noise. Coordinates whose exact sum is zero are dropped.
    fn refine(&self, candidates: &[Recovered], grads: &[Vec<f32>]) -> Vec<Recovered> {
        let mut refined: Vec<Recovered> = candidates
            .iter()
            .map(|c| {
                let value: f32 = if self.config.accumulate_error() {
                    self.buffers.iter().map(|b| b.value_at(c.index)).sum()
                } else {
                    grads.iter().map(|g| g[c.index]).sum()
                };
                Recovered {
                    index: c.index,
                    value,
                }
            })
            .filter(|c| c.value != 0.0)
            .collect();

        refined.sort_by(|a, b| {
            b.value
                .abs()
                .total_cmp(&a.value.abs())
                .then(a.index.cmp(&b.index))
        });

        refined
    }
}
