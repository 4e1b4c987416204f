use count_sketch::SketchTable;
use log::{debug, warn};
use rayon::prelude::*;

use crate::{
    config::SketchConfig,
    error::{OptimErr, Result},
};

/// How per-worker vectors are combined into the per-step aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Every worker's vector is sketched and the tables are summed. This is
    /// the communication-compressed path.
    Sketched,
    /// The dense vectors are summed directly. Debug path for validating
    /// recovery against ground truth; it defeats the compression purpose
    /// and is never used in a deployed aggregation.
    Exact,
}

/// The combined result of one step, handed to recovery and then discarded.
pub enum Aggregate {
    Sketched(SketchTable),
    Exact(Vec<f32>),
}

/// Combines per-worker vectors into one aggregate per optimizer step.
///
/// Ingestion is pure summation, so the order workers report in is
/// irrelevant; recovery is the synchronization point and may not run until
/// every expected worker's contribution has landed.
pub struct GradientAggregator {
    sketch: SketchConfig,
    num_workers: usize,
    dim: usize,
    mode: AggregationMode,
    step: Option<InFlightStep>,
}

struct InFlightStep {
    partial: Aggregate,
    seen: Vec<bool>,
    remaining: usize,
}

impl GradientAggregator {
    /// Creates a new `GradientAggregator`.
    ///
    /// # Args
    /// * `sketch` - Geometry and seed used for every worker table.
    /// * `num_workers` - Number of contributions expected per step.
    /// * `dim` - Length of the flattened parameter vector.
    /// * `mode` - Sketched or exact combination.
    ///
    /// # Returns
    /// A `GradientAggregator` instance with no step in flight.
    pub fn new(
        sketch: SketchConfig,
        num_workers: usize,
        dim: usize,
        mode: AggregationMode,
    ) -> Self {
        Self {
            sketch,
            num_workers,
            dim,
            mode,
            step: None,
        }
    }

    /// Returns the number of contributions expected per step.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the expected vector length.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the configured combination mode.
    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// Starts a fresh step with an empty aggregate.
    ///
    /// An unfinished previous step is discarded; its contributions were
    /// never recovered or applied.
    pub fn begin_step(&mut self) {
        if self.step.is_some() {
            warn!("discarding an unfinished aggregation step");
        }

        let partial = match self.mode {
            AggregationMode::Sketched => Aggregate::Sketched(SketchTable::new(
                self.sketch.rows(),
                self.sketch.cols(),
                self.sketch.seed(),
            )),
            AggregationMode::Exact => Aggregate::Exact(vec![0.0; self.dim]),
        };

        self.step = Some(InFlightStep {
            partial,
            seen: vec![false; self.num_workers],
            remaining: self.num_workers,
        });
    }

    /// Folds one worker's vector into the step aggregate.
    ///
    /// # Args
    /// * `worker_id` - The reporting worker.
    /// * `vector` - Its effective gradient (feedback buffer or raw).
    ///
    /// # Errors
    /// Fails fast on a missing step, an unknown or duplicate worker, or a
    /// vector whose length disagrees with the declared parameter count.
    pub fn ingest(&mut self, worker_id: usize, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(OptimErr::GradientLengthMismatch {
                worker_id,
                got: vector.len(),
                expected: self.dim,
            });
        }

        match self.mark_ingested(worker_id)? {
            Aggregate::Sketched(table) => table.accumulate(vector),
            Aggregate::Exact(dense) => {
                for (acc, v) in dense.iter_mut().zip(vector) {
                    *acc += v;
                }
            }
        }

        debug!(worker_id = worker_id; "worker vector folded into the step aggregate");
        Ok(())
    }

    /// Folds every worker's vector in one call, sketching them in parallel.
    ///
    /// Summation is associative and commutative, so splitting the sketching
    /// across threads and adding the tables afterwards yields the same
    /// aggregate as sequential ingestion.
    ///
    /// # Args
    /// * `vectors` - One effective gradient per worker, indexed by id.
    ///
    /// # Errors
    /// Same failure modes as `ingest`, plus a worker count mismatch when
    /// the slice length disagrees with the construction-time worker count.
    pub fn ingest_all(&mut self, vectors: &[&[f32]]) -> Result<()> {
        if vectors.len() != self.num_workers {
            return Err(OptimErr::WorkerCountMismatch {
                got: vectors.len(),
                expected: self.num_workers,
            });
        }

        if self.mode == AggregationMode::Exact {
            for (worker_id, vector) in vectors.iter().enumerate() {
                self.ingest(worker_id, vector)?;
            }
            return Ok(());
        }

        for (worker_id, vector) in vectors.iter().enumerate() {
            if vector.len() != self.dim {
                return Err(OptimErr::GradientLengthMismatch {
                    worker_id,
                    got: vector.len(),
                    expected: self.dim,
                });
            }
        }

        let (rows, cols, seed) = (self.sketch.rows(), self.sketch.cols(), self.sketch.seed());
        let tables: Vec<SketchTable> = vectors
            .par_iter()
            .map(|vector| {
                let mut table = SketchTable::new(rows, cols, seed);
                table.accumulate(vector);
                table
            })
            .collect();

        for (worker_id, worker_table) in tables.iter().enumerate() {
            match self.mark_ingested(worker_id)? {
                Aggregate::Sketched(table) => table.add(worker_table)?,
                Aggregate::Exact(_) => unreachable!("exact mode handled above"),
            }
        }

        debug!("all {} worker sketches folded in parallel", self.num_workers);
        Ok(())
    }

    /// Hands out the finished aggregate and clears the in-flight step.
    ///
    /// # Errors
    /// Fails when no step was begun or when some workers have not reported;
    /// recovery must never run over a partial sum.
    pub fn finalize_step(&mut self) -> Result<Aggregate> {
        let step = self.step.take().ok_or(OptimErr::StepNotStarted)?;

        if step.remaining != 0 {
            let got = self.num_workers - step.remaining;
            self.step = Some(step);
            return Err(OptimErr::StepIncomplete {
                got,
                expected: self.num_workers,
            });
        }

        debug!("step aggregate finalized: workers={}", self.num_workers);
        Ok(step.partial)
    }

    fn mark_ingested(&mut self, worker_id: usize) -> Result<&mut Aggregate> {
        let num_workers = self.num_workers;
        let step = self.step.as_mut().ok_or(OptimErr::StepNotStarted)?;

        if worker_id >= num_workers {
            return Err(OptimErr::WorkerOutOfRange {
                worker_id,
                num_workers,
            });
        }

        if step.seen[worker_id] {
            return Err(OptimErr::DuplicateIngestion { worker_id });
        }

        step.seen[worker_id] = true;
        step.remaining -= 1;
        Ok(&mut step.partial)
    }
}
