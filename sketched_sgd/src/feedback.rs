use count_sketch::Recovered;

use crate::error::{OptimErr, Result};

/// Per-worker accumulator of communicated-but-unapplied gradient mass.
///
/// Coordinates that are dropped by top-k recovery stay in the buffer and
/// are retransmitted, decayed by the momentum factor, on later steps; mass
/// is delayed by compression, never lost. Coordinates that are applied get
/// this worker's own contribution removed so it is not applied twice.
pub struct ErrorFeedbackBuffer {
    residual: Vec<f32>,
    momentum: f32,
}

impl ErrorFeedbackBuffer {
    /// Creates a zeroed buffer.
    ///
    /// # Args
    /// * `dim` - Length of the flattened parameter vector.
    /// * `momentum` - Decay applied to retained residuals on every absorb;
    ///   `0.0` keeps only the fresh gradient, `1.0` accumulates undecayed.
    ///
    /// # Returns
    /// An `ErrorFeedbackBuffer` instance.
    pub fn new(dim: usize, momentum: f32) -> Self {
        Self {
            residual: vec![0.0; dim],
            momentum,
        }
    }

    /// Folds a fresh gradient into the buffer: `u <- momentum * u + g`.
    ///
    /// # Errors
    /// Returns `OptimErr::BufferLengthMismatch` when the gradient length
    /// disagrees with the buffer; nothing is absorbed in that case.
    pub fn absorb(&mut self, grad: &[f32]) -> Result<()> {
        if grad.len() != self.residual.len() {
            return Err(OptimErr::BufferLengthMismatch {
                got: grad.len(),
                expected: self.residual.len(),
            });
        }

        for (u, g) in self.residual.iter_mut().zip(grad) {
            *u = self.momentum * *u + g;
        }

        Ok(())
    }

    /// Returns the buffered vector to be sketched this step.
    pub fn as_slice(&self) -> &[f32] {
        &self.residual
    }

    /// Returns the buffered value of one coordinate.
    pub fn value_at(&self, index: usize) -> f32 {
        self.residual[index]
    }

    /// Removes this worker's contribution at the applied coordinates.
    pub fn mask(&mut self, applied: &[Recovered]) {
        for entry in applied {
            self.residual[entry.index] = 0.0;
        }
    }
}
