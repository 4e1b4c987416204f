use std::{
    error::Error,
    fmt::{self, Display},
};

use count_sketch::SketchErr;

/// The result type used in the entire sketched optimizer module.
pub type Result<T> = std::result::Result<T, OptimErr>;

/// The sketched optimizer module's error type.
#[derive(Debug)]
pub enum OptimErr {
    Sketch(SketchErr),
    SparsityOverBudget {
        k: usize,
        dim: usize,
    },
    GradientLengthMismatch {
        worker_id: usize,
        got: usize,
        expected: usize,
    },
    BufferLengthMismatch {
        got: usize,
        expected: usize,
    },
    ParamsLengthMismatch {
        got: usize,
        expected: usize,
    },
    WorkerOutOfRange {
        worker_id: usize,
        num_workers: usize,
    },
    DuplicateIngestion {
        worker_id: usize,
    },
    WorkerCountMismatch {
        got: usize,
        expected: usize,
    },
    StepNotStarted,
    StepIncomplete {
        got: usize,
        expected: usize,
    },
}

impl Display for OptimErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimErr::Sketch(e) => write!(f, "sketch error: {e}"),
            OptimErr::SparsityOverBudget { k, dim } => {
                write!(f, "sparsity budget k={k} exceeds the parameter count {dim}")
            }
            OptimErr::GradientLengthMismatch {
                worker_id,
                got,
                expected,
            } => write!(
                f,
                "gradient length mismatch for worker {worker_id}: got {got}, expected {expected}"
            ),
            OptimErr::BufferLengthMismatch { got, expected } => write!(
                f,
                "feedback buffer length mismatch: got {got}, expected {expected}"
            ),
            OptimErr::ParamsLengthMismatch { got, expected } => write!(
                f,
                "parameter vector length mismatch: got {got}, expected {expected}"
            ),
            OptimErr::WorkerOutOfRange {
                worker_id,
                num_workers,
            } => write!(
                f,
                "worker id {worker_id} is out of range for {num_workers} workers"
            ),
            OptimErr::DuplicateIngestion { worker_id } => {
                write!(f, "worker {worker_id} already ingested this step")
            }
            OptimErr::WorkerCountMismatch { got, expected } => write!(
                f,
                "worker count mismatch: got {got} vectors, expected {expected}"
            ),
            OptimErr::StepNotStarted => {
                write!(f, "no step in flight, call begin_step first")
            }
            OptimErr::StepIncomplete { got, expected } => write!(
                f,
                "cannot finalize step: only {got} of {expected} workers ingested"
            ),
        }
    }
}

impl Error for OptimErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OptimErr::Sketch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SketchErr> for OptimErr {
    fn from(value: SketchErr) -> Self {
        Self::Sketch(value)
    }
}
