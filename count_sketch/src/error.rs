use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire count sketch module.
pub type Result<T> = std::result::Result<T, SketchErr>;

/// The count sketch module's error type.
#[derive(Debug)]
pub enum SketchErr {
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    FamilyMismatch {
        got: u64,
        expected: u64,
    },
}

impl Display for SketchErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "shape mismatch for {what}: got {got}, expected {expected}"
            ),
            SketchErr::FamilyMismatch { got, expected } => write!(
                f,
                "hash family mismatch: table seeded with {got}, expected {expected}"
            ),
        }
    }
}

impl Error for SketchErr {}
