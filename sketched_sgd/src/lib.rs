pub mod aggregator;
pub mod config;
pub mod error;
pub mod feedback;
pub mod optimization;
pub mod sketched;

pub use aggregator::{Aggregate, AggregationMode, GradientAggregator};
pub use config::{SketchConfig, SketchedSgdConfig};
pub use error::{OptimErr, Result};
pub use feedback::ErrorFeedbackBuffer;
pub use optimization::{GradientDescent, Optimizer};
pub use sketched::SketchedSgd;
