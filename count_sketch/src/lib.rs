pub mod error;
pub mod family;
pub mod recover;
pub mod table;

pub use error::{Result, SketchErr};
pub use family::HashFamily;
pub use recover::{Recovered, recover_top_k, top_k_dense};
pub use table::SketchTable;
