// Cross-cutting infrastructure
pub mod logging;

pub use logging::*;
