pub mod priority;
pub mod telemetry;

pub use priority::*;
pub use telemetry::*;
