mod dummy_joint;
mod tracing_joint;

pub use dummy_joint::*;
pub use tracing_joint::*;
