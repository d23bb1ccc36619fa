pub mod runtime_error;
pub mod tape;

pub use runtime_error::RuntimeError;
pub use tape::{Machine, MachineConfig};
