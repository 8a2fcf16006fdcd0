pub mod control;
pub mod registry;

pub use control::DeviceControl;
pub use registry::{DeviceRegistry, DeviceState};
