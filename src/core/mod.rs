pub mod bridge;
pub mod device;
pub mod event;
