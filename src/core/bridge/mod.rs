pub mod poll_bridge;
pub mod request;
pub mod tracker;
pub mod transport;
pub mod wait_bridge;
pub mod worker;

pub use poll_bridge::PollBridge;
pub use tracker::WorkerTracker;
pub use transport::{ChannelTransport, Delivery, EnclaveId, EnclaveTransport, TransportError};
pub use wait_bridge::WaitBridge;
pub use worker::WorkerSettings;
