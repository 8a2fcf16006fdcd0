pub mod boundary;
pub mod polling_host;

pub use polling_host::PollingHost;
