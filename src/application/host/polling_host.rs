use crate::application::config::models::Config;
use crate::common::error::Result;
use crate::core::bridge::poll_bridge::PollBridge;
use crate::core::bridge::tracker::WorkerTracker;
use crate::core::bridge::transport::{EnclaveId, EnclaveTransport};
use crate::core::bridge::wait_bridge::WaitBridge;
use crate::core::device::control::DeviceControl;
use crate::core::device::registry::DeviceRegistry;
use crate::core::event::poller::{LinuxPoller, PollingSys};
use libc::{c_int, pollfd};
use std::os::unix::io::RawFd;
use std::sync::Arc;
use std::time::Duration;

/// The host half of the polling device: device control plus both bridges,
/// sharing one OS backend, one transport and one worker tracker.
pub struct PollingHost {
    control: DeviceControl,
    wait_bridge: WaitBridge,
    poll_bridge: PollBridge,
    tracker: Arc<WorkerTracker>,
}

impl PollingHost {
    pub fn new(config: &Config, sys: Arc<dyn PollingSys>, transport: Arc<dyn EnclaveTransport>) -> Self {
        let registry = DeviceRegistry::new();
        let tracker = WorkerTracker::new();
        let settings = config.bridge.worker_settings();

        Self {
            control: DeviceControl::new(Arc::clone(&sys), Arc::clone(&registry), config.shutdown.drain_timeout()),
            wait_bridge: WaitBridge::new(
                Arc::clone(&sys),
                Arc::clone(&transport),
                Arc::clone(&registry),
                Arc::clone(&tracker),
                settings.clone(),
            ),
            poll_bridge: PollBridge::new(sys, transport, registry, Arc::clone(&tracker), settings),
            tracker,
        }
    }

    /// Host backed by the real Linux syscalls.
    pub fn linux(config: &Config, transport: Arc<dyn EnclaveTransport>) -> Self {
        Self::new(config, Arc::new(LinuxPoller), transport)
    }

    pub fn create(&self, flags: c_int) -> Result<RawFd> {
        self.control.create(flags)
    }

    pub fn add(&self, handle: RawFd, fd: RawFd, event_mask: u32, list_index: u32, fd_id: u32) -> Result<()> {
        self.control.add(handle, fd, event_mask, list_index, fd_id)
    }

    pub fn modify(&self, handle: RawFd, fd: RawFd, event_mask: u32, list_index: u32, fd_id: u32) -> Result<()> {
        self.control.modify(handle, fd, event_mask, list_index, fd_id)
    }

    pub fn delete(&self, handle: RawFd, fd: RawFd) -> Result<()> {
        self.control.delete(handle, fd)
    }

    pub fn close(&self, handle: RawFd) -> Result<()> {
        self.control.close(handle)
    }

    pub fn shutdown(&self, handle: RawFd) -> Result<()> {
        self.control.shutdown(handle)
    }

    pub fn wait(&self, enclave: EnclaveId, handle: RawFd, capacity: usize, timeout_ms: c_int) -> Result<()> {
        self.wait_bridge.wait(enclave, handle, capacity, timeout_ms)
    }

    pub fn poll(&self, enclave: EnclaveId, handle: RawFd, entries: &[pollfd], timeout_ms: c_int) -> Result<()> {
        self.poll_bridge.poll(enclave, handle, entries, timeout_ms)
    }

    /// Workers that still own a wait or poll request.
    pub fn in_flight(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Requests released so far, whatever their outcome.
    pub fn released(&self) -> u64 {
        self.tracker.released()
    }

    /// Block until no worker is in flight or `timeout` passes; returns the
    /// number still in flight.
    pub fn wait_idle(&self, timeout: Duration) -> usize {
        self.tracker.wait_idle(timeout)
    }
}
