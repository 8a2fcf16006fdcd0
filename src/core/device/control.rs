use crate::common::error::{HostError, Result};
use crate::core::device::registry::{DeviceRegistry, DeviceState};
use crate::core::event::identity::IdentityPayload;
use crate::core::event::poller::{ControlOp, PollingSys};
use libc::{c_int, epoll_event};
use log::{debug, warn};
use std::os::unix::io::RawFd;
use std::sync::Arc;
use std::time::Duration;

/// Synchronous operations on host polling devices.
pub struct DeviceControl {
    sys: Arc<dyn PollingSys>,
    registry: Arc<DeviceRegistry>,
    drain_timeout: Duration,
}

impl DeviceControl {
    pub fn new(sys: Arc<dyn PollingSys>, registry: Arc<DeviceRegistry>, drain_timeout: Duration) -> Self {
        Self {
            sys,
            registry,
            drain_timeout,
        }
    }

    /// Create a device. A private wake source is attached so the device can
    /// later be shut down; if that fails the device still works, it just
    /// cannot interrupt blocked waiters.
    pub fn create(&self, flags: c_int) -> Result<RawFd> {
        let handle = self.sys.create(flags)?;
        let wake_fd = match self.attach_wake_source(handle) {
            Ok(fd) => Some(fd),
            Err(e) => {
                warn!("device {}: no wake source, shutdown cannot interrupt waiters: {}", handle, e);
                None
            }
        };
        self.registry.insert(DeviceState::new(handle, wake_fd));
        debug!("device {} created (flags {:#x})", handle, flags);
        Ok(handle)
    }

    pub fn add(&self, handle: RawFd, fd: RawFd, event_mask: u32, list_index: u32, fd_id: u32) -> Result<()> {
        let event = interest(event_mask, list_index, fd_id);
        self.sys.control(handle, ControlOp::Add, fd, Some(event))
    }

    pub fn modify(&self, handle: RawFd, fd: RawFd, event_mask: u32, list_index: u32, fd_id: u32) -> Result<()> {
        let event = interest(event_mask, list_index, fd_id);
        self.sys.control(handle, ControlOp::Modify, fd, Some(event))
    }

    pub fn delete(&self, handle: RawFd, fd: RawFd) -> Result<()> {
        self.sys.control(handle, ControlOp::Delete, fd, None)
    }

    /// Release the handle. Workers already blocked on it are not woken;
    /// call [`shutdown`](Self::shutdown) first for a clean stop.
    pub fn close(&self, handle: RawFd) -> Result<()> {
        // Host state goes first: once the kernel frees the number, a
        // concurrent create may reuse it and register a new device under it.
        if let Some(state) = self.registry.remove(handle) {
            let outstanding = state.workers().outstanding();
            if outstanding > 0 {
                warn!("device {} closed with {} worker(s) still waiting", handle, outstanding);
            }
            if let Some(wake_fd) = state.wake_fd() {
                if let Err(e) = self.sys.close(wake_fd) {
                    warn!("device {}: failed to close wake source {}: {}", handle, wake_fd, e);
                }
            }
        }

        self.sys.close(handle)
    }

    /// Cancel the device, wake every blocked worker on it and wait for them
    /// to drain. New waits on the device are refused from here on. The
    /// handle itself stays open.
    pub fn shutdown(&self, handle: RawFd) -> Result<()> {
        let state = self.registry.get(handle).ok_or(HostError::Os(libc::EBADF))?;

        state.cancel();
        if let Some(wake_fd) = state.wake_fd() {
            self.sys.wake(wake_fd)?;
        }

        let outstanding = state.workers().wait_idle(self.drain_timeout);
        if outstanding > 0 {
            return Err(HostError::DrainTimeout {
                handle,
                outstanding,
            });
        }

        debug!("device {} shut down", handle);
        Ok(())
    }

    pub fn device(&self, handle: RawFd) -> Option<Arc<DeviceState>> {
        self.registry.get(handle)
    }

    fn attach_wake_source(&self, handle: RawFd) -> Result<RawFd> {
        let wake_fd = self.sys.wake_source()?;
        let event = epoll_event {
            events: libc::EPOLLIN as u32,
            u64: IdentityPayload::WAKE.into_raw(),
        };
        if let Err(e) = self.sys.control(handle, ControlOp::Add, wake_fd, Some(event)) {
            let _ = self.sys.close(wake_fd);
            return Err(e);
        }
        Ok(wake_fd)
    }
}

fn interest(event_mask: u32, list_index: u32, fd_id: u32) -> epoll_event {
    epoll_event {
        events: event_mask,
        u64: IdentityPayload::encode(list_index, fd_id).into_raw(),
    }
}
