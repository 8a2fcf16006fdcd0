use crate::common::error::{HostError, Result};
use crate::core::bridge::tracker::{WorkerTicket, WorkerTracker};
use crate::core::bridge::transport::EnclaveId;
use crate::core::device::registry::DeviceState;
use crate::core::event::notification::NotificationRecord;
use libc::{epoll_event, pollfd};
use std::os::unix::io::RawFd;
use std::sync::Arc;

/// Everything one wait worker needs. Moved into the worker on spawn and
/// dropped by it on every exit path; dropping releases the ticket.
pub struct WaitRequest {
    pub enclave: EnclaveId,
    pub handle: RawFd,
    pub events: Vec<epoll_event>,
    device: Option<Arc<DeviceState>>,
    _ticket: WorkerTicket,
}

impl WaitRequest {
    pub fn allocate(
        enclave: EnclaveId,
        handle: RawFd,
        capacity: usize,
        device: Option<Arc<DeviceState>>,
        host: &Arc<WorkerTracker>,
    ) -> Result<Self> {
        let mut events = Vec::new();
        events.try_reserve_exact(capacity).map_err(|e| {
            HostError::OutOfMemory(format!("{} wait slot(s): {}", capacity, e))
        })?;
        events.resize(capacity, epoll_event { events: 0, u64: 0 });

        let ticket = WorkerTicket::issue(host, device.as_ref().map(|d| d.workers()));
        Ok(Self {
            enclave,
            handle,
            events,
            device,
            _ticket: ticket,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        is_cancelled(&self.device)
    }
}

/// A poll worker's copy of the enclave's descriptor list plus room for the
/// notifications it may produce.
pub struct PollRequest {
    pub enclave: EnclaveId,
    pub handle: RawFd,
    /// The enclave's entries, then the device wake source if it has one.
    pub fds: Vec<pollfd>,
    requested: usize,
    notifications: Vec<NotificationRecord>,
    device: Option<Arc<DeviceState>>,
    _ticket: WorkerTicket,
}

impl PollRequest {
    pub fn allocate(
        enclave: EnclaveId,
        handle: RawFd,
        entries: &[pollfd],
        device: Option<Arc<DeviceState>>,
        host: &Arc<WorkerTracker>,
    ) -> Result<Self> {
        let wake_fd = device.as_ref().and_then(|d| d.wake_fd());
        let total = entries.len() + usize::from(wake_fd.is_some());

        let mut fds = Vec::new();
        fds.try_reserve_exact(total).map_err(|e| {
            HostError::OutOfMemory(format!("{} poll entries: {}", total, e))
        })?;
        let mut notifications = Vec::new();
        notifications.try_reserve_exact(entries.len()).map_err(|e| {
            HostError::OutOfMemory(format!("{} notification(s): {}", entries.len(), e))
        })?;

        fds.extend(entries.iter().map(|e| pollfd {
            fd: e.fd,
            events: e.events,
            revents: 0,
        }));
        if let Some(fd) = wake_fd {
            fds.push(pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            });
        }

        let ticket = WorkerTicket::issue(host, device.as_ref().map(|d| d.workers()));
        Ok(Self {
            enclave,
            handle,
            fds,
            requested: entries.len(),
            notifications,
            device,
            _ticket: ticket,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        is_cancelled(&self.device)
    }

    /// Pick the enclave's entries that came back with a result mask, in list
    /// order. `ready` is what the OS reported; a different number of
    /// populated entries is an internal error.
    pub fn select(&mut self, ready: usize) -> Result<&[NotificationRecord]> {
        self.notifications.clear();
        let device = self.handle as u32;
        for (idx, entry) in self.fds[..self.requested].iter().enumerate() {
            if entry.revents != 0 {
                let mask = u32::from(entry.revents as u16);
                self.notifications.push(NotificationRecord::new(mask, idx as u32, device));
            }
        }

        if self.notifications.len() != ready {
            return Err(HostError::Inconsistent(format!(
                "poll on device {} reported {} ready entries but {} carry a result",
                self.handle,
                ready,
                self.notifications.len()
            )));
        }
        Ok(&self.notifications)
    }
}

fn is_cancelled(device: &Option<Arc<DeviceState>>) -> bool {
    device.as_ref().map_or(false, |d| d.is_cancelled())
}
