use crate::core::bridge::tracker::WorkerTracker;
use std::collections::HashMap;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Host-side state for a device created through `DeviceControl`.
///
/// Interest registrations are not tracked here; they live only in the
/// kernel's per-registration payload.
#[derive(Debug)]
pub struct DeviceState {
    handle: RawFd,
    wake_fd: Option<RawFd>,
    cancelled: AtomicBool,
    workers: Arc<WorkerTracker>,
}

impl DeviceState {
    pub fn new(handle: RawFd, wake_fd: Option<RawFd>) -> Self {
        Self {
            handle,
            wake_fd,
            cancelled: AtomicBool::new(false),
            workers: WorkerTracker::new(),
        }
    }

    pub fn handle(&self) -> RawFd {
        self.handle
    }

    /// Private eventfd registered on the device, if one could be created.
    pub fn wake_fd(&self) -> Option<RawFd> {
        self.wake_fd
    }

    pub fn workers(&self) -> &Arc<WorkerTracker> {
        &self.workers
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Mutex<HashMap<RawFd, Arc<DeviceState>>>,
}

impl DeviceRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, state: DeviceState) -> Arc<DeviceState> {
        let state = Arc::new(state);
        self.lock().insert(state.handle(), Arc::clone(&state));
        state
    }

    pub fn get(&self, handle: RawFd) -> Option<Arc<DeviceState>> {
        self.lock().get(&handle).cloned()
    }

    pub fn remove(&self, handle: RawFd) -> Option<Arc<DeviceState>> {
        self.lock().remove(&handle)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RawFd, Arc<DeviceState>>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
