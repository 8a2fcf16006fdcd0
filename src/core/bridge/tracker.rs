use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Counts workers that still own a request.
#[derive(Debug, Default)]
pub struct WorkerTracker {
    outstanding: Mutex<usize>,
    idle: Condvar,
    released: AtomicU64,
}

impl WorkerTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn outstanding(&self) -> usize {
        *self.lock()
    }

    /// Total tickets ever released.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Block until nothing is outstanding or `timeout` passes.
    /// Returns how many workers are still outstanding.
    pub fn wait_idle(&self, timeout: Duration) -> usize {
        let guard = self.lock();
        let (guard, _) = self
            .idle
            .wait_timeout_while(guard, timeout, |n| *n > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.outstanding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) {
        *self.lock() += 1;
    }

    fn leave(&self) {
        let mut n = self.lock();
        *n = n.saturating_sub(1);
        self.released.fetch_add(1, Ordering::SeqCst);
        if *n == 0 {
            self.idle.notify_all();
        }
    }
}

/// Held by every request; counts it against the host and, when the device is
/// known, against the device. Dropping the request releases it.
#[derive(Debug)]
pub struct WorkerTicket {
    host: Arc<WorkerTracker>,
    device: Option<Arc<WorkerTracker>>,
}

impl WorkerTicket {
    pub fn issue(host: &Arc<WorkerTracker>, device: Option<&Arc<WorkerTracker>>) -> Self {
        host.enter();
        if let Some(device) = device {
            device.enter();
        }
        Self {
            host: Arc::clone(host),
            device: device.map(Arc::clone),
        }
    }
}

impl Drop for WorkerTicket {
    fn drop(&mut self) {
        if let Some(ref device) = self.device {
            device.leave();
        }
        self.host.leave();
    }
}
