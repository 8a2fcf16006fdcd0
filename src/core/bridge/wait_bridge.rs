use crate::common::constants::WAIT_FOREVER;
use crate::common::error::{HostError, Result};
use crate::core::bridge::request::WaitRequest;
use crate::core::bridge::tracker::WorkerTracker;
use crate::core::bridge::transport::{deliver_once, EnclaveId, EnclaveTransport};
use crate::core::bridge::worker::{spawn_detached, WorkerSettings};
use crate::core::device::registry::DeviceRegistry;
use crate::core::event::notification::NotificationRecord;
use crate::core::event::poller::PollingSys;
use libc::c_int;
use log::debug;
use std::os::unix::io::RawFd;
use std::sync::Arc;

/// Turns a blocking `epoll_wait` into one asynchronous delivery.
///
/// Several waits may be outstanding on one device at once. They are not
/// serialized: each ready event reaches at most one of them, in no
/// particular order, exactly as the kernel hands it out.
pub struct WaitBridge {
    sys: Arc<dyn PollingSys>,
    transport: Arc<dyn EnclaveTransport>,
    registry: Arc<DeviceRegistry>,
    tracker: Arc<WorkerTracker>,
    settings: WorkerSettings,
}

impl WaitBridge {
    pub fn new(
        sys: Arc<dyn PollingSys>,
        transport: Arc<dyn EnclaveTransport>,
        registry: Arc<DeviceRegistry>,
        tracker: Arc<WorkerTracker>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            sys,
            transport,
            registry,
            tracker,
            settings,
        }
    }

    /// Queue a wait for up to `capacity` events and return at once.
    ///
    /// `Ok` only means a worker now owns the wait. The worker blocks without
    /// a timeout (`_timeout_ms` is not honoured) and later delivers at most
    /// one batch; if the wait or the delivery fails, nothing is reported.
    pub fn wait(&self, enclave: EnclaveId, handle: RawFd, capacity: usize, _timeout_ms: c_int) -> Result<()> {
        if capacity > self.settings.max_wait_events {
            return Err(HostError::OutOfMemory(format!(
                "wait capacity {} exceeds limit {}",
                capacity, self.settings.max_wait_events
            )));
        }

        let device = self.registry.get(handle);
        let request = WaitRequest::allocate(enclave, handle, capacity, device, &self.tracker)?;
        // Checked only once the ticket counts against the device, so a
        // shutdown that already drained can never see this request missing.
        if request.is_cancelled() {
            return Err(HostError::Shutdown(handle));
        }

        let sys = Arc::clone(&self.sys);
        let transport = Arc::clone(&self.transport);
        spawn_detached(&self.settings, move || {
            run_wait(sys.as_ref(), transport.as_ref(), request)
        })?;

        debug!("wait queued on device {} for enclave {} ({} slots)", handle, enclave, capacity);
        Ok(())
    }
}

fn run_wait(sys: &dyn PollingSys, transport: &dyn EnclaveTransport, mut request: WaitRequest) {
    if request.is_cancelled() {
        return;
    }

    let filled = match sys.wait(request.handle, &mut request.events, WAIT_FOREVER) {
        Ok(n) => n.min(request.events.len()),
        Err(e) => {
            debug!("wait on device {} failed: {}", request.handle, e);
            return;
        }
    };

    // A shutdown wake always comes with the cancel flag already set.
    if request.is_cancelled() {
        debug!("device {} shut down, dropping {} event(s)", request.handle, filled);
        return;
    }

    let records = NotificationRecord::view(&request.events[..filled]);
    deliver_once(transport, request.enclave, records);
}
