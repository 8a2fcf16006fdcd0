use crate::common::constants::WAIT_FOREVER;
use crate::common::error::{HostError, Result};
use crate::core::bridge::request::PollRequest;
use crate::core::bridge::tracker::WorkerTracker;
use crate::core::bridge::transport::{deliver_once, EnclaveId, EnclaveTransport};
use crate::core::bridge::worker::{spawn_detached, WorkerSettings};
use crate::core::device::registry::DeviceRegistry;
use crate::core::event::poller::PollingSys;
use libc::{c_int, pollfd};
use log::{debug, error};
use std::os::unix::io::RawFd;
use std::sync::Arc;

/// `poll(2)` counterpart of the wait bridge. Notifications name the entry's
/// position in the enclave's list and the device handle, not an identity
/// payload.
pub struct PollBridge {
    sys: Arc<dyn PollingSys>,
    transport: Arc<dyn EnclaveTransport>,
    registry: Arc<DeviceRegistry>,
    tracker: Arc<WorkerTracker>,
    settings: WorkerSettings,
}

impl PollBridge {
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

    pub fn poll(&self, enclave: EnclaveId, handle: RawFd, entries: &[pollfd], _timeout_ms: c_int) -> Result<()> {
        if entries.len() > self.settings.max_poll_fds {
            return Err(HostError::OutOfMemory(format!(
                "{} poll entries exceed limit {}",
                entries.len(),
                self.settings.max_poll_fds
            )));
        }

        let device = self.registry.get(handle);
        let request = PollRequest::allocate(enclave, handle, entries, device, &self.tracker)?;
        // Checked only once the ticket counts against the device, so a
        // shutdown that already drained can never see this request missing.
        if request.is_cancelled() {
            return Err(HostError::Shutdown(handle));
        }

        let sys = Arc::clone(&self.sys);
        let transport = Arc::clone(&self.transport);
        spawn_detached(&self.settings, move || {
            run_poll(sys.as_ref(), transport.as_ref(), request)
        })?;

        debug!("poll queued on device {} for enclave {} ({} entries)", handle, enclave, entries.len());
        Ok(())
    }
}

fn run_poll(sys: &dyn PollingSys, transport: &dyn EnclaveTransport, mut request: PollRequest) {
    if request.is_cancelled() {
        return;
    }

    let ready = match sys.poll(&mut request.fds, WAIT_FOREVER) {
        Ok(n) => n,
        Err(e) => {
            debug!("poll on device {} failed: {}", request.handle, e);
            return;
        }
    };

    if request.is_cancelled() {
        debug!("device {} shut down, dropping poll result", request.handle);
        return;
    }

    let enclave = request.enclave;
    match request.select(ready) {
        Ok(records) => deliver_once(transport, enclave, records),
        Err(e) => error!("{}", e),
    }
}
