use crate::core::event::notification::NotificationRecord;
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};
use std::fmt;
use thiserror::Error;

/// Opaque id of the enclave a wait was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnclaveId(pub u64);

impl fmt::Display for EnclaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("enclave {0} is no longer reachable")]
    EnclaveGone(EnclaveId),

    #[error("transport failure: {0}")]
    Failed(String),
}

/// The host→enclave "deliver notifications" call.
pub trait EnclaveTransport: Send + Sync + 'static {
    /// Deliver one batch. `Ok` carries the enclave's own status; zero means
    /// the enclave accepted the batch.
    fn deliver(&self, enclave: EnclaveId, records: &[NotificationRecord]) -> Result<i32, TransportError>;
}

/// Make the single delivery call for a wake-up. Failures end the attempt;
/// there is no retry and nothing is reported to the original caller.
pub(crate) fn deliver_once(transport: &dyn EnclaveTransport, enclave: EnclaveId, records: &[NotificationRecord]) {
    match transport.deliver(enclave, records) {
        Ok(0) => debug!("delivered {} notification(s) to enclave {}", records.len(), enclave),
        Ok(status) => debug!("enclave {} rejected {} notification(s): status {}", enclave, records.len(), status),
        Err(e) => warn!("delivery to enclave {} failed: {}", enclave, e),
    }
}

/// One batch as seen by a [`ChannelTransport`] receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub enclave: EnclaveId,
    pub records: Vec<NotificationRecord>,
}

/// In-process transport: every batch is copied into a channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: Sender<Delivery>,
    status: i32,
}

impl ChannelTransport {
    pub fn new() -> (Self, Receiver<Delivery>) {
        Self::with_status(0)
    }

    /// Transport whose enclave answers every batch with `status`.
    pub fn with_status(status: i32) -> (Self, Receiver<Delivery>) {
        let (tx, rx) = unbounded();
        (Self { tx, status }, rx)
    }
}

impl EnclaveTransport for ChannelTransport {
    fn deliver(&self, enclave: EnclaveId, records: &[NotificationRecord]) -> Result<i32, TransportError> {
        self.tx
            .send(Delivery {
                enclave,
                records: records.to_vec(),
            })
            .map_err(|_| TransportError::EnclaveGone(enclave))?;
        Ok(self.status)
    }
}
