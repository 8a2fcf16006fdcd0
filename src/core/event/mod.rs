pub mod identity;
pub mod notification;
pub mod poller;

pub use identity::IdentityPayload;
pub use notification::NotificationRecord;
pub use poller::{ControlOp, LinuxPoller, PollingSys};
