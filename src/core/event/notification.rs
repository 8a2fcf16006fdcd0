use crate::core::event::identity::IdentityPayload;
use libc::epoll_event;
use std::fmt;
use std::mem;

/// One readiness notification delivered to the enclave.
///
/// The wait bridge never builds these: the kernel fills a buffer of
/// `epoll_event`s and the bridge hands that same memory over as a slice of
/// records (see [`NotificationRecord::view`]). The layout therefore mirrors
/// `libc::epoll_event` exactly, including its packing on x86.
#[repr(C)]
#[cfg_attr(
    any(
        all(
            target_arch = "x86",
            not(target_env = "musl"),
            not(target_os = "android")
        ),
        target_arch = "x86_64"
    ),
    repr(packed)
)]
#[derive(Clone, Copy)]
pub struct NotificationRecord {
    event_mask: u32,
    data: IdentityPayload,
}

// Overlay contract with the kernel's record.
const _: () = {
    assert!(mem::size_of::<NotificationRecord>() == mem::size_of::<epoll_event>());
    assert!(mem::align_of::<NotificationRecord>() <= mem::align_of::<epoll_event>());
    assert!(mem::offset_of!(NotificationRecord, event_mask) == mem::offset_of!(epoll_event, events));
    assert!(mem::offset_of!(NotificationRecord, data) == mem::offset_of!(epoll_event, u64));
};

impl NotificationRecord {
    pub fn new(event_mask: u32, list_index: u32, device: u32) -> Self {
        Self {
            event_mask,
            data: IdentityPayload::encode(list_index, device),
        }
    }

    /// Reinterpret filled kernel records as notifications without copying.
    pub fn view(events: &[epoll_event]) -> &[NotificationRecord] {
        // SAFETY: both types are plain-old-data with identical size and field
        // offsets, and NotificationRecord's alignment is no stricter than
        // epoll_event's (asserted at compile time above). Every bit pattern
        // is valid for u32/u64, and the borrow keeps the buffer alive.
        unsafe { std::slice::from_raw_parts(events.as_ptr().cast::<NotificationRecord>(), events.len()) }
    }

    pub fn event_mask(&self) -> u32 {
        self.event_mask
    }

    pub fn payload(&self) -> IdentityPayload {
        self.data
    }

    pub fn list_index(&self) -> u32 {
        self.payload().list_index()
    }

    /// Enclave fd id registered with the interest (wait bridge), or the
    /// host device handle (poll bridge).
    pub fn device(&self) -> u32 {
        self.payload().fd_id()
    }
}

impl PartialEq for NotificationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.event_mask() == other.event_mask() && self.payload() == other.payload()
    }
}

impl Eq for NotificationRecord {}

impl fmt::Debug for NotificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRecord")
            .field("event_mask", &self.event_mask())
            .field("list_index", &self.list_index())
            .field("device", &self.device())
            .finish()
    }
}
