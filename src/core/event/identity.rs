// Identity codec for the per-registration epoll payload.
//
// The enclave hands the host two opaque 32-bit ids with every registration:
// the slot in its own interest list and its own descriptor id. Both ride in
// the u64 the kernel hands back with each ready event, so the host never keeps
// a side table. Low half = list index, high half = descriptor id.

/// Packed (list index, enclave fd id) pair stored in `epoll_event.u64`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IdentityPayload(u64);

impl IdentityPayload {
    /// Payload of the host's private wake source registration. Workers never
    /// decode it: a wake only happens once the device is cancelled, and a
    /// cancelled worker drops the whole batch. Enclave pairs may equal it.
    pub const WAKE: IdentityPayload = IdentityPayload(u64::MAX);

    pub const fn encode(list_index: u32, fd_id: u32) -> Self {
        IdentityPayload(((fd_id as u64) << 32) | list_index as u64)
    }

    pub const fn decode(self) -> (u32, u32) {
        (self.list_index(), self.fd_id())
    }

    pub const fn list_index(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }

    pub const fn fd_id(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn from_raw(raw: u64) -> Self {
        IdentityPayload(raw)
    }

    pub const fn into_raw(self) -> u64 {
        self.0
    }
}
