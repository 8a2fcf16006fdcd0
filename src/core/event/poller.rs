use crate::common::error::{HostError, Result};
use libc::{c_int, epoll_event, pollfd};
use std::os::unix::io::RawFd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOp {
    Add,
    Modify,
    Delete,
}

impl ControlOp {
    fn as_raw(self) -> c_int {
        match self {
            ControlOp::Add => libc::EPOLL_CTL_ADD,
            ControlOp::Modify => libc::EPOLL_CTL_MOD,
            ControlOp::Delete => libc::EPOLL_CTL_DEL,
        }
    }
}

/// The OS polling primitives the host drives on the enclave's behalf.
///
/// Implementations must tolerate concurrent calls on the same device from
/// control operations and any number of blocked waiters; the host adds no
/// locking of its own around a device handle.
pub trait PollingSys: Send + Sync + 'static {
    fn create(&self, flags: c_int) -> Result<RawFd>;

    fn control(&self, epfd: RawFd, op: ControlOp, fd: RawFd, event: Option<epoll_event>) -> Result<()>;

    /// Block until at least one registered descriptor is ready. Ready records
    /// are compacted to the front of `events`; returns how many were filled.
    fn wait(&self, epfd: RawFd, events: &mut [epoll_event], timeout_ms: c_int) -> Result<usize>;

    /// Block on an explicit descriptor list, filling `revents` in place.
    /// Returns the number of entries with a non-zero `revents`.
    fn poll(&self, fds: &mut [pollfd], timeout_ms: c_int) -> Result<usize>;

    fn close(&self, fd: RawFd) -> Result<()>;

    /// A descriptor that can be made permanently readable with [`wake`].
    ///
    /// [`wake`]: PollingSys::wake
    fn wake_source(&self) -> Result<RawFd>;

    fn wake(&self, fd: RawFd) -> Result<()>;
}

/// `PollingSys` over the real Linux syscalls.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPoller;

impl PollingSys for LinuxPoller {
    fn create(&self, flags: c_int) -> Result<RawFd> {
        let epfd = unsafe { libc::epoll_create1(flags) };
        if epfd < 0 {
            return Err(HostError::last_os_error());
        }
        Ok(epfd)
    }

    fn control(&self, epfd: RawFd, op: ControlOp, fd: RawFd, event: Option<epoll_event>) -> Result<()> {
        let mut ev = event;
        let ev_ptr = match ev.as_mut() {
            Some(ev) => ev as *mut epoll_event,
            None => std::ptr::null_mut(),
        };

        if unsafe { libc::epoll_ctl(epfd, op.as_raw(), fd, ev_ptr) } < 0 {
            return Err(HostError::last_os_error());
        }
        Ok(())
    }

    fn wait(&self, epfd: RawFd, events: &mut [epoll_event], timeout_ms: c_int) -> Result<usize> {
        let max = events.len().min(c_int::MAX as usize) as c_int;
        loop {
            let n = unsafe { libc::epoll_wait(epfd, events.as_mut_ptr(), max, timeout_ms) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(HostError::from_os(err));
            }
        }
    }

    fn poll(&self, fds: &mut [pollfd], timeout_ms: c_int) -> Result<usize> {
        loop {
            let n = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(HostError::from_os(err));
            }
        }
    }

    fn close(&self, fd: RawFd) -> Result<()> {
        if unsafe { libc::close(fd) } < 0 {
            return Err(HostError::last_os_error());
        }
        Ok(())
    }

    fn wake_source(&self) -> Result<RawFd> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        if fd < 0 {
            return Err(HostError::last_os_error());
        }
        Ok(fd)
    }

    fn wake(&self, fd: RawFd) -> Result<()> {
        let one: u64 = 1;
        let n = unsafe {
            libc::write(
                fd,
                &one as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        // EAGAIN means the counter is already saturated, i.e. already readable.
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EAGAIN) {
                return Err(HostError::from_os(err));
            }
        }
        Ok(())
    }
}
