// Shared test utilities: a scripted OS backend and pipe helpers

use crossbeam_channel::{unbounded, Receiver, Sender};
use hostpoll::application::config::models::Config;
use hostpoll::application::host::PollingHost;
use hostpoll::common::error::{HostError, Result};
use hostpoll::core::bridge::transport::{
    ChannelTransport, Delivery, EnclaveId, EnclaveTransport, TransportError,
};
use hostpoll::core::event::identity::IdentityPayload;
use hostpoll::core::event::notification::NotificationRecord;
use hostpoll::core::event::poller::{ControlOp, PollingSys};
use libc::{c_int, epoll_event, pollfd};
use std::collections::{HashMap, HashSet};
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// What the next blocked `wait` returns.
#[allow(dead_code)]
pub enum WaitScript {
    Ready(Vec<epoll_event>),
    Fail(i32),
    Wake,
}

/// What the next blocked `poll` returns.
#[allow(dead_code)]
pub enum PollScript {
    Ready { revents: Vec<(usize, i16)>, reported: usize },
    Fail(i32),
    Wake,
}

struct FakeDevice {
    wait_tx: Sender<WaitScript>,
    wait_rx: Receiver<WaitScript>,
    registrations: HashMap<RawFd, u64>,
    wake_fd: Option<RawFd>,
}

/// `PollingSys` whose blocking calls return whatever the test scripts.
/// Wake-ups are level-triggered: a woken waiter re-arms the wake for the next.
pub struct FakeSys {
    next_fd: AtomicI32,
    devices: Mutex<HashMap<RawFd, FakeDevice>>,
    wake_fds: Mutex<HashSet<RawFd>>,
    poll_tx: Sender<PollScript>,
    poll_rx: Receiver<PollScript>,
}

#[allow(dead_code)]
impl FakeSys {
    pub fn new() -> Arc<Self> {
        let (poll_tx, poll_rx) = unbounded();
        Arc::new(Self {
            next_fd: AtomicI32::new(1000),
            devices: Mutex::new(HashMap::new()),
            wake_fds: Mutex::new(HashSet::new()),
            poll_tx,
            poll_rx,
        })
    }

    pub fn script_wait(&self, handle: RawFd, script: WaitScript) {
        let devices = self.devices.lock().unwrap();
        if let Some(device) = devices.get(&handle) {
            let _ = device.wait_tx.send(script);
        }
    }

    pub fn script_poll(&self, script: PollScript) {
        self.poll_tx.send(script).unwrap();
    }

    pub fn registered(&self, handle: RawFd) -> Vec<RawFd> {
        let devices = self.devices.lock().unwrap();
        let mut fds: Vec<RawFd> = devices[&handle]
            .registrations
            .keys()
            .copied()
            .filter(|fd| Some(*fd) != devices[&handle].wake_fd)
            .collect();
        fds.sort();
        fds
    }

    pub fn payload(&self, handle: RawFd, fd: RawFd) -> Option<IdentityPayload> {
        let devices = self.devices.lock().unwrap();
        devices[&handle]
            .registrations
            .get(&fd)
            .map(|raw| IdentityPayload::from_raw(*raw))
    }

    fn wait_rx(&self, handle: RawFd) -> Result<Receiver<WaitScript>> {
        let devices = self.devices.lock().unwrap();
        devices
            .get(&handle)
            .map(|d| d.wait_rx.clone())
            .ok_or(HostError::Os(libc::EBADF))
    }
}

impl PollingSys for FakeSys {
    fn create(&self, _flags: c_int) -> Result<RawFd> {
        let handle = self.next_fd.fetch_add(1, Ordering::SeqCst);
        let (wait_tx, wait_rx) = unbounded();
        self.devices.lock().unwrap().insert(
            handle,
            FakeDevice {
                wait_tx,
                wait_rx,
                registrations: HashMap::new(),
                wake_fd: None,
            },
        );
        Ok(handle)
    }

    fn control(&self, epfd: RawFd, op: ControlOp, fd: RawFd, event: Option<epoll_event>) -> Result<()> {
        let mut devices = self.devices.lock().unwrap();
        let device = devices.get_mut(&epfd).ok_or(HostError::Os(libc::EBADF))?;
        match op {
            ControlOp::Add => {
                if device.registrations.contains_key(&fd) {
                    return Err(HostError::Os(libc::EEXIST));
                }
                let raw = event.map(|e| e.u64).unwrap_or(0);
                if self.wake_fds.lock().unwrap().contains(&fd) {
                    device.wake_fd = Some(fd);
                }
                device.registrations.insert(fd, raw);
            }
            ControlOp::Modify => {
                let slot = device.registrations.get_mut(&fd).ok_or(HostError::Os(libc::ENOENT))?;
                *slot = event.map(|e| e.u64).unwrap_or(0);
            }
            ControlOp::Delete => {
                device.registrations.remove(&fd).ok_or(HostError::Os(libc::ENOENT))?;
            }
        }
        Ok(())
    }

    fn wait(&self, epfd: RawFd, events: &mut [epoll_event], _timeout_ms: c_int) -> Result<usize> {
        if events.is_empty() {
            return Err(HostError::Os(libc::EINVAL));
        }
        let rx = self.wait_rx(epfd)?;
        match rx.recv() {
            Ok(WaitScript::Ready(ready)) => {
                let n = ready.len().min(events.len());
                events[..n].copy_from_slice(&ready[..n]);
                Ok(n)
            }
            Ok(WaitScript::Fail(errno)) => Err(HostError::Os(errno)),
            Ok(WaitScript::Wake) => {
                self.script_wait(epfd, WaitScript::Wake);
                events[0] = epoll_event {
                    events: libc::EPOLLIN as u32,
                    u64: IdentityPayload::WAKE.into_raw(),
                };
                Ok(1)
            }
            Err(_) => Err(HostError::Os(libc::EBADF)),
        }
    }

    fn poll(&self, fds: &mut [pollfd], _timeout_ms: c_int) -> Result<usize> {
        match self.poll_rx.recv() {
            Ok(PollScript::Ready { revents, reported }) => {
                for (idx, mask) in revents {
                    fds[idx].revents = mask;
                }
                Ok(reported)
            }
            Ok(PollScript::Fail(errno)) => Err(HostError::Os(errno)),
            Ok(PollScript::Wake) => {
                self.script_poll(PollScript::Wake);
                if let Some(last) = fds.last_mut() {
                    last.revents = libc::POLLIN;
                }
                Ok(1)
            }
            Err(_) => Err(HostError::Os(libc::EBADF)),
        }
    }

    fn close(&self, fd: RawFd) -> Result<()> {
        let mut devices = self.devices.lock().unwrap();
        if devices.remove(&fd).is_some() {
            return Ok(());
        }
        if devices.values().any(|d| d.wake_fd == Some(fd)) {
            return Ok(());
        }
        Err(HostError::Os(libc::EBADF))
    }

    fn wake_source(&self) -> Result<RawFd> {
        let fd = self.next_fd.fetch_add(1, Ordering::SeqCst);
        self.wake_fds.lock().unwrap().insert(fd);
        Ok(fd)
    }

    fn wake(&self, fd: RawFd) -> Result<()> {
        let handle = {
            let devices = self.devices.lock().unwrap();
            devices
                .iter()
                .find(|(_, d)| d.wake_fd == Some(fd))
                .map(|(h, _)| *h)
                .ok_or(HostError::Os(libc::EBADF))?
        };
        self.script_wait(handle, WaitScript::Wake);
        self.script_poll(PollScript::Wake);
        Ok(())
    }
}

/// Transport whose every call fails at the transport level.
pub struct BrokenTransport;

impl EnclaveTransport for BrokenTransport {
    fn deliver(&self, enclave: EnclaveId, _records: &[NotificationRecord]) -> std::result::Result<i32, TransportError> {
        Err(TransportError::EnclaveGone(enclave))
    }
}

/// Short drain timeout so shutdown tests stay fast.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.shutdown.drain_timeout_ms = 2000;
    config
}

/// Host over the scripted backend, with its delivery receiver.
#[allow(dead_code)]
pub fn fake_host() -> (PollingHost, Arc<FakeSys>, Receiver<Delivery>) {
    fake_host_with(&test_config())
}

#[allow(dead_code)]
pub fn fake_host_with(config: &Config) -> (PollingHost, Arc<FakeSys>, Receiver<Delivery>) {
    let sys = FakeSys::new();
    let (transport, rx) = ChannelTransport::new();
    let host = PollingHost::new(config, sys.clone(), Arc::new(transport));
    (host, sys, rx)
}

/// Host over the real syscalls, with its delivery receiver.
#[allow(dead_code)]
pub fn linux_host() -> (PollingHost, Receiver<Delivery>) {
    let (transport, rx) = ChannelTransport::new();
    (PollingHost::linux(&test_config(), Arc::new(transport)), rx)
}

#[allow(dead_code)]
pub fn ready(mask: c_int, list_index: u32, fd_id: u32) -> epoll_event {
    epoll_event {
        events: mask as u32,
        u64: IdentityPayload::encode(list_index, fd_id).into_raw(),
    }
}

/// Anonymous pipe; closed on drop.
#[allow(dead_code)]
pub struct Pipe {
    pub read: RawFd,
    pub write: RawFd,
}

#[allow(dead_code)]
impl Pipe {
    pub fn new() -> Self {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        Self {
            read: fds[0],
            write: fds[1],
        }
    }

    pub fn make_readable(&self) {
        let byte = [7u8];
        let n = unsafe { libc::write(self.write, byte.as_ptr() as *const libc::c_void, 1) };
        assert_eq!(n, 1);
    }
}

impl Drop for Pipe {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.read);
            libc::close(self.write);
        }
    }
}
