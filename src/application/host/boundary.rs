// Boundary surface called by the enclave-call dispatcher.
//
// Each call returns -1 on failure and writes an errno-compatible code to
// `err`, or returns a non-negative value on success and leaves `err` alone.
// For `wait` and `poll` a zero return only acknowledges that a worker owns
// the request; what happens afterwards is never reported here.

use crate::application::host::polling_host::PollingHost;
use crate::common::error::Result;
use crate::core::bridge::transport::EnclaveId;
use libc::{c_int, pollfd};
use log::debug;
use std::os::unix::io::RawFd;

fn report<T>(op: &str, result: Result<T>, err: Option<&mut c_int>, ok: impl FnOnce(T) -> c_int) -> c_int {
    match result {
        Ok(value) => ok(value),
        Err(e) => {
            debug!("{} failed: {}", op, e);
            if let Some(err) = err {
                *err = e.errno();
            }
            -1
        }
    }
}

/// Returns the new device handle.
pub fn create(host: &PollingHost, flags: c_int, err: Option<&mut c_int>) -> c_int {
    report("create", host.create(flags), err, |handle| handle)
}

pub fn add(
    host: &PollingHost,
    handle: RawFd,
    fd: RawFd,
    event_mask: u32,
    list_index: u32,
    fd_id: u32,
    err: Option<&mut c_int>,
) -> c_int {
    let result = host.add(handle, fd, event_mask, list_index, fd_id);
    report("add", result, err, |()| 0)
}

pub fn modify(
    host: &PollingHost,
    handle: RawFd,
    fd: RawFd,
    event_mask: u32,
    list_index: u32,
    fd_id: u32,
    err: Option<&mut c_int>,
) -> c_int {
    let result = host.modify(handle, fd, event_mask, list_index, fd_id);
    report("modify", result, err, |()| 0)
}

pub fn delete(host: &PollingHost, handle: RawFd, fd: RawFd, err: Option<&mut c_int>) -> c_int {
    report("delete", host.delete(handle, fd), err, |()| 0)
}

pub fn close(host: &PollingHost, handle: RawFd, err: Option<&mut c_int>) -> c_int {
    report("close", host.close(handle), err, |()| 0)
}

pub fn shutdown(host: &PollingHost, handle: RawFd, err: Option<&mut c_int>) -> c_int {
    report("shutdown", host.shutdown(handle), err, |()| 0)
}

pub fn wait(
    host: &PollingHost,
    enclave_id: u64,
    handle: RawFd,
    max_events: usize,
    timeout_ms: c_int,
    err: Option<&mut c_int>,
) -> c_int {
    let result = host.wait(EnclaveId(enclave_id), handle, max_events, timeout_ms);
    report("wait", result, err, |()| 0)
}

pub fn poll(
    host: &PollingHost,
    enclave_id: u64,
    handle: RawFd,
    fds: &[pollfd],
    timeout_ms: c_int,
    err: Option<&mut c_int>,
) -> c_int {
    let result = host.poll(EnclaveId(enclave_id), handle, fds, timeout_ms);
    report("poll", result, err, |()| 0)
}
