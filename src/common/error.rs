use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    /// An OS primitive failed; the code is kept verbatim for the enclave.
    #[error("OS error: {}", os_message(.0))]
    Os(i32),

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("Failed to spawn worker: {0}")]
    Spawn(io::Error),

    #[error("Device {0} has been shut down")]
    Shutdown(i32),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal consistency error: {0}")]
    Inconsistent(String),

    #[error("Device {handle} still has {outstanding} worker(s) after drain timeout")]
    DrainTimeout { handle: i32, outstanding: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl HostError {
    /// Capture `errno` after a failed libc call.
    pub fn last_os_error() -> Self {
        Self::from_os(io::Error::last_os_error())
    }

    /// Keep the raw OS code when there is one.
    pub fn from_os(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) => HostError::Os(code),
            None => HostError::Io(err),
        }
    }

    /// The errno-compatible code written to the boundary error out-parameter.
    pub fn errno(&self) -> i32 {
        match self {
            HostError::Os(code) => *code,
            HostError::OutOfMemory(_) => libc::ENOMEM,
            HostError::Spawn(e) => e.raw_os_error().unwrap_or(libc::EINVAL),
            HostError::Shutdown(_) => libc::ESHUTDOWN,
            HostError::InvalidArgument(_) => libc::EINVAL,
            HostError::Inconsistent(_) => libc::EIO,
            HostError::DrainTimeout { .. } => libc::ETIMEDOUT,
            HostError::Config(_) => libc::EINVAL,
            HostError::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

fn os_message(code: &i32) -> io::Error {
    io::Error::from_raw_os_error(*code)
}

pub type Result<T> = std::result::Result<T, HostError>;
