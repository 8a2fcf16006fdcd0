pub const DEFAULT_MAX_WAIT_EVENTS: usize = 4096;
pub const DEFAULT_MAX_POLL_FDS: usize = 4096;
pub const DEFAULT_WORKER_STACK_SIZE: usize = 64 * 1024; // 64KB
pub const MIN_WORKER_STACK_SIZE: usize = 16 * 1024; // 16KB
pub const DEFAULT_WORKER_NAME: &str = "hostpoll-worker";
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Timeout handed to the OS wait primitives: block until something is ready.
pub const WAIT_FOREVER: libc::c_int = -1;
