use crate::common::constants::{
    DEFAULT_MAX_POLL_FDS, DEFAULT_MAX_WAIT_EVENTS, DEFAULT_WORKER_NAME, DEFAULT_WORKER_STACK_SIZE,
};
use crate::common::error::{HostError, Result};
use std::thread;

/// Limits and thread parameters shared by both bridges.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub name: String,
    pub stack_size: usize,
    pub max_wait_events: usize,
    pub max_poll_fds: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_WORKER_NAME.to_string(),
            stack_size: DEFAULT_WORKER_STACK_SIZE,
            max_wait_events: DEFAULT_MAX_WAIT_EVENTS,
            max_poll_fds: DEFAULT_MAX_POLL_FDS,
        }
    }
}

/// Start a detached worker. Nothing joins it; the closure owns its request
/// and, if the thread cannot be created, the closure and the request it
/// captured are dropped here.
pub fn spawn_detached<F>(settings: &WorkerSettings, f: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(settings.name.clone())
        .stack_size(settings.stack_size)
        .spawn(f)
        .map(drop)
        .map_err(HostError::Spawn)
}
