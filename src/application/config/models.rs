use crate::common::constants::{
    DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_MAX_POLL_FDS, DEFAULT_MAX_WAIT_EVENTS,
    DEFAULT_WORKER_NAME, DEFAULT_WORKER_STACK_SIZE,
};
use crate::core::bridge::worker::WorkerSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Wait/poll worker settings
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Device shutdown behaviour
    #[serde(default)]
    pub shutdown: ShutdownConfig,

    /// `env_logger` filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// Worker thread and request-size limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Largest accepted wait capacity; above it a wait fails with ENOMEM
    #[serde(default = "default_max_wait_events")]
    pub max_wait_events: usize,

    /// Largest accepted poll list; above it a poll fails with ENOMEM
    #[serde(default = "default_max_poll_fds")]
    pub max_poll_fds: usize,

    /// Stack size of each worker thread in bytes
    #[serde(default = "default_worker_stack_size")]
    pub worker_stack_size: usize,

    /// Thread name given to workers
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShutdownConfig {
    /// How long shutdown waits for a device's workers to drain
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

fn default_max_wait_events() -> usize {
    DEFAULT_MAX_WAIT_EVENTS
}

fn default_max_poll_fds() -> usize {
    DEFAULT_MAX_POLL_FDS
}

fn default_worker_stack_size() -> usize {
    DEFAULT_WORKER_STACK_SIZE
}

fn default_worker_name() -> String {
    DEFAULT_WORKER_NAME.to_string()
}

fn default_drain_timeout_ms() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            shutdown: ShutdownConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_wait_events: default_max_wait_events(),
            max_poll_fds: default_max_poll_fds(),
            worker_stack_size: default_worker_stack_size(),
            worker_name: default_worker_name(),
        }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            name: self.worker_name.clone(),
            stack_size: self.worker_stack_size,
            max_wait_events: self.max_wait_events,
            max_poll_fds: self.max_poll_fds,
        }
    }
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
