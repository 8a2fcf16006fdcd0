use crate::application::config::models::{BridgeConfig, Config, ShutdownConfig};
use crate::common::constants::MIN_WORKER_STACK_SIZE;
use crate::common::error::{HostError, Result};

/// Validate configuration for correctness and consistency
pub fn validate_config(config: &Config) -> Result<()> {
    validate_bridge(&config.bridge)?;
    validate_shutdown(&config.shutdown)?;

    if config.log_filter.trim().is_empty() {
        return Err(HostError::Config("log_filter cannot be empty".to_string()));
    }

    Ok(())
}

fn validate_bridge(bridge: &BridgeConfig) -> Result<()> {
    if bridge.max_wait_events == 0 {
        return Err(HostError::Config(
            "bridge.max_wait_events must be greater than 0".to_string(),
        ));
    }

    // epoll_wait takes its capacity as a C int
    if bridge.max_wait_events > libc::c_int::MAX as usize {
        return Err(HostError::Config(format!(
            "bridge.max_wait_events cannot exceed {}",
            libc::c_int::MAX
        )));
    }

    if bridge.max_poll_fds == 0 {
        return Err(HostError::Config(
            "bridge.max_poll_fds must be greater than 0".to_string(),
        ));
    }

    if bridge.worker_stack_size < MIN_WORKER_STACK_SIZE {
        return Err(HostError::Config(format!(
            "bridge.worker_stack_size must be at least {} bytes",
            MIN_WORKER_STACK_SIZE
        )));
    }

    if bridge.worker_name.is_empty() {
        return Err(HostError::Config(
            "bridge.worker_name cannot be empty".to_string(),
        ));
    }

    // Thread names go through a C string
    if bridge.worker_name.contains('\0') {
        return Err(HostError::Config(
            "bridge.worker_name cannot contain NUL".to_string(),
        ));
    }

    Ok(())
}

fn validate_shutdown(shutdown: &ShutdownConfig) -> Result<()> {
    if shutdown.drain_timeout_ms == 0 {
        return Err(HostError::Config(
            "shutdown.drain_timeout_ms must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
