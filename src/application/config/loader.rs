use crate::application::config::models::Config;
use crate::application::config::parser::parse_config_file;
use crate::application::config::validator::validate_config;
use crate::common::error::Result;
use log::debug;

/// Load and validate configuration from file
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    pub fn load(path: &str) -> Result<Config> {
        let config = parse_config_file(path)?;
        validate_config(&config)?;
        debug!(
            "config '{}': max_wait_events={} max_poll_fds={} drain_timeout_ms={}",
            path, config.bridge.max_wait_events, config.bridge.max_poll_fds, config.shutdown.drain_timeout_ms
        );
        Ok(config)
    }

    /// Load from `path` when given; otherwise every setting takes its default.
    pub fn load_or_default(path: Option<&str>) -> Result<Config> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("no config file given, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Load configuration from string (useful for testing)
    pub fn load_from_str(content: &str) -> Result<Config> {
        use crate::application::config::parser::parse_config;
        let config = parse_config(content)?;
        validate_config(&config)?;
        Ok(config)
    }
}
