//! Link configuration.
//!
//! A node is configured from an optional YAML file, with command-line flags
//! layered on top. Every field except `role` may be omitted and falls back to
//! the role's defaults:
//!
//! ```yaml
//! role: edge
//! port: /dev/ttyUSB0
//! baud_rate: 19200
//! tx_interval_ms: 80
//! ```

use std::path::Path;
use std::time::Duration;

use edgelink_packet::{DEFAULT_MAX_FRAME_LEN, MIN_FRAME_LEN};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::role::Role;

/// Default serial symbol rate.
pub const DEFAULT_BAUD_RATE: u32 = 19200;
/// Default serial read timeout.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;
/// Default receive polling interval when no bytes are available.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Configuration for one link node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Role this node plays.
    pub role: Role,
    /// Serial port name. Defaults to the role's port.
    #[serde(default)]
    pub port: Option<String>,
    /// Serial symbol rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Serial read timeout in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Transmit cadence in milliseconds. Defaults to the role's cadence.
    #[serde(default)]
    pub tx_interval_ms: Option<u64>,
    /// Receive polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Length at which an unterminated candidate frame is abandoned.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
    /// Whether the periodic transmit loop runs. Replies (ACKs) are sent
    /// regardless.
    #[serde(default = "default_transmit")]
    pub transmit: bool,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_frame_len() -> usize {
    DEFAULT_MAX_FRAME_LEN
}

fn default_transmit() -> bool {
    true
}

fn whole_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl LinkConfig {
    /// Default configuration for `role`.
    pub fn for_role(role: Role) -> Self {
        LinkConfig {
            role,
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            tx_interval_ms: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            transmit: true,
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: LinkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".into()));
        }
        if self.tx_interval_ms == Some(0) {
            return Err(ConfigError::Invalid("tx_interval_ms must be non-zero".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be non-zero".into()));
        }
        if self.max_frame_len < MIN_FRAME_LEN {
            return Err(ConfigError::Invalid(format!(
                "max_frame_len must be at least {}, got {}",
                MIN_FRAME_LEN, self.max_frame_len
            )));
        }
        if matches!(&self.port, Some(port) if port.trim().is_empty()) {
            return Err(ConfigError::Invalid("port must not be empty".into()));
        }
        Ok(())
    }

    /// Serial port to open.
    pub fn port_name(&self) -> &str {
        self.port.as_deref().unwrap_or_else(|| self.role.default_port())
    }

    /// Transmit cadence.
    pub fn tx_interval(&self) -> Duration {
        self.tx_interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.role.default_tx_interval())
    }

    /// Receive polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Serial read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Set the transmit cadence, truncated to whole milliseconds (at least 1).
    pub fn with_tx_interval(mut self, interval: Duration) -> Self {
        self.tx_interval_ms = Some(whole_millis(interval));
        self
    }

    /// Set the receive polling interval, truncated to whole milliseconds (at
    /// least 1).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = whole_millis(interval);
        self
    }

    /// Enable or disable the periodic transmit loop.
    pub fn with_transmit(mut self, transmit: bool) -> Self {
        self.transmit = transmit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_role_defaults() {
        let edge = LinkConfig::for_role(Role::Edge);
        assert_eq!(edge.port_name(), "COM6");
        assert_eq!(edge.tx_interval(), Duration::from_millis(80));
        assert_eq!(edge.baud_rate, 19200);
        assert_eq!(edge.read_timeout(), Duration::from_millis(100));
        assert_eq!(edge.poll_interval(), Duration::from_millis(10));
        assert!(edge.transmit);

        let controller = LinkConfig::for_role(Role::Controller);
        assert_eq!(controller.port_name(), "COM5");
        assert_eq!(controller.tx_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_minimal_yaml() {
        let config = LinkConfig::from_yaml_str("role: controller\n").unwrap();
        assert_eq!(config, LinkConfig::for_role(Role::Controller));
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
role: edge
port: /dev/ttyUSB0
baud_rate: 115200
read_timeout_ms: 50
tx_interval_ms: 250
poll_interval_ms: 5
max_frame_len: 32
transmit: false
"#;
        let config = LinkConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.role, Role::Edge);
        assert_eq!(config.port_name(), "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.read_timeout(), Duration::from_millis(50));
        assert_eq!(config.tx_interval(), Duration::from_millis(250));
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
        assert_eq!(config.max_frame_len, 32);
        assert!(!config.transmit);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            "role: edge\nbaud_rate: 0\n",
            "role: edge\ntx_interval_ms: 0\n",
            "role: edge\npoll_interval_ms: 0\n",
            "role: edge\nmax_frame_len: 3\n",
            "role: edge\nport: \"  \"\n",
        ];
        for yaml in cases {
            assert!(
                matches!(LinkConfig::from_yaml_str(yaml), Err(ConfigError::Invalid(_))),
                "accepted {:?}",
                yaml
            );
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            LinkConfig::from_yaml_str("port: COM1\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LinkConfig::from_yaml_str("role: gateway\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "role: controller\nport: COM9").unwrap();

        let config = LinkConfig::load(file.path()).unwrap();
        assert_eq!(config.role, Role::Controller);
        assert_eq!(config.port_name(), "COM9");
    }

    #[test]
    fn test_load_missing_file() {
        let err = LinkConfig::load("/nonexistent/edgelink.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_sub_millisecond_intervals_round_up_to_one() {
        let config = LinkConfig::for_role(Role::Controller)
            .with_tx_interval(Duration::from_micros(500))
            .with_poll_interval(Duration::ZERO);
        assert_eq!(config.tx_interval(), Duration::from_millis(1));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert!(config.validate().is_ok());

        let config = config.with_tx_interval(Duration::from_micros(2_900));
        assert_eq!(config.tx_interval(), Duration::from_millis(2));
    }

    #[test]
    fn test_builders() {
        let config = LinkConfig::for_role(Role::Edge)
            .with_tx_interval(Duration::from_millis(5))
            .with_poll_interval(Duration::from_millis(1))
            .with_transmit(false);
        assert_eq!(config.tx_interval(), Duration::from_millis(5));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert!(!config.transmit);
    }
}
