//! Error types for the link runner.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the byte channel underneath the link.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The serial port could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        /// Port name as given in the configuration.
        port: String,
        /// Underlying driver error.
        #[source]
        source: serialport::Error,
    },

    /// A read, write or status query failed.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial driver reported an error outside of plain I/O.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The other end of the channel is gone.
    #[error("channel closed")]
    Closed,
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::LinkConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level error for running a link node.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Channel failure.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A loop thread panicked.
    #[error("{0} thread panicked")]
    ThreadPanicked(String),

    /// A loop thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
