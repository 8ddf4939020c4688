use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Broad class of a [`PluginError`], used by callers to decide how to report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Network,
    Validation,
    Filesystem,
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin {0} has no download sources")]
    NoSources(String),

    #[error("plugin {plugin} has no source labelled {label}")]
    UnknownSource { plugin: String, label: String },

    #[error("download from {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("downloaded file is only {size} bytes (minimum {min}), it may be corrupted")]
    TooSmall { size: u64, min: u64 },

    #[error("failed to {action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("both {name}.jar and {name}.jar.disabled exist, resolve the duplicate by hand")]
    Conflict { name: String },
}

impl PluginError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSources(_) | Self::UnknownSource { .. } => ErrorKind::Configuration,
            Self::Network { .. } => ErrorKind::Network,
            Self::TooSmall { .. } => ErrorKind::Validation,
            Self::Filesystem { .. } | Self::Conflict { .. } => ErrorKind::Filesystem,
        }
    }

    pub(crate) fn fs(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn network(url: &str, reason: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type PluginResult<T> = Result<T, PluginError>;
