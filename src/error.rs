use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapError {
    #[error(
        "Call to control command failed with error {returncode}: {}",
        .stderr.trim_end()
    )]
    SnapCtl { returncode: i32, stderr: String },
    #[error("failed to run control command {}: {source}", .executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unknown config key: {key}")]
    UnknownConfigKey { key: String },
    #[error("Invalid top-level config key: {key}")]
    InvalidKey { key: String },
    #[error("control command output is not valid UTF-8: {0}")]
    OutputEncoding(#[source] std::string::FromUtf8Error),
    #[error("failed to decode control command output: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("not running in a snap: SNAP environment variable not set")]
    NotASnap,
    #[error("{0} environment variable not defined")]
    MissingEnv(String),
    #[error("{0}")]
    InvalidHealth(&'static str),
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("{0}")]
    Hook(String),
}

impl SnapError {
    /// The dotted key carried by `UnknownConfigKey` and `InvalidKey`.
    pub fn key(&self) -> Option<&str> {
        match self {
            SnapError::UnknownConfigKey { key } | SnapError::InvalidKey { key } => Some(key),
            _ => None,
        }
    }
}

pub type Result<T, E = SnapError> = std::result::Result<T, E>;
