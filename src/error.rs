use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera: {0}")]
    Open(String),

    #[error("camera frame read failed: {0}")]
    Read(String),

    #[error("failed to decode camera frame: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("subject has {found} keypoints, expected at least {expected}")]
    MalformedSubject { found: usize, expected: usize },
}

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("robot request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("robot daemon at {url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("robot sink unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
