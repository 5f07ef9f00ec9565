use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncerError>;

#[derive(Error, Debug)]
pub enum SyncerError {
    #[error("Transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to decode admin response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Gateway rejected {method} {url} with status {status}: {body}")]
    GatewayRejection {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncerError {
    /// Whether the gateway answered but refused the request
    pub fn is_rejection(&self) -> bool {
        matches!(self, SyncerError::GatewayRejection { .. })
    }
}
