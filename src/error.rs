use azure_core::error::ErrorKind;
use azure_core::StatusCode;
use thiserror::Error;

/// Main error type for blobtier operations
#[derive(Debug, Error)]
pub enum BlobTierError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Price table error for region '{region}': {details}")]
    PriceTableError { region: String, details: String },

    #[error("Failed to enumerate source '{source_name}': {details}")]
    SourceError {
        source_name: String,
        details: String,
    },

    #[error("Container not found: {name}")]
    ContainerNotFound { name: String },

    #[error("Invalid container name: {name}")]
    InvalidContainerName { name: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl BlobTierError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn price_table<R: Into<String>, S: Into<String>>(region: R, details: S) -> Self {
        Self::PriceTableError {
            region: region.into(),
            details: details.into(),
        }
    }

    pub fn source<N: Into<String>, S: Into<String>>(source_name: N, details: S) -> Self {
        Self::SourceError {
            source_name: source_name.into(),
            details: details.into(),
        }
    }

    pub fn container_not_found<S: Into<String>>(name: S) -> Self {
        Self::ContainerNotFound { name: name.into() }
    }

    pub fn invalid_container_name<S: Into<String>>(name: S) -> Self {
        Self::InvalidContainerName { name: name.into() }
    }

    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unknown<S: Into<String>>(msg: S) -> Self {
        Self::Unknown(msg.into())
    }
}

/// Result type alias for blobtier operations
pub type Result<T> = std::result::Result<T, BlobTierError>;

/// Statuses worth another attempt: timeouts, throttling and server faults
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::RequestTimeout | StatusCode::TooManyRequests)
        || status.is_server_error()
}

/// Convert Azure Core errors to BlobTierError by error kind and HTTP status
impl From<azure_core::Error> for BlobTierError {
    fn from(error: azure_core::Error) -> Self {
        let message = error.to_string();
        match error.kind() {
            ErrorKind::Credential => Self::AuthenticationError(message),
            ErrorKind::Io => Self::NetworkError(message),
            ErrorKind::HttpResponse { status, .. } => match *status {
                StatusCode::Unauthorized => Self::AuthenticationError(message),
                StatusCode::Forbidden => Self::PermissionDenied(message),
                status if is_transient_status(status) => Self::NetworkError(message),
                status => Self::AzureApiError(format!("{} ({})", message, status as u16)),
            },
            _ => Self::AzureApiError(message),
        }
    }
}
