use thiserror::Error;

/// HTTP statuses the Sheets API uses for throttling and temporary outages.
const TRANSIENT_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("OAuth error: {0}")]
    OAuth(#[from] yup_oauth2::Error),
}

impl SheetsError {
    /// True for API failures worth another attempt: throttling and temporary
    /// unavailability. Everything else fails fast.
    pub fn is_transient(&self) -> bool {
        match self {
            SheetsError::Api { status, .. } => TRANSIENT_STATUSES.contains(status),
            _ => false,
        }
    }
}

pub type SheetsResult<T> = Result<T, SheetsError>;
