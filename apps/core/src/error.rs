use thiserror::Error;

/// Everything that can go wrong between the page and the outside world.
///
/// None of these are fatal: callers log the `Display` form and show
/// [`AppError::user_message`] to the user, then leave the page interactive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// The browser lacks a capability (notifications, push, storage).
    #[error("unsupported capability: {0}")]
    Unsupported(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The request never produced a response.
    #[error("network failure: {0}")]
    Network(String),

    #[error("server responded with HTTP {status}")]
    Http { status: u16 },

    #[error("not found")]
    NotFound,

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl AppError {
    /// Plain-language text for inline errors and alert banners.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported(message)
            | Self::PermissionDenied(message)
            | Self::Network(message)
            | Self::Parse(message)
            | Self::Storage(message) => message.clone(),
            Self::Http { status } => format!("HTTP {status}"),
            Self::NotFound => "Not found".to_string(),
        }
    }

    /// Maps a non-success HTTP status onto the taxonomy.
    pub const fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            status => Self::Http { status },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(error: base64::DecodeError) -> Self {
        Self::Parse(format!("invalid application server key: {error}"))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
