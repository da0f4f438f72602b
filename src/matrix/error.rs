use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid homeserver URL {url}: {reason}")]
    InvalidHomeserver { url: String, reason: String },

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("No password or access token for {0}")]
    MissingCredentials(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Failed to join room {room}: {message}")]
    JoinFailed { room: String, message: String },

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Http(err.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
