use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Feed request failed: {0}")]
    Transport(String),

    #[error("Feed request timed out")]
    Timeout,

    #[error("Feed returned HTTP {0}")]
    Status(u16),

    #[error("Feed could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
