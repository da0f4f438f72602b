use thiserror::Error;

/// Failure to put a probe into the monitoring room
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Rejected by homeserver ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SendError::MalformedResponse(err.to_string())
        } else {
            SendError::Transport(err.to_string())
        }
    }
}

pub type SendResult<T> = Result<T, SendError>;
