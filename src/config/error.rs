use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No ping room defined")]
    MissingPingRoom,

    #[error("No ping json url defined")]
    MissingFeedUrl,

    #[error("{field} of {value}s exceeds the maximum of {max}s")]
    DurationTooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("Invalid listen address {0}")]
    InvalidAddress(String),

    #[error("No own homeserver defined")]
    MissingOwnHomeserver,

    #[error("No own homeserver username defined")]
    MissingOwnUsername,

    #[error("No own homeserver password or access token defined")]
    MissingOwnCredentials,

    #[error("No remote homeservers defined")]
    NoRemoteHomeservers,

    #[error("No remote homeserver defined for homeserver {0}")]
    MissingRemoteHomeserver(usize),

    #[error("No remote homeserver username defined for homeserver {0}")]
    MissingRemoteUsername(String),

    #[error("No remote homeserver password or access token defined for homeserver {0}")]
    MissingRemoteCredentials(String),

    #[error("Remote homeserver {0} is blacklisted")]
    Blacklisted(String),

    #[error("Remote homeserver {0} is the same as the own homeserver")]
    SameAsOwn(String),

    #[error("Remote homeserver {0} is configured more than once")]
    DuplicateRemote(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
