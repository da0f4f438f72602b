use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Ping rate must be greater than zero")]
    ZeroPingRate,

    #[error("Ping threshold must be greater than zero")]
    ZeroThreshold,

    #[error("No ping room configured")]
    MissingRoom,

    #[error("Setting {0} exceeds the maximum of one week")]
    DurationTooLarge(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
