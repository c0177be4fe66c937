use thiserror::Error;

/// Error type for analyzer and capture operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),
}

impl From<cpal::DevicesError> for Error {
    fn from(err: cpal::DevicesError) -> Self {
        Error::UnsupportedEnvironment(format!("failed to enumerate devices: {}", err))
    }
}

impl From<cpal::DefaultStreamConfigError> for Error {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        Error::UnsupportedEnvironment(format!("no usable input config: {}", err))
    }
}

impl From<cpal::BuildStreamError> for Error {
    fn from(err: cpal::BuildStreamError) -> Self {
        Error::UnsupportedEnvironment(format!("failed to build input stream: {}", err))
    }
}

impl From<cpal::PlayStreamError> for Error {
    fn from(err: cpal::PlayStreamError) -> Self {
        Error::UnsupportedEnvironment(format!("failed to start input stream: {}", err))
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
