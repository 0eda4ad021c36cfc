use std::result::Result;
use thiserror::Error;

pub type DispatcherResult<T> = Result<T, DispatcherError>;

#[derive(Error, Debug)]
pub enum DispatcherError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Json serde error")]
    JsonError(#[from] serde_json::Error),
    #[error("Http request error")]
    HttpError(#[from] reqwest::Error),
    #[error("Zenoh error {0}")]
    ZenohError(zenoh::Error),
    #[error("Invalid device entry in catalog: {0}")]
    InvalidDevice(String),
    #[error("Failed parsing command output {0}")]
    FailedParsingCommandOutput(String),
    #[error("Command {0} exited with failure")]
    CommandFailed(String),
}
