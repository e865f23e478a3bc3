//! Things that can go wrong while probing driver limits

use crate::result::ResultCode;
use std::io;
use thiserror::Error;

/// Refusal of a resource creation request by the driver (or its wrapper)
///
/// Inside of a stress loop, this is the expected way for things to end. It
/// only becomes a fatal [`Error`] when it happens during one-time setup.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DriverError {
    #[error("{0}")]
    Result(ResultCode),

    #[error("request rejected before reaching the driver ({0})")]
    Validation(String),

    #[error("no physical device matches requirements")]
    NoMatchingDevice,
}
//
impl From<ResultCode> for DriverError {
    fn from(code: ResultCode) -> Self {
        Self::Result(code)
    }
}

/// Result type of individual driver calls
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Fatal setup failures
///
/// These end a probe before it could reach the driver limit it was meant to
/// measure. Each has a distinct process exit code, see [`Error::exit_code()`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load the Vulkan library ({0})")]
    Loading(String),

    #[error("failed to create {what}: {cause}")]
    Setup {
        what: &'static str,
        cause: DriverError,
    },

    #[error("no physical devices found")]
    NoPhysicalDevice,

    #[error("failed to spawn worker thread ({0})")]
    ThreadSpawn(io::Error),

    #[error("failed to write probe output")]
    Output(#[from] io::Error),
}
//
impl Error {
    /// Process exit code associated with this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoPhysicalDevice | Self::ThreadSpawn(_) => 2,
            Self::Loading(_) | Self::Setup { .. } | Self::Output(_) => 1,
        }
    }
}

/// Result type associated with fatal probe errors
pub type Result<T> = std::result::Result<T, Error>;
