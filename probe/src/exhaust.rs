//! Resource exhaustion loop

use crate::{
    error::{DriverError, Error, Result},
    leak::Leaked,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::io::Write;

/// How a probe ended, when it did not end with a fatal [`Error`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The driver refused an allocation, as expected
    Exhausted(Exhaustion),

    /// The probe ran out of things to try before the driver gave up
    Completed {
        /// Number of successful allocations
        count: usize,
    },
}
//
impl Outcome {
    /// Process exit code associated with this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Exhausted(_) => 1,
            Self::Completed { .. } => 0,
        }
    }

    /// Number of allocations that succeeded
    pub fn count(&self) -> usize {
        match self {
            Self::Exhausted(Exhaustion { count, .. }) | Self::Completed { count } => *count,
        }
    }
}

/// Driver limit that was reached by a probe
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Exhaustion {
    /// Number of allocations that succeeded before the first failure
    pub count: usize,

    /// Reason why the driver refused the next allocation
    pub error: DriverError,
}

/// Reason why a single iteration of a stress loop did not go through
#[derive(Debug)]
pub enum Refusal {
    /// The driver refused an allocation: the loop is done
    Driver(DriverError),

    /// Something went wrong that has nothing to do with the probed limit
    Fatal(Error),
}
//
impl From<DriverError> for Refusal {
    fn from(error: DriverError) -> Self {
        Self::Driver(error)
    }
}
//
impl From<Error> for Refusal {
    fn from(error: Error) -> Self {
        Self::Fatal(error)
    }
}

/// Repeat `create` until it fails, leaking everything it creates
///
/// A line with the running success count is written to `out` after each
/// success, and a final line naming the driver error after the first
/// failure. `what` describes the resource for that final line.
pub fn exhaust<T>(
    out: &mut impl Write,
    what: &str,
    mut create: impl FnMut() -> std::result::Result<T, Refusal>,
) -> Result<Exhaustion> {
    let mut count = 0;
    loop {
        match create() {
            Ok(resource) => {
                Leaked::abandon(resource);
                count += 1;
                writeln!(out, "  {count}")?;
            }
            Err(Refusal::Driver(error)) => {
                info!("{what} refused by the driver after {count} successes: {error:?}");
                writeln!(out, "{what} failed after {count} successes: {error}")?;
                return Ok(Exhaustion { count, error });
            }
            Err(Refusal::Fatal(error)) => return Err(error),
        }
    }
}
