//! Stress loop going through a higher-level rendering helper

use crate::{
    error::{Error, Result},
    exhaust::{exhaust, Outcome},
    leak::Leaked,
    Helper,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::io::Write;

/// Initialize helper contexts on a single helper instance until one fails
///
/// A helper does not say why a context could not be set up, so every failure
/// counts as the limit being reached.
pub fn contexts<H: Helper>(helper: &H, out: &mut impl Write) -> Result<Outcome> {
    let instance = helper.create_instance().map_err(|cause| Error::Setup {
        what: "helper instance",
        cause,
    })?;
    let instance = Leaked::new(instance);
    info!("Created the helper instance");

    writeln!(out, "Trying to exhaust helper context creation limit...")?;
    let exhaustion = exhaust(out, "Helper context creation", || {
        Ok(helper.create_context(&instance)?)
    })?;
    Ok(Outcome::Exhausted(exhaustion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::DriverError, result::ResultCode, testing::FakeHelper, Exhaustion};

    #[test]
    fn context_failure_is_exhaustion() {
        let helper = FakeHelper::new(2);
        let mut out = Vec::new();
        let outcome = contexts(&helper, &mut out).unwrap();
        assert_eq!(
            outcome,
            Outcome::Exhausted(Exhaustion {
                count: 2,
                error: DriverError::NoMatchingDevice,
            })
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Trying to exhaust helper context creation limit...\n  1\n  2\n\
             Helper context creation failed after 2 successes: no physical device matches requirements\n"
        );
    }

    #[test]
    fn driver_codes_are_reported_verbatim() {
        let helper = FakeHelper::new(0).failing_with(ResultCode::OutOfDeviceMemory.into());
        let mut out = Vec::new();
        let outcome = contexts(&helper, &mut out).unwrap();
        assert_eq!(outcome.count(), 0);
        assert!(String::from_utf8(out)
            .unwrap()
            .ends_with("failed after 0 successes: VK_ERROR_OUT_OF_DEVICE_MEMORY\n"));
    }

    #[test]
    fn instance_failure_is_fatal() {
        let helper = FakeHelper::new(10).without_instance();
        let mut out = Vec::new();
        let error = contexts(&helper, &mut out).unwrap_err();
        assert!(matches!(error, Error::Setup { what: "helper instance", .. }));
        assert_eq!(error.exit_code(), 1);
        assert!(out.is_empty());
    }
}
