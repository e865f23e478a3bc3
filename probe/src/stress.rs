//! Single-threaded stress loops

use crate::{
    error::{DriverError, Error, Result},
    exhaust::{exhaust, Exhaustion, Outcome, Refusal},
    leak::Leaked,
    Driver,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{convert::Infallible, io::Write};

/// Instance, physical device and logical device created together
pub struct Chain<D: Driver> {
    /// Vulkan instance
    pub instance: D::Instance,

    /// Physical device that was picked
    pub physical_device: D::PhysicalDevice,

    /// Logical device on `physical_device`
    pub device: D::Device,
}
//
impl<D: Driver> Chain<D> {
    /// Create an instance, then a logical device on its first physical device
    ///
    /// Driver refusals are reported as such, while an instance without any
    /// physical device is a fatal error.
    pub fn create(driver: &D) -> std::result::Result<Self, Refusal> {
        let instance = driver.create_instance()?;
        let physical_device = driver
            .first_physical_device(&instance)?
            .ok_or(Error::NoPhysicalDevice)?;
        let device = driver.create_device(&physical_device)?;
        Ok(Self {
            instance,
            physical_device,
            device,
        })
    }

    /// Like `create()`, but for one-time setup where any failure is fatal
    pub fn setup(driver: &D) -> Result<Leaked<Self>> {
        let instance = new_instance(driver)?;
        let physical_device = new_physical_device(driver, &instance)?;
        let device = new_device(driver, &physical_device)?;
        Ok(Leaked::new(Self {
            instance,
            physical_device,
            device,
        }))
    }
}

/// Report a driver refusal during one-time setup as fatal
fn setup_error(what: &'static str) -> impl FnOnce(DriverError) -> Error {
    move |cause| Error::Setup { what, cause }
}

fn new_instance<D: Driver>(driver: &D) -> Result<D::Instance> {
    let instance = driver
        .create_instance()
        .map_err(setup_error("Vulkan instance"))?;
    debug!("Created the probe's Vulkan instance");
    Ok(instance)
}

fn new_physical_device<D: Driver>(
    driver: &D,
    instance: &D::Instance,
) -> Result<D::PhysicalDevice> {
    let physical_device = driver
        .first_physical_device(instance)
        .map_err(setup_error("physical device list"))?
        .ok_or(Error::NoPhysicalDevice)?;
    debug!("Picked the probe's physical device");
    Ok(physical_device)
}

fn new_device<D: Driver>(driver: &D, physical_device: &D::PhysicalDevice) -> Result<D::Device> {
    let device = driver
        .create_device(physical_device)
        .map_err(setup_error("logical device"))?;
    debug!("Created the probe's logical device");
    Ok(device)
}

/// Create the instance that a probe will work with
pub fn setup_instance<D: Driver>(driver: &D) -> Result<Leaked<D::Instance>> {
    new_instance(driver).map(Leaked::new)
}

/// Pick the physical device that a probe will work with
pub fn setup_physical_device<D: Driver>(
    driver: &D,
    instance: &D::Instance,
) -> Result<Leaked<D::PhysicalDevice>> {
    new_physical_device(driver, instance).map(Leaked::new)
}

/// Create the logical device that a probe will work with
pub fn setup_device<D: Driver>(
    driver: &D,
    physical_device: &D::PhysicalDevice,
) -> Result<Leaked<D::Device>> {
    new_device(driver, physical_device).map(Leaked::new)
}

/// Create instances until the driver refuses
pub fn instances<D: Driver>(driver: &D, out: &mut impl Write) -> Result<Outcome> {
    writeln!(out, "Trying to exhaust instance creation limit...")?;
    let exhaustion = exhaust(out, "Instance creation", || Ok(driver.create_instance()?))?;
    Ok(Outcome::Exhausted(exhaustion))
}

/// Create logical devices on a single physical device until the driver refuses
pub fn devices<D: Driver>(driver: &D, out: &mut impl Write) -> Result<Outcome> {
    let instance = setup_instance(driver)?;
    let physical_device = setup_physical_device(driver, &instance)?;
    writeln!(out, "Trying to exhaust device creation limit...")?;
    let exhaustion = exhaust(out, "Device creation", || {
        Ok(driver.create_device(&physical_device)?)
    })?;
    Ok(Outcome::Exhausted(exhaustion))
}

/// Create an instance and a logical device per iteration until the driver
/// refuses either of them
pub fn combined<D: Driver>(driver: &D, out: &mut impl Write) -> Result<Outcome> {
    writeln!(
        out,
        "Trying to exhaust combined instance+device creation limit..."
    )?;
    let exhaustion = exhaust(out, "Instance+device creation", || Chain::create(driver))?;
    Ok(Outcome::Exhausted(exhaustion))
}

/// Result of the device memory probe
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemoryReport {
    /// Largest allocation size that succeeded, in bytes
    pub largest: Option<u64>,

    /// How the probe ended
    pub outcome: Outcome,
}

/// Allocate device memory blocks of 1, 2, 4... bytes until the driver refuses
///
/// Successful blocks are leaked, so each allocation happens on top of all the
/// previous ones.
pub fn memory<D: Driver>(driver: &D, out: &mut impl Write) -> Result<MemoryReport> {
    let instance = setup_instance(driver)?;
    let physical_device = setup_physical_device(driver, &instance)?;
    let device = setup_device(driver, &physical_device)?;

    writeln!(out, "Trying to find the largest device memory allocation...")?;
    let mut size = 1u64;
    let mut count = 0;
    let mut largest = None;
    loop {
        match driver.allocate_memory(&device, size) {
            Ok(block) => {
                Leaked::abandon(block);
                count += 1;
                largest = Some(size);
                writeln!(out, "  {size} bytes")?;
                let Some(next_size) = size.checked_mul(2) else {
                    writeln!(
                        out,
                        "Every power-of-two allocation up to {size} bytes succeeded"
                    )?;
                    return Ok(MemoryReport {
                        largest,
                        outcome: Outcome::Completed { count },
                    });
                };
                size = next_size;
            }
            Err(error) => {
                info!("Allocation of {size} bytes refused by the driver: {error:?}");
                writeln!(
                    out,
                    "Memory allocation of {size} bytes failed after {count} successes: {error}"
                )?;
                match largest {
                    Some(largest) => writeln!(out, "Largest successful allocation: {largest} bytes")?,
                    None => writeln!(out, "No allocation succeeded")?,
                }
                return Ok(MemoryReport {
                    largest,
                    outcome: Outcome::Exhausted(Exhaustion { count, error }),
                });
            }
        }
    }
}

/// Create a single instance and logical device, then announce it
///
/// This is the first half of [`hold()`], which then blocks forever.
pub fn hold_chain<D: Driver>(driver: &D, out: &mut impl Write) -> Result<Leaked<Chain<D>>> {
    let chain = Chain::setup(driver)?;
    writeln!(
        out,
        "Holding one instance and logical device, inspect resource usage now (Ctrl+C to quit)..."
    )?;
    out.flush()?;
    Ok(chain)
}

/// Hold a single instance and logical device forever
pub fn hold<D: Driver>(driver: &D, out: &mut impl Write) -> Result<Infallible> {
    let _chain = hold_chain(driver, out)?;
    park_forever()
}

/// Block the calling thread forever
pub(crate) fn park_forever() -> ! {
    loop {
        std::thread::park();
    }
}
