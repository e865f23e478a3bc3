//! Device management

use crate::error::{DriverError, DriverResult};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{cmp::Ordering, sync::Arc};
use vulkano::{
    device::{
        physical::PhysicalDevice, Device, DeviceCreateInfo, DeviceExtensions, Features, Queue,
        QueueCreateInfo,
    },
    instance::Instance,
};

/// Take the first physical device that the instance enumerates
pub fn first_physical(instance: &Arc<Instance>) -> DriverResult<Option<Arc<PhysicalDevice>>> {
    let device = instance.enumerate_physical_devices()?.next();
    if let Some(device) = &device {
        trace!("Using physical device {}", device.properties().device_name);
    }
    Ok(device)
}

/// Pick the preferred physical device among those that meet requirements
///
/// If several devices compare equal according to the `preference` callback,
/// the first matching device will be selected.
pub fn select_physical(
    instance: &Arc<Instance>,
    features_extensions: impl Fn(&PhysicalDevice) -> (Features, DeviceExtensions),
    other_requirements: impl Fn(&PhysicalDevice) -> bool,
    preference: impl Fn(&PhysicalDevice, &PhysicalDevice) -> Ordering,
) -> DriverResult<Arc<PhysicalDevice>> {
    instance
        .enumerate_physical_devices()?
        .filter(|device| {
            debug!("Found physical device {}", device.properties().device_name);
            trace!("- With {:#?}", device.properties());
            trace!(
                "- With device extensions {}",
                super::format_extension_properties(device.extension_properties())
            );
            trace!(
                "- With queue families {:#?}",
                device.queue_family_properties()
            );

            let (features, extensions) = features_extensions(device);
            let can_use = device.supported_features().contains(&features)
                && device.supported_extensions().contains(&extensions)
                && other_requirements(device);
            if can_use {
                debug!("=> Device meets requirements");
            } else {
                debug!("=> Device does NOT meet requirements");
            }
            can_use
        })
        // Using minimum ensures we pick the first device given equal preference
        .min_by(|a, b| preference(a, b).reverse())
        .ok_or(DriverError::NoMatchingDevice)
}

/// Queue configuration of the probes' logical devices
///
/// Requests up to `queue_count` queues from queue family 0, the first one
/// with top priority and the others with the lowest priority.
fn probe_queues(physical_device: &PhysicalDevice, queue_count: u32) -> QueueCreateInfo {
    let available = physical_device
        .queue_family_properties()
        .first()
        .map_or(1, |family| family.queue_count);
    let queue_count = queue_count.clamp(1, available.max(1));
    QueueCreateInfo {
        queue_family_index: 0,
        queues: std::iter::once(1.0)
            .chain(std::iter::repeat(0.0))
            .take(queue_count as usize)
            .collect(),
        ..Default::default()
    }
}

/// Create a logical device, as done on every iteration of the device probes
pub fn create_logical(
    physical_device: &Arc<PhysicalDevice>,
    queue_count: u32,
) -> DriverResult<Arc<Device>> {
    let mut enabled_extensions = DeviceExtensions::empty();
    if physical_device.supported_extensions().khr_portability_subset {
        enabled_extensions.khr_portability_subset = true;
    }
    let (device, _queues) = create_with_queues(
        physical_device.clone(),
        Features::empty(),
        enabled_extensions,
        vec![probe_queues(physical_device, queue_count)],
    )?;
    Ok(device)
}

/// Create a logical device and associated command queues
pub fn create_with_queues(
    physical_device: Arc<PhysicalDevice>,
    enabled_features: Features,
    enabled_extensions: DeviceExtensions,
    queue_create_infos: Vec<QueueCreateInfo>,
) -> DriverResult<(Arc<Device>, Box<[Arc<Queue>]>)> {
    let create_info = DeviceCreateInfo {
        enabled_features,
        enabled_extensions,
        queue_create_infos,
        ..Default::default()
    };
    trace!("Will now create a logical device with {create_info:#?}");
    let (device, queues) = Device::new(physical_device, create_info)?;
    Ok((device, queues.collect()))
}
