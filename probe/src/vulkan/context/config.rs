//! Helper context configuration

use crate::config::ProbeConfig;
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{cmp::Ordering, env::VarError};
use vulkano::{
    device::{
        physical::{PhysicalDevice, PhysicalDeviceType},
        DeviceExtensions, Features, QueueCreateInfo, QueueFamilyProperties, QueueFlags,
    },
};

/// Environment variable that overrides the preferred device type
pub const PREFER_DEVICE_VAR: &str = "VULKAN_LIMITS_PREFER_DEVICE";

/// Device selection callback
pub type DevicePreference = Box<dyn Fn(&PhysicalDevice, &PhysicalDevice) -> Ordering + Send + Sync>;

/// Helper context configuration
///
/// A default configuration is provided via the [`default()`] method and
/// documented in the various fields of this struct. Contexts are built from
/// it over and over again, so unlike a one-shot configuration, callbacks must
/// be reusable.
///
/// [`default()`]: ContextConfig::default()
pub struct ContextConfig {
    /// Vulkan layers to be enabled on the helper instance
    ///
    /// None by default. Note that you can use the `VK_INSTANCE_LAYERS`
    /// environment variable to activate layers, instead of activating them in
    /// code.
    pub layers: Vec<String>,

    /// Truth that Vulkan Portability devices should be enumerated
    pub enumerate_portability: bool,

    /// Decide which device features and extensions should be enabled
    ///
    /// Devices which do not support them are not eligible. By default, the
    /// khr_portability_subset extension is enabled on devices that have it,
    /// and nothing else is requested.
    pub device_features_extensions:
        Box<dyn Fn(&PhysicalDevice) -> (Features, DeviceExtensions) + Send + Sync>,

    /// Impose additional device requirements
    ///
    /// By default, devices must have a queue family with compute support.
    pub other_device_requirements: Box<dyn Fn(&PhysicalDevice) -> bool + Send + Sync>,

    /// Decide which device is best
    ///
    /// By default, we pick the device type which is most likely to be the
    /// system's main GPU:
    ///
    /// - Physical discrete GPU is best
    /// - Then virtual GPU
    /// - Then integrated GPU
    /// - Then CPUs
    /// - Then others
    ///
    /// The `VULKAN_LIMITS_PREFER_DEVICE` environment variable can put one
    /// device type ahead of all others. Accepted values are "discrete",
    /// "integrated", "virtual", "cpu" and "other".
    pub device_preference: DevicePreference,

    /// Configure command queues
    ///
    /// By default, a single queue is allocated from the main queue family of
    /// the device, which is the first one with graphics support or, failing
    /// that, the first one with compute support.
    pub queues: Box<dyn Fn(&PhysicalDevice) -> Vec<QueueCreateInfo> + Send + Sync>,
}
//
impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            enumerate_portability: false,
            device_features_extensions: Box::new(device_features_extensions),
            other_device_requirements: Box::new(other_device_requirements),
            device_preference: device_preference(preferred_device_type_from_env()),
            queues: Box::new(queues),
        }
    }
}
//
impl From<&ProbeConfig> for ContextConfig {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            layers: config.layers.clone(),
            enumerate_portability: config.enumerate_portability,
            ..Self::default()
        }
    }
}

/// Suggested device features and extensions
pub fn device_features_extensions(device: &PhysicalDevice) -> (Features, DeviceExtensions) {
    let mut extensions = DeviceExtensions::empty();
    if device.supported_extensions().khr_portability_subset {
        extensions.khr_portability_subset = true;
    }
    (Features::empty(), extensions)
}

/// Suggested other device requirements
pub fn other_device_requirements(device: &PhysicalDevice) -> bool {
    main_queue_family(device).is_some()
}

/// Device type requested through the environment, if any
fn preferred_device_type_from_env() -> Option<PhysicalDeviceType> {
    match std::env::var(PREFER_DEVICE_VAR) {
        Ok(string) => parse_device_type(&string),
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(s)) => {
            warn!("{PREFER_DEVICE_VAR} contains non-unicode data {s:?}, ignoring it");
            None
        }
    }
}

/// Parse a device type name as accepted by `VULKAN_LIMITS_PREFER_DEVICE`
fn parse_device_type(name: &str) -> Option<PhysicalDeviceType> {
    match name {
        "" | "discrete" => Some(PhysicalDeviceType::DiscreteGpu),
        "integrated" => Some(PhysicalDeviceType::IntegratedGpu),
        "virtual" => Some(PhysicalDeviceType::VirtualGpu),
        "cpu" => Some(PhysicalDeviceType::Cpu),
        "other" => Some(PhysicalDeviceType::Other),
        unknown => {
            warn!("{PREFER_DEVICE_VAR} contains unknown device type {unknown}, ignoring it");
            None
        }
    }
}

/// Suggested device preference
pub fn device_preference(preferred: Option<PhysicalDeviceType>) -> DevicePreference {
    Box::new(move |device1: &PhysicalDevice, device2: &PhysicalDevice| {
        device_type_score(device1.properties().device_type, preferred)
            .cmp(&device_type_score(device2.properties().device_type, preferred))
    })
}

/// Score of a device type, higher is better
fn device_type_score(ty: PhysicalDeviceType, preferred: Option<PhysicalDeviceType>) -> u8 {
    match ty {
        x if Some(x) == preferred => 6,
        PhysicalDeviceType::DiscreteGpu => 5,
        PhysicalDeviceType::VirtualGpu => 4,
        PhysicalDeviceType::IntegratedGpu => 3,
        PhysicalDeviceType::Cpu => 2,
        PhysicalDeviceType::Other => 1,
        _ => 0,
    }
}

/// Index of the family which is presumed to be the "main" queue family of
/// the device
fn main_queue_family(device: &PhysicalDevice) -> Option<u32> {
    device
        .queue_family_properties()
        .iter()
        .enumerate()
        .map(|(idx, family)| (idx as u32, family))
        .filter(|(_idx, family)| family.queue_flags.contains(QueueFlags::COMPUTE))
        .max_by(|(idx1, queue1), (idx2, queue2)| {
            // Queues that support graphics are most likely to be the main queue
            let supports_graphics =
                |queue: &QueueFamilyProperties| queue.queue_flags.contains(QueueFlags::GRAPHICS);
            match (supports_graphics(queue1), supports_graphics(queue2)) {
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (false, false) | (true, true) => {}
            }

            // As a last resort, pick the queue that comes first in the list
            idx2.cmp(idx1)
        })
        .map(|(idx, _family)| idx)
}

/// Suggested single-queue creation info
pub fn queues(device: &PhysicalDevice) -> Vec<QueueCreateInfo> {
    main_queue_family(device)
        .map(|queue_family_index| QueueCreateInfo {
            queue_family_index,
            ..Default::default()
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_names() {
        assert_eq!(
            parse_device_type("discrete"),
            Some(PhysicalDeviceType::DiscreteGpu)
        );
        assert_eq!(parse_device_type(""), Some(PhysicalDeviceType::DiscreteGpu));
        assert_eq!(parse_device_type("cpu"), Some(PhysicalDeviceType::Cpu));
        assert_eq!(parse_device_type("gpu"), None);
    }

    #[test]
    fn device_type_precedence() {
        let score = |ty| device_type_score(ty, None);
        assert!(score(PhysicalDeviceType::DiscreteGpu) > score(PhysicalDeviceType::VirtualGpu));
        assert!(score(PhysicalDeviceType::VirtualGpu) > score(PhysicalDeviceType::IntegratedGpu));
        assert!(score(PhysicalDeviceType::IntegratedGpu) > score(PhysicalDeviceType::Cpu));
        assert!(score(PhysicalDeviceType::Cpu) > score(PhysicalDeviceType::Other));

        let preferred = Some(PhysicalDeviceType::Cpu);
        assert!(
            device_type_score(PhysicalDeviceType::Cpu, preferred)
                > device_type_score(PhysicalDeviceType::DiscreteGpu, preferred)
        );
    }
}
