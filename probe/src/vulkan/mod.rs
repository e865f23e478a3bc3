//! Vulkan backend, built on vulkano

pub mod context;
mod device;
mod instance;
mod library;
mod memory;

pub use self::instance::DebuggedInstance;
use crate::{
    config::ProbeConfig,
    error::{DriverError, DriverResult, Result},
    result::ResultCode,
    Driver,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::sync::Arc;
use vulkano::{
    device::{physical::PhysicalDevice, Device},
    instance::Instance,
    memory::DeviceMemory,
    ExtensionProperties, Validated, ValidationError, VulkanError, VulkanLibrary,
};

/// [`Driver`] that talks to the system's Vulkan implementation
pub struct VulkanDriver {
    /// Vulkan loader
    library: Arc<VulkanLibrary>,

    /// Probe configuration
    config: ProbeConfig,
}
//
impl VulkanDriver {
    /// Load the Vulkan library
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let library = library::load()?;
        Ok(Self { library, config })
    }
}
//
impl Driver for VulkanDriver {
    type Instance = Arc<Instance>;
    type PhysicalDevice = Arc<PhysicalDevice>;
    type Device = Arc<Device>;
    type Memory = DeviceMemory;

    fn create_instance(&self) -> DriverResult<Arc<Instance>> {
        instance::create(&self.library, &self.config)
    }

    fn first_physical_device(
        &self,
        instance: &Arc<Instance>,
    ) -> DriverResult<Option<Arc<PhysicalDevice>>> {
        device::first_physical(instance)
    }

    fn create_device(&self, physical_device: &Arc<PhysicalDevice>) -> DriverResult<Arc<Device>> {
        device::create_logical(physical_device, self.config.queue_count)
    }

    fn allocate_memory(&self, device: &Arc<Device>, size: u64) -> DriverResult<DeviceMemory> {
        memory::allocate(device, size)
    }
}

impl From<VulkanError> for ResultCode {
    fn from(error: VulkanError) -> Self {
        match error {
            VulkanError::OutOfHostMemory => Self::OutOfHostMemory,
            VulkanError::OutOfDeviceMemory => Self::OutOfDeviceMemory,
            VulkanError::InitializationFailed => Self::InitializationFailed,
            VulkanError::DeviceLost => Self::DeviceLost,
            VulkanError::MemoryMapFailed => Self::MemoryMapFailed,
            VulkanError::LayerNotPresent => Self::LayerNotPresent,
            VulkanError::ExtensionNotPresent => Self::ExtensionNotPresent,
            VulkanError::FeatureNotPresent => Self::FeatureNotPresent,
            VulkanError::IncompatibleDriver => Self::IncompatibleDriver,
            VulkanError::TooManyObjects => Self::TooManyObjects,
            VulkanError::FormatNotSupported => Self::FormatNotSupported,
            VulkanError::FragmentedPool => Self::FragmentedPool,
            VulkanError::Unknown => Self::Unknown,
            other => {
                debug!("No canonical name for {other:?}");
                Self::Unnamed
            }
        }
    }
}
//
impl From<VulkanError> for DriverError {
    fn from(error: VulkanError) -> Self {
        Self::Result(error.into())
    }
}
//
impl From<Box<ValidationError>> for DriverError {
    fn from(error: Box<ValidationError>) -> Self {
        Self::Validation(error.to_string())
    }
}
//
impl From<Validated<VulkanError>> for DriverError {
    fn from(error: Validated<VulkanError>) -> Self {
        match error {
            Validated::Error(error) => error.into(),
            Validated::ValidationError(error) => error.into(),
        }
    }
}

/// Format Vulkan extension properties for display
fn format_extension_properties(extension_properties: &[ExtensionProperties]) -> String {
    format!(
        "{:#?}",
        extension_properties
            .iter()
            .map(|ext| format!("{} v{}", ext.extension_name, ext.spec_version))
            .collect::<Vec<_>>()
    )
}
