//! Complete Vulkan contexts, as set up by rendering helpers
//!
//! This is what the "pl_vulkan" probe goes through: instead of creating bare
//! logical devices, every iteration performs device selection, logical device
//! and queue creation, and allocator setup, in the way a higher-level
//! rendering library would.

pub mod config;

use self::config::ContextConfig;
use super::{device, library, DebuggedInstance};
use crate::{
    error::{DriverResult, Result},
    Helper,
};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::sync::Arc;
use vulkano::{
    command_buffer::allocator::{
        StandardCommandBufferAllocator, StandardCommandBufferAllocatorCreateInfo,
    },
    device::{Device, Queue},
    memory::allocator::StandardMemoryAllocator,
    VulkanLibrary,
};

/// Vulkan rendering context
pub struct VulkanContext {
    /// Logical device (used for resource allocation)
    pub device: Arc<Device>,

    /// Command queues (used for command submission)
    pub queues: Box<[Arc<Queue>]>,

    /// Memory allocator (used for image and buffer allocation)
    pub memory_allocator: Arc<StandardMemoryAllocator>,

    /// Command buffer allocator
    pub command_allocator: Arc<StandardCommandBufferAllocator>,
}
//
impl VulkanContext {
    /// Set up a context on an existing instance
    pub fn new(instance: &DebuggedInstance, config: &ContextConfig) -> DriverResult<Self> {
        let physical_device = device::select_physical(
            instance,
            &config.device_features_extensions,
            &config.other_device_requirements,
            &config.device_preference,
        )?;
        debug!(
            "Selected device {}",
            physical_device.properties().device_name
        );

        let (features, extensions) = (config.device_features_extensions)(&physical_device);
        let queue_create_infos = (config.queues)(&physical_device);
        let (device, queues) =
            device::create_with_queues(physical_device, features, extensions, queue_create_infos)?;

        let memory_allocator = Arc::new(StandardMemoryAllocator::new_default(device.clone()));
        let command_allocator = Arc::new(StandardCommandBufferAllocator::new(
            device.clone(),
            StandardCommandBufferAllocatorCreateInfo::default(),
        ));
        Ok(Self {
            device,
            queues,
            memory_allocator,
            command_allocator,
        })
    }
}

/// [`Helper`] that sets up [`VulkanContext`]s
pub struct ContextHelper {
    /// Vulkan loader
    library: Arc<VulkanLibrary>,

    /// Configuration of every context
    config: ContextConfig,
}
//
impl ContextHelper {
    /// Load the Vulkan library
    pub fn new(config: ContextConfig) -> Result<Self> {
        let library = library::load()?;
        Ok(Self { library, config })
    }
}
//
impl Helper for ContextHelper {
    type Instance = DebuggedInstance;
    type Context = VulkanContext;

    fn create_instance(&self) -> DriverResult<DebuggedInstance> {
        DebuggedInstance::new(
            self.library.clone(),
            self.config.layers.clone(),
            self.config.enumerate_portability,
        )
    }

    fn create_context(&self, instance: &DebuggedInstance) -> DriverResult<VulkanContext> {
        VulkanContext::new(instance, &self.config)
    }
}
