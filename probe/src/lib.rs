//! Probes for the resource creation limits of Vulkan drivers
//!
//! Every probe follows the same recipe: allocate some driver resource in a
//! loop, never release anything, and stop at the first allocation that the
//! driver refuses. The number of successful allocations and the driver's
//! verdict are then reported.
//!
//! Probes are written against the [`Driver`] and [`Helper`] traits, which are
//! implemented for real hardware by [`vulkan::VulkanDriver`] and
//! [`vulkan::context::ContextHelper`].

pub mod config;
pub mod error;
pub mod exhaust;
pub mod helper;
pub mod leak;
pub mod result;
pub mod stress;
pub mod threads;
pub mod vulkan;

#[cfg(test)]
pub(crate) mod testing;

pub use self::{
    config::{Mode, ProbeArgs, ProbeConfig},
    error::{DriverError, DriverResult, Error, Result},
    exhaust::{Exhaustion, Outcome},
    leak::Leaked,
    result::ResultCode,
};

/// Resource creation entry points of a graphics driver
///
/// Handles are opaque to the probes. They are only ever used to create the
/// next handle in the instance -> physical device -> device -> memory chain,
/// and end up being [`Leaked`].
pub trait Driver: Send + Sync + 'static {
    /// Top-level connection to the driver
    type Instance: Send + 'static;

    /// Piece of graphics hardware
    type PhysicalDevice: Send + 'static;

    /// Application session on a physical device
    type Device: Send + 'static;

    /// Block of device memory
    type Memory: Send + 'static;

    /// Create a new instance
    fn create_instance(&self) -> DriverResult<Self::Instance>;

    /// Request a single physical device from an instance
    ///
    /// Returns `None` if the instance does not expose any physical device.
    fn first_physical_device(
        &self,
        instance: &Self::Instance,
    ) -> DriverResult<Option<Self::PhysicalDevice>>;

    /// Create a logical device
    fn create_device(&self, physical_device: &Self::PhysicalDevice) -> DriverResult<Self::Device>;

    /// Allocate `size` bytes of device memory
    fn allocate_memory(&self, device: &Self::Device, size: u64) -> DriverResult<Self::Memory>;
}

/// Higher-level rendering helper that sets up complete Vulkan contexts
///
/// Where a [`Driver`] exposes each Vulkan object individually, a helper
/// bundles device selection, logical device creation, queues and allocators
/// behind a single initialization call.
pub trait Helper: Send + Sync {
    /// Helper-managed instance, with logging attached
    type Instance;

    /// Fully initialized rendering context
    type Context;

    /// Set up the instance that contexts will be created from
    fn create_instance(&self) -> DriverResult<Self::Instance>;

    /// Initialize one more context
    fn create_context(&self, instance: &Self::Instance) -> DriverResult<Self::Context>;
}
