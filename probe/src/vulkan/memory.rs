//! Device memory allocation

use crate::error::DriverResult;
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::sync::Arc;
use vulkano::{
    device::{physical::PhysicalDevice, Device},
    memory::{DeviceMemory, MemoryAllocateInfo, MemoryPropertyFlags},
};

/// Memory type that the memory probe allocates from
///
/// This is the first device-local memory type, which is where the memory of
/// a discrete GPU lives. Memory type 0 is used if none is device-local.
fn probed_memory_type(physical_device: &PhysicalDevice) -> u32 {
    physical_device
        .memory_properties()
        .memory_types
        .iter()
        .position(|ty| ty.property_flags.contains(MemoryPropertyFlags::DEVICE_LOCAL))
        .unwrap_or(0) as u32
}

/// Allocate a block of `size` bytes directly from the device
pub fn allocate(device: &Arc<Device>, size: u64) -> DriverResult<DeviceMemory> {
    let memory_type_index = probed_memory_type(device.physical_device());
    trace!("Allocating {size} bytes from memory type {memory_type_index}");
    let memory = DeviceMemory::allocate(
        device.clone(),
        MemoryAllocateInfo {
            allocation_size: size,
            memory_type_index,
            ..Default::default()
        },
    )?;
    Ok(memory)
}
