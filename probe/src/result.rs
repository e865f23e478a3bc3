//! Driver result codes

use std::fmt::{self, Display};

/// Error code reported by a Vulkan driver
///
/// Only the core Vulkan 1.0 error codes are named. Everything else the driver may
/// come up with is folded into `Unnamed`, which is still reported, just not
/// with a canonical name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResultCode {
    OutOfHostMemory,
    OutOfDeviceMemory,
    InitializationFailed,
    DeviceLost,
    MemoryMapFailed,
    LayerNotPresent,
    ExtensionNotPresent,
    FeatureNotPresent,
    IncompatibleDriver,
    TooManyObjects,
    FormatNotSupported,
    FragmentedPool,
    Unknown,
    Unnamed,
}
//
impl ResultCode {
    /// Canonical `VK_*` name of this result code
    pub fn name(self) -> &'static str {
        match self {
            Self::OutOfHostMemory => "VK_ERROR_OUT_OF_HOST_MEMORY",
            Self::OutOfDeviceMemory => "VK_ERROR_OUT_OF_DEVICE_MEMORY",
            Self::InitializationFailed => "VK_ERROR_INITIALIZATION_FAILED",
            Self::DeviceLost => "VK_ERROR_DEVICE_LOST",
            Self::MemoryMapFailed => "VK_ERROR_MEMORY_MAP_FAILED",
            Self::LayerNotPresent => "VK_ERROR_LAYER_NOT_PRESENT",
            Self::ExtensionNotPresent => "VK_ERROR_EXTENSION_NOT_PRESENT",
            Self::FeatureNotPresent => "VK_ERROR_FEATURE_NOT_PRESENT",
            Self::IncompatibleDriver => "VK_ERROR_INCOMPATIBLE_DRIVER",
            Self::TooManyObjects => "VK_ERROR_TOO_MANY_OBJECTS",
            Self::FormatNotSupported => "VK_ERROR_FORMAT_NOT_SUPPORTED",
            Self::FragmentedPool => "VK_ERROR_FRAGMENTED_POOL",
            Self::Unknown => "VK_ERROR_UNKNOWN",
            Self::Unnamed => "Unknown error",
        }
    }
}
//
impl Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names() {
        assert_eq!(
            ResultCode::OutOfHostMemory.to_string(),
            "VK_ERROR_OUT_OF_HOST_MEMORY"
        );
        assert_eq!(ResultCode::TooManyObjects.name(), "VK_ERROR_TOO_MANY_OBJECTS");
        assert_eq!(ResultCode::Unnamed.name(), "Unknown error");
    }
}
