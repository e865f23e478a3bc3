//! Vulkan library loading

use crate::error::{Error, Result};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::sync::Arc;
use vulkano::VulkanLibrary;

/// Load the Vulkan library
pub fn load() -> Result<Arc<VulkanLibrary>> {
    let library = VulkanLibrary::new().map_err(|e| Error::Loading(e.to_string()))?;
    info!("Loaded Vulkan library");
    trace!("- Supports Vulkan v{}", library.api_version());
    trace!(
        "- Supports instance extensions {}",
        super::format_extension_properties(library.extension_properties())
    );
    match library.layer_properties() {
        Ok(layers) => trace!(
            "- Supports layers {:#?}",
            layers
                .map(|layer| {
                    format!(
                        "{} v{} for Vulkan >= {}",
                        layer.name(),
                        layer.implementation_version(),
                        layer.vulkan_version()
                    )
                })
                .collect::<Vec<_>>()
        ),
        Err(e) => warn!("Failed to enumerate Vulkan layers: {e}"),
    }
    Ok(library)
}
