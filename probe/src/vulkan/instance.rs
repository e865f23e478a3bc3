//! Vulkan instance

use crate::{config::ProbeConfig, error::DriverResult};
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use std::{ops::Deref, sync::Arc};
use vulkano::{
    instance::{
        debug::{
            DebugUtilsMessageSeverity, DebugUtilsMessageType, DebugUtilsMessenger,
            DebugUtilsMessengerCallback, DebugUtilsMessengerCreateInfo,
        },
        Instance, InstanceCreateFlags, InstanceCreateInfo, InstanceExtensions,
    },
    Version, VulkanLibrary,
};

/// Newest Vulkan version that instances are allowed to use
const MAX_API_VERSION: Version = Version::V1_3;

/// Instance configuration shared by the plain and debugged instances
fn create_info(
    library: &VulkanLibrary,
    enabled_layers: Vec<String>,
    mut enabled_extensions: InstanceExtensions,
    enumerate_portability: bool,
) -> InstanceCreateInfo {
    let mut flags = InstanceCreateFlags::empty();
    if enumerate_portability {
        if library.supported_extensions().khr_portability_enumeration {
            flags |= InstanceCreateFlags::ENUMERATE_PORTABILITY;
            enabled_extensions.khr_portability_enumeration = true;
        } else {
            warn!("Portability enumeration requested, but not supported by the Vulkan library");
        }
    }
    InstanceCreateInfo {
        flags,
        enabled_extensions,
        enabled_layers,
        max_api_version: Some(MAX_API_VERSION),
        ..InstanceCreateInfo::application_from_cargo_toml()
    }
}

/// Create a bare instance, as done on every iteration of the instance probes
pub fn create(library: &Arc<VulkanLibrary>, config: &ProbeConfig) -> DriverResult<Arc<Instance>> {
    let create_info = create_info(
        library,
        config.layers.clone(),
        InstanceExtensions::empty(),
        config.enumerate_portability,
    );
    trace!("Will now create a Vulkan instance with {create_info:#?}");
    Ok(Instance::new(library.clone(), create_info)?)
}

/// Vulkan instance with debug logging
///
/// Logging will stop once this struct is dropped, even if there are
/// other Arc<Instance> remaining in flight
pub struct DebuggedInstance {
    /// Vulkan instance
    instance: Arc<Instance>,

    /// Messenger that logs instance debug messages
    _messenger: Option<DebugUtilsMessenger>,
}
//
impl DebuggedInstance {
    /// Set up a Vulkan instance that forwards its debug messages to [`log`]
    ///
    /// Debug messages are only available if the Vulkan library supports the
    /// `ext_debug_utils` extension. Without it, a plain instance is created.
    pub fn new(
        library: Arc<VulkanLibrary>,
        enabled_layers: Vec<String>,
        enumerate_portability: bool,
    ) -> DriverResult<Self> {
        let mut enabled_extensions = InstanceExtensions::empty();
        if library.supported_extensions().ext_debug_utils {
            enabled_extensions.ext_debug_utils = true;
        } else {
            debug!("Vulkan library lacks ext_debug_utils, driver messages won't be logged");
        }
        let debug_messenger_cfg = enabled_extensions
            .ext_debug_utils
            .then(Self::configure_debug_messenger);

        let create_info = InstanceCreateInfo {
            debug_utils_messengers: debug_messenger_cfg.clone().into_iter().collect(),
            ..create_info(
                &library,
                enabled_layers,
                enabled_extensions,
                enumerate_portability,
            )
        };
        info!("Will now create a Vulkan instance with {create_info:#?}");
        let instance = Instance::new(library, create_info)?;
        trace!(
            "Vulkan instance supports Vulkan v{}",
            instance.api_version()
        );

        let _messenger = debug_messenger_cfg
            .map(|cfg| DebugUtilsMessenger::new(instance.clone(), cfg))
            .transpose()?;
        Ok(Self {
            instance,
            _messenger,
        })
    }

    /// Configure Vulkan logging via the debug utils messenger
    fn configure_debug_messenger() -> DebugUtilsMessengerCreateInfo {
        type DUMSeverity = DebugUtilsMessageSeverity;
        type DUMType = DebugUtilsMessageType;
        let mut debug_messenger_info = DebugUtilsMessengerCreateInfo {
            message_severity: DUMSeverity::ERROR | DUMSeverity::WARNING,
            message_type: DUMType::GENERAL | DUMType::VALIDATION,
            // SAFETY: This callback does not call into Vulkan APIs
            ..DebugUtilsMessengerCreateInfo::user_callback(unsafe {
                DebugUtilsMessengerCallback::new(|severity, ty, data| {
                    let level = match severity {
                        DUMSeverity::ERROR => log::Level::Error,
                        DUMSeverity::WARNING => log::Level::Warn,
                        DUMSeverity::INFO => log::Level::Debug,
                        DUMSeverity::VERBOSE => log::Level::Trace,
                        _ => log::Level::Info,
                    };
                    if level > log::max_level() {
                        return;
                    }
                    let target = data
                        .message_id_name
                        .map(|id_name| format!("Vulkan {ty:?} {id_name}"))
                        .unwrap_or(format!("Vulkan {ty:?}"));
                    log!(
                        target: &target,
                        level,
                        "{} (id: {})",
                        data.message,
                        data.message_id_number,
                    );
                })
            })
        };
        if log::STATIC_MAX_LEVEL >= log::Level::Debug {
            debug_messenger_info.message_severity |= DUMSeverity::INFO;
        }
        if log::STATIC_MAX_LEVEL >= log::Level::Trace {
            debug_messenger_info.message_severity |= DUMSeverity::VERBOSE;
        }
        debug!("Setting up debug utils with {debug_messenger_info:#?}");
        debug_messenger_info
    }
}
//
impl Deref for DebuggedInstance {
    type Target = Arc<Instance>;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}
