//! Probe configuration

use clap::{Args, ValueEnum};

/// Driver limit to be probed
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Mode {
    /// Create instances until the driver refuses
    Instance,

    /// Create logical devices on a single physical device
    Device,

    /// Create an instance and a logical device on every iteration
    #[value(name = "both", alias = "combined")]
    Combined,

    /// Spawn threads that each hold an instance and a logical device
    Threads,

    /// Hold a single instance and logical device forever
    Hold,

    /// Find the largest power-of-two device memory allocation
    Memory,

    /// Create complete rendering contexts through the helper layer
    #[value(name = "pl_vulkan")]
    PlVulkan,
}

/// Tuning knobs shared by all probes, as exposed on the command line
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Number of queues requested from queue family 0 for each logical device
    ///
    /// Clamped to the number of queues that the family actually provides.
    #[arg(short, long, default_value_t = ProbeConfig::default().queue_count)]
    pub queues: u32,

    /// Also enumerate devices that do not fully conform to the Vulkan spec
    #[arg(short, long)]
    pub portability: bool,

    /// Instance layer to enable (can be specified multiple times)
    #[arg(short, long = "layer")]
    pub layers: Vec<String>,

    /// Stack size of worker threads in the "threads" probe, in bytes
    #[arg(short, long, default_value_t = ProbeConfig::default().worker_stack_size)]
    pub stack_size: usize,
}
//
impl From<ProbeArgs> for ProbeConfig {
    fn from(args: ProbeArgs) -> Self {
        let mut layers = ProbeConfig::default().layers;
        for layer in args.layers {
            if !layers.contains(&layer) {
                layers.push(layer);
            }
        }
        Self {
            queue_count: args.queues,
            enumerate_portability: args.portability,
            layers,
            worker_stack_size: args.stack_size,
        }
    }
}

/// Probe configuration
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeConfig {
    /// Number of queues requested from queue family 0 for each logical device
    pub queue_count: u32,

    /// Truth that Vulkan Portability devices should be enumerated
    pub enumerate_portability: bool,

    /// Instance layers to be enabled
    ///
    /// Contains "VK_LAYER_KHRONOS_validation" by default if the `validation`
    /// feature is enabled.
    pub layers: Vec<String>,

    /// Stack size of the worker threads spawned by the "threads" probe
    ///
    /// Kept small so that the thread count is bounded by the OS and driver
    /// rather than by virtual address space.
    pub worker_stack_size: usize,
}
//
impl Default for ProbeConfig {
    fn default() -> Self {
        let layers = if cfg!(feature = "validation") {
            vec!["VK_LAYER_KHRONOS_validation".to_owned()]
        } else {
            vec![]
        };
        Self {
            queue_count: 16,
            enumerate_portability: false,
            layers,
            worker_stack_size: 256 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[arg(value_enum)]
        mode: Mode,

        #[command(flatten)]
        probe: ProbeArgs,
    }

    #[test]
    fn mode_names() {
        let parse = |name: &str| Cli::try_parse_from(["probe", name]).map(|cli| cli.mode);
        assert_eq!(parse("instance").unwrap(), Mode::Instance);
        assert_eq!(parse("device").unwrap(), Mode::Device);
        assert_eq!(parse("both").unwrap(), Mode::Combined);
        assert_eq!(parse("combined").unwrap(), Mode::Combined);
        assert_eq!(parse("threads").unwrap(), Mode::Threads);
        assert_eq!(parse("hold").unwrap(), Mode::Hold);
        assert_eq!(parse("memory").unwrap(), Mode::Memory);
        assert_eq!(parse("pl_vulkan").unwrap(), Mode::PlVulkan);
        assert!(parse("pl-vulkan").is_err());
        assert!(parse("swapchain").is_err());
    }

    #[test]
    fn args_to_config() {
        let cli = Cli::try_parse_from([
            "probe",
            "device",
            "--queues",
            "4",
            "--layer",
            "VK_LAYER_MESA_overlay",
            "-p",
        ])
        .unwrap();
        let config = ProbeConfig::from(cli.probe);
        assert_eq!(config.queue_count, 4);
        assert!(config.enumerate_portability);
        assert!(config.layers.contains(&"VK_LAYER_MESA_overlay".to_owned()));
        assert_eq!(
            config.worker_stack_size,
            ProbeConfig::default().worker_stack_size
        );
    }
}
