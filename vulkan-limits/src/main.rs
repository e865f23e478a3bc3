use clap::Parser;
use eyre::WrapErr;
#[allow(unused_imports)]
use log::{debug, error, info, log, trace, warn};
use probe::{
    helper, stress, threads,
    vulkan::{
        context::{config::ContextConfig, ContextHelper},
        VulkanDriver,
    },
    Mode, Outcome, ProbeArgs, ProbeConfig,
};
use std::{ffi::OsString, io::Write, process::ExitCode, sync::Arc};

/// Probe the resource creation limits of the Vulkan driver
///
/// Allocates the selected kind of resource until the driver refuses, then
/// reports how many allocations succeeded and why the next one failed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Driver limit to be probed
    #[arg(value_enum)]
    mode: Mode,

    /// Probe tuning
    #[command(flatten)]
    probe: ProbeArgs,
}

/// Exit code of command line usage errors
const USAGE_ERROR: u8 = 1;

fn main() -> ExitCode {
    // Enable logging to stderr
    env_logger::init();

    // Parse CLI arguments before touching the driver
    let args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(code) => return ExitCode::from(code),
    };

    match run(args) {
        Ok(code) => code,
        Err(report) => {
            eprintln!("Error: {report:?}");
            ExitCode::from(1)
        }
    }
}

/// Parse CLI arguments, or tell with which code the process should exit
///
/// Help and version requests exit successfully, anything else that clap does
/// not accept is a usage error.
fn parse_args<I, T>(args: I) -> Result<Args, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::try_parse_from(args).map_err(|error| {
        let _ = error.print();
        if error.use_stderr() {
            USAGE_ERROR
        } else {
            0
        }
    })
}

/// Run the requested probe and translate its result into an exit code
fn run(args: Args) -> eyre::Result<ExitCode> {
    let config = ProbeConfig::from(args.probe);
    info!("Probing the {:?} limit with {config:#?}", args.mode);

    let mut out = std::io::stdout().lock();
    let result = run_probe(args.mode, config, &mut out);
    out.flush().wrap_err("Failed to flush probe output")?;
    match result {
        Ok(outcome) => {
            debug!("Probe ended with {outcome:?}");
            Ok(ExitCode::from(outcome.exit_code()))
        }
        Err(probe::Error::Output(e)) => Err(e).wrap_err("Failed to write probe output"),
        Err(error) => {
            eprintln!("{error}");
            Ok(ExitCode::from(error.exit_code()))
        }
    }
}

/// Set up the driver and run the probe associated with `mode`
fn run_probe(mode: Mode, config: ProbeConfig, out: &mut impl Write) -> probe::Result<Outcome> {
    match mode {
        Mode::Instance => stress::instances(&VulkanDriver::new(config)?, out),
        Mode::Device => stress::devices(&VulkanDriver::new(config)?, out),
        Mode::Combined => stress::combined(&VulkanDriver::new(config)?, out),
        Mode::Memory => {
            let report = stress::memory(&VulkanDriver::new(config)?, out)?;
            Ok(report.outcome)
        }
        Mode::Threads => {
            let stack_size = config.worker_stack_size;
            threads::threads(Arc::new(VulkanDriver::new(config)?), stack_size, out)
        }
        Mode::Hold => match stress::hold(&VulkanDriver::new(config)?, out)? {},
        Mode::PlVulkan => {
            let helper = ContextHelper::new(ContextConfig::from(&config))?;
            helper::contexts(&helper, out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mode_is_a_usage_error() {
        assert_eq!(parse_args(["vulkan-limits"]).unwrap_err(), USAGE_ERROR);
    }

    #[test]
    fn unknown_mode_is_a_usage_error() {
        assert_eq!(
            parse_args(["vulkan-limits", "swapchains"]).unwrap_err(),
            USAGE_ERROR
        );
        assert_eq!(
            parse_args(["vulkan-limits", "instance", "--bogus"]).unwrap_err(),
            USAGE_ERROR
        );
    }

    #[test]
    fn help_is_not_an_error() {
        assert_eq!(parse_args(["vulkan-limits", "--help"]).unwrap_err(), 0);
    }

    #[test]
    fn known_modes() {
        for (name, mode) in [
            ("instance", Mode::Instance),
            ("device", Mode::Device),
            ("both", Mode::Combined),
            ("combined", Mode::Combined),
            ("threads", Mode::Threads),
            ("hold", Mode::Hold),
            ("memory", Mode::Memory),
            ("pl_vulkan", Mode::PlVulkan),
        ] {
            let args = parse_args(["vulkan-limits", name]).unwrap();
            assert_eq!(args.mode, mode);
        }
    }

    #[test]
    fn probe_options() {
        let args = parse_args(["vulkan-limits", "threads", "--stack-size", "65536", "-q", "1"])
            .unwrap();
        let config = ProbeConfig::from(args.probe);
        assert_eq!(config.worker_stack_size, 65536);
        assert_eq!(config.queue_count, 1);
    }
}
