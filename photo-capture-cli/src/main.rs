//! `takephoto`: capture one still photo after letting the preview stabilize.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use photo_capture_core::models::config::DEFAULT_OUTPUT_FILE;
use photo_capture_core::virtual_camera::{VirtualCamera, VirtualDeviceProvider, VirtualEngine};
use photo_capture_core::{
    CaptureEngine, CaptureError, DeviceProvider, DeviceRegistry, PhotoConfiguration,
    PipelineController, PipelineStep, PlatformStatus,
};

// Long options take two dashes. The single-dash `-st <ms>` and `-enum`
// spellings of the classic Windows tool are `-t`/`--stability-time <ms>`
// and `--enum`. `-h` is the photo height, so help is `--help` only.
#[derive(Parser, Debug)]
#[command(name = "takephoto")]
#[command(about = "Take a still photo once the camera preview has stabilized")]
#[command(version, disable_help_flag = true)]
struct Cli {
    /// Preview stabilization time before the photo is taken, in milliseconds
    #[arg(short = 't', long = "stability-time", value_name = "MS", default_value_t = 5000)]
    stability_time: u64,

    /// Photo width in pixels (0 with height 0 = camera native size)
    #[arg(short = 'w', long, value_name = "PIXELS", default_value_t = 0)]
    width: u32,

    /// Photo height in pixels (0 with width 0 = camera native size)
    #[arg(short = 'h', long, value_name = "PIXELS", default_value_t = 0)]
    height: u32,

    /// Output file path
    #[arg(short = 'o', long, value_name = "PATH", default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// List video capture devices and exit
    #[arg(long = "enum")]
    enumerate: bool,

    /// Device index to use (from --enum); defaults to the system camera
    #[arg(short = 'd', long = "device", value_name = "INDEX")]
    device: Option<u32>,

    /// Use the built-in virtual cameras instead of real hardware
    #[arg(long = "virtual")]
    virtual_camera: bool,

    /// Write a <photo>.metadata.json sidecar next to the photo
    #[arg(long)]
    metadata: bool,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    fn configuration(&self) -> PhotoConfiguration {
        PhotoConfiguration {
            stabilization: Duration::from_millis(self.stability_time),
            output_path: self.output.clone(),
            device_index: self.device,
            write_metadata: self.metadata,
            ..Default::default()
        }
        .with_photo_size(self.width, self.height)
    }
}

/// A failed run: the step it failed at, if the pipeline got that far.
struct Failure {
    step: Option<PipelineStep>,
    error: CaptureError,
}

impl From<CaptureError> for Failure {
    fn from(error: CaptureError) -> Self {
        Self { step: None, error }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(failure) = run(&cli) {
        let status = failure.error.status();
        match failure.step {
            Some(step) => eprintln!("failed {}: {} ({})", step, failure.error, status),
            None => eprintln!("Error: {} ({})", failure.error, status),
        }
        if matches!(failure.error, CaptureError::InvalidArgument(_)) && failure.step.is_none() {
            eprintln!("Run 'takephoto --help' for usage.");
        }
        process::exit(exit_code(status));
    }
}

#[cfg(target_os = "windows")]
fn run(cli: &Cli) -> Result<(), Failure> {
    use photo_capture_windows::{MediaFoundationRuntime, MfCaptureEngine, MfDeviceProvider};

    if cli.virtual_camera {
        return run_virtual(cli);
    }

    let _runtime = MediaFoundationRuntime::start()?;
    let registry = DeviceRegistry::new(MfDeviceProvider::new());
    if cli.enumerate {
        return list_devices(&registry);
    }
    capture(&registry, MfCaptureEngine::new()?, cli.configuration())
}

#[cfg(not(target_os = "windows"))]
fn run(cli: &Cli) -> Result<(), Failure> {
    if !cli.virtual_camera {
        log::info!("no camera backend on this platform, using virtual cameras");
    }
    run_virtual(cli)
}

fn run_virtual(cli: &Cli) -> Result<(), Failure> {
    let provider = VirtualDeviceProvider::with_cameras(vec![
        VirtualCamera::hd("Virtual HD Camera"),
        VirtualCamera::vga("Virtual VGA Camera"),
    ]);
    let registry = DeviceRegistry::new(provider.clone());
    if cli.enumerate {
        return list_devices(&registry);
    }
    capture(&registry, VirtualEngine::new(provider), cli.configuration())
}

fn list_devices<P: DeviceProvider>(registry: &DeviceRegistry<P>) -> Result<(), Failure> {
    for device in registry.enumerate()? {
        println!("{}", device);
    }
    Ok(())
}

fn capture<P, E>(
    registry: &DeviceRegistry<P>,
    engine: E,
    config: PhotoConfiguration,
) -> Result<(), Failure>
where
    E: CaptureEngine,
    P: DeviceProvider<Device = E::Device>,
{
    let mut pipeline = PipelineController::new(engine, config)?;

    match pipeline.run(registry) {
        Ok(photo) => {
            println!(
                "{} ({}, {} bytes, sha256 {})",
                photo.file_path.display(),
                photo.format.frame_size.map(|s| s.to_string()).unwrap_or_default(),
                photo.size_bytes,
                photo.checksum
            );
            Ok(())
        }
        Err(error) => Err(Failure {
            step: pipeline.state().failure().map(|(step, _)| step),
            error,
        }),
    }
}

/// Process exit code for `status`. Non-Windows hosts only keep the low byte,
/// which must stay non-zero for a failure.
fn exit_code(status: PlatformStatus) -> i32 {
    if cfg!(target_os = "windows") {
        status.0
    } else {
        match status.code() & 0xFF {
            0 => 1,
            low => low as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_h_is_height_not_help() {
        let cli = Cli::try_parse_from(["takephoto", "-w", "1280", "-h", "720", "-t", "100"]).unwrap();
        assert_eq!(cli.width, 1280);
        assert_eq!(cli.height, 720);

        let config = cli.configuration();
        assert_eq!(config.stabilization, Duration::from_millis(100));
        assert_eq!(config.photo_size.map(|s| (s.width, s.height)), Some((1280, 720)));
    }

    #[test]
    fn defaults_take_native_size_after_five_seconds() {
        let config = Cli::try_parse_from(["takephoto"]).unwrap().configuration();
        assert_eq!(config.stabilization, Duration::from_millis(5000));
        assert_eq!(config.photo_size, None);
        assert_eq!(config.output_path, PathBuf::from("photo.jpg"));
        assert_eq!(config.device_index, None);
    }

    #[test]
    fn long_flags_take_two_dashes() {
        let cli = Cli::try_parse_from(["takephoto", "--stability-time", "250", "--enum"]).unwrap();
        assert_eq!(cli.stability_time, 250);
        assert!(cli.enumerate);

        assert!(Cli::try_parse_from(["takephoto", "-st", "250"]).is_err());
    }

    #[test]
    fn missing_value_is_a_usage_error() {
        assert!(Cli::try_parse_from(["takephoto", "-d"]).is_err());
        assert!(Cli::try_parse_from(["takephoto", "--bogus"]).is_err());
    }

    #[test]
    fn partial_size_fails_validation() {
        let config = Cli::try_parse_from(["takephoto", "-w", "640"]).unwrap().configuration();
        assert!(config.validate().is_err());
    }

    #[test]
    fn failure_exit_codes_are_non_zero() {
        assert_ne!(exit_code(PlatformStatus::INVALID_ARGUMENT), 0);
        assert_ne!(exit_code(PlatformStatus(0x8007_0000_u32 as i32)), 0);
    }
}
