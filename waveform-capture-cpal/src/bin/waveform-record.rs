//! Record the microphone to a file while drawing a live level meter.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use waveform_capture_core::models::encoder::LINEAR_PCM_ID;
use waveform_capture_core::{CaptureError, SessionManager, StartRecordingArgs, PCM16_FULL_SCALE};
use waveform_capture_cpal::{list_input_devices, DesktopPermission, DesktopPlatform};

#[derive(Debug, Parser)]
#[command(about = "Record the microphone with a live waveform meter", version)]
struct Args {
    /// Output file. Defaults to a timestamped file in the documents folder.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Encoder identifier (10 = linear PCM, the only one available on desktop).
    #[arg(long, default_value_t = LINEAR_PCM_ID)]
    encoder: i64,

    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Date pattern for synthesized file names.
    #[arg(long, default_value = "yyyy-MM-dd-HH-mm-ss")]
    file_name_format: String,

    /// Recording length in seconds.
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Pause once this many seconds in, then resume after `--pause-for`.
    #[arg(long)]
    pause_after: Option<f64>,

    #[arg(long, default_value_t = 1.0)]
    pause_for: f64,

    /// Report loudness in decibels instead of the linear peak.
    #[arg(long)]
    legacy: bool,

    /// Input device name.
    #[arg(long)]
    device: Option<String>,

    /// Print input device names and exit.
    #[arg(long)]
    list_devices: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.list_devices {
        return match list_input_devices() {
            Ok(names) => {
                names.iter().for_each(|n| println!("{}", n));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match record(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

fn record(args: &Args) -> Result<(), CaptureError> {
    let mut platform = DesktopPlatform::new();
    if let Some(device) = &args.device {
        platform = platform.with_input_device(device.clone());
    }
    let manager = SessionManager::new(
        Arc::new(platform),
        Arc::new(DesktopPermission::new(args.device.clone())),
    );

    if !manager.check_permission() {
        return Err(CaptureError::PermissionDenied);
    }

    manager.start_recording(StartRecordingArgs {
        path: args.output.as_ref().map(|p| p.to_string_lossy().into_owned()),
        encoder: Some(args.encoder),
        sample_rate: Some(args.sample_rate),
        file_name_format: Some(args.file_name_format.clone()),
        use_legacy_normalization: Some(args.legacy),
        ..Default::default()
    })?;

    let total = Duration::from_secs_f64(args.seconds.max(0.0));
    let mut pause_at = args.pause_after.map(|s| Duration::from_secs_f64(s.max(0.0)));
    let started = Instant::now();

    while started.elapsed() < total {
        if pause_at.is_some_and(|at| started.elapsed() >= at) {
            pause_at = None;
            manager.pause_recording()?;
            eprintln!("\npaused");
            thread::sleep(Duration::from_secs_f64(args.pause_for.max(0.0)));
            manager.resume_recording()?;
            eprintln!("resumed");
        }
        draw_meter(manager.get_loudness(), args.legacy);
        thread::sleep(Duration::from_millis(50));
    }

    let result = manager.stop_recording()?;
    eprintln!();
    println!("{}\t{} ms", result.path, result.duration_ms);
    Ok(())
}

fn draw_meter(loudness: f32, legacy: bool) {
    const WIDTH: usize = 40;
    let fraction = if legacy {
        // 0 dB .. full scale (~90.3 dB).
        (loudness / (20.0 * PCM16_FULL_SCALE.log10())).clamp(0.0, 1.0)
    } else {
        (loudness / PCM16_FULL_SCALE).clamp(0.0, 1.0)
    };
    let filled = (fraction * WIDTH as f32).round() as usize;
    let mut stderr = std::io::stderr().lock();
    let _ = write!(
        stderr,
        "\r[{}{}] {:>9.2}",
        "#".repeat(filled),
        " ".repeat(WIDTH - filled),
        loudness
    );
    let _ = stderr.flush();
}
