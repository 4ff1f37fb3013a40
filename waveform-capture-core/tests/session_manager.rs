mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{fast_tuning, tone, FakePermissions, FakePlatform};
use waveform_capture_core::{
    probe_wav_duration, CaptureError, CaptureState, PermissionStatus, SessionManager, StartRecordingArgs,
};

fn manager(platform: &Arc<FakePlatform>, status: PermissionStatus) -> SessionManager {
    SessionManager::new(platform.clone(), FakePermissions::new(status)).with_tuning(fast_tuning())
}

fn wav_args(path: Option<String>) -> StartRecordingArgs {
    StartRecordingArgs {
        path,
        encoder: Some(10),
        ..Default::default()
    }
}

#[test]
fn record_with_defaults_and_stop() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = manager(&platform, PermissionStatus::Granted);

    assert!(manager.start_recording(StartRecordingArgs::default()).unwrap());
    assert_eq!(manager.state(), CaptureState::Recording);

    let result = manager.stop_recording().unwrap();
    assert!(result.path.ends_with(".m4a"), "{}", result.path);
    assert!(result.path.starts_with(dir.path().to_str().unwrap()));
    assert_eq!(manager.state(), CaptureState::Idle);
}

#[test]
fn start_pause_resume_stop_round() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = manager(&platform, PermissionStatus::Granted);

    manager.start_recording(wav_args(None)).unwrap();
    assert!(!manager.pause_recording().unwrap());
    assert_eq!(manager.state(), CaptureState::Paused);
    assert!(manager.resume_recording().unwrap());
    assert_eq!(manager.state(), CaptureState::Recording);
    manager.stop_recording().unwrap();
}

#[test]
fn controls_without_a_session_are_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = manager(&platform, PermissionStatus::Granted);

    let idle = |operation| CaptureError::InvalidState {
        operation,
        state: "idle",
    };
    assert_eq!(manager.pause_recording().unwrap_err(), idle("pause"));
    assert_eq!(manager.resume_recording().unwrap_err(), idle("resume"));
    assert_eq!(manager.stop_recording().unwrap_err(), idle("stop"));

    manager.start_recording(wav_args(None)).unwrap();
    manager.stop_recording().unwrap();
    assert_eq!(manager.stop_recording().unwrap_err(), idle("stop"));
}

#[test]
fn second_start_replaces_active_session() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 8_000.0);
    let manager = manager(&platform, PermissionStatus::Granted);
    let first = dir.path().join("first.wav");
    let second = dir.path().join("second.wav");

    manager
        .start_recording(wav_args(Some(first.to_string_lossy().into_owned())))
        .unwrap();
    platform.input.fire(&tone(800, 0.4), 1);

    manager
        .start_recording(wav_args(Some(second.to_string_lossy().into_owned())))
        .unwrap();
    assert_eq!(manager.state(), CaptureState::Recording);
    assert_eq!(platform.activations.load(Ordering::SeqCst), 2);
    assert_eq!(platform.deactivations.load(Ordering::SeqCst), 1);

    // The replaced recording was finalized, not truncated.
    assert!(probe_wav_duration(&first).unwrap() > std::time::Duration::ZERO);

    let result = manager.stop_recording().unwrap();
    assert_eq!(result.path, second.to_string_lossy());
}

#[test]
fn denied_permission_blocks_start() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = manager(&platform, PermissionStatus::Denied);

    assert_eq!(
        manager.start_recording(StartRecordingArgs::default()).unwrap_err(),
        CaptureError::PermissionDenied
    );
    assert_eq!(platform.activations.load(Ordering::SeqCst), 0);
    assert!(!manager.check_permission());
}

#[test]
fn check_permission_prompts_when_undetermined() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = manager(&platform, PermissionStatus::Undetermined);

    // The fake answers the prompt synchronously.
    assert!(manager.check_permission());
    assert!(manager.check_permission());
}

#[test]
fn loudness_follows_the_live_session() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = manager(&platform, PermissionStatus::Granted);

    assert_eq!(manager.get_loudness(), 0.0);

    manager.start_recording(wav_args(None)).unwrap();
    platform.input.fire(&[0.25, -1.0], 1);
    assert_eq!(manager.get_loudness(), 32767.0);
    assert_eq!(manager.get_loudness(), 0.0);

    manager.stop_recording().unwrap();
    assert_eq!(manager.get_loudness(), 0.0);
}

#[test]
fn legacy_flag_switches_loudness_to_decibels() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = manager(&platform, PermissionStatus::Granted);

    let args = StartRecordingArgs {
        use_legacy_normalization: Some(true),
        ..wav_args(None)
    };
    manager.start_recording(args).unwrap();
    platform.input.fire(&[1.0], 1);

    let db = manager.get_loudness();
    assert!((db - 20.0 * 32767f32.log10()).abs() < 1e-3, "{}", db);
    assert_eq!(manager.get_loudness(), waveform_capture_core::SILENCE_DB);
}

#[test]
fn failed_start_leaves_manager_idle() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    platform.input.fail_install.store(true, Ordering::SeqCst);
    let manager = manager(&platform, PermissionStatus::Granted);

    assert!(matches!(
        manager.start_recording(wav_args(None)),
        Err(CaptureError::HardwareInitFailure(_))
    ));
    assert_eq!(manager.state(), CaptureState::Idle);
    assert_eq!(manager.get_loudness(), 0.0);
}

#[test]
fn failed_stop_still_releases_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    platform.fail_writes.store(true, Ordering::SeqCst);
    let manager = manager(&platform, PermissionStatus::Granted);

    manager.start_recording(wav_args(None)).unwrap();
    platform.input.fire(&tone(4_410, 0.2), 1);

    assert!(matches!(manager.stop_recording(), Err(CaptureError::StorageError(_))));
    assert_eq!(manager.state(), CaptureState::Idle);
    assert!(!platform.input.is_running());
    assert_eq!(manager.get_loudness(), 0.0);

    platform.fail_writes.store(false, Ordering::SeqCst);
    assert!(manager.start_recording(wav_args(None)).unwrap());
    manager.stop_recording().unwrap();
}

#[test]
fn starts_with_the_same_file_name_keep_both_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 8_000.0);
    let manager = manager(&platform, PermissionStatus::Granted);
    let args = || StartRecordingArgs {
        sample_rate: Some(8_000),
        file_name_format: Some("'take'".into()),
        ..wav_args(None)
    };

    manager.start_recording(args()).unwrap();
    platform.input.fire(&tone(4_000, 0.3), 1);
    let first = manager.stop_recording().unwrap();

    manager.start_recording(args()).unwrap();
    platform.input.fire(&tone(2_000, 0.3), 1);
    let second = manager.stop_recording().unwrap();

    assert_eq!(first.path, dir.path().join("take.wav").to_string_lossy());
    assert_eq!(second.path, dir.path().join("take-1.wav").to_string_lossy());
    assert_eq!(probe_wav_duration(&dir.path().join("take.wav")).unwrap().as_millis(), 500);
    assert_eq!(probe_wav_duration(&dir.path().join("take-1.wav")).unwrap().as_millis(), 250);
}

#[test]
fn stop_result_serializes_as_path_and_millis() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 8_000.0);
    let manager = manager(&platform, PermissionStatus::Granted);
    let target = dir.path().join("memo.wav");

    manager
        .start_recording(StartRecordingArgs {
            sample_rate: Some(8_000),
            ..wav_args(Some(target.to_string_lossy().into_owned()))
        })
        .unwrap();
    platform.input.fire(&tone(2_000, 0.1), 1);
    let result = manager.stop_recording().unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json, serde_json::json!([target.to_string_lossy(), "250"]));
}

#[test]
fn loudness_polling_runs_alongside_the_tap() {
    let dir = tempfile::tempdir().unwrap();
    let platform = FakePlatform::new(dir.path(), 44_100.0);
    let manager = Arc::new(manager(&platform, PermissionStatus::Granted));
    manager.start_recording(wav_args(None)).unwrap();

    let input = Arc::clone(&platform.input);
    let feeder = std::thread::spawn(move || {
        for i in 1..=500 {
            input.fire(&[i as f32 / 500.0, 0.0], 1);
        }
    });

    let mut readings = Vec::new();
    while !feeder.is_finished() {
        readings.push(manager.get_loudness());
    }
    feeder.join().unwrap();
    readings.push(manager.get_loudness());

    assert!(readings.iter().all(|v| (0.0..=32767.0).contains(v)));
    assert_eq!(readings.iter().cloned().fold(0.0, f32::max), 32767.0);
    manager.stop_recording().unwrap();
}
