use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

/// Result returned when a capture session stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResult {
    pub file_path: PathBuf,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Whether `duration` came from the media probe or the wall clock.
    pub duration_source: DurationSource,
    /// Instant the session started; synthesized file names are formatted from it.
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    MediaProbe,
    WallClock,
}

impl RecordingResult {
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    pub fn to_stop_result(&self) -> StopResult {
        StopResult {
            path: self.file_path.to_string_lossy().into_owned(),
            duration_ms: self.duration_ms(),
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// `(path, duration in ms)` pair returned by `stopRecording`.
///
/// Serializes as `["<path>", "<ms>"]`, the two-element list the host
/// transport expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopResult {
    pub path: String,
    pub duration_ms: u64,
}

impl Serialize for StopResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.path)?;
        seq.serialize_element(&self.duration_ms.to_string())?;
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn result() -> RecordingResult {
        RecordingResult {
            file_path: PathBuf::from("/docs/take.m4a"),
            duration: Duration::from_micros(1_534_900),
            duration_source: DurationSource::MediaProbe,
            started_at: Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 4).unwrap(),
        }
    }

    #[test]
    fn stop_result_serializes_as_pair() {
        let json = serde_json::to_value(result().to_stop_result()).unwrap();
        assert_eq!(json, serde_json::json!(["/docs/take.m4a", "1534"]));
    }

    #[test]
    fn recording_result_serializes_as_struct() {
        let json = serde_json::to_value(result()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filePath": "/docs/take.m4a",
                "durationMs": 1534,
                "durationSource": "media_probe",
                "startedAt": "2024-03-07T09:05:04Z"
            })
        );
    }
}
