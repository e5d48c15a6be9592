use crate::models::ApplicationRecord;
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat};
use log::warn;
use serde::{Deserialize, Serialize};

/// On-disk shape of one label's totals. Unknown fields are ignored on read.
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct StoredEntry {
    duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_timestamp: Option<String>,
}

impl StoredEntry {
    pub(super) fn from_record(record: &ApplicationRecord) -> Self {
        Self {
            duration: record.accumulated_seconds,
            last_timestamp: Some(
                record
                    .last_update
                    .to_rfc3339_opts(SecondsFormat::Micros, false),
            ),
        }
    }

    pub(super) fn into_record(self, label: &str, now: DateTime<Local>) -> ApplicationRecord {
        let last_update = match self.last_timestamp.as_deref() {
            None => now,
            Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
                warn!("Unreadable last_timestamp '{raw}' for '{label}', using load time");
                now
            }),
        };

        let accumulated_seconds = if self.duration.is_finite() && self.duration >= 0.0 {
            self.duration
        } else {
            warn!("Invalid duration {} for '{label}', resetting to zero", self.duration);
            0.0
        };

        ApplicationRecord {
            label: label.to_string(),
            accumulated_seconds,
            last_update,
        }
    }
}

/// Accepts RFC 3339 timestamps and offset-less ISO-8601 local times.
fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
    }

    fn parse(json: &str) -> StoredEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        let record = parse(r#"{"duration": 12.5}"#).into_record("Editor", now());
        assert_eq!(record.last_update, now());
        assert!((record.accumulated_seconds - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let entry = parse(r#"{"duration": 3, "icon": "x.png", "last_timestamp": null}"#);
        let record = entry.into_record("Editor", now());
        assert!((record.accumulated_seconds - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_naive_iso_timestamp_is_local_time() {
        let entry = parse(r#"{"duration": 1, "last_timestamp": "2024-03-04T08:15:30.250000"}"#);
        let record = entry.into_record("Editor", now());
        assert_eq!(record.last_update.naive_local().hour(), 8);
        assert_eq!(record.last_update.naive_local().minute(), 15);
    }

    #[test]
    fn test_naive_timestamp_without_fraction() {
        assert!(parse_timestamp("2024-03-04T08:15:30").is_some());
    }

    #[test]
    fn test_rfc3339_timestamp_round_trips() {
        let stamped = now() + chrono::Duration::microseconds(123_456);
        let record = ApplicationRecord {
            label: "Editor".to_string(),
            accumulated_seconds: 1.0,
            last_update: stamped,
        };
        let entry = StoredEntry::from_record(&record);
        let back = entry.into_record("Editor", now());
        assert_eq!(back.last_update, stamped);
    }

    #[test]
    fn test_garbage_timestamp_falls_back_to_now() {
        let entry = parse(r#"{"duration": 1, "last_timestamp": "yesterday"}"#);
        assert_eq!(entry.into_record("Editor", now()).last_update, now());
    }

    #[test]
    fn test_negative_duration_is_reset() {
        let entry = parse(r#"{"duration": -5.0}"#);
        assert!(entry.into_record("Editor", now()).accumulated_seconds.abs() < f64::EPSILON);
    }
}
