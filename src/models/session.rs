use chrono::{DateTime, Local};

/// The open, not yet committed interval of focus on one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub label: String,
    pub started_at: DateTime<Local>,
}

/// Result of measuring a session against the current instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elapsed {
    Forward(f64),
    /// The clock reads earlier than `started_at`; carries the regression in seconds.
    Regressed(f64),
}

impl Elapsed {
    /// Seconds that may be attributed: regressions count as zero.
    pub fn attributable(self) -> f64 {
        match self {
            Elapsed::Forward(secs) => secs,
            Elapsed::Regressed(_) => 0.0,
        }
    }
}

impl Session {
    pub fn open(label: &str, now: DateTime<Local>) -> Self {
        Self {
            label: label.to_string(),
            started_at: now,
        }
    }

    pub fn elapsed(&self, now: DateTime<Local>) -> Elapsed {
        let delta = now.signed_duration_since(self.started_at);
        match delta.to_std() {
            Ok(forward) => Elapsed::Forward(forward.as_secs_f64()),
            Err(_) => Elapsed::Regressed(
                (-delta).to_std().map(|d| d.as_secs_f64()).unwrap_or_default(),
            ),
        }
    }

    /// Restarts the open interval at `now`. After a clock regression this
    /// re-anchors the session on the new clock so `started_at <= now` holds.
    pub fn restart_at(&mut self, now: DateTime<Local>) {
        self.started_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_elapsed_forward() {
        let session = Session::open("Editor", base());
        let elapsed = session.elapsed(base() + Duration::milliseconds(1500));
        assert_eq!(elapsed, Elapsed::Forward(1.5));
        assert!((elapsed.attributable() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_backwards_is_not_attributable() {
        let session = Session::open("Editor", base());
        let elapsed = session.elapsed(base() - Duration::seconds(7));
        assert_eq!(elapsed, Elapsed::Regressed(7.0));
        assert!(elapsed.attributable().abs() < f64::EPSILON);
    }

    #[test]
    fn test_restart_reanchors_after_regression() {
        let mut session = Session::open("Editor", base());
        session.restart_at(base() - Duration::seconds(3));
        assert_eq!(session.started_at, base() - Duration::seconds(3));

        let elapsed = session.elapsed(base());
        assert_eq!(elapsed, Elapsed::Forward(3.0));
    }
}
