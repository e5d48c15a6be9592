use chrono::{DateTime, Local};

/// Focused time accumulated for one label within the active week.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRecord {
    pub label: String,
    pub accumulated_seconds: f64,
    pub last_update: DateTime<Local>,
}

impl ApplicationRecord {
    pub fn new(label: &str, now: DateTime<Local>) -> Self {
        Self {
            label: label.to_string(),
            accumulated_seconds: 0.0,
            last_update: now,
        }
    }

    /// Adds `secs` to the total. Non-positive and non-finite amounts are ignored
    /// so the total can only grow.
    pub fn add_seconds(&mut self, secs: f64, now: DateTime<Local>) {
        if secs.is_finite() && secs > 0.0 {
            self.accumulated_seconds += secs;
        }
        self.last_update = now;
    }
}
