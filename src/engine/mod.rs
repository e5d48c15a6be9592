//! Converts periodic focus samples into per-label duration totals.
//!
//! The engine is pure: it never reads the clock or touches the disk. Every
//! call carries the label observed and the instant it was observed at.

pub mod filter;

pub use filter::is_path_like;

use crate::models::session::Elapsed;
use crate::models::{ApplicationRecord, Session};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use log::{debug, warn};

/// Records keyed by label, in first-attributed order.
pub type Records = IndexMap<String, ApplicationRecord>;

/// What a single sample did to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The label looked like a filesystem path; nothing changed.
    Discarded,
    /// First sample: a session was opened and nothing was attributed.
    Opened,
    /// Same label as before; the interval since the previous tick was attributed.
    Continued { attributed: f64 },
    /// The label changed; the previous label received the final interval.
    Switched { from: String, attributed: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Label,
    Duration,
}

#[derive(Debug, Default)]
pub struct AttributionEngine {
    records: Records,
    session: Option<Session>,
}

impl AttributionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Records) -> Self {
        Self {
            records,
            session: None,
        }
    }

    /// Applies one sampling tick.
    pub fn observe(&mut self, label: &str, now: DateTime<Local>) -> Observation {
        if is_path_like(label) {
            debug!("Discarding path-like focus label '{label}'");
            return Observation::Discarded;
        }

        match self.session.as_mut() {
            None => {
                self.session = Some(Session::open(label, now));
                Observation::Opened
            }
            Some(session) if session.label == label => {
                let attributed = attribute(&mut self.records, session, now);
                Observation::Continued { attributed }
            }
            Some(session) => {
                let attributed = attribute(&mut self.records, session, now);
                let previous = self.session.replace(Session::open(label, now));
                Observation::Switched {
                    from: previous.map(|s| s.label).unwrap_or_default(),
                    attributed,
                }
            }
        }
    }

    /// Attributes the open interval to the current label without closing the
    /// session. Returns the seconds attributed.
    pub fn commit(&mut self, now: DateTime<Local>) -> f64 {
        match self.session.as_mut() {
            Some(session) => attribute(&mut self.records, session, now),
            None => 0.0,
        }
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn record(&self, label: &str) -> Option<&ApplicationRecord> {
        self.records.get(label)
    }

    pub fn current_label(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.label.as_str())
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    /// Replaces all totals, e.g. with the contents of a freshly loaded store.
    /// The open session is kept.
    pub fn replace_records(&mut self, records: Records) {
        self.records = records;
    }

    /// Removes and returns all totals. The open session is kept.
    pub fn take_records(&mut self) -> Records {
        std::mem::take(&mut self.records)
    }

    pub fn total_seconds(&self) -> f64 {
        self.records.values().map(|r| r.accumulated_seconds).sum()
    }

    /// Totals ordered by `key`, ascending. Ties keep insertion order.
    pub fn sorted(&self, key: SortKey) -> Vec<&ApplicationRecord> {
        let mut rows: Vec<&ApplicationRecord> = self.records.values().collect();
        match key {
            SortKey::Label => rows.sort_by(|a, b| a.label.cmp(&b.label)),
            SortKey::Duration => {
                rows.sort_by(|a, b| a.accumulated_seconds.total_cmp(&b.accumulated_seconds));
            }
        }
        rows
    }
}

fn attribute(records: &mut Records, session: &mut Session, now: DateTime<Local>) -> f64 {
    let elapsed = session.elapsed(now);
    if let Elapsed::Regressed(back) = elapsed {
        warn!(
            "Clock moved backwards by {back:.3}s while tracking '{}', attributing nothing",
            session.label
        );
    }
    let secs = elapsed.attributable();

    // A label's record appears with its first non-zero interval.
    match records.get_mut(&session.label) {
        Some(record) => record.add_seconds(secs, now),
        None if secs > 0.0 => {
            let mut record = ApplicationRecord::new(&session.label, now);
            record.add_seconds(secs, now);
            records.insert(session.label.clone(), record);
        }
        None => {}
    }
    session.restart_at(now);
    secs
}
