use crate::engine::{AttributionEngine, Observation, Records};
use crate::error::StoreError;
use crate::store::DurationStore;
use crate::week::{WeekBoundary, WeekKey};
use chrono::{DateTime, Local};
use log::{error, info, warn};

/// A committed copy of one week's totals, ready to be written.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub week: WeekKey,
    pub records: Records,
}

/// Binds the attribution engine to its store and the active week.
#[derive(Debug)]
pub struct Tracker {
    engine: AttributionEngine,
    store: DurationStore,
    boundary: WeekBoundary,
    /// Rollover flushes that failed and still need writing.
    pending: Vec<Snapshot>,
}

impl Tracker {
    /// Starts tracking the week containing `now`, resuming any totals already
    /// stored for it.
    pub fn open(store: DurationStore, now: DateTime<Local>) -> Self {
        let week = WeekKey::current(now);
        let records = load_or_empty(&store, week, now);
        info!("Tracking week {week} with {} stored labels", records.len());

        Self {
            engine: AttributionEngine::with_records(records),
            store,
            boundary: WeekBoundary::new(week),
            pending: Vec::new(),
        }
    }

    /// One sampling tick: roll the week over if needed, then attribute.
    pub fn sample(&mut self, label: &str, now: DateTime<Local>) -> Observation {
        self.check_week(now);
        self.engine.observe(label, now)
    }

    /// Switches stores when `now` falls in a different ISO week. The open
    /// interval up to `now` is credited to the old week, which is flushed
    /// before the new week's totals are loaded. Returns the week left behind.
    pub fn check_week(&mut self, now: DateTime<Local>) -> Option<WeekKey> {
        let previous = self.boundary.advance(now)?;
        let current = self.boundary.active();

        self.engine.commit(now);
        let outgoing = Snapshot {
            week: previous,
            records: self.engine.take_records(),
        };
        info!(
            "Week changed from {previous} to {current}, flushing {} labels",
            outgoing.records.len()
        );
        let failed = write_snapshots(&self.store, vec![outgoing]);
        self.pending.extend(failed);

        let records = load_or_empty(&self.store, current, now);
        self.engine.replace_records(records);
        Some(previous)
    }

    /// Commits the open interval and copies the active week's totals.
    pub fn snapshot(&mut self, now: DateTime<Local>) -> Snapshot {
        self.engine.commit(now);
        Snapshot {
            week: self.boundary.active(),
            records: self.engine.records().clone(),
        }
    }

    pub fn take_pending(&mut self) -> Vec<Snapshot> {
        std::mem::take(&mut self.pending)
    }

    pub fn requeue(&mut self, snapshots: Vec<Snapshot>) {
        self.pending.extend(snapshots);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Commits and writes the active week, retrying any failed rollover
    /// flushes first. On error the in-memory totals are untouched.
    pub fn save(&mut self, now: DateTime<Local>) -> Result<(), StoreError> {
        let snapshot = self.snapshot(now);
        let pending = self.take_pending();
        let failed = write_snapshots(&self.store, pending);
        self.requeue(failed);
        self.store.save(snapshot.week, &snapshot.records)
    }

    pub fn engine(&self) -> &AttributionEngine {
        &self.engine
    }

    pub fn store(&self) -> &DurationStore {
        &self.store
    }

    pub fn week(&self) -> WeekKey {
        self.boundary.active()
    }
}

/// Writes each snapshot, returning the ones that could not be written.
pub(crate) fn write_snapshots(store: &DurationStore, snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
    snapshots
        .into_iter()
        .filter(|snapshot| match store.save(snapshot.week, &snapshot.records) {
            Ok(()) => false,
            Err(e) => {
                error!("Failed to flush week {}: {e}; will retry", snapshot.week);
                true
            }
        })
        .collect()
}

fn load_or_empty(store: &DurationStore, week: WeekKey, now: DateTime<Local>) -> Records {
    match store.load(week, now) {
        Ok(records) => records,
        Err(e) if e.is_corrupt() => {
            warn!("{e}; starting week {week} empty");
            if let Err(e) = store.quarantine(week, now) {
                error!("Could not move corrupt store aside: {e}");
            }
            Records::new()
        }
        Err(e) => {
            warn!("{e}; starting week {week} empty");
            Records::new()
        }
    }
}
