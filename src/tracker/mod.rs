mod state;

pub use state::{Snapshot, Tracker};

use crate::constants::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SAVE_INTERVAL_SECS};
use crate::engine::SortKey;
use crate::error::StoreError;
use crate::platform::FocusProbe;
use crate::report;
use crate::store::DurationStore;
use crate::week::WeekKey;
use chrono::Local;
use log::{debug, error, info, warn};
use state::write_snapshots;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval_secs: u64,
    pub save_interval_secs: u64,
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            save_interval_secs: DEFAULT_SAVE_INTERVAL_SECS,
            data_dir: None,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `APPTALLY_POLL_SECS`, `APPTALLY_SAVE_SECS` and
    /// `APPTALLY_DATA_DIR`. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let secs = |key: &str, current: u64| -> u64 {
            match lookup(key).map(|raw| raw.trim().parse::<u64>()) {
                None => current,
                Some(Ok(value)) => value.max(1),
                Some(Err(e)) => {
                    warn!("Ignoring {key}: {e}");
                    current
                }
            }
        };
        config.poll_interval_secs = secs("APPTALLY_POLL_SECS", config.poll_interval_secs);
        config.save_interval_secs = secs("APPTALLY_SAVE_SECS", config.save_interval_secs);

        if let Some(dir) = lookup("APPTALLY_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        config
    }
}

/// Runs sampling and persistence on a background thread until stopped.
///
/// Lock order is `writes` before `tracker`. Holding `writes` across a save
/// keeps an older snapshot from landing on disk after a newer one.
pub struct TrackerService {
    config: TrackerConfig,
    running: Arc<AtomicBool>,
    tracker: Arc<Mutex<Tracker>>,
    writes: Arc<Mutex<()>>,
    store: DurationStore,
}

impl TrackerService {
    pub fn new(tracker: Tracker, config: TrackerConfig) -> Self {
        let store = tracker.store().clone();
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            tracker: Arc::new(Mutex::new(tracker)),
            writes: Arc::new(Mutex::new(())),
            store,
        }
    }

    /// Spawns the tracking thread. The thread always performs a final
    /// commit-and-save before it exits, however it exits.
    pub fn start<P: FocusProbe + 'static>(&self, probe: P) -> thread::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let tracker = Arc::clone(&self.tracker);
        let writes = Arc::clone(&self.writes);
        let store = self.store.clone();
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let save_interval = Duration::from_secs(self.config.save_interval_secs.max(1));

        thread::spawn(move || {
            let _flush = FinalFlush {
                tracker: Arc::clone(&tracker),
                writes: Arc::clone(&writes),
                store: store.clone(),
            };
            let mut last_save = Instant::now();

            while running.load(Ordering::SeqCst) {
                let window = probe.get_active_window();
                let now = Local::now();
                // A rollover writes the old week, so it queues behind saves.
                let rollover_due = lock_tracker(&tracker).week() != WeekKey::current(now);
                let writing = rollover_due.then(|| lock_writes(&writes));
                lock_tracker(&tracker).sample(&window.label, now);
                drop(writing);

                if last_save.elapsed() >= save_interval {
                    if let Err(e) = persist(&writes, &tracker, &store) {
                        error!("Periodic save failed, keeping totals in memory: {e}");
                    }
                    last_save = Instant::now();
                }

                thread::sleep(poll_interval);
            }
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shared handle for read-only consumers such as viewers.
    pub fn tracker(&self) -> Arc<Mutex<Tracker>> {
        Arc::clone(&self.tracker)
    }

    pub fn save_now(&self) -> Result<(), StoreError> {
        persist(&self.writes, &self.tracker, &self.store)
    }
}

/// Lock the tracker, recovering from poisoning if necessary
fn lock_tracker(tracker: &Mutex<Tracker>) -> MutexGuard<'_, Tracker> {
    match tracker.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Tracker mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn lock_writes(writes: &Mutex<()>) -> MutexGuard<'_, ()> {
    writes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Copies the committed totals under the tracker lock and writes them after
/// releasing it. Saves run one at a time.
fn persist(
    writes: &Mutex<()>,
    tracker: &Mutex<Tracker>,
    store: &DurationStore,
) -> Result<(), StoreError> {
    let _writing = lock_writes(writes);
    let (snapshot, pending) = {
        let mut guard = lock_tracker(tracker);
        (guard.snapshot(Local::now()), guard.take_pending())
    };

    let failed = write_snapshots(store, pending);
    if !failed.is_empty() {
        lock_tracker(tracker).requeue(failed);
    }

    store.save(snapshot.week, &snapshot.records)?;
    debug!(
        "Saved week {} ({} labels)",
        snapshot.week,
        snapshot.records.len()
    );
    Ok(())
}

struct FinalFlush {
    tracker: Arc<Mutex<Tracker>>,
    writes: Arc<Mutex<()>>,
    store: DurationStore,
}

impl Drop for FinalFlush {
    fn drop(&mut self) {
        let result = persist(&self.writes, &self.tracker, &self.store);
        let guard = lock_tracker(&self.tracker);
        if guard.has_pending() {
            error!("Exiting with unwritten totals from an earlier week");
        }
        match result {
            Ok(()) => {
                let mut rows = guard.engine().sorted(SortKey::Duration);
                rows.reverse();
                info!(
                    "Final save for week {} complete, {} tracked\n{}",
                    guard.week(),
                    report::format_duration(guard.engine().total_seconds()),
                    report::summary(&rows)
                );
            }
            Err(e) => error!("Final save failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ActiveWindow;
    use crate::test_utils::setup_test_store;
    use crate::week::WeekKey;
    use std::collections::HashMap;
    use std::fs;

    struct FixedProbe(&'static str);

    impl FocusProbe for FixedProbe {
        fn get_active_window(&self) -> ActiveWindow {
            ActiveWindow::titled(self.0, None, None)
        }
    }

    fn fast_config() -> TrackerConfig {
        TrackerConfig {
            poll_interval_secs: 1,
            save_interval_secs: 60,
            data_dir: None,
        }
    }

    #[test]
    fn test_tracker_starts_and_stops() {
        let (store, _dir) = setup_test_store();
        let tracker = Tracker::open(store, Local::now());
        let service = TrackerService::new(tracker, fast_config());

        assert!(!service.is_running());

        let handle = service.start(FixedProbe("Editor"));
        assert!(service.is_running());

        thread::sleep(Duration::from_millis(100));

        service.stop();
        handle.join().unwrap();

        assert!(!service.is_running());
    }

    #[test]
    fn test_stop_flushes_samples_to_disk() {
        let (store, _dir) = setup_test_store();
        let tracker = Tracker::open(store.clone(), Local::now());
        let service = TrackerService::new(tracker, fast_config());

        let handle = service.start(FixedProbe("Editor"));
        thread::sleep(Duration::from_millis(1500));
        service.stop();
        handle.join().unwrap();

        let shared = service.tracker();
        let week = lock_tracker(&shared).week();
        let stored = store.load(week, Local::now()).unwrap();
        let editor = stored.get("Editor").expect("Editor was sampled");
        assert!(editor.accumulated_seconds > 0.0);
    }

    #[test]
    fn test_path_like_probe_records_nothing() {
        let (store, _dir) = setup_test_store();
        let tracker = Tracker::open(store.clone(), Local::now());
        let service = TrackerService::new(tracker, fast_config());

        let handle = service.start(FixedProbe(r"C:\Windows\System32"));
        thread::sleep(Duration::from_millis(100));
        service.stop();
        handle.join().unwrap();

        let week = WeekKey::current(Local::now());
        assert!(store.load(week, Local::now()).unwrap().is_empty());
    }

    #[test]
    fn test_save_now_writes_current_week() {
        let (store, _dir) = setup_test_store();
        let mut tracker = Tracker::open(store.clone(), Local::now());
        tracker.sample("Editor", Local::now());
        let service = TrackerService::new(tracker, fast_config());

        service.save_now().unwrap();
        let week = lock_tracker(&service.tracker()).week();
        assert!(store.path_for(week).exists());
    }

    #[test]
    fn test_periodic_save_runs_while_tracking() {
        let (store, _dir) = setup_test_store();
        let tracker = Tracker::open(store.clone(), Local::now());
        let config = TrackerConfig {
            save_interval_secs: 1,
            ..fast_config()
        };
        let service = TrackerService::new(tracker, config);

        let handle = service.start(FixedProbe("Editor"));
        thread::sleep(Duration::from_millis(2500));

        // Written by the cadence, not by the final flush.
        let week = lock_tracker(&service.tracker()).week();
        let stored = store.load(week, Local::now());
        service.stop();
        handle.join().unwrap();

        let stored = stored.unwrap();
        assert!(stored.get("Editor").is_some_and(|r| r.accumulated_seconds > 0.0));
    }

    #[test]
    fn test_concurrent_save_now_calls_all_succeed() {
        let (store, _dir) = setup_test_store();
        let start = Local::now();
        let mut tracker = Tracker::open(store.clone(), start);
        tracker.sample("Editor", start);
        tracker.sample("Editor", start + chrono::Duration::seconds(5));
        let service = Arc::new(TrackerService::new(tracker, fast_config()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                thread::spawn(move || (0..50).all(|_| service.save_now().is_ok()))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let week = lock_tracker(&service.tracker()).week();
        assert!(store.load(week, Local::now()).unwrap().contains_key("Editor"));
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_config_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.save_interval_secs, 60);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let env: HashMap<&str, &str> = [
            ("APPTALLY_POLL_SECS", "2"),
            ("APPTALLY_SAVE_SECS", "0"),
            ("APPTALLY_DATA_DIR", "/tmp/apptally"),
        ]
        .into_iter()
        .collect();

        let config = TrackerConfig::from_lookup(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.save_interval_secs, 1);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/apptally")));
    }

    #[test]
    fn test_config_ignores_bad_values() {
        let config = TrackerConfig::from_lookup(|key| {
            (key == "APPTALLY_POLL_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.poll_interval_secs, 1);
    }
}
