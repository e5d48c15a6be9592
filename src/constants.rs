// src/constants.rs

/// Label recorded when no real window has focus or the probe cannot resolve one.
pub const DESKTOP_LABEL: &str = "Desktop";

/// Seconds in one day (24 * 60 * 60)
pub const SECS_PER_DAY: u64 = 86400;

/// Seconds in one hour
pub const SECS_PER_HOUR: u64 = 3600;

/// Seconds in one minute
pub const SECS_PER_MINUTE: u64 = 60;

/// Default sampling cadence in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Default persistence cadence in seconds
pub const DEFAULT_SAVE_INTERVAL_SECS: u64 = 60;

/// File name prefix for the per-week duration stores
pub const STORE_FILE_PREFIX: &str = "app_durations_week_";
