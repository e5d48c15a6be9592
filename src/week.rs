use chrono::{DateTime, Datelike, Local, NaiveDate};
use std::fmt;

/// ISO-8601 week number (1..=53) naming the active duration store.
///
/// Only the week number is kept, not the ISO year, so week 10 of one year
/// shares a store with week 10 of the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey(u32);

impl WeekKey {
    pub fn new(week: u32) -> Self {
        Self(week)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.iso_week().week())
    }

    pub fn current(now: DateTime<Local>) -> Self {
        Self::from_date(now.date_naive())
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tracks the active week and reports when a sample falls into a new one.
#[derive(Debug, Clone, Copy)]
pub struct WeekBoundary {
    active: WeekKey,
}

impl WeekBoundary {
    pub fn new(active: WeekKey) -> Self {
        Self { active }
    }

    pub fn active(&self) -> WeekKey {
        self.active
    }

    /// Returns `Some(previous)` and switches to the week containing `now`
    /// if it differs from the active one.
    pub fn advance(&mut self, now: DateTime<Local>) -> Option<WeekKey> {
        let week = WeekKey::current(now);
        if week == self.active {
            return None;
        }
        let previous = self.active;
        self.active = week;
        Some(previous)
    }
}
