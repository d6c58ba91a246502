//! Class schedule, attendance counters and daily mark history.
//!
//! `AttendanceBook` is the counter store the projection engine reads from.
//! It owns the only mutation path for counters (`mark`), which enforces one
//! mark per subject per day and never decrements.

use crate::projection::{self, AggregateProjection, ProjectionResult};
use crate::store::{self, KvStore, ATTENDANCE_KEY};
use crate::{AttendanceCounter, Error, MarkStatus, Result, Weekday};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read/write access to per-subject counters
pub trait CounterStore {
    fn counter(&self, subject: &str) -> Option<AttendanceCounter>;
    fn set_counter(&mut self, subject: &str, counter: AttendanceCounter);
    fn subjects(&self) -> Vec<String>;
}

/// Persisted attendance state
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AttendanceBook {
    #[serde(default)]
    pub schedule: BTreeMap<Weekday, Vec<String>>,
    #[serde(default)]
    pub stats: BTreeMap<String, AttendanceCounter>,
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, BTreeMap<String, MarkStatus>>,
}

/// Projection for one subject, as shown in the stats view
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubjectReport {
    pub subject: String,
    pub counter: AttendanceCounter,
    pub projection: ProjectionResult,
}

impl CounterStore for AttendanceBook {
    fn counter(&self, subject: &str) -> Option<AttendanceCounter> {
        self.stats.get(subject).copied()
    }

    fn set_counter(&mut self, subject: &str, counter: AttendanceCounter) {
        self.stats.insert(subject.to_string(), counter);
    }

    fn subjects(&self) -> Vec<String> {
        self.stats.keys().cloned().collect()
    }
}

impl AttendanceBook {
    /// Load from the blob store; a corrupt blob yields an empty book
    pub fn load(store: &dyn KvStore) -> Result<Self> {
        store::load_or_default(store, ATTENDANCE_KEY)
    }

    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        store::save_json(store, ATTENDANCE_KEY, self)
    }

    /// Load, modify and save back
    pub fn update<F, T>(store: &mut dyn KvStore, f: F) -> Result<T>
    where
        F: FnOnce(&mut AttendanceBook) -> Result<T>,
    {
        let mut book = Self::load(store)?;
        let out = f(&mut book)?;
        book.save(store)?;
        Ok(out)
    }

    // ------------------------------------------------------------------------
    // Schedule
    // ------------------------------------------------------------------------

    /// Add a class to a weekday, registering the subject if it is new
    pub fn add_to_schedule(&mut self, day: Weekday, subject: &str) -> Result<()> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(Error::Validation("subject name is empty".into()));
        }

        self.schedule.entry(day).or_default().push(subject.to_string());

        if self.counter(subject).is_none() {
            self.set_counter(subject, AttendanceCounter::default());
            tracing::info!("Registered new subject {}", subject);
        }

        Ok(())
    }

    /// Remove the class at `index` on `day`
    ///
    /// The subject's counter and history stay; only the timetable slot goes.
    pub fn remove_from_schedule(&mut self, day: Weekday, index: usize) -> Result<String> {
        let classes = self
            .schedule
            .get_mut(&day)
            .filter(|c| index < c.len())
            .ok_or_else(|| Error::NotFound(format!("no class #{} on {}", index, day)))?;

        let removed = classes.remove(index);
        if classes.is_empty() {
            self.schedule.remove(&day);
        }

        tracing::info!("Removed {} from {}", removed, day);
        Ok(removed)
    }

    /// Classes on a weekday, in the order they were added
    pub fn classes_on(&self, day: Weekday) -> &[String] {
        self.schedule.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_schedule_empty(&self) -> bool {
        self.schedule.values().all(Vec::is_empty)
    }

    // ------------------------------------------------------------------------
    // Marking
    // ------------------------------------------------------------------------

    /// Mark a subject present or absent for a date
    ///
    /// Each subject can be marked once per date.
    pub fn mark(&mut self, subject: &str, status: MarkStatus, date: NaiveDate) -> Result<AttendanceCounter> {
        let mut counter = self
            .counter(subject)
            .ok_or_else(|| Error::NotFound(format!("unknown subject '{}'", subject)))?;

        if self.status_on(date, subject).is_some() {
            return Err(Error::AlreadyMarked {
                subject: subject.to_string(),
                date,
            });
        }

        counter.record(status);
        self.set_counter(subject, counter);
        self.history
            .entry(date)
            .or_default()
            .insert(subject.to_string(), status);

        tracing::info!("Marked {} {} on {}", subject, status, date);
        Ok(counter)
    }

    /// Mark recorded for a subject on a date, if any
    pub fn status_on(&self, date: NaiveDate, subject: &str) -> Option<MarkStatus> {
        self.history.get(&date).and_then(|day| day.get(subject)).copied()
    }

    /// The date's scheduled classes with their mark status
    pub fn today(&self, date: NaiveDate) -> Vec<(String, Option<MarkStatus>)> {
        self.classes_on(Weekday::of(date))
            .iter()
            .map(|subject| (subject.clone(), self.status_on(date, subject)))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------------

    /// Per-subject projections for subjects with recorded classes, by name
    pub fn subject_reports(&self, target: i64) -> Vec<SubjectReport> {
        self.stats
            .iter()
            .filter(|(_, counter)| counter.total > 0)
            .map(|(subject, counter)| SubjectReport {
                subject: subject.clone(),
                counter: *counter,
                projection: projection::project_counter(*counter, target),
            })
            .collect()
    }

    /// Overall projection across every subject
    pub fn aggregate(&self, target: i64) -> AggregateProjection {
        projection::aggregate(self.stats.values().copied(), target)
    }

    /// Counters that break `attended <= total`
    pub fn inconsistent_subjects(&self) -> Vec<&str> {
        self.stats
            .iter()
            .filter(|(_, c)| !c.is_consistent())
            .map(|(s, _)| s.as_str())
            .collect()
    }
}
