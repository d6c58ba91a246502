#![forbid(unsafe_code)]

//! Core domain model and business logic for the Tally tracker.
//!
//! This crate provides:
//! - Domain types (counters, marks, courses, tasks, expenses)
//! - The attendance projection engine
//! - Attendance book (schedule, counters, history)
//! - GPA, task list and expense ledger bookkeeping
//! - Key-value blob persistence and import/export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod projection;
pub mod attendance;
pub mod calculator;
pub mod gpa;
pub mod tasks;
pub mod expenses;
pub mod prefs;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::{FileStore, KvStore, MemoryStore};
pub use projection::{project, project_counter, AggregateProjection, ForecastPoint, ProjectionResult};
pub use attendance::{AttendanceBook, CounterStore, SubjectReport};
pub use calculator::{CalculatorField, CalculatorInputs};
pub use gpa::{GpaBook, GpaSummary};
pub use tasks::TaskList;
pub use expenses::Ledger;
pub use prefs::{Theme, View};
pub use export::{factory_reset, Snapshot};
