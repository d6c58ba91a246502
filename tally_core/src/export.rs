//! Whole-app import/export and factory reset.
//!
//! A snapshot bundles every stored blob into one JSON document. Counters
//! stay integers the whole way through so a round trip is lossless.

use crate::attendance::AttendanceBook;
use crate::gpa::GpaBook;
use crate::prefs::Theme;
use crate::store::KvStore;
use crate::tasks::TaskList;
use crate::expenses::Ledger;
use crate::{Course, Error, Expense, Result, Task};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything the application stores
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub attendance: AttendanceBook,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub theme: Theme,
}

impl Snapshot {
    /// Gather every blob from the store
    pub fn collect(store: &dyn KvStore) -> Result<Self> {
        Ok(Self {
            version: SNAPSHOT_VERSION,
            attendance: AttendanceBook::load(store)?,
            courses: GpaBook::load(store)?.into_courses(),
            tasks: TaskList::load(store)?.into_tasks(),
            expenses: Ledger::load(store)?.into_entries(),
            theme: Theme::load(store)?,
        })
    }

    /// Check the snapshot can be restored as-is
    pub fn validate(&self) -> Result<()> {
        if self.version > SNAPSHOT_VERSION {
            return Err(Error::Validation(format!(
                "snapshot version {} is newer than supported version {}",
                self.version, SNAPSHOT_VERSION
            )));
        }

        let bad = self.attendance.inconsistent_subjects();
        if !bad.is_empty() {
            return Err(Error::Validation(format!(
                "attended exceeds total for: {}",
                bad.join(", ")
            )));
        }

        if let Some(expense) = self.expenses.iter().find(|e| e.amount_cents <= 0) {
            return Err(Error::Validation(format!(
                "expense {} has a non-positive amount",
                expense.id
            )));
        }

        Ok(())
    }

    /// Replace the store's contents with this snapshot
    ///
    /// Validation happens before anything is written. Each blob is replaced
    /// atomically but the set is not: a write failure part way leaves the
    /// earlier blobs restored and the rest untouched. Attendance goes last so
    /// that it is never replaced unless everything else was.
    pub fn restore(&self, store: &mut dyn KvStore) -> Result<()> {
        self.validate()?;

        self.theme.save(store)?;
        GpaBook::from_courses(self.courses.clone()).save(store)?;
        TaskList::from_tasks(self.tasks.clone()).save(store)?;
        Ledger::from_entries(self.expenses.clone()).save(store)?;
        self.attendance.save(store)?;

        tracing::info!(
            "Restored snapshot: {} subjects, {} courses, {} tasks, {} expenses",
            self.attendance.stats.len(),
            self.courses.len(),
            self.tasks.len(),
            self.expenses.len()
        );
        Ok(())
    }

    /// Write as pretty JSON, atomically replacing `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        let contents = serde_json::to_string_pretty(self)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Exported snapshot to {:?}", path);
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        tracing::debug!("Read snapshot version {} from {:?}", snapshot.version, path);
        Ok(snapshot)
    }
}

/// Wipe schedule, attendance, GPA, tasks, expenses and theme
pub fn factory_reset(store: &mut dyn KvStore) -> Result<()> {
    store.clear()?;
    tracing::warn!("Factory reset: all stored data removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore, ATTENDANCE_KEY};
    use crate::{AttendanceCounter, MarkStatus, Weekday};
    use crate::attendance::CounterStore;
    use chrono::{NaiveDate, Utc};

    fn populated_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        AttendanceBook::update(&mut store, |book| {
            book.add_to_schedule(Weekday::Monday, "Physics")?;
            book.mark("Physics", MarkStatus::Present, date)?;
            Ok(())
        })
        .unwrap();

        let mut tasks = TaskList::default();
        tasks.add("revise", Utc::now()).unwrap();
        tasks.save(&mut store).unwrap();

        let mut ledger = Ledger::default();
        ledger.add(1999, "books", None, date).unwrap();
        ledger.save(&mut store).unwrap();

        Theme::Dark.save(&mut store).unwrap();
        store
    }

    /// Store that refuses writes to one key
    struct FailingStore {
        inner: MemoryStore,
        fail_on: &'static str,
    }

    impl KvStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if key == self.fail_on {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_failed_restore_keeps_attendance() {
        let snapshot = Snapshot::collect(&populated_store()).unwrap();

        let mut existing = MemoryStore::new();
        AttendanceBook::update(&mut existing, |book| {
            book.add_to_schedule(Weekday::Friday, "History")
        })
        .unwrap();
        let before = existing.get(ATTENDANCE_KEY).unwrap();

        let mut store = FailingStore {
            inner: existing,
            fail_on: crate::store::EXPENSES_KEY,
        };
        assert!(matches!(snapshot.restore(&mut store), Err(Error::Io(_))));
        assert_eq!(store.get(ATTENDANCE_KEY).unwrap(), before);
    }

    #[test]
    fn test_collect_and_restore() {
        let source = populated_store();
        let snapshot = Snapshot::collect(&source).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.courses.len(), 1);

        let mut target = MemoryStore::new();
        snapshot.restore(&mut target).unwrap();
        assert_eq!(Snapshot::collect(&target).unwrap(), snapshot);
    }

    #[test]
    fn test_file_roundtrip_preserves_counters() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("backup.json");

        let mut snapshot = Snapshot::collect(&populated_store()).unwrap();
        snapshot
            .attendance
            .set_counter("Chemistry", AttendanceCounter::new(3_999_999_999, 4_000_000_000));
        snapshot.write_to(&path).unwrap();

        let loaded = Snapshot::read_from(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(
            loaded.attendance.counter("Chemistry"),
            Some(AttendanceCounter::new(3_999_999_999, 4_000_000_000))
        );
    }

    #[test]
    fn test_restore_rejects_inconsistent_counter() {
        let mut snapshot = Snapshot::collect(&MemoryStore::new()).unwrap();
        snapshot
            .attendance
            .set_counter("Physics", AttendanceCounter::new(5, 3));

        let mut store = MemoryStore::new();
        let err = snapshot.restore(&mut store).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_restore_rejects_future_version() {
        let mut snapshot = Snapshot::collect(&MemoryStore::new()).unwrap();
        snapshot.version = SNAPSHOT_VERSION + 1;
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_minimal_document_imports() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("minimal.json");
        std::fs::write(
            &path,
            r#"{ "version": 1, "attendance": { "stats": { "Maths": { "attended": 3, "total": 4 } } } }"#,
        )
        .unwrap();

        let snapshot = Snapshot::read_from(&path).unwrap();
        assert_eq!(snapshot.theme, Theme::Light);
        assert_eq!(
            snapshot.attendance.counter("Maths"),
            Some(AttendanceCounter::new(3, 4))
        );
    }

    #[test]
    fn test_factory_reset_on_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        Snapshot::collect(&populated_store())
            .unwrap()
            .restore(&mut store)
            .unwrap();
        assert!(store.get(ATTENDANCE_KEY).unwrap().is_some());

        factory_reset(&mut store).unwrap();
        let after = Snapshot::collect(&store).unwrap();
        assert!(after.attendance.stats.is_empty());
        assert!(after.tasks.is_empty());
        assert_eq!(after.theme, Theme::Light);
    }
}
