//! Spending ledger with CSV export.
//!
//! Amounts are integer cents end to end; the only place decimals appear is
//! `parse_amount` and `format_amount` at the edges.

use crate::store::{self, KvStore, EXPENSES_KEY};
use crate::{Error, Expense, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// Spending entries in the order they were added
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<Expense>,
}

impl Ledger {
    pub fn from_entries(entries: Vec<Expense>) -> Self {
        Self { entries }
    }

    pub fn load(store: &dyn KvStore) -> Result<Self> {
        Ok(Self::from_entries(store::load_or_default(store, EXPENSES_KEY)?))
    }

    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        store::save_json(store, EXPENSES_KEY, &self.entries)
    }

    pub fn entries(&self) -> &[Expense] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Expense> {
        self.entries
    }

    pub fn add(
        &mut self,
        amount_cents: i64,
        category: &str,
        note: Option<&str>,
        spent_on: NaiveDate,
    ) -> Result<Uuid> {
        if amount_cents <= 0 {
            return Err(Error::Validation("amount must be greater than zero".into()));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::Validation("category is empty".into()));
        }

        let expense = Expense {
            id: Uuid::new_v4(),
            amount_cents,
            category: category.to_string(),
            note: note.map(str::trim).filter(|n| !n.is_empty()).map(String::from),
            spent_on,
        };
        let id = expense.id;
        self.entries.push(expense);
        tracing::debug!("Recorded expense {} ({} cents)", id, amount_cents);
        Ok(id)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Expense> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("expense {}", id)))?;
        Ok(self.entries.remove(idx))
    }

    pub fn total(&self) -> i64 {
        self.entries.iter().map(|e| e.amount_cents).sum()
    }

    /// Total spent per category, by category name
    pub fn totals_by_category(&self) -> BTreeMap<String, i64> {
        let mut totals = BTreeMap::new();
        for expense in &self.entries {
            *totals.entry(expense.category.clone()).or_insert(0) += expense.amount_cents;
        }
        totals
    }

    /// Entries dated within a calendar month
    pub fn in_month(&self, year: i32, month: u32) -> Ledger {
        Ledger::from_entries(
            self.entries
                .iter()
                .filter(|e| e.spent_on.year() == year && e.spent_on.month() == month)
                .cloned()
                .collect(),
        )
    }

    /// Find an expense by full id or by a unique id prefix
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Uuid> {
        crate::tasks::resolve_prefix(self.entries.iter().map(|e| e.id), id_or_prefix, "expense")
    }

    /// Write the ledger to a CSV file, replacing any existing file
    ///
    /// Returns the number of rows written.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);
        for expense in &self.entries {
            writer.serialize(CsvRow::from(expense))?;
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        file.sync_all()?;

        tracing::info!("Exported {} expenses to {:?}", self.entries.len(), path);
        Ok(self.entries.len())
    }
}

/// A row in the CSV export
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    spent_on: String,
    category: String,
    amount: String,
    note: Option<String>,
}

impl From<&Expense> for CsvRow {
    fn from(expense: &Expense) -> Self {
        CsvRow {
            id: expense.id.to_string(),
            spent_on: expense.spent_on.to_string(),
            category: expense.category.clone(),
            amount: format_amount(expense.amount_cents),
            note: expense.note.clone(),
        }
    }
}

/// Parse a decimal amount like `12`, `12.5` or `12.50` into cents
pub fn parse_amount(input: &str) -> Result<i64> {
    let invalid = || Error::Validation(format!("invalid amount '{}'", input));
    let trimmed = input.trim();

    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > 2 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(frac))
        .ok_or_else(invalid)
}

/// Format cents as a decimal string with two places
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12").unwrap(), 1200);
        assert_eq!(parse_amount("12.5").unwrap(), 1250);
        assert_eq!(parse_amount("12.05").unwrap(), 1205);
        assert_eq!(parse_amount(" 0.99 ").unwrap(), 99);
        assert_eq!(parse_amount(".5").unwrap(), 50);
        assert_eq!(parse_amount("7.").unwrap(), 700);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        for bad in ["", ".", "-3", "1.234", "abc", "1,50", "1.2.3", "99999999999999999999"] {
            assert!(parse_amount(bad).is_err(), "expected '{}' to be rejected", bad);
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1205), "12.05");
        assert_eq!(format_amount(7), "0.07");
        assert_eq!(format_amount(-150), "-1.50");
    }

    #[test]
    fn test_add_validates() {
        let mut ledger = Ledger::default();
        assert!(ledger.add(0, "food", None, day(2024, 1, 1)).is_err());
        assert!(ledger.add(100, " ", None, day(2024, 1, 1)).is_err());

        ledger.add(100, " food ", Some("  "), day(2024, 1, 1)).unwrap();
        assert_eq!(ledger.entries()[0].category, "food");
        assert_eq!(ledger.entries()[0].note, None);
    }

    #[test]
    fn test_totals() {
        let mut ledger = Ledger::default();
        ledger.add(450, "food", None, day(2024, 1, 3)).unwrap();
        ledger.add(1200, "books", Some("calculus"), day(2024, 2, 1)).unwrap();
        ledger.add(300, "food", None, day(2024, 2, 9)).unwrap();

        assert_eq!(ledger.total(), 1950);
        let by_cat = ledger.totals_by_category();
        assert_eq!(by_cat["food"], 750);
        assert_eq!(by_cat["books"], 1200);

        let feb = ledger.in_month(2024, 2);
        assert_eq!(feb.entries().len(), 2);
        assert_eq!(feb.total(), 1500);
    }

    #[test]
    fn test_remove() {
        let mut ledger = Ledger::default();
        let id = ledger.add(450, "food", None, day(2024, 1, 3)).unwrap();
        assert_eq!(ledger.remove(id).unwrap().amount_cents, 450);
        assert!(matches!(ledger.remove(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_export_csv() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("expenses.csv");

        let mut ledger = Ledger::default();
        ledger.add(450, "food", None, day(2024, 1, 3)).unwrap();
        ledger.add(1205, "books", Some("calculus"), day(2024, 2, 1)).unwrap();

        assert_eq!(ledger.export_csv(&path).unwrap(), 2);
        // Exporting again replaces rather than appends
        assert_eq!(ledger.export_csv(&path).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["id", "spent_on", "category", "amount", "note"]
        );
        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][3], "12.05");
        assert_eq!(&rows[1][4], "calculus");
    }

    #[test]
    fn test_store_roundtrip() {
        let mut store = MemoryStore::new();
        let mut ledger = Ledger::default();
        ledger.add(450, "food", None, day(2024, 1, 3)).unwrap();
        ledger.save(&mut store).unwrap();

        assert_eq!(Ledger::load(&store).unwrap(), ledger);
    }
}
