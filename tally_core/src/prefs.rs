//! Theme preference and view selection.

use crate::store::{KvStore, THEME_KEY};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Color theme
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Stored as bare text; anything other than `dark` reads as light
    pub fn load(store: &dyn KvStore) -> Result<Self> {
        let raw = store.get(THEME_KEY)?;
        Ok(match raw.as_deref().map(str::trim) {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        })
    }

    pub fn save(self, store: &mut dyn KvStore) -> Result<()> {
        store.set(THEME_KEY, &self.to_string())
    }

    /// Flip and persist the stored theme; returns the new one
    pub fn toggle_stored(store: &mut dyn KvStore) -> Result<Self> {
        let next = Self::load(store)?.toggled();
        next.save(store)?;
        tracing::info!("Theme switched to {}", next);
        Ok(next)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::Validation(format!("unknown theme '{}'", other))),
        }
    }
}

/// Screens of the application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Calc,
    Today,
    Stats,
    Schedule,
    Gpa,
    Tasks,
    Expenses,
}

impl View {
    /// The holiday switch only applies to the daily marking screen
    pub fn shows_holiday_toggle(self) -> bool {
        self == View::Today
    }
}
