//! Quick "what if" calculator.
//!
//! Works on ad-hoc numbers typed by the user rather than stored counters.

use crate::config::CalculatorConfig;
use crate::projection::{self, ProjectionResult};

/// Input field of the calculator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalculatorField {
    Total,
    Attended,
    Target,
}

/// Current calculator inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalculatorInputs {
    pub total: i64,
    pub attended: i64,
    pub target: i64,
    defaults: (i64, i64),
}

impl CalculatorInputs {
    pub fn new(config: &CalculatorConfig) -> Self {
        Self {
            total: config.total,
            attended: config.attended,
            target: config.target,
            defaults: (config.total, config.attended),
        }
    }

    /// Step a field up or down, never below zero
    pub fn adjust(&mut self, field: CalculatorField, delta: i64) {
        let value = match field {
            CalculatorField::Total => &mut self.total,
            CalculatorField::Attended => &mut self.attended,
            CalculatorField::Target => &mut self.target,
        };
        *value = value.saturating_add(delta).max(0);
        self.normalize();
    }

    /// Restore default total and attended; target is left alone
    pub fn reset(&mut self) {
        (self.total, self.attended) = self.defaults;
    }

    /// Pull attended back down to total, as the input form does while typing
    ///
    /// Returns true when a correction was made.
    pub fn normalize(&mut self) -> bool {
        if self.attended > self.total {
            self.attended = self.total;
            return true;
        }
        false
    }

    pub fn evaluate(&self) -> ProjectionResult {
        projection::project(self.attended, self.total, self.target)
    }
}

impl Default for CalculatorInputs {
    fn default() -> Self {
        Self::new(&CalculatorConfig::default())
    }
}
