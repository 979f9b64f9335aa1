//! Observer-side parameter table
//!
//! [`ParameterTable`] is the model a presentation layer renders: one row per
//! parameter with its latest value. It is only ever mutated through
//! [`Observer::on_update`], which the mailbox runs on the owning thread, so
//! it needs no locking of its own.

use crate::notifier::Observer;
use crate::types::{ParameterName, ParameterValue};
use std::fmt;

/// Column headers, in column order
pub const TABLE_HEADER: [&str; 2] = ["Parameter", "Value"];

/// Latest value of every parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTable {
    values: [Option<ParameterValue>; 3],
    updates_applied: u64,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest value for `name`
    pub fn set_param(&mut self, name: ParameterName, value: ParameterValue) {
        self.values[name.index()] = Some(value);
        self.updates_applied += 1;
    }

    /// Latest value for `name`, if any update has arrived
    pub fn value(&self, name: ParameterName) -> Option<ParameterValue> {
        self.values[name.index()]
    }

    /// Total number of updates applied since creation
    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }

    pub fn row_count(&self) -> usize {
        ParameterName::ALL.len()
    }

    pub fn column_count(&self) -> usize {
        TABLE_HEADER.len()
    }

    /// Header text for a column
    pub fn header(&self, section: usize) -> Option<&'static str> {
        TABLE_HEADER.get(section).copied()
    }

    /// Display text of a cell; the value column is empty until set
    pub fn cell(&self, row: usize, column: usize) -> Option<String> {
        let name = *ParameterName::ALL.get(row)?;
        match column {
            0 => Some(name.as_str().to_string()),
            1 => Some(
                self.value(name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    /// Every row as `(name, value)` display text
    pub fn rows(&self) -> Vec<(String, String)> {
        (0..self.row_count())
            .filter_map(|row| Some((self.cell(row, 0)?, self.cell(row, 1)?)))
            .collect()
    }
}

impl Observer for ParameterTable {
    fn on_update(&mut self, name: ParameterName, value: ParameterValue) {
        self.set_param(name, value);
    }
}

impl fmt::Display for ParameterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows();
        let name_width = rows
            .iter()
            .map(|(name, _)| name.len())
            .chain(std::iter::once(TABLE_HEADER[0].len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "{:<name_width$} | {}", TABLE_HEADER[0], TABLE_HEADER[1])?;
        writeln!(f, "{}-+-{}", "-".repeat(name_width), "-".repeat(TABLE_HEADER[1].len()))?;
        for (name, value) in rows {
            writeln!(f, "{:<name_width$} | {}", name, value)?;
        }
        Ok(())
    }
}
