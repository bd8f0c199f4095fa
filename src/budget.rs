//! Resource accounting for one extraction pass.

use crate::config::WorkspaceConfig;
use crate::error::{BudgetExceeded, ExtractError};

/// Running entry and byte totals for a single extraction.
///
/// A budget is created at the start of an extraction call and dropped at
/// its end. Each non-directory entry is charged with [`accept`] *before*
/// any of its bytes reach the disk, so the entry that crosses a ceiling is
/// rejected whole rather than truncated.
///
/// # Example
///
/// ```rust
/// use zipspace::ResourceBudget;
///
/// let mut budget = ResourceBudget::new(2, 100);
/// assert!(budget.accept(60).is_ok());
/// assert!(budget.accept(50).is_err()); // 110 bytes > 100
/// ```
///
/// [`accept`]: ResourceBudget::accept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBudget {
    max_entries: usize,
    max_total_bytes: u64,
    entries: usize,
    total_bytes: u64,
}

impl ResourceBudget {
    /// Creates an empty budget with explicit ceilings.
    pub fn new(max_entries: usize, max_total_bytes: u64) -> Self {
        Self {
            max_entries,
            max_total_bytes,
            entries: 0,
            total_bytes: 0,
        }
    }

    /// Creates an empty budget from a configuration.
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.max_entries, config.max_total_bytes)
    }

    /// Rejects a raw archive payload larger than the byte ceiling.
    ///
    /// This is a cheap upfront check run before the container is parsed, so
    /// the error names no entry.
    pub fn check_input(&self, payload_len: u64) -> Result<(), ExtractError> {
        if payload_len > self.max_total_bytes {
            return Err(ExtractError::TooLarge {
                size: payload_len,
                limit: self.max_total_bytes,
                entry_index: None,
            });
        }
        Ok(())
    }

    /// Charges one entry of `entry_size` declared bytes.
    ///
    /// # Errors
    ///
    /// - [`BudgetExceeded::TooManyEntries`] once the entry count exceeds
    ///   `max_entries`
    /// - [`BudgetExceeded::TooLarge`] once the byte total exceeds
    ///   `max_total_bytes`
    pub fn accept(&mut self, entry_size: u64) -> Result<(), BudgetExceeded> {
        self.entries += 1;
        if self.entries > self.max_entries {
            return Err(BudgetExceeded::TooManyEntries {
                count: self.entries,
                limit: self.max_entries,
            });
        }

        self.total_bytes = self.total_bytes.saturating_add(entry_size);
        if self.total_bytes > self.max_total_bytes {
            return Err(BudgetExceeded::TooLarge {
                total: self.total_bytes,
                limit: self.max_total_bytes,
            });
        }

        Ok(())
    }

    /// Returns the number of accepted entries.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Returns the accepted declared bytes.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}
