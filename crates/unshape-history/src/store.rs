//! Per-key ordered transform history.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::record::TransformRecord;

/// Ordered history of the transforms applied to one key.
///
/// Order is application order: the last record is the most recent one.
/// Records can be appended, inspected and removed, never edited.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct HistoryStore {
    records: Vec<TransformRecord>,
}

impl HistoryStore {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn push(&mut self, record: TransformRecord) {
        self.records.push(record);
    }

    /// Removes and returns the most recent record.
    pub fn pop(&mut self) -> Option<TransformRecord> {
        self.records.pop()
    }

    /// Returns the most recent record.
    pub fn last(&self) -> Option<&TransformRecord> {
        self.records.last()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, TransformRecord> {
        self.records.iter()
    }

    /// Returns the records as a slice, oldest first.
    pub fn as_slice(&self) -> &[TransformRecord] {
        &self.records
    }

    /// Keeps only the records matching `keep`, preserving their order.
    pub(crate) fn retain(&mut self, keep: impl FnMut(&TransformRecord) -> bool) {
        self.records.retain(keep);
    }
}

impl<'a> IntoIterator for &'a HistoryStore {
    type Item = &'a TransformRecord;
    type IntoIter = std::slice::Iter<'a, TransformRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<TransformRecord> for HistoryStore {
    fn from_iter<I: IntoIterator<Item = TransformRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
