//! Transform traits and the invertible capability.

use tracing::debug;

use crate::compose::Compose;
use crate::error::{HistoryError, TransformError};
use crate::record::{ExtraInfo, TransformId, TransformRecord};
use crate::sample::Sample;

/// A step that maps one sample to the next.
pub trait Transform: Send {
    /// Name of the transform type. Recorded as `class_name`.
    fn name(&self) -> &'static str;

    /// Applies the transform.
    fn apply(&mut self, sample: Sample) -> Result<Sample, TransformError>;

    /// Keys this transform reads and writes.
    fn keys(&self) -> &[String] {
        &[]
    }

    /// Returns the invertible capability, if this transform has it.
    fn as_invertible(&self) -> Option<&dyn Invertible> {
        None
    }

    /// Returns the pipeline, if this transform is a nested [`Compose`].
    fn as_compose(&self) -> Option<&Compose> {
        None
    }

    /// Reseeds any random state.
    fn set_random_state(&mut self, _seed: u64) {}
}

/// The capability of recording history and undoing it.
///
/// Implementors push one record per touched key from [`Transform::apply`] and
/// pop those records again in [`inverse`](Invertible::inverse).
pub trait Invertible: Transform {
    /// Identity of this instance.
    fn transform_id(&self) -> TransformId;

    /// Undoes the most recent application of this transform.
    fn inverse(&self, sample: Sample) -> Result<Sample, TransformError>;

    /// Creates an empty record for `key` stamped with this instance's identity.
    fn record(&self, key: &str) -> TransformRecord {
        TransformRecord::new(self.name(), self.transform_id(), key)
    }

    /// Appends a record for `key` carrying `extra_info`.
    fn push_record(
        &self,
        sample: &mut Sample,
        key: &str,
        extra_info: ExtraInfo,
    ) -> Result<(), HistoryError> {
        self.push_full_record(sample, self.record(key).with_extra_info(extra_info))
    }

    /// Appends a fully built record to the history of `record.key`.
    fn push_full_record(
        &self,
        sample: &mut Sample,
        record: TransformRecord,
    ) -> Result<(), HistoryError> {
        let history = sample.history_mut(&record.key)?;
        debug!(
            transform = self.name(),
            id = %record.id,
            key = %record.key,
            depth = history.len() + 1,
            "push transform record"
        );
        history.push(record);
        Ok(())
    }

    /// Returns the most recent record for `key` if it belongs to this instance.
    fn last_record<'a>(
        &self,
        sample: &'a Sample,
        key: &str,
    ) -> Result<&'a TransformRecord, HistoryError> {
        let last = sample.history(key).and_then(|h| h.last());
        match last {
            Some(record) if self.owns(record) => Ok(record),
            other => Err(no_record(self, key, other)),
        }
    }

    /// Removes and returns the most recent record for `key`.
    ///
    /// Fails with [`HistoryError::NoRecord`] when the history is empty or its
    /// last record was produced by a different transform.
    fn pop_record(&self, sample: &mut Sample, key: &str) -> Result<TransformRecord, HistoryError> {
        self.last_record(sample, key)?;
        let record = sample
            .existing_history_mut(key)
            .and_then(|h| h.pop())
            .ok_or_else(|| no_record(self, key, None))?;
        debug!(
            transform = self.name(),
            id = %record.id,
            key,
            depth = sample.history_len(key),
            "pop transform record"
        );
        Ok(record)
    }

    /// Returns true if `record` was produced by this instance.
    fn owns(&self, record: &TransformRecord) -> bool {
        record.id == self.transform_id() && record.class_name == self.name()
    }
}

fn no_record<T: Invertible + ?Sized>(
    transform: &T,
    key: &str,
    found: Option<&TransformRecord>,
) -> HistoryError {
    HistoryError::NoRecord {
        key: key.to_string(),
        transform: format!("{} {}", transform.name(), transform.transform_id()),
        found: found.map_or_else(
            || "none".to_string(),
            |r| format!("{} {}", r.class_name, r.id),
        ),
    }
}

/// Keys a mapping transform operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapKeys {
    keys: Vec<String>,
    allow_missing: bool,
}

impl MapKeys {
    /// Creates a key list; missing keys are an error.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            allow_missing: false,
        }
    }

    /// Skips keys absent from the sample instead of failing.
    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    /// Returns the configured keys.
    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    /// Returns the configured keys present in `sample`, in order.
    pub fn present(&self, sample: &Sample) -> Result<Vec<String>, TransformError> {
        let mut present = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            if sample.contains_key(key) {
                present.push(key.clone());
            } else if !self.allow_missing {
                return Err(TransformError::MissingKey { key: key.clone() });
            }
        }
        Ok(present)
    }
}

impl From<&str> for MapKeys {
    fn from(key: &str) -> Self {
        MapKeys::new([key])
    }
}

impl<const N: usize> From<[&str; N]> for MapKeys {
    fn from(keys: [&str; N]) -> Self {
        MapKeys::new(keys)
    }
}

impl From<Vec<String>> for MapKeys {
    fn from(keys: Vec<String>) -> Self {
        MapKeys::new(keys)
    }
}

/// Declared identity of an invertible pipeline member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformInfo {
    /// Instance identity, matches [`TransformRecord::id`].
    pub id: TransformId,
    /// Transform type, matches [`TransformRecord::class_name`].
    pub class_name: &'static str,
    /// Keys the transform is configured for.
    pub keys: Vec<String>,
}

impl TransformInfo {
    /// Describes an invertible transform.
    pub fn of(transform: &dyn Invertible) -> Self {
        Self {
            id: transform.transform_id(),
            class_name: transform.name(),
            keys: transform.keys().to_vec(),
        }
    }

    /// Returns true if the transform is configured for `key`.
    pub fn touches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}
