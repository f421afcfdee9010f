//! Transform records and the parameters they carry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one transform instance.
///
/// Two transforms of the same type get different ids, so their records can be
/// told apart in a key's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TransformId(u64);

impl TransformId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A parameter stored in a record's `extra_info`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Param {
    /// 32-bit float
    F32(f32),
    /// List of axis indices
    Axes(Vec<usize>),
    /// Named sub-parameters, e.g. one entry per key
    Map(ExtraInfo),
}

/// Type tag for [`Param`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamType {
    F32,
    Axes,
    Map,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::F32 => "f32",
            ParamType::Axes => "axes",
            ParamType::Map => "map",
        };
        f.write_str(name)
    }
}

impl Param {
    /// Returns the type of this parameter.
    pub fn param_type(&self) -> ParamType {
        match self {
            Param::F32(_) => ParamType::F32,
            Param::Axes(_) => ParamType::Axes,
            Param::Map(_) => ParamType::Map,
        }
    }

    fn mismatch(&self, name: &str, expected: ParamType) -> HistoryError {
        HistoryError::ParamType {
            name: name.to_string(),
            expected,
            got: self.param_type(),
        }
    }

    /// Attempts to extract an f32 value.
    pub fn as_f32(&self, name: &str) -> Result<f32, HistoryError> {
        match self {
            Param::F32(v) => Ok(*v),
            other => Err(other.mismatch(name, ParamType::F32)),
        }
    }

    /// Attempts to extract a list of axes.
    pub fn as_axes(&self, name: &str) -> Result<&[usize], HistoryError> {
        match self {
            Param::Axes(v) => Ok(v),
            other => Err(other.mismatch(name, ParamType::Axes)),
        }
    }

    /// Attempts to extract a map of sub-parameters.
    pub fn as_map(&self, name: &str) -> Result<&ExtraInfo, HistoryError> {
        match self {
            Param::Map(v) => Ok(v),
            other => Err(other.mismatch(name, ParamType::Map)),
        }
    }
}

impl From<f32> for Param {
    fn from(v: f32) -> Self {
        Param::F32(v)
    }
}

impl From<Vec<usize>> for Param {
    fn from(v: Vec<usize>) -> Self {
        Param::Axes(v)
    }
}

impl From<ExtraInfo> for Param {
    fn from(v: ExtraInfo) -> Self {
        Param::Map(v)
    }
}

/// Parameters a transform needs to invert one application.
pub type ExtraInfo = BTreeMap<String, Param>;

/// One application of one transform to one key.
///
/// Records are created by [`Invertible::push_record`](crate::Invertible::push_record)
/// and never change once they are in a [`HistoryStore`](crate::HistoryStore).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransformRecord {
    /// Name of the transform type that produced this record.
    pub class_name: String,
    /// Instance that produced this record.
    pub id: TransformId,
    /// Key this record applies to.
    pub key: String,
    /// Parameters needed to invert the application.
    pub extra_info: ExtraInfo,
    /// Shape of the payload before the transform ran.
    pub orig_size: Option<Vec<usize>>,
    /// Whether a randomized transform actually acted on this application.
    pub do_transform: bool,
}

impl TransformRecord {
    /// Creates a record with empty `extra_info` and `do_transform` set.
    pub fn new(class_name: impl Into<String>, id: TransformId, key: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            id,
            key: key.into(),
            extra_info: ExtraInfo::new(),
            orig_size: None,
            do_transform: true,
        }
    }

    /// Sets the inversion parameters.
    pub fn with_extra_info(mut self, extra_info: ExtraInfo) -> Self {
        self.extra_info = extra_info;
        self
    }

    /// Sets the original payload shape.
    pub fn with_orig_size(mut self, orig_size: Vec<usize>) -> Self {
        self.orig_size = Some(orig_size);
        self
    }

    /// Sets whether the transform acted.
    pub fn with_do_transform(mut self, do_transform: bool) -> Self {
        self.do_transform = do_transform;
        self
    }

    /// Looks up an `extra_info` parameter.
    pub fn param(&self, name: &str) -> Result<&Param, HistoryError> {
        self.extra_info
            .get(name)
            .ok_or_else(|| self.missing(name.to_string()))
    }

    /// Looks up this record's own entry in a per-key [`Param::Map`].
    ///
    /// Transforms that touch several keys share one `extra_info` across them
    /// and store per-key values as `name -> { key -> value }`.
    pub fn key_param(&self, name: &str) -> Result<&Param, HistoryError> {
        self.param(name)?
            .as_map(name)?
            .get(&self.key)
            .ok_or_else(|| self.missing(format!("{name}.{}", self.key)))
    }

    fn missing(&self, name: String) -> HistoryError {
        HistoryError::MissingParam {
            transform: self.class_name.clone(),
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = TransformId::next();
        let b = TransformId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_param_accessors() {
        let record = TransformRecord::new("Flip", TransformId::next(), "image").with_extra_info(
            ExtraInfo::from([
                ("axes".to_string(), Param::Axes(vec![1])),
                ("gamma".to_string(), Param::F32(0.5)),
            ]),
        );

        assert_eq!(record.param("axes").unwrap().as_axes("axes").unwrap(), &[1]);
        assert_eq!(record.param("gamma").unwrap().as_f32("gamma").unwrap(), 0.5);
        assert!(record.do_transform);
    }

    #[test]
    fn test_param_type_mismatch() {
        let err = Param::Axes(vec![0]).as_f32("gamma").unwrap_err();
        assert_eq!(
            err,
            HistoryError::ParamType {
                name: "gamma".into(),
                expected: ParamType::F32,
                got: ParamType::Axes,
            }
        );
    }

    #[test]
    fn test_key_param() {
        let min = ExtraInfo::from([
            ("image".to_string(), Param::F32(0.0)),
            ("label".to_string(), Param::F32(2.0)),
        ]);
        let extra_info = ExtraInfo::from([("min".to_string(), Param::Map(min))]);
        let id = TransformId::next();
        let label =
            TransformRecord::new("Contrast", id, "label").with_extra_info(extra_info.clone());
        let mask = TransformRecord::new("Contrast", id, "mask").with_extra_info(extra_info);

        assert_eq!(label.key_param("min").unwrap().as_f32("min").unwrap(), 2.0);
        assert_eq!(
            mask.key_param("min"),
            Err(HistoryError::MissingParam {
                transform: "Contrast".into(),
                name: "min.mask".into(),
            })
        );
    }

    #[test]
    fn test_missing_param() {
        let record = TransformRecord::new("Flip", TransformId::next(), "image");
        assert!(matches!(
            record.param("axis"),
            Err(HistoryError::MissingParam { .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_wire_shape() {
        let record = TransformRecord::new("Flip", TransformId::next(), "label")
            .with_extra_info(ExtraInfo::from([(
                "spatial_axes".to_string(),
                Param::Axes(vec![0]),
            )]));
        let json = serde_json::to_value(&record).unwrap();

        for field in ["class_name", "id", "key", "extra_info"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        let back: TransformRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
