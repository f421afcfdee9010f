//! Transform history for keyed samples.
//!
//! Every invertible transform that touches a key appends a [`TransformRecord`]
//! to that key's [`HistoryStore`], which travels inside the [`Sample`] under a
//! reserved key (`"<key>_transforms"`). The records carry what is needed to
//! undo each application later.
//!
//! This crate provides:
//!
//! - **Recording**: the [`Invertible`] capability with `push_record` / `pop_record`.
//! - **Pipelines**: [`Compose`] applies transforms in order and inverts them in
//!   reverse.
//! - **Pruning**: [`remove_applied_transforms`] drops selected records so a later
//!   inversion only undoes part of what was applied.
//!
//! # Selecting what to prune
//!
//! | Selector | Sees | Answers |
//! |----------|------|---------|
//! | `list_selection_fn` | declared invertible transforms for a key | which to leave alone |
//! | `per_element_selection_fn` | one recorded application | keep it? |
//!
//! A record is removed when the list selector dropped its transform and the
//! element selector does not keep it.
//!
//! # Example
//!
//! ```ignore
//! use unshape_history::{Compose, TransformRecord};
//!
//! let applied = pipeline.apply(sample)?;
//!
//! // Forget every record but the contrast adjustment; a later inverse only undoes it.
//! let keep_contrast = |r: &TransformRecord| r.class_name == "RandAdjustContrast";
//! let pruned = pipeline.remove_applied_transforms(
//!     &applied,
//!     &["image", "label"],
//!     None,
//!     Some(&keep_contrast),
//! )?;
//! ```

mod array;
mod compose;
mod error;
mod record;
mod removal;
mod rng;
mod sample;
mod store;
mod transform;

pub use array::Array;
pub use compose::{Compose, ComposeConfig};
pub use error::{ArrayError, HistoryError, TransformError};
pub use record::{ExtraInfo, Param, ParamType, TransformId, TransformRecord};
pub use removal::{ListSelectionFn, PerElementSelectionFn, remove_applied_transforms};
pub use rng::SimpleRng;
pub use sample::{KEY_SUFFIX, Sample, Value, history_key};
pub use store::HistoryStore;
pub use transform::{Invertible, MapKeys, Transform, TransformInfo};
