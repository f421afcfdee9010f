//! Selective removal of recorded transforms.
//!
//! Pruning runs two independent filters and removes a record only when both
//! agree:
//!
//! 1. The list-scoping function receives the pipeline's declared invertible
//!    transforms and returns the ones to leave alone. Whatever it drops is
//!    eligible for removal.
//! 2. The per-element function looks at each recorded application and returns
//!    `true` for records that must be kept.
//!
//! The declared list handed to the list-scoping function is derived per key: it
//! holds the invertible transforms configured for that key, in declaration
//! order. `|l| l[1..].to_vec()` therefore makes the earliest transform that
//! touched the key eligible, and nothing else.

use std::collections::HashSet;

use tracing::debug;

use crate::error::HistoryError;
use crate::record::{TransformId, TransformRecord};
use crate::sample::Sample;
use crate::transform::TransformInfo;

/// Returns the sub-sequence of a key's declared transforms to leave alone.
pub type ListSelectionFn = dyn Fn(&[TransformInfo]) -> Vec<TransformInfo>;

/// Returns `true` for records that must be kept.
pub type PerElementSelectionFn = dyn Fn(&TransformRecord) -> bool;

/// Returns a copy of `sample` with matching history records removed.
///
/// For every key in `keys`, a record is removed when its transform was dropped
/// by `list_selection_fn` (every transform counts as dropped when absent) and
/// `per_element_selection_fn` returns `false` for it (or is absent). Surviving
/// records keep their order. Keys without history are skipped.
///
/// `sample` itself is left untouched.
///
/// # Errors
///
/// [`HistoryError::MissingSelection`] if both functions are `None`.
pub fn remove_applied_transforms(
    declared: &[TransformInfo],
    sample: &Sample,
    keys: &[&str],
    list_selection_fn: Option<&ListSelectionFn>,
    per_element_selection_fn: Option<&PerElementSelectionFn>,
) -> Result<Sample, HistoryError> {
    if list_selection_fn.is_none() && per_element_selection_fn.is_none() {
        return Err(HistoryError::MissingSelection);
    }

    let mut pruned = sample.clone();
    for &key in keys {
        let eligible = list_selection_fn.map(|select| eligible_ids(declared, key, select));
        let Some(history) = pruned.existing_history_mut(key) else {
            continue;
        };

        let before = history.len();
        history.retain(|record| {
            let in_scope = eligible
                .as_ref()
                .is_none_or(|ids| ids.contains(&record.id));
            let exempt = per_element_selection_fn.is_some_and(|keep| keep(record));
            !in_scope || exempt
        });

        debug!(
            key,
            removed = before - history.len(),
            remaining = history.len(),
            "pruned transform history"
        );
    }

    Ok(pruned)
}

/// Ids of the transforms declared for `key` that the list-scoping function dropped.
fn eligible_ids(
    declared: &[TransformInfo],
    key: &str,
    select: &ListSelectionFn,
) -> HashSet<TransformId> {
    let scoped: Vec<TransformInfo> = declared
        .iter()
        .filter(|info| info.touches(key))
        .cloned()
        .collect();
    let retained: HashSet<TransformId> =
        select(&scoped).into_iter().map(|info| info.id).collect();
    scoped
        .into_iter()
        .map(|info| info.id)
        .filter(|id| !retained.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;

    struct Fixture {
        declared: Vec<TransformInfo>,
        sample: Sample,
    }

    fn info(class_name: &'static str, keys: &[&str]) -> TransformInfo {
        TransformInfo {
            id: TransformId::next(),
            class_name,
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Records one application of every declared transform, in order.
    fn fixture(declared: Vec<TransformInfo>) -> Fixture {
        let mut sample = Sample::new()
            .with("image", Array::zeros(vec![1, 2, 2]))
            .with("label", Array::zeros(vec![1, 2, 2]));
        for info in &declared {
            for key in &info.keys {
                let record = TransformRecord::new(info.class_name, info.id, key.as_str());
                sample.history_mut(key).unwrap().push(record);
            }
        }
        Fixture { declared, sample }
    }

    fn flip_contrast_flip() -> Fixture {
        fixture(vec![
            info("RandAxisFlip", &["image"]),
            info("RandAdjustContrast", &["label"]),
            info("RandFlip", &["image", "label"]),
        ])
    }

    fn names(sample: &Sample, key: &str) -> Vec<String> {
        sample
            .history(key)
            .map(|h| h.iter().map(|r| r.class_name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_requires_a_selection() {
        let f = flip_contrast_flip();
        let err = remove_applied_transforms(&f.declared, &f.sample, &["image", "label"], None, None)
            .unwrap_err();
        assert_eq!(err, HistoryError::MissingSelection);
    }

    #[test]
    fn test_per_element_only() {
        let f = flip_contrast_flip();
        let keep = |r: &TransformRecord| r.class_name != "RandAdjustContrast";
        let pruned = remove_applied_transforms(
            &f.declared,
            &f.sample,
            &["image", "label"],
            None,
            Some(&keep),
        )
        .unwrap();

        assert_eq!(names(&pruned, "image"), ["RandAxisFlip", "RandFlip"]);
        assert_eq!(names(&pruned, "label"), ["RandFlip"]);
    }

    #[test]
    fn test_list_selection_is_scoped_per_key() {
        let f = flip_contrast_flip();
        let drop_first = |l: &[TransformInfo]| l[1..].to_vec();
        let pruned = remove_applied_transforms(
            &f.declared,
            &f.sample,
            &["image", "label"],
            Some(&drop_first),
            None,
        )
        .unwrap();

        assert_eq!(names(&pruned, "image"), ["RandFlip"]);
        assert_eq!(names(&pruned, "label"), ["RandFlip"]);
    }

    #[test]
    fn test_list_selection_keeping_everything_removes_nothing() {
        let f = flip_contrast_flip();
        let keep_all = |l: &[TransformInfo]| l.to_vec();
        let pruned = remove_applied_transforms(
            &f.declared,
            &f.sample,
            &["image", "label"],
            Some(&keep_all),
            None,
        )
        .unwrap();

        assert_eq!(pruned, f.sample);
    }

    #[test]
    fn test_both_filters_must_agree() {
        let f = flip_contrast_flip();
        let drop_first = |l: &[TransformInfo]| l[1..].to_vec();
        let keep_axis_flip = |r: &TransformRecord| r.class_name == "RandAxisFlip";
        let pruned = remove_applied_transforms(
            &f.declared,
            &f.sample,
            &["image", "label"],
            Some(&drop_first),
            Some(&keep_axis_flip),
        )
        .unwrap();

        // image: only RandAxisFlip is eligible and it is exempt
        assert_eq!(names(&pruned, "image"), ["RandAxisFlip", "RandFlip"]);
        // label: only RandAdjustContrast is eligible and it is not exempt
        assert_eq!(names(&pruned, "label"), ["RandFlip"]);
    }

    #[test]
    fn test_same_type_distinguished_by_instance() {
        let f = fixture(vec![
            info("RandAxisFlip", &["image"]),
            info("RandAxisFlip", &["image", "label"]),
        ]);
        let drop_first = |l: &[TransformInfo]| l[1..].to_vec();
        let pruned = remove_applied_transforms(
            &f.declared,
            &f.sample,
            &["image", "label"],
            Some(&drop_first),
            None,
        )
        .unwrap();

        assert_eq!(pruned.history_len("image"), 1);
        assert_eq!(
            pruned.history("image").unwrap().last().unwrap().id,
            f.declared[1].id
        );
        // label only saw the second flip, which is first in its scoped list
        assert_eq!(pruned.history_len("label"), 0);
    }

    #[test]
    fn test_input_is_untouched_and_other_keys_unaffected() {
        let f = flip_contrast_flip();
        let keep = |r: &TransformRecord| r.class_name != "RandFlip";
        let pruned =
            remove_applied_transforms(&f.declared, &f.sample, &["image"], None, Some(&keep))
                .unwrap();

        assert_eq!(f.sample.history_len("image"), 2);
        assert_eq!(pruned.history_len("image"), 1);
        assert_eq!(pruned.history_len("label"), 2);
    }

    #[test]
    fn test_key_without_history_is_noop() {
        let f = flip_contrast_flip();
        let keep = |_: &TransformRecord| false;
        let pruned =
            remove_applied_transforms(&f.declared, &f.sample, &["mask"], None, Some(&keep))
                .unwrap();
        assert_eq!(pruned, f.sample);
    }
}
