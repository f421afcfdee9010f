//! Sequential transform pipelines.

use tracing::{debug, info};

use crate::error::{HistoryError, TransformError};
use crate::removal::{ListSelectionFn, PerElementSelectionFn, remove_applied_transforms};
use crate::rng::SimpleRng;
use crate::sample::Sample;
use crate::transform::{Transform, TransformInfo};

/// Configuration for a [`Compose`] pipeline.
#[derive(Debug, Clone, Default)]
pub struct ComposeConfig {
    /// Seed handed to [`Compose::set_random_state`] at construction.
    pub seed: Option<u64>,
    /// Log every applied transform at info level.
    pub log_stats: bool,
}

impl ComposeConfig {
    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables per-transform logging.
    pub fn with_log_stats(mut self, log_stats: bool) -> Self {
        self.log_stats = log_stats;
        self
    }
}

/// An ordered list of transforms applied one after another.
///
/// Invertible members record their applications in the sample's history;
/// [`inverse`](Compose::inverse) undoes them in reverse order and
/// [`remove_applied_transforms`](Compose::remove_applied_transforms) prunes
/// records before a partial inversion.
///
/// # Example
///
/// ```ignore
/// let mut pipeline = Compose::new()
///     .with(LoadImage::new(["image", "label"]))
///     .with(AddChannel::new(["image", "label"]))
///     .with(RandFlip::new(["image", "label"]).with_prob(1.0));
///
/// let applied = pipeline.apply(sample)?;
/// let restored = pipeline.inverse(applied)?;
/// ```
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
    config: ComposeConfig,
}

impl std::fmt::Debug for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.transforms.iter().map(|t| t.name()).collect();
        f.debug_struct("Compose")
            .field("transforms", &names)
            .field("config", &self.config)
            .finish()
    }
}

impl Compose {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pipeline from an ordered list of transforms.
    pub fn from_transforms(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self::with_config(transforms, ComposeConfig::default())
    }

    /// Creates a pipeline with explicit configuration.
    pub fn with_config(transforms: Vec<Box<dyn Transform>>, config: ComposeConfig) -> Self {
        let mut compose = Self { transforms, config };
        if let Some(seed) = compose.config.seed {
            compose.set_random_state(seed);
        }
        compose
    }

    /// Adds a transform to the end of the pipeline.
    pub fn push<T: Transform + 'static>(&mut self, transform: T) {
        self.transforms.push(Box::new(transform));
    }

    /// Adds a transform and returns self (for builder pattern).
    pub fn with<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.push(transform);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Returns the direct members in declaration order.
    pub fn transforms(&self) -> &[Box<dyn Transform>] {
        &self.transforms
    }

    /// Returns the leaf transforms in order, with nested pipelines expanded.
    pub fn flatten(&self) -> Vec<&dyn Transform> {
        let mut leaves = Vec::new();
        for transform in &self.transforms {
            match transform.as_compose() {
                Some(nested) => leaves.extend(nested.flatten()),
                None => leaves.push(transform.as_ref()),
            }
        }
        leaves
    }

    /// Returns the number of leaf transforms.
    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    /// Returns true if the pipeline has no leaf transforms.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Describes the invertible leaf transforms in declaration order.
    pub fn transform_infos(&self) -> Vec<TransformInfo> {
        self.flatten()
            .into_iter()
            .filter_map(|t| t.as_invertible())
            .map(TransformInfo::of)
            .collect()
    }

    /// Applies every transform in order.
    pub fn apply(&mut self, mut sample: Sample) -> Result<Sample, TransformError> {
        let log_stats = self.config.log_stats;
        for transform in &mut self.transforms {
            sample = transform.apply(sample)?;
            if log_stats {
                info!(transform = transform.name(), "applied transform");
            }
        }
        Ok(sample)
    }

    /// Inverts every invertible member, most recently applied first.
    ///
    /// Non-invertible members are skipped. Fails with
    /// [`HistoryError::NoRecord`] if a member's record is missing, e.g. after
    /// pruning removed it.
    pub fn inverse(&self, mut sample: Sample) -> Result<Sample, TransformError> {
        for transform in self.transforms.iter().rev() {
            if let Some(invertible) = transform.as_invertible() {
                debug!(transform = transform.name(), "inverting transform");
                sample = invertible.inverse(sample)?;
            } else if let Some(nested) = transform.as_compose() {
                sample = nested.inverse(sample)?;
            }
        }
        Ok(sample)
    }

    /// Reseeds every member from one seed.
    pub fn set_random_state(&mut self, seed: u64) {
        let mut rng = SimpleRng::new(seed);
        for transform in &mut self.transforms {
            transform.set_random_state(rng.next_u64());
        }
    }

    /// Returns a copy of `sample` with selected history records removed.
    ///
    /// See [`remove_applied_transforms`] for the selection rules. At least one
    /// of the two selection functions must be given.
    pub fn remove_applied_transforms(
        &self,
        sample: &Sample,
        keys: &[&str],
        list_selection_fn: Option<&ListSelectionFn>,
        per_element_selection_fn: Option<&PerElementSelectionFn>,
    ) -> Result<Sample, HistoryError> {
        remove_applied_transforms(
            &self.transform_infos(),
            sample,
            keys,
            list_selection_fn,
            per_element_selection_fn,
        )
    }
}

impl Transform for Compose {
    fn name(&self) -> &'static str {
        "Compose"
    }

    fn apply(&mut self, sample: Sample) -> Result<Sample, TransformError> {
        Compose::apply(self, sample)
    }

    fn as_compose(&self) -> Option<&Compose> {
        Some(self)
    }

    fn set_random_state(&mut self, seed: u64) {
        Compose::set_random_state(self, seed);
    }
}
