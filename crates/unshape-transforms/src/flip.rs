use unshape_history::{
    Array, ArrayError, ExtraInfo, Invertible, MapKeys, Param, Sample, SimpleRng, Transform,
    TransformError, TransformId,
};

const SPATIAL_AXES: &str = "spatial_axes";

/// Flips spatial axes, where spatial axis `i` is array axis `i + 1`.
fn flip_spatial(array: &Array, axes: &[usize]) -> Result<Array, ArrayError> {
    let mapped: Vec<usize> = axes.iter().map(|a| a + 1).collect();
    array.flip_axes(&mapped)
}

/// Number of spatial axes of the first key's array (everything after the channel axis).
///
/// Every key must hold an array with a channel axis and at least one spatial axis.
fn spatial_ndim(sample: &Sample, keys: &[String]) -> Result<Option<usize>, TransformError> {
    let mut first = None;
    for key in keys {
        let ndim = sample.array(key)?.ndim();
        if ndim < 2 {
            return Err(ArrayError::AxisOutOfBounds { axis: 1, ndim }.into());
        }
        first.get_or_insert(ndim - 1);
    }
    Ok(first)
}

/// Fails unless every spatial axis in `axes` exists on every key.
fn check_axes(sample: &Sample, keys: &[String], axes: &[usize]) -> Result<(), TransformError> {
    for key in keys {
        let ndim = sample.array(key)?.ndim();
        if let Some(&axis) = axes.iter().find(|&&axis| axis + 1 >= ndim) {
            return Err(ArrayError::AxisOutOfBounds {
                axis: axis + 1,
                ndim,
            }
            .into());
        }
    }
    Ok(())
}

/// Undoes a recorded flip on every key.
fn invert_flip<T: Invertible + ?Sized>(
    transform: &T,
    keys: &MapKeys,
    mut sample: Sample,
) -> Result<Sample, TransformError> {
    for key in keys.present(&sample)? {
        let record = transform.pop_record(&mut sample, &key)?;
        if !record.do_transform {
            continue;
        }
        let axes = record.param(SPATIAL_AXES)?.as_axes(SPATIAL_AXES)?;
        let restored = flip_spatial(sample.array(&key)?, axes)?;
        sample.set_array(&key, restored);
    }
    Ok(sample)
}

/// Applies one flip decision to every key and records it.
///
/// All keys are checked before any is touched, so a failure leaves no key
/// flipped or recorded.
fn apply_flip<T: Invertible + ?Sized>(
    transform: &T,
    keys: &[String],
    mut sample: Sample,
    do_transform: bool,
    axes: Vec<usize>,
) -> Result<Sample, TransformError> {
    check_axes(&sample, keys, &axes)?;
    let extra_info = ExtraInfo::from([(SPATIAL_AXES.to_string(), Param::Axes(axes.clone()))]);
    for key in keys {
        let array = sample.array(key)?;
        let orig_size = array.shape().get(1..).unwrap_or_default().to_vec();
        if do_transform {
            let flipped = flip_spatial(array, &axes)?;
            sample.set_array(key, flipped);
        }
        let record = transform
            .record(key)
            .with_extra_info(extra_info.clone())
            .with_orig_size(orig_size)
            .with_do_transform(do_transform);
        transform.push_full_record(&mut sample, record)?;
    }
    Ok(sample)
}

/// Randomly flips one spatial axis.
///
/// With probability `prob`, picks a spatial axis uniformly and flips it on
/// every key. The same decision applies to all keys of one call.
#[derive(Debug, Clone)]
pub struct RandAxisFlip {
    id: TransformId,
    keys: MapKeys,
    prob: f32,
    rng: SimpleRng,
}

impl RandAxisFlip {
    /// Creates the transform with `prob = 0.1`.
    pub fn new(keys: impl Into<MapKeys>) -> Self {
        Self {
            id: TransformId::next(),
            keys: keys.into(),
            prob: 0.1,
            rng: SimpleRng::default(),
        }
    }

    /// Sets the probability of flipping.
    pub fn with_prob(mut self, prob: f32) -> Self {
        self.prob = prob;
        self
    }

    /// Seeds the random state.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SimpleRng::new(seed);
        self
    }
}

impl Transform for RandAxisFlip {
    fn name(&self) -> &'static str {
        "RandAxisFlip"
    }

    fn apply(&mut self, sample: Sample) -> Result<Sample, TransformError> {
        let keys = self.keys.present(&sample)?;
        let do_transform = self.rng.next_f32() < self.prob;
        let Some(spatial) = spatial_ndim(&sample, &keys)? else {
            return Ok(sample);
        };
        let axis = self.rng.below(spatial);
        apply_flip(self, &keys, sample, do_transform, vec![axis])
    }

    fn keys(&self) -> &[String] {
        self.keys.as_slice()
    }

    fn as_invertible(&self) -> Option<&dyn Invertible> {
        Some(self)
    }

    fn set_random_state(&mut self, seed: u64) {
        self.rng = SimpleRng::new(seed);
    }
}

impl Invertible for RandAxisFlip {
    fn transform_id(&self) -> TransformId {
        self.id
    }

    fn inverse(&self, sample: Sample) -> Result<Sample, TransformError> {
        invert_flip(self, &self.keys, sample)
    }
}

/// Randomly flips a fixed set of spatial axes.
///
/// With probability `prob`, flips `spatial_axes` (all spatial axes when unset)
/// on every key.
#[derive(Debug, Clone)]
pub struct RandFlip {
    id: TransformId,
    keys: MapKeys,
    prob: f32,
    spatial_axes: Option<Vec<usize>>,
    rng: SimpleRng,
}

impl RandFlip {
    /// Creates the transform with `prob = 0.1`, flipping all spatial axes.
    pub fn new(keys: impl Into<MapKeys>) -> Self {
        Self {
            id: TransformId::next(),
            keys: keys.into(),
            prob: 0.1,
            spatial_axes: None,
            rng: SimpleRng::default(),
        }
    }

    /// Sets the probability of flipping.
    pub fn with_prob(mut self, prob: f32) -> Self {
        self.prob = prob;
        self
    }

    /// Restricts flipping to the given spatial axes.
    pub fn with_spatial_axes(mut self, axes: Vec<usize>) -> Self {
        self.spatial_axes = Some(axes);
        self
    }

    /// Seeds the random state.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SimpleRng::new(seed);
        self
    }
}

impl Transform for RandFlip {
    fn name(&self) -> &'static str {
        "RandFlip"
    }

    fn apply(&mut self, sample: Sample) -> Result<Sample, TransformError> {
        let keys = self.keys.present(&sample)?;
        let do_transform = self.rng.next_f32() < self.prob;
        let Some(spatial) = spatial_ndim(&sample, &keys)? else {
            return Ok(sample);
        };
        let axes = self
            .spatial_axes
            .clone()
            .unwrap_or_else(|| (0..spatial).collect());
        apply_flip(self, &keys, sample, do_transform, axes)
    }

    fn keys(&self) -> &[String] {
        self.keys.as_slice()
    }

    fn as_invertible(&self) -> Option<&dyn Invertible> {
        Some(self)
    }

    fn set_random_state(&mut self, seed: u64) {
        self.rng = SimpleRng::new(seed);
    }
}

impl Invertible for RandFlip {
    fn transform_id(&self) -> TransformId {
        self.id
    }

    fn inverse(&self, sample: Sample) -> Result<Sample, TransformError> {
        invert_flip(self, &self.keys, sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sample {
        Sample::new()
            .with("image", Array::from_fn(vec![1, 2, 3], |i| i as f32))
            .with("label", Array::from_fn(vec![1, 2, 3], |i| (i * 10) as f32))
    }

    #[test]
    fn test_rand_flip_always() {
        let mut flip = RandFlip::new(["image", "label"])
            .with_prob(1.0)
            .with_spatial_axes(vec![1]);
        let out = flip.apply(sample()).unwrap();

        assert_eq!(
            out.array("image").unwrap().data(),
            &[2.0, 1.0, 0.0, 5.0, 4.0, 3.0]
        );
        let image = out.history("image").unwrap().last().unwrap();
        let label = out.history("label").unwrap().last().unwrap();
        assert_eq!(image.id, label.id);
        assert_eq!(image.extra_info, label.extra_info);
        assert_eq!(image.orig_size, Some(vec![2, 3]));
    }

    #[test]
    fn test_rand_flip_never_still_records() {
        let mut flip = RandFlip::new("image").with_prob(0.0);
        let out = flip.apply(sample()).unwrap();

        assert_eq!(out.array("image"), sample().array("image"));
        assert_eq!(out.history_len("image"), 1);
        assert!(!out.history("image").unwrap().last().unwrap().do_transform);
    }

    #[test]
    fn test_rand_axis_flip_round_trip() {
        let mut flip = RandAxisFlip::new(["image", "label"])
            .with_prob(1.0)
            .with_seed(11);
        let out = flip.apply(sample()).unwrap();
        assert_ne!(out.array("image"), sample().array("image"));

        let restored = flip.inverse(out).unwrap();
        assert_eq!(restored.array("image"), sample().array("image"));
        assert_eq!(restored.array("label"), sample().array("label"));
        assert_eq!(restored.history_len("image"), 0);
    }

    #[test]
    fn test_flip_requires_channel_axis() {
        let mut flip = RandAxisFlip::new("image").with_prob(1.0);
        let sample = Sample::new().with("image", Array::zeros(vec![4]));
        assert!(matches!(
            flip.apply(sample),
            Err(TransformError::Array(ArrayError::AxisOutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_flip_checks_every_key() {
        let sample = Sample::new()
            .with("image", Array::zeros(vec![1, 2, 2]))
            .with("scalar", Array::zeros(vec![]));
        for prob in [0.0, 1.0] {
            let mut flip = RandFlip::new(["image", "scalar"]).with_prob(prob);
            assert!(matches!(
                flip.apply(sample.clone()),
                Err(TransformError::Array(ArrayError::AxisOutOfBounds { axis: 1, ndim: 0 }))
            ));
        }
    }

    #[test]
    fn test_flip_axes_must_exist_on_every_key() {
        let sample = Sample::new()
            .with("image", Array::zeros(vec![1, 2, 2]))
            .with("profile", Array::zeros(vec![1, 4]));
        let mut flip = RandFlip::new(["image", "profile"]).with_prob(1.0);
        assert!(matches!(
            flip.apply(sample),
            Err(TransformError::Array(ArrayError::AxisOutOfBounds { axis: 2, ndim: 2 }))
        ));

        // a single spatial axis present on both keys is fine
        let sample = Sample::new()
            .with("image", Array::zeros(vec![1, 2, 2]))
            .with("profile", Array::zeros(vec![1, 4]));
        let mut flip = RandFlip::new(["image", "profile"])
            .with_prob(1.0)
            .with_spatial_axes(vec![0]);
        let out = flip.apply(sample).unwrap();
        assert_eq!(out.history_len("image"), 1);
        assert_eq!(out.history_len("profile"), 1);
    }

    #[test]
    fn test_inverse_other_instance_fails() {
        let mut first = RandFlip::new("image").with_prob(1.0);
        let second = RandFlip::new("image").with_prob(1.0);
        let out = first.apply(sample()).unwrap();

        let err = second.inverse(out).unwrap_err();
        assert!(err.is_no_record());
    }
}
