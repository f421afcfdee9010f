use unshape_history::{
    Array, ExtraInfo, Invertible, MapKeys, Param, Sample, SimpleRng, Transform, TransformError,
    TransformId,
};

const EPSILON: f32 = 1e-7;

/// Gamma contrast: `((x - min) / (range + eps))^gamma * range + min`.
fn adjust_contrast(array: &Array, gamma: f32, min: f32, range: f32) -> Array {
    array.map(|x| ((x - min) / (range + EPSILON)).max(0.0).powf(gamma) * range + min)
}

/// Inverse of [`adjust_contrast`] for the same parameters.
fn restore_contrast(array: &Array, gamma: f32, min: f32, range: f32) -> Array {
    array.map(|y| ((y - min) / range).clamp(0.0, 1.0).powf(1.0 / gamma) * (range + EPSILON) + min)
}

/// Randomly adjusts contrast with a gamma curve.
///
/// With probability `prob`, draws `gamma` from the configured range and
/// applies it to every key. Every key gets the same `extra_info`: the shared
/// `gamma` plus `min` and `range` maps holding each key's intensity statistics.
/// Constant arrays are left unchanged.
#[derive(Debug, Clone)]
pub struct RandAdjustContrast {
    id: TransformId,
    keys: MapKeys,
    prob: f32,
    gamma: (f32, f32),
    rng: SimpleRng,
}

impl RandAdjustContrast {
    /// Creates the transform with `prob = 0.1` and gamma in `[0.5, 4.5)`.
    pub fn new(keys: impl Into<MapKeys>) -> Self {
        Self {
            id: TransformId::next(),
            keys: keys.into(),
            prob: 0.1,
            gamma: (0.5, 4.5),
            rng: SimpleRng::default(),
        }
    }

    /// Sets the probability of adjusting.
    pub fn with_prob(mut self, prob: f32) -> Self {
        self.prob = prob;
        self
    }

    /// Sets the range gamma is drawn from.
    pub fn with_gamma(mut self, low: f32, high: f32) -> Self {
        self.gamma = (low, high);
        self
    }

    /// Seeds the random state.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SimpleRng::new(seed);
        self
    }
}

impl Transform for RandAdjustContrast {
    fn name(&self) -> &'static str {
        "RandAdjustContrast"
    }

    fn apply(&mut self, mut sample: Sample) -> Result<Sample, TransformError> {
        let do_transform = self.rng.next_f32() < self.prob;
        let gamma = self.rng.uniform(self.gamma.0, self.gamma.1);
        let keys = self.keys.present(&sample)?;

        let mut mins = ExtraInfo::new();
        let mut ranges = ExtraInfo::new();
        for key in &keys {
            let (min, max) = sample.array(key)?.min_max().unwrap_or((0.0, 0.0));
            mins.insert(key.clone(), Param::F32(min));
            ranges.insert(key.clone(), Param::F32(max - min));
        }
        let extra_info = ExtraInfo::from([
            ("gamma".to_string(), Param::F32(gamma)),
            ("min".to_string(), Param::Map(mins)),
            ("range".to_string(), Param::Map(ranges)),
        ]);

        for key in keys {
            let array = sample.array(&key)?;
            let record = self
                .record(&key)
                .with_extra_info(extra_info.clone())
                .with_orig_size(array.shape().get(1..).unwrap_or_default().to_vec())
                .with_do_transform(do_transform);
            let min = record.key_param("min")?.as_f32("min")?;
            let range = record.key_param("range")?.as_f32("range")?;

            if do_transform && range > 0.0 {
                let adjusted = adjust_contrast(array, gamma, min, range);
                sample.set_array(&key, adjusted);
            }
            self.push_full_record(&mut sample, record)?;
        }
        Ok(sample)
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

impl Invertible for RandAdjustContrast {
    fn transform_id(&self) -> TransformId {
        self.id
    }

    fn inverse(&self, mut sample: Sample) -> Result<Sample, TransformError> {
        for key in self.keys.present(&sample)? {
            let record = self.pop_record(&mut sample, &key)?;
            let range = record.key_param("range")?.as_f32("range")?;
            if !record.do_transform || range <= 0.0 {
                continue;
            }
            let gamma = record.param("gamma")?.as_f32("gamma")?;
            let min = record.key_param("min")?.as_f32("min")?;
            let restored = restore_contrast(sample.array(&key)?, gamma, min, range);
            sample.set_array(&key, restored);
        }
        Ok(sample)
    }
}
