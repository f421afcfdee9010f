use unshape_history::{MapKeys, Sample, Transform, TransformError};

/// Prepends a channel axis of length 1.
///
/// `[H, W]` becomes `[1, H, W]`. Not invertible.
#[derive(Debug, Clone)]
pub struct AddChannel {
    keys: MapKeys,
}

impl AddChannel {
    /// Adds a channel axis to every key in `keys`.
    pub fn new(keys: impl Into<MapKeys>) -> Self {
        Self { keys: keys.into() }
    }
}

impl Transform for AddChannel {
    fn name(&self) -> &'static str {
        "AddChannel"
    }

    fn apply(&mut self, mut sample: Sample) -> Result<Sample, TransformError> {
        for key in self.keys.present(&sample)? {
            let array = sample.array(&key)?.clone().insert_axis(0)?;
            sample.set_array(&key, array);
        }
        Ok(sample)
    }

    fn keys(&self) -> &[String] {
        self.keys.as_slice()
    }
}
