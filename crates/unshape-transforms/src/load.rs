use tracing::debug;
use unshape_history::{Array, MapKeys, Sample, Transform, TransformError};

/// Replaces an image path with its decoded pixels.
///
/// Images are converted to single-channel `f32` in `[0, 1]` and stored as a
/// `[height, width]` array. Not invertible.
#[derive(Debug, Clone)]
pub struct LoadImage {
    keys: MapKeys,
}

impl LoadImage {
    /// Loads every key in `keys`.
    pub fn new(keys: impl Into<MapKeys>) -> Self {
        Self { keys: keys.into() }
    }
}

impl Transform for LoadImage {
    fn name(&self) -> &'static str {
        "LoadImage"
    }

    fn apply(&mut self, mut sample: Sample) -> Result<Sample, TransformError> {
        for key in self.keys.present(&sample)? {
            let path = sample.text(&key)?.to_string();
            let image = image::open(&path).map_err(|e| TransformError::External {
                transform: self.name().to_string(),
                source: Box::new(e),
            })?;

            let luma = image.to_luma32f();
            let (width, height) = luma.dimensions();
            let array = Array::new(vec![height as usize, width as usize], luma.into_raw())?;
            debug!(key = %key, path = %path, width, height, "loaded image");
            sample.set_array(&key, array);
        }
        Ok(sample)
    }

    fn keys(&self) -> &[String] {
        self.keys.as_slice()
    }
}
