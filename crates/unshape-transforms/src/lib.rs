//! Array transforms that record their history.
//!
//! Loading and channel handling are plain [`Transform`](unshape_history::Transform)s;
//! the randomized transforms also implement
//! [`Invertible`](unshape_history::Invertible) and push one record per key on
//! every call, whether or not the random draw decided to act.
//!
//! | Transform | Invertible | Records |
//! |-----------|------------|---------|
//! | [`LoadImage`] | no | - |
//! | [`AddChannel`] | no | - |
//! | [`RandAxisFlip`] | yes | `spatial_axes` |
//! | [`RandFlip`] | yes | `spatial_axes` |
//! | [`RandAdjustContrast`] | yes | `gamma`, `min`, `range` |
//!
//! # Example
//!
//! ```ignore
//! use unshape_history::{Compose, ComposeConfig, Sample};
//! use unshape_transforms::{AddChannel, LoadImage, RandFlip};
//!
//! let keys = ["image", "label"];
//! let mut pipeline = Compose::new()
//!     .with(LoadImage::new(keys))
//!     .with(AddChannel::new(keys))
//!     .with(RandFlip::new(keys).with_prob(0.5));
//! pipeline.set_random_state(0);
//!
//! let sample = Sample::new().with("image", "img.png").with("label", "seg.png");
//! let applied = pipeline.apply(sample)?;
//! ```

mod channel;
mod contrast;
mod flip;
mod load;

pub use channel::AddChannel;
pub use contrast::RandAdjustContrast;
pub use flip::{RandAxisFlip, RandFlip};
pub use load::LoadImage;
