//! Data model for contribution entries and cached images

pub mod cached_image;
pub mod contribution;

pub use cached_image::*;
pub use contribution::*;
