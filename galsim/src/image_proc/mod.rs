//! Image buffers and pixel-level measurements.

pub mod image;
pub mod moments;

pub use image::{Image, KImage};
pub use moments::ImageMoments;
