//! Loading a base raster and saving the flattened composite.
//!
//! Failures are reported and leave the in-memory session untouched; nothing
//! here is fatal. The action log itself is never persisted — reopening a
//! file starts a fresh log over the loaded bitmap.

use std::path::Path;

use thiserror::Error;

use crate::canvas::{Canvas, Surface};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("could not load image: {0}")]
    Load(#[source] image::ImageError),
    #[error("could not save image: {0}")]
    Save(#[source] image::ImageError),
}

/// Decode an image file into a surface suitable as a new base raster.
pub fn load_image(path: impl AsRef<Path>) -> Result<Surface, IoError> {
    let img = image::open(path).map_err(IoError::Load)?;
    Ok(Surface::from_image(img.to_rgba8()))
}

/// Flatten the canvas and write it out; the format follows the extension.
pub fn save_composite(canvas: &Canvas, path: impl AsRef<Path>) -> Result<(), IoError> {
    canvas
        .composite()
        .into_image()
        .save(path)
        .map_err(IoError::Save)
}
