//! Texture customization pipeline.
//!
//! Turns `(property, index)` into a decoded image sized for the property:
//! 1. resolve the URL through the [`ImageCatalog`] (unknown properties are rejected)
//! 2. fetch the raw bytes from the [`AssetSource`]
//! 3. decode and, when the decoded size differs from the authored size,
//!    resample to exactly that size and re-encode as PNG
//! 4. if the fast decode path is disabled or cannot read the bytes, carry
//!    the raw bytes forward unresized
//! 5. decode through the animation runtime into an [`ImageHandle`]
//!
//! The pipeline is synchronous; the asset worker runs it off the main thread.

pub mod catalog;
pub mod fetch;

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{ImageError, ImageFormat};
use log::debug;
use thiserror::Error;

use crate::runtime::{AnimationRuntime, ImageHandle, RuntimeError};
use self::catalog::{ImageCatalog, ImageSize};
use self::fetch::{AssetSource, FetchError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no catalog for image property '{0}'")]
    UnknownProperty(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] RuntimeError),
}

/// How fetched bytes are prepared before the runtime decodes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePath {
    /// Decode, resample to the authored size when needed, re-encode.
    #[default]
    Resample,
    /// Hand the raw bytes to the runtime unchanged.
    Raw,
}

#[derive(Clone)]
pub struct TexturePipeline {
    source: Arc<dyn AssetSource>,
    runtime: Arc<dyn AnimationRuntime>,
    catalog: Arc<ImageCatalog>,
    decode_path: DecodePath,
}

impl TexturePipeline {
    pub fn new(
        source: Arc<dyn AssetSource>,
        runtime: Arc<dyn AnimationRuntime>,
        catalog: Arc<ImageCatalog>,
    ) -> Self {
        Self {
            source,
            runtime,
            catalog,
            decode_path: DecodePath::default(),
        }
    }

    pub fn with_decode_path(mut self, decode_path: DecodePath) -> Self {
        self.decode_path = decode_path;
        self
    }

    pub fn source(&self) -> &dyn AssetSource {
        self.source.as_ref()
    }

    pub fn runtime(&self) -> &dyn AnimationRuntime {
        self.runtime.as_ref()
    }

    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    /// Run the whole pipeline for one catalog selection.
    pub fn run(&self, property: &str, index: i64) -> Result<ImageHandle, PipelineError> {
        let entry = self
            .catalog
            .property(property)
            .ok_or_else(|| PipelineError::UnknownProperty(property.to_string()))?;
        let url = entry
            .url_for(index)
            .ok_or_else(|| PipelineError::UnknownProperty(property.to_string()))?;

        let raw = self.source.fetch(url)?;

        let bytes = match self.decode_path {
            DecodePath::Resample => match resample_to(&raw, entry.expected) {
                Ok(Some(resampled)) => {
                    debug!(
                        "resampled '{}' to {}x{}",
                        url, entry.expected.width, entry.expected.height
                    );
                    resampled
                }
                Ok(None) => raw,
                Err(e) => {
                    debug!("fast decode unavailable for '{}', using raw bytes: {}", url, e);
                    raw
                }
            },
            DecodePath::Raw => raw,
        };

        Ok(self.runtime.decode_image(&bytes)?)
    }
}

/// Resample encoded image bytes to `expected`.
///
/// Returns `Ok(None)` when the image already has the expected size, so the
/// caller can keep the original bytes untouched.
pub fn resample_to(bytes: &[u8], expected: ImageSize) -> Result<Option<Vec<u8>>, ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    if expected.width == 0
        || expected.height == 0
        || (decoded.width() == expected.width && decoded.height() == expected.height)
    {
        return Ok(None);
    }
    let resized = decoded.resize_exact(expected.width, expected.height, FilterType::Lanczos3);
    let mut out = Vec::new();
    resized.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(Some(out))
}
