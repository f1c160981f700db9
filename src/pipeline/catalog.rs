//! Image catalogs for bindable image properties.
//!
//! Every bindable property has a fixed authored pixel size and an ordered
//! list of selectable image URLs. Indices wrap in both directions, so any
//! integer selects a catalog entry.

use serde::Deserialize;

/// Property name of the head image on the avatar view model.
pub const HEAD_IMAGE: &str = "HeadImage";
/// Property name of the torso image on the avatar view model.
pub const TORSO_IMAGE: &str = "TorsoImage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One bindable image property and its selectable variants.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageProperty {
    pub name: String,
    /// Pixel size of the image node as authored in the animation.
    pub expected: ImageSize,
    pub urls: Vec<String>,
}

impl ImageProperty {
    /// URL for `index`, wrapping negative and out-of-range values.
    /// `None` only when the catalog is empty.
    pub fn url_for(&self, index: i64) -> Option<&str> {
        if self.urls.is_empty() {
            return None;
        }
        let len = self.urls.len() as i64;
        let slot = index.rem_euclid(len) as usize;
        self.urls.get(slot).map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageCatalog {
    properties: Vec<ImageProperty>,
}

impl Default for ImageCatalog {
    fn default() -> Self {
        Self::avatar()
    }
}

impl ImageCatalog {
    pub fn new(properties: Vec<ImageProperty>) -> Self {
        Self { properties }
    }

    /// Head and torso catalogs shipped with the avatar artwork.
    pub fn avatar() -> Self {
        let heads = (0..6)
            .map(|i| format!("/assets/avatar/heads/head_{i:02}.png"))
            .collect();
        // Only three torsos exist; the list cycles through them twice.
        let torsos = (0..6)
            .map(|i| format!("/assets/avatar/torsos/torso_{:02}.png", i % 3))
            .collect();
        Self::new(vec![
            ImageProperty {
                name: HEAD_IMAGE.to_string(),
                expected: ImageSize::new(170, 170),
                urls: heads,
            },
            ImageProperty {
                name: TORSO_IMAGE.to_string(),
                expected: ImageSize::new(460, 730),
                urls: torsos,
            },
        ])
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn property(&self, name: &str) -> Option<&ImageProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn resolve(&self, name: &str, index: i64) -> Option<&str> {
        self.property(name).and_then(|p| p.url_for(index))
    }

    pub fn properties(&self) -> &[ImageProperty] {
        &self.properties
    }
}
