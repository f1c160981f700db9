//! Vector-animation runtime seam.
//!
//! The overlay never talks to a concrete animation interpreter. It goes
//! through the two traits defined here:
//! - [`AnimationRuntime`] loads an asset into a live [`RuntimeInstance`] and
//!   decodes raw image bytes into an [`ImageHandle`] the instance can bind.
//! - [`RuntimeInstance`] is one loaded artboard + state machine with an
//!   optional bound view model (data-model instance) exposing image
//!   properties.
//!
//! Submodules
//! - [`paperdoll`] – a small JSON-manifest runtime that layers bound images
//!   into named slots. Used by the demo host and the integration tests.

pub mod paperdoll;

use image::RgbaImage;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by a runtime while loading assets or binding images.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid animation asset: {0}")]
    InvalidAsset(String),
    #[error("artboard '{0}' not found")]
    MissingArtboard(String),
    #[error("state machine '{0}' not found")]
    MissingStateMachine(String),
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("no view model instance is bound")]
    Unbound,
    #[error("image property '{0}' not found on the bound view model")]
    MissingProperty(String),
}

/// Where an animation comes from and which parts of it to instantiate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSource {
    /// Asset path resolved by the [`AssetSource`](crate::pipeline::fetch::AssetSource).
    pub path: String,
    pub artboard: String,
    pub state_machine: String,
    /// View model type used when the artboard has no default instance to auto-bind.
    pub view_model: String,
}

impl Default for AnimationSource {
    fn default() -> Self {
        Self {
            path: "/assets/rive/avatar.json".to_string(),
            artboard: "Avatar".to_string(),
            state_machine: "AvatarSM".to_string(),
            view_model: "AvatarVM".to_string(),
        }
    }
}

/// Kind of a state machine input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Boolean,
    Trigger,
    Number,
}

/// Name and kind of one state machine input, as enumerated at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDescriptor {
    pub name: String,
    pub kind: InputKind,
}

/// Current value of an input. Triggers carry no value, only how often they fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputValue {
    Boolean(bool),
    Number(f32),
    Trigger { fired: u32 },
}

/// A decoded image ready to be assigned to a bound image property.
///
/// Assigning moves the handle into the instance, so the caller keeps no
/// ownership once the property holds it.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    image: RgbaImage,
}

impl ImageHandle {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

/// Loader and image decoder for one animation runtime.
pub trait AnimationRuntime: Send + Sync {
    /// Instantiate `source.artboard` and `source.state_machine` from the asset bytes.
    fn load(
        &self,
        source: &AnimationSource,
        bytes: &[u8],
    ) -> Result<Box<dyn RuntimeInstance>, RuntimeError>;

    /// Decode encoded image bytes into a handle the runtime can bind.
    fn decode_image(&self, bytes: &[u8]) -> Result<ImageHandle, RuntimeError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(ImageHandle::new(image))
    }
}

/// One live artboard instance driven by a state machine.
pub trait RuntimeInstance: Send + Sync {
    /// Match the drawing surface to a new pixel resolution.
    fn resize_drawing_surface(&mut self, width: u32, height: u32);

    /// Whether a view model instance was bound automatically at load.
    fn has_bound_view_model(&self) -> bool;

    /// Create the default instance of `view_model` and bind it.
    /// Returns false when the asset has no such view model.
    fn bind_default_instance(&mut self, view_model: &str) -> bool;

    fn has_image_property(&self, property: &str) -> bool;

    /// Assign an image to a property of the bound view model.
    fn set_image_property(&mut self, property: &str, image: ImageHandle)
    -> Result<(), RuntimeError>;

    fn state_machine_inputs(&self) -> Vec<InputDescriptor>;

    fn set_boolean(&mut self, input: &str, value: bool);

    fn fire_trigger(&mut self, input: &str);

    fn input_value(&self, input: &str) -> Option<InputValue>;

    /// Advance the runtime's own clock.
    fn advance(&mut self, dt: f32);

    /// Render the current frame into `surface`, replacing its contents.
    fn draw(&mut self, surface: &mut RgbaImage);

    /// Release runtime resources. The instance must not be used afterwards.
    fn cleanup(&mut self);
}
