//! Paper-doll runtime backed by a JSON manifest.
//!
//! The manifest describes artboards, their state machines and image slots,
//! and the view models that expose bindable image properties:
//!
//! ```json
//! {
//!   "artboards": [{
//!     "name": "Avatar", "width": 460, "height": 900,
//!     "default_view_model": "AvatarVM",
//!     "state_machines": [{ "name": "AvatarSM", "inputs": [
//!       { "name": "Idle", "kind": "boolean", "bob": 4.0 },
//!       { "name": "Jab", "kind": "trigger" }
//!     ]}],
//!     "slots": [{ "property": "TorsoImage", "x": 0, "y": 170, "width": 460, "height": 730 }]
//!   }],
//!   "view_models": [{ "name": "AvatarVM", "images": ["HeadImage", "TorsoImage"] }]
//! }
//! ```
//!
//! Drawing stretches the artboard over the whole surface and layers each
//! bound image into its slot in declaration order. Active boolean inputs bob
//! the doll by their `bob` amplitude (artboard units); firing a trigger makes
//! it hop once.

use std::f32::consts::{PI, TAU};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::{
    AnimationRuntime, AnimationSource, ImageHandle, InputDescriptor, InputKind, InputValue,
    RuntimeError, RuntimeInstance,
};

const HOP_SECONDS: f32 = 0.3;
const HOP_HEIGHT: f32 = 24.0;
const BOB_HZ: f32 = 2.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub artboards: Vec<ArtboardDef>,
    #[serde(default)]
    pub view_models: Vec<ViewModelDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtboardDef {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub default_view_model: Option<String>,
    #[serde(default)]
    pub state_machines: Vec<StateMachineDef>,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateMachineDef {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<InputDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputDef {
    pub name: String,
    pub kind: InputKind,
    /// Vertical bob amplitude while this boolean is true.
    #[serde(default)]
    pub bob: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewModelDef {
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotDef {
    pub property: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Manifest {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RuntimeError> {
        serde_json::from_slice(bytes).map_err(|e| RuntimeError::InvalidAsset(e.to_string()))
    }
}

/// Runtime that instantiates [`Manifest`] assets.
#[derive(Debug, Default, Clone, Copy)]
pub struct PaperDollRuntime;

impl AnimationRuntime for PaperDollRuntime {
    fn load(
        &self,
        source: &AnimationSource,
        bytes: &[u8],
    ) -> Result<Box<dyn RuntimeInstance>, RuntimeError> {
        let manifest = Manifest::from_slice(bytes)?;
        let instance = PaperDollInstance::new(manifest, source)?;
        Ok(Box::new(instance))
    }
}

#[derive(Debug)]
struct BoundViewModel {
    name: String,
    images: FxHashMap<String, Option<RgbaImage>>,
}

impl BoundViewModel {
    fn default_instance(def: &ViewModelDef) -> Self {
        Self {
            name: def.name.clone(),
            images: def.images.iter().map(|p| (p.clone(), None)).collect(),
        }
    }
}

/// Live instance of one manifest artboard.
#[derive(Debug)]
pub struct PaperDollInstance {
    artboard: ArtboardDef,
    inputs: Vec<InputDef>,
    values: FxHashMap<String, InputValue>,
    view_models: Vec<ViewModelDef>,
    bound: Option<BoundViewModel>,
    surface_size: (u32, u32),
    /// Slot images already scaled for the current surface size.
    scaled: FxHashMap<String, RgbaImage>,
    elapsed: f32,
    hop_left: f32,
    disposed: bool,
}

impl PaperDollInstance {
    pub fn new(manifest: Manifest, source: &AnimationSource) -> Result<Self, RuntimeError> {
        let Manifest {
            artboards,
            view_models,
        } = manifest;
        let artboard = artboards
            .into_iter()
            .find(|a| a.name == source.artboard)
            .ok_or_else(|| RuntimeError::MissingArtboard(source.artboard.clone()))?;
        let inputs = artboard
            .state_machines
            .iter()
            .find(|sm| sm.name == source.state_machine)
            .map(|sm| sm.inputs.clone())
            .ok_or_else(|| RuntimeError::MissingStateMachine(source.state_machine.clone()))?;

        let values = inputs
            .iter()
            .map(|i| {
                let value = match i.kind {
                    InputKind::Boolean => InputValue::Boolean(false),
                    InputKind::Number => InputValue::Number(0.0),
                    InputKind::Trigger => InputValue::Trigger { fired: 0 },
                };
                (i.name.clone(), value)
            })
            .collect();

        // Auto-bind only when the artboard names a default that actually exists.
        let bound = artboard
            .default_view_model
            .as_ref()
            .and_then(|name| view_models.iter().find(|vm| &vm.name == name))
            .map(BoundViewModel::default_instance);

        let surface_size = (artboard.width.max(1), artboard.height.max(1));
        Ok(Self {
            artboard,
            inputs,
            values,
            view_models,
            bound,
            surface_size,
            scaled: FxHashMap::default(),
            elapsed: 0.0,
            hop_left: 0.0,
            disposed: false,
        })
    }

    /// Name of the bound view model, if any.
    pub fn bound_view_model(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.name.as_str())
    }

    fn input_kind(&self, name: &str) -> Option<InputKind> {
        self.inputs.iter().find(|i| i.name == name).map(|i| i.kind)
    }

    /// Vertical displacement in artboard units for the current clock.
    fn motion_offset(&self) -> f32 {
        let bob: f32 = self
            .inputs
            .iter()
            .filter(|i| matches!(self.values.get(&i.name), Some(InputValue::Boolean(true))))
            .map(|i| i.bob)
            .sum();
        let mut dy = bob * (self.elapsed * TAU * BOB_HZ).sin();
        if self.hop_left > 0.0 {
            let t = 1.0 - self.hop_left / HOP_SECONDS;
            dy -= (t * PI).sin() * HOP_HEIGHT;
        }
        dy
    }

    fn scaled_slot(&mut self, slot: &SlotDef, w: u32, h: u32) -> Option<&RgbaImage> {
        let bound = self.bound.as_ref()?;
        let source = bound.images.get(&slot.property)?.as_ref()?;
        let stale = self
            .scaled
            .get(&slot.property)
            .is_none_or(|img| img.dimensions() != (w, h));
        if stale {
            let resized = imageops::resize(source, w, h, FilterType::Triangle);
            self.scaled.insert(slot.property.clone(), resized);
        }
        self.scaled.get(&slot.property)
    }
}

impl RuntimeInstance for PaperDollInstance {
    fn resize_drawing_surface(&mut self, width: u32, height: u32) {
        self.surface_size = (width.max(1), height.max(1));
        self.scaled.clear();
    }

    fn has_bound_view_model(&self) -> bool {
        self.bound.is_some()
    }

    fn bind_default_instance(&mut self, view_model: &str) -> bool {
        match self.view_models.iter().find(|vm| vm.name == view_model) {
            Some(def) => {
                self.bound = Some(BoundViewModel::default_instance(def));
                self.scaled.clear();
                true
            }
            None => false,
        }
    }

    fn has_image_property(&self, property: &str) -> bool {
        self.bound
            .as_ref()
            .is_some_and(|b| b.images.contains_key(property))
    }

    fn set_image_property(
        &mut self,
        property: &str,
        image: ImageHandle,
    ) -> Result<(), RuntimeError> {
        let bound = self.bound.as_mut().ok_or(RuntimeError::Unbound)?;
        let slot = bound
            .images
            .get_mut(property)
            .ok_or_else(|| RuntimeError::MissingProperty(property.to_string()))?;
        *slot = Some(image.into_rgba());
        self.scaled.remove(property);
        Ok(())
    }

    fn state_machine_inputs(&self) -> Vec<InputDescriptor> {
        self.inputs
            .iter()
            .map(|i| InputDescriptor {
                name: i.name.clone(),
                kind: i.kind,
            })
            .collect()
    }

    fn set_boolean(&mut self, input: &str, value: bool) {
        if self.input_kind(input) == Some(InputKind::Boolean) {
            self.values
                .insert(input.to_string(), InputValue::Boolean(value));
        }
    }

    fn fire_trigger(&mut self, input: &str) {
        if self.input_kind(input) != Some(InputKind::Trigger) {
            return;
        }
        if let Some(InputValue::Trigger { fired }) = self.values.get_mut(input) {
            *fired += 1;
        }
        self.hop_left = HOP_SECONDS;
    }

    fn input_value(&self, input: &str) -> Option<InputValue> {
        self.values.get(input).copied()
    }

    fn advance(&mut self, dt: f32) {
        if self.disposed {
            return;
        }
        self.elapsed += dt;
        self.hop_left = (self.hop_left - dt).max(0.0);
    }

    fn draw(&mut self, surface: &mut RgbaImage) {
        for px in surface.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
        if self.disposed {
            return;
        }
        let (sw, sh) = surface.dimensions();
        let sx = sw as f32 / self.artboard.width.max(1) as f32;
        let sy = sh as f32 / self.artboard.height.max(1) as f32;
        let dy = self.motion_offset();

        let slots = self.artboard.slots.clone();
        for slot in &slots {
            let w = ((slot.width * sx).round() as u32).max(1);
            let h = ((slot.height * sy).round() as u32).max(1);
            let x = (slot.x * sx).round() as i64;
            let y = ((slot.y + dy) * sy).round() as i64;
            if let Some(img) = self.scaled_slot(slot, w, h) {
                imageops::overlay(surface, img, x, y);
            }
        }
    }

    fn cleanup(&mut self) {
        self.disposed = true;
        self.bound = None;
        self.scaled.clear();
    }
}
