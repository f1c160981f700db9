//! Avatar component: the command surface that ties a collision body to its
//! animation overlay.
//!
//! Commands issued before the overlay is ready are latched: the latest
//! animation name, and the merged look (which is always the held look).
//! When the load completes they are flushed once, look first.

use bevy_ecs::prelude::Component;
use log::{debug, warn};

use crate::components::boxcollider::BoxCollider;
use crate::components::look::AvatarLook;
use crate::components::overlay::{
    AnimationName, AnimationOverlay, ImageRequestPolicy, MAX_SURFACE_EDGE, OverlayState,
};
use crate::events::assets::AssetCompletion;
use crate::resources::assetbridge::JobSender;
use crate::runtime::AnimationSource;

pub const MIN_VISUAL_SCALE: f32 = 0.01;

/// Integer pixel footprint of an avatar at scale 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            width: 28,
            height: 46,
        }
    }
}

impl BoundingBox {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scaled size, rounded and between one pixel and [`MAX_SURFACE_EDGE`] per axis.
    pub fn scaled(&self, scale: VisualScale) -> (u32, u32) {
        let s = scale.get();
        let axis = |v: u32| {
            ((v as f32 * s).round().min(MAX_SURFACE_EDGE as f32) as u32).max(1)
        };
        (axis(self.width), axis(self.height))
    }

    /// Largest scale whose longer edge still fits in [`MAX_SURFACE_EDGE`].
    pub fn max_scale(&self) -> f32 {
        MAX_SURFACE_EDGE as f32 / self.width.max(self.height).max(1) as f32
    }
}

/// Multiplier applied to the [`BoundingBox`]; never below [`MIN_VISUAL_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualScale(f32);

impl Default for VisualScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl VisualScale {
    pub fn new(scale: f32) -> Self {
        if scale.is_finite() && scale >= MIN_VISUAL_SCALE {
            Self(scale)
        } else {
            Self(MIN_VISUAL_SCALE)
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

#[derive(Component, Debug)]
pub struct Avatar {
    bbox: BoundingBox,
    scale: VisualScale,
    look: AvatarLook,
    pending_animation: Option<AnimationName>,
    /// `None` once destroyed.
    overlay: Option<AnimationOverlay>,
}

impl Avatar {
    pub fn new(
        overlay_owner: bevy_ecs::entity::Entity,
        bbox: BoundingBox,
        look: AvatarLook,
        source: AnimationSource,
        policy: ImageRequestPolicy,
    ) -> Self {
        let scale = VisualScale::default();
        Self {
            bbox,
            scale,
            look,
            pending_animation: Some(AnimationName::Idle),
            overlay: Some(AnimationOverlay::new(
                overlay_owner,
                source,
                policy,
                bbox.scaled(scale),
            )),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn visual_scale(&self) -> VisualScale {
        self.scale
    }

    pub fn look(&self) -> AvatarLook {
        self.look
    }

    pub fn pending_animation(&self) -> Option<AnimationName> {
        self.pending_animation
    }

    pub fn overlay(&self) -> Option<&AnimationOverlay> {
        self.overlay.as_ref()
    }

    pub fn overlay_mut(&mut self) -> Option<&mut AnimationOverlay> {
        self.overlay.as_mut()
    }

    pub fn state(&self) -> OverlayState {
        self.overlay
            .as_ref()
            .map_or(OverlayState::Destroyed, AnimationOverlay::state)
    }

    pub fn is_ready(&self) -> bool {
        self.state() == OverlayState::Ready
    }

    pub fn is_destroyed(&self) -> bool {
        self.overlay.is_none()
    }

    /// Queue the overlay's animation load on the asset worker.
    pub fn start_loading(&mut self, jobs: JobSender) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.start_loading(jobs);
        }
    }

    /// Play `name` now, or latch it until the overlay is ready.
    ///
    /// `looped` is accepted for callers that track it; the state machine
    /// decides looping on its own.
    pub fn play(&mut self, name: AnimationName, looped: bool) {
        let Some(overlay) = self.overlay.as_mut() else {
            debug!("play({}) on destroyed avatar ignored", name);
            return;
        };
        if overlay.is_ready() {
            overlay.play(name);
        } else {
            debug!("latching play({}, looped={})", name, looped);
            self.pending_animation = Some(name);
        }
    }

    /// Merge `partial` into the held look; when ready, rebind every slot it names.
    pub fn set_look(&mut self, partial: &AvatarLook) {
        let Some(overlay) = self.overlay.as_mut() else {
            debug!("set_look on destroyed avatar ignored");
            return;
        };
        self.look.merge(partial);
        if overlay.is_ready() {
            for (property, index) in self.look.bindings() {
                overlay.request_image(property, index);
            }
        }
    }

    /// Rescale the collider (center preserved) and the overlay resolution.
    pub fn set_visual_scale(&mut self, scale: f32, collider: &mut BoxCollider) {
        let Some(overlay) = self.overlay.as_mut() else {
            debug!("set_visual_scale on destroyed avatar ignored");
            return;
        };
        let mut clamped = VisualScale::new(scale);
        let max = self.bbox.max_scale();
        if clamped.get() > max {
            warn!("visual scale {} exceeds {}; clamped", scale, max);
            clamped = VisualScale::new(max);
        }
        self.scale = clamped;
        let (w, h) = self.bbox.scaled(self.scale);
        collider.resize_centered(w as f32, h as f32);
        overlay.set_resolution(w, h);
    }

    /// Dispose the overlay and drop latched commands. Returns `false` if the
    /// avatar was already destroyed.
    pub fn destroy(&mut self) -> bool {
        self.pending_animation = None;
        match self.overlay.take() {
            Some(mut overlay) => {
                overlay.dispose();
                true
            }
            None => false,
        }
    }

    /// Apply an asset completion addressed to this avatar.
    ///
    /// Completions for a destroyed avatar or an older overlay are released.
    pub fn handle_completion(&mut self, completion: AssetCompletion) {
        let ticket = completion.ticket();
        let Some(overlay) = self.overlay.as_mut() else {
            debug!("discarding completion for destroyed avatar {:?}", ticket.avatar);
            completion.discard();
            return;
        };
        if overlay.id() != ticket.overlay {
            debug!(
                "discarding completion for overlay {} (current {})",
                ticket.overlay,
                overlay.id()
            );
            completion.discard();
            return;
        }

        match completion {
            AssetCompletion::AnimationLoaded { instance, .. } => {
                if overlay.finish_loading(instance) {
                    for (property, index) in self.look.bindings() {
                        overlay.request_image(property, index);
                    }
                    if let Some(name) = self.pending_animation.take() {
                        overlay.play(name);
                    }
                }
            }
            AssetCompletion::AnimationFailed { error, .. } => overlay.fail_loading(&error),
            AssetCompletion::TextureReady {
                property,
                token,
                image,
                ..
            } => {
                overlay.apply_image(&property, token, image);
            }
            AssetCompletion::TextureFailed {
                property, error, ..
            } => {
                warn!("texture for '{}' unavailable: {}", property, error);
            }
        }
    }
}
