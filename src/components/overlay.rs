//! Animation overlay: one live runtime instance rendered into an off-screen
//! surface that is composited over the game view.
//!
//! The overlay is a small state machine:
//!
//! ```text
//! Uninitialized --start_loading--> Loading --finish_loading--> Ready
//!        \                            |                          |
//!         `-------------------------dispose---------------------'--> Destroyed
//! ```
//!
//! Loading and texture fetching happen on the asset worker; their results
//! come back through [`finish_loading`](AnimationOverlay::finish_loading) and
//! [`apply_image`](AnimationOverlay::apply_image). Anything arriving after
//! disposal is released and ignored.
//!
//! Image requests are sequenced per property with a monotonic token. With
//! [`ImageRequestPolicy::LatestRequestWins`] only the completion answering
//! the most recent request for a property is applied.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use bevy_ecs::entity::Entity;
use image::RgbaImage;
use log::{debug, info, warn};
use raylib::prelude::Vector2;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::events::assets::{AssetJob, OverlayTicket};
use crate::resources::assetbridge::JobSender;
use crate::runtime::{AnimationSource, ImageHandle, InputKind, InputValue, RuntimeInstance};

/// The closed set of animations an avatar can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationName {
    Idle,
    Run,
    Jump,
    Fall,
    Jab,
    Hurt,
    Win,
    Hi,
}

/// Largest overlay surface edge in pixels. Larger resolutions are clamped.
pub const MAX_SURFACE_EDGE: u32 = 2048;

fn clamp_resolution((width, height): (u32, u32)) -> (u32, u32) {
    let clamped = (
        width.clamp(1, MAX_SURFACE_EDGE),
        height.clamp(1, MAX_SURFACE_EDGE),
    );
    if clamped != (width, height) {
        warn!(
            "overlay resolution {}x{} clamped to {}x{}",
            width, height, clamped.0, clamped.1
        );
    }
    clamped
}

/// Boolean state machine inputs; exactly one of them is on after a motion `play`.
pub const MOTION_INPUTS: [&str; 6] = ["Idle", "Run", "Jump", "Fall", "Hurt", "Win"];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown animation '{0}'")]
pub struct UnknownAnimation(pub String);

impl AnimationName {
    pub const ALL: [AnimationName; 8] = [
        AnimationName::Idle,
        AnimationName::Run,
        AnimationName::Jump,
        AnimationName::Fall,
        AnimationName::Jab,
        AnimationName::Hurt,
        AnimationName::Win,
        AnimationName::Hi,
    ];

    /// Name of the state machine input this animation drives.
    pub fn input(self) -> &'static str {
        match self {
            AnimationName::Idle => "Idle",
            AnimationName::Run => "Run",
            AnimationName::Jump => "Jump",
            AnimationName::Fall => "Fall",
            AnimationName::Jab => "Jab",
            AnimationName::Hurt => "Hurt",
            AnimationName::Win => "Win",
            AnimationName::Hi => "Hi",
        }
    }

    pub fn kind(self) -> InputKind {
        match self {
            AnimationName::Jab | AnimationName::Hi => InputKind::Trigger,
            _ => InputKind::Boolean,
        }
    }
}

impl FromStr for AnimationName {
    type Err = UnknownAnimation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimationName::ALL
            .into_iter()
            .find(|a| a.input().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAnimation(s.to_string()))
    }
}

impl fmt::Display for AnimationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.input())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Uninitialized,
    Loading,
    Ready,
    Destroyed,
}

/// How concurrent requests for the same image property are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageRequestPolicy {
    /// Only the completion of the newest request is applied.
    #[default]
    LatestRequestWins,
    /// Every completion is applied in arrival order.
    LastCompletionWins,
}

static NEXT_OVERLAY_ID: AtomicU64 = AtomicU64::new(1);

pub struct AnimationOverlay {
    id: u64,
    avatar: Entity,
    state: OverlayState,
    source: AnimationSource,
    policy: ImageRequestPolicy,
    jobs: Option<JobSender>,
    instance: Option<Box<dyn RuntimeInstance>>,
    /// State machine inputs, cached once at load.
    inputs: FxHashMap<String, InputKind>,
    bound: bool,
    latest_tokens: FxHashMap<String, u64>,
    next_token: u64,
    resolution: (u32, u32),
    /// Display center in world space.
    position: Vector2,
    surface: Option<RgbaImage>,
    revision: u64,
}

impl AnimationOverlay {
    pub fn new(
        avatar: Entity,
        source: AnimationSource,
        policy: ImageRequestPolicy,
        resolution: (u32, u32),
    ) -> Self {
        Self {
            id: NEXT_OVERLAY_ID.fetch_add(1, Ordering::Relaxed),
            avatar,
            state: OverlayState::Uninitialized,
            source,
            policy,
            jobs: None,
            instance: None,
            inputs: FxHashMap::default(),
            bound: false,
            latest_tokens: FxHashMap::default(),
            next_token: 0,
            resolution: clamp_resolution(resolution),
            position: Vector2::zero(),
            surface: None,
            revision: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn ticket(&self) -> OverlayTicket {
        OverlayTicket {
            avatar: self.avatar,
            overlay: self.id,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == OverlayState::Ready
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn policy(&self) -> ImageRequestPolicy {
        self.policy
    }

    /// Queue the animation load. Only valid from `Uninitialized`.
    pub fn start_loading(&mut self, jobs: JobSender) -> bool {
        if self.state != OverlayState::Uninitialized {
            return false;
        }
        let job = AssetJob::LoadAnimation {
            ticket: self.ticket(),
            source: self.source.clone(),
        };
        if !jobs.submit(job) {
            warn!("asset worker unavailable; '{}' will not load", self.source.path);
        }
        self.jobs = Some(jobs);
        self.state = OverlayState::Loading;
        true
    }

    /// Adopt a loaded instance and become `Ready`.
    ///
    /// An instance arriving in any state other than `Loading` is cleaned up
    /// and `false` is returned.
    pub fn finish_loading(&mut self, mut instance: Box<dyn RuntimeInstance>) -> bool {
        if self.state != OverlayState::Loading {
            debug!("overlay {} not loading; releasing late instance", self.id);
            instance.cleanup();
            return false;
        }

        let (w, h) = self.resolution;
        instance.resize_drawing_surface(w, h);

        self.bound = instance.has_bound_view_model()
            || instance.bind_default_instance(&self.source.view_model);
        if !self.bound {
            warn!(
                "no '{}' view model instance could be bound; image customization disabled",
                self.source.view_model
            );
        }

        self.inputs = instance
            .state_machine_inputs()
            .into_iter()
            .map(|d| (d.name, d.kind))
            .collect();

        self.instance = Some(instance);
        self.surface = Some(RgbaImage::new(w, h));
        self.state = OverlayState::Ready;
        info!(
            "overlay {} ready ({} inputs, {}x{})",
            self.id,
            self.inputs.len(),
            w,
            h
        );
        true
    }

    /// Record a load failure. The overlay stays in `Loading`.
    pub fn fail_loading(&mut self, error: &str) {
        warn!(
            "failed to load animation '{}': {}",
            self.source.path, error
        );
    }

    /// Drive the state machine input for `name`. No-op unless `Ready`.
    pub fn play(&mut self, name: AnimationName) -> bool {
        if self.state != OverlayState::Ready {
            return false;
        }
        let Some(instance) = self.instance.as_mut() else {
            return false;
        };
        let input = name.input();
        if name.kind() == InputKind::Boolean {
            // Every motion flag goes off, even when the asset lacks `input`.
            for motion in MOTION_INPUTS {
                if self.inputs.get(motion) == Some(&InputKind::Boolean) {
                    instance.set_boolean(motion, motion == input);
                }
            }
        }
        match (self.inputs.get(input), name.kind()) {
            (Some(InputKind::Trigger), InputKind::Trigger) => {
                instance.fire_trigger(input);
                true
            }
            (Some(InputKind::Boolean), InputKind::Boolean) => true,
            _ => {
                debug!("state machine has no matching input for '{}'", name);
                false
            }
        }
    }

    /// Ask the worker for catalog entry `index` of `property`.
    ///
    /// Returns the request token, or `None` when the overlay cannot accept
    /// images (not ready, unbound, or no such property).
    pub fn request_image(&mut self, property: &str, index: i64) -> Option<u64> {
        if self.state != OverlayState::Ready || !self.bound {
            debug!("overlay {} cannot bind images yet; '{}' ignored", self.id, property);
            return None;
        }
        let instance = self.instance.as_ref()?;
        if !instance.has_image_property(property) {
            debug!("bound view model has no image property '{}'", property);
            return None;
        }
        let jobs = self.jobs.as_ref()?;

        self.next_token += 1;
        let token = self.next_token;
        self.latest_tokens.insert(property.to_string(), token);

        let job = AssetJob::FetchTexture {
            ticket: self.ticket(),
            property: property.to_string(),
            index,
            token,
        };
        if !jobs.submit(job) {
            warn!("asset worker unavailable; '{}' request dropped", property);
        }
        Some(token)
    }

    /// Assign a fetched image to its property if it is still wanted.
    pub fn apply_image(&mut self, property: &str, token: u64, image: ImageHandle) -> bool {
        if self.state != OverlayState::Ready || !self.bound {
            return false;
        }
        if self.policy == ImageRequestPolicy::LatestRequestWins
            && self.latest_tokens.get(property) != Some(&token)
        {
            debug!(
                "dropping stale '{}' image (token {}, latest {:?})",
                property,
                token,
                self.latest_tokens.get(property)
            );
            return false;
        }
        let Some(instance) = self.instance.as_mut() else {
            return false;
        };
        match instance.set_image_property(property, image) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to assign '{}': {}", property, e);
                false
            }
        }
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Change the render resolution. Applied to the drawing surface
    /// immediately when ready, otherwise on load.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        if self.state == OverlayState::Destroyed {
            return;
        }
        let (width, height) = clamp_resolution((width, height));
        if self.resolution == (width, height) {
            return;
        }
        self.resolution = (width, height);
        if self.state != OverlayState::Ready {
            return;
        }
        if let Some(instance) = self.instance.as_mut() {
            instance.resize_drawing_surface(width, height);
            let mut surface = RgbaImage::new(width, height);
            instance.draw(&mut surface);
            self.surface = Some(surface);
            self.revision += 1;
        }
    }

    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    /// World-space top-left corner where the surface is drawn.
    pub fn top_left(&self) -> Vector2 {
        let (w, h) = self.resolution;
        Vector2::new(
            self.position.x - w as f32 * 0.5,
            self.position.y - h as f32 * 0.5,
        )
    }

    /// Advance the runtime clock and redraw the surface.
    pub fn advance(&mut self, dt: f32) {
        if self.state != OverlayState::Ready {
            return;
        }
        let Some(instance) = self.instance.as_mut() else {
            return;
        };
        instance.advance(dt);
        let (w, h) = self.resolution;
        let surface = self
            .surface
            .get_or_insert_with(|| RgbaImage::new(w, h));
        if surface.dimensions() != (w, h) {
            *surface = RgbaImage::new(w, h);
        }
        instance.draw(surface);
        self.revision += 1;
    }

    pub fn surface(&self) -> Option<&RgbaImage> {
        self.surface.as_ref()
    }

    /// Bumped every time the surface contents change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn input_value(&self, input: &str) -> Option<InputValue> {
        self.instance.as_ref()?.input_value(input)
    }

    pub fn input_kind(&self, input: &str) -> Option<InputKind> {
        self.inputs.get(input).copied()
    }

    /// Release the runtime instance and enter `Destroyed`. Idempotent.
    pub fn dispose(&mut self) -> bool {
        if self.state == OverlayState::Destroyed {
            return false;
        }
        if let Some(mut instance) = self.instance.take() {
            instance.cleanup();
        }
        self.state = OverlayState::Destroyed;
        self.jobs = None;
        self.surface = None;
        self.inputs.clear();
        self.latest_tokens.clear();
        self.bound = false;
        debug!("overlay {} disposed", self.id);
        true
    }
}

impl fmt::Debug for AnimationOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationOverlay")
            .field("id", &self.id)
            .field("avatar", &self.avatar)
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("bound", &self.bound)
            .field("resolution", &self.resolution)
            .field("position", &self.position)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
