//! Direct avatar command surface for code that holds `&mut World`.
//!
//! ```ignore
//! let avatar = AvatarHandle::spawn(&mut world, AvatarSpawn {
//!     position: Vector2::new(200.0, 300.0),
//!     look: AvatarLook::head(2),
//!     ..Default::default()
//! });
//! avatar.set_visual_scale(&mut world, 2.0);
//! avatar.play(&mut world, AnimationName::Run, true);
//! // on scene exit
//! avatar.destroy(&mut world);
//! ```
//!
//! Every call is a silent no-op once the avatar has been destroyed.

use bevy_ecs::prelude::*;
use log::{debug, info, warn};
use raylib::prelude::Vector2;

use crate::components::avatar::{Avatar, BoundingBox};
use crate::components::boxcollider::BoxCollider;
use crate::components::framesync::FrameSync;
use crate::components::look::AvatarLook;
use crate::components::mapposition::MapPosition;
use crate::components::overlay::{AnimationName, OverlayState};
use crate::components::rigidbody::RigidBody;
use crate::resources::assetbridge::AssetBridge;
use crate::resources::avatarsettings::AvatarSettings;

/// Construction parameters for [`AvatarHandle::spawn`].
#[derive(Debug, Clone, Copy)]
pub struct AvatarSpawn {
    /// Center of the collision body.
    pub position: Vector2,
    pub bbox: BoundingBox,
    /// Persisted look applied once the overlay is ready.
    pub look: AvatarLook,
}

impl Default for AvatarSpawn {
    fn default() -> Self {
        Self {
            position: Vector2::zero(),
            bbox: BoundingBox::default(),
            look: AvatarLook::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AvatarHandle(pub Entity);

impl AvatarHandle {
    /// Spawn the collision body, attach the avatar and start loading its overlay.
    ///
    /// Uses the world's [`AvatarSettings`] (defaults when absent). Without an
    /// [`AssetBridge`] the overlay stays `Uninitialized` and every command latches.
    pub fn spawn(world: &mut World, spawn: AvatarSpawn) -> Self {
        let settings = world
            .get_resource::<AvatarSettings>()
            .cloned()
            .unwrap_or_default();
        let jobs = world.get_resource::<AssetBridge>().map(AssetBridge::jobs);

        let bbox = spawn.bbox;
        let entity = world
            .spawn((
                MapPosition::new(spawn.position.x, spawn.position.y),
                BoxCollider::centered(bbox.width as f32, bbox.height as f32),
                RigidBody::new(),
                FrameSync,
            ))
            .id();

        let mut avatar = Avatar::new(entity, bbox, spawn.look, settings.source, settings.policy);
        if let Some(overlay) = avatar.overlay_mut() {
            overlay.set_position(spawn.position);
        }
        match jobs {
            Some(jobs) => avatar.start_loading(jobs),
            None => warn!("no asset bridge; avatar {:?} will never become ready", entity),
        }
        world.entity_mut(entity).insert(avatar);

        info!(
            "spawned avatar {:?} ({}x{}) at ({}, {})",
            entity, bbox.width, bbox.height, spawn.position.x, spawn.position.y
        );
        AvatarHandle(entity)
    }

    pub fn entity(self) -> Entity {
        self.0
    }

    /// Position and collider of the collision body, `None` once destroyed.
    pub fn body(self, world: &World) -> Option<(MapPosition, BoxCollider)> {
        let entity = world.get_entity(self.0).ok()?;
        Some((*entity.get::<MapPosition>()?, *entity.get::<BoxCollider>()?))
    }

    pub fn play(self, world: &mut World, name: AnimationName, looped: bool) {
        with_avatar(world, self.0, |avatar, _| avatar.play(name, looped));
    }

    /// String form of [`play`](Self::play). Unknown names are ignored.
    pub fn play_named(self, world: &mut World, name: &str) {
        match name.parse::<AnimationName>() {
            Ok(name) => self.play(world, name, false),
            Err(e) => debug!("{}; ignored", e),
        }
    }

    pub fn set_look(self, world: &mut World, look: &AvatarLook) {
        with_avatar(world, self.0, |avatar, _| avatar.set_look(look));
    }

    pub fn set_visual_scale(self, world: &mut World, scale: f32) {
        with_avatar(world, self.0, |avatar, collider| {
            avatar.set_visual_scale(scale, collider)
        });
    }

    /// Returns `true` only for the call that actually destroyed the avatar.
    pub fn destroy(self, world: &mut World) -> bool {
        destroy_avatar(world, self.0)
    }

    pub fn look(self, world: &World) -> Option<AvatarLook> {
        world.get::<Avatar>(self.0).map(Avatar::look)
    }

    pub fn state(self, world: &World) -> OverlayState {
        world
            .get::<Avatar>(self.0)
            .map_or(OverlayState::Destroyed, Avatar::state)
    }
}

fn with_avatar<R>(
    world: &mut World,
    entity: Entity,
    f: impl FnOnce(&mut Avatar, &mut BoxCollider) -> R,
) -> Option<R> {
    let mut query = world.query::<(&mut Avatar, &mut BoxCollider)>();
    match query.get_mut(world, entity) {
        Ok((mut avatar, mut collider)) => Some(f(&mut avatar, &mut collider)),
        Err(_) => {
            debug!("avatar {:?} no longer exists; command ignored", entity);
            None
        }
    }
}

/// Stop frame sync, dispose the overlay and despawn the body.
///
/// Safe to call any number of times and before the overlay is ready.
pub fn destroy_avatar(world: &mut World, entity: Entity) -> bool {
    let Ok(mut body) = world.get_entity_mut(entity) else {
        return false;
    };
    if !body.contains::<Avatar>() {
        return false;
    }
    body.remove::<FrameSync>();
    let destroyed = body
        .get_mut::<Avatar>()
        .is_some_and(|mut avatar| avatar.destroy());
    body.despawn();
    if destroyed {
        info!("destroyed avatar {:?}", entity);
    }
    destroyed
}
