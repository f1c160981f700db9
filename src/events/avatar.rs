//! Avatar command messages and the scene shutdown event.
//!
//! Scenes written as systems do not hold `&mut World`; they write
//! [`AvatarCmd`] messages instead, which
//! [`apply_avatar_commands`](crate::systems::avatar::apply_avatar_commands)
//! applies in order through the same entry points as
//! [`AvatarHandle`](crate::avatar::AvatarHandle).
//!
//! Triggering [`SceneShutdownEvent`] destroys every live avatar; see
//! [`observe_scene_shutdown`](crate::systems::avatar::observe_scene_shutdown).

use bevy_ecs::entity::Entity;
use bevy_ecs::message::Message;
use bevy_ecs::prelude::Event;

use crate::components::look::AvatarLook;
use crate::components::overlay::AnimationName;

#[derive(Message, Debug, Clone)]
pub enum AvatarCmd {
    Play {
        avatar: Entity,
        name: AnimationName,
        looped: bool,
    },
    /// String form of [`AvatarCmd::Play`]; unknown names are ignored.
    PlayNamed { avatar: Entity, name: String },
    SetLook { avatar: Entity, look: AvatarLook },
    SetVisualScale { avatar: Entity, scale: f32 },
    Destroy { avatar: Entity },
}

/// The hosting scene is shutting down or being replaced.
#[derive(Event, Debug, Clone, Copy)]
pub struct SceneShutdownEvent {}
