//! Systems and observers that apply avatar commands.
//!
//! - [`apply_avatar_commands`] drains queued [`AvatarCmd`] messages in order.
//! - [`observe_scene_shutdown`] destroys every avatar when a
//!   [`SceneShutdownEvent`] is triggered.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::info;

use crate::avatar::{AvatarHandle, destroy_avatar};
use crate::components::avatar::Avatar;
use crate::events::avatar::{AvatarCmd, SceneShutdownEvent};

/// Apply every pending [`AvatarCmd`] through [`AvatarHandle`].
///
/// Runs as an exclusive system; the messages are drained, so each command
/// is applied exactly once.
pub fn apply_avatar_commands(world: &mut World) {
    let cmds: Vec<AvatarCmd> = match world.get_resource_mut::<Messages<AvatarCmd>>() {
        Some(mut messages) => messages.drain().collect(),
        None => return,
    };
    for cmd in cmds {
        match cmd {
            AvatarCmd::Play {
                avatar,
                name,
                looped,
            } => AvatarHandle(avatar).play(world, name, looped),
            AvatarCmd::PlayNamed { avatar, name } => AvatarHandle(avatar).play_named(world, &name),
            AvatarCmd::SetLook { avatar, look } => AvatarHandle(avatar).set_look(world, &look),
            AvatarCmd::SetVisualScale { avatar, scale } => {
                AvatarHandle(avatar).set_visual_scale(world, scale)
            }
            AvatarCmd::Destroy { avatar } => {
                AvatarHandle(avatar).destroy(world);
            }
        }
    }
}

/// Destroy every live avatar when the hosting scene goes away.
pub fn observe_scene_shutdown(
    _trigger: On<SceneShutdownEvent>,
    mut commands: Commands,
    avatars: Query<Entity, With<Avatar>>,
) {
    let count = avatars.iter().count();
    info!("scene shutdown: destroying {} avatar(s)", count);
    for entity in avatars.iter() {
        commands.queue(move |world: &mut World| {
            destroy_avatar(world, entity);
        });
    }
}
