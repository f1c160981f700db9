use bevy_ecs::prelude::Component;

/// Marks an avatar body whose overlay follows its collider every frame.
///
/// Removed when the avatar is destroyed, which unsubscribes the body from
/// [`frame_sync_system`](crate::systems::framesync::frame_sync_system).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct FrameSync;
