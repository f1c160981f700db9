//! Per-frame overlay tracking.
//!
//! Runs after the physics step and only moves overlays: each avatar body
//! still subscribed through [`FrameSync`] gets its overlay display center
//! set to the collider center.

use bevy_ecs::prelude::*;

use crate::components::avatar::Avatar;
use crate::components::boxcollider::BoxCollider;
use crate::components::framesync::FrameSync;
use crate::components::mapposition::MapPosition;

pub fn frame_sync_system(
    mut query: Query<(&MapPosition, &BoxCollider, &mut Avatar), With<FrameSync>>,
) {
    for (position, collider, mut avatar) in query.iter_mut() {
        if let Some(overlay) = avatar.overlay_mut() {
            overlay.set_position(collider.center(position.pos));
        }
    }
}
