use bevy_ecs::prelude::*;

use crate::components::avatar::Avatar;
use crate::resources::worldtime::WorldTime;

/// Advance each ready overlay's runtime clock and redraw its surface.
pub fn advance_overlays(time: Res<WorldTime>, mut avatars: Query<&mut Avatar>) {
    for mut avatar in avatars.iter_mut() {
        if let Some(overlay) = avatar.overlay_mut() {
            overlay.advance(time.delta);
        }
    }
}
