use bevy_ecs::prelude::*;

use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::resources::worldtime::WorldTime;

/// Integrate enabled forces into velocity and velocity into position.
/// Frozen bodies are skipped.
pub fn movement_system(mut query: Query<(&mut MapPosition, &mut RigidBody)>, time: Res<WorldTime>) {
    for (mut position, mut rigidbody) in query.iter_mut() {
        if rigidbody.frozen {
            continue;
        }
        let accel = rigidbody.total_acceleration();
        rigidbody.velocity += accel.scale_by(time.delta);
        let delta = rigidbody.velocity.scale_by(time.delta);
        position.pos += delta;
    }
}
