//! Debug toggle resource.
//!
//! The mere presence of this resource makes the render pass outline every
//! avatar collider and overlay surface. Remove it to disable.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct DebugMode {}
