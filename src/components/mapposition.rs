use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

/// World-space position of a body. For avatars this is the pivot the
/// centered collider is laid out around.
#[derive(Component, Clone, Copy, Debug)]
pub struct MapPosition {
    pub pos: Vector2,
}

impl MapPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: Vector2 { x, y },
        }
    }
}
