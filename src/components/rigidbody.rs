//! Kinematic body component with named acceleration forces.
//!
//! Scenes drive avatar bodies through [`RigidBody`]; the
//! [`movement_system`](crate::systems::movement::movement_system) integrates
//! it into [`MapPosition`](super::mapposition::MapPosition) before overlays
//! are synchronized.

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;
use rustc_hash::FxHashMap;

/// A named acceleration force that can be toggled on/off.
#[derive(Clone, Copy, Debug)]
pub struct AccelerationForce {
    /// The acceleration vector in world units per second squared.
    pub value: Vector2,
    pub enabled: bool,
}

/// Velocity plus named acceleration forces.
///
/// `frozen` bodies are skipped by the movement system; their position can
/// still be set directly.
#[derive(Component, Clone, Debug)]
pub struct RigidBody {
    /// Current velocity in world units per second.
    pub velocity: Vector2,
    /// The total acceleration is the sum of all enabled forces.
    pub forces: FxHashMap<String, AccelerationForce>,
    pub frozen: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    pub fn new() -> Self {
        Self {
            velocity: Vector2::zero(),
            forces: FxHashMap::default(),
            frozen: false,
        }
    }

    /// Add or update a named acceleration force (enabled by default).
    pub fn add_force(&mut self, name: &str, value: Vector2) {
        self.forces.insert(
            name.to_string(),
            AccelerationForce {
                value,
                enabled: true,
            },
        );
    }

    /// Enable or disable a specific force by name.
    /// Returns false if the force doesn't exist.
    pub fn set_force_enabled(&mut self, name: &str, enabled: bool) -> bool {
        if let Some(force) = self.forces.get_mut(name) {
            force.enabled = enabled;
            true
        } else {
            false
        }
    }

    pub fn total_acceleration(&self) -> Vector2 {
        self.forces
            .values()
            .filter(|f| f.enabled)
            .fold(Vector2::zero(), |acc, f| acc + f.value)
    }

    pub fn set_velocity(&mut self, velocity: Vector2) {
        self.velocity = velocity;
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }
}
