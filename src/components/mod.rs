//! ECS components for avatar bodies.
//!
//! Submodules overview:
//! - [`avatar`] – the avatar command surface, bounding box and visual scale
//! - [`boxcollider`] – axis-aligned rectangular collider for collision checks
//! - [`framesync`] – marker subscribing a body to per-frame overlay tracking
//! - [`look`] – partial, mergeable head/torso selection
//! - [`mapposition`] – world-space position (pivot) for an entity
//! - [`overlay`] – the animation overlay state machine and its off-screen surface
//! - [`rigidbody`] – kinematic body storing velocity and named forces

pub mod avatar;
pub mod boxcollider;
pub mod framesync;
pub mod look;
pub mod mapposition;
pub mod overlay;
pub mod rigidbody;
