//! Engine systems.
//!
//! Submodules overview
//! - [`assets`] – the asset worker thread and completion routing
//! - [`avatar`] – apply avatar command messages and scene shutdown
//! - [`framesync`] – move overlays onto their bodies after the physics step
//! - [`movement`] – integrate positions from rigid body velocities and time
//! - [`overlay`] – advance overlay runtimes and redraw their surfaces
//! - [`render`] – upload overlay surfaces and draw them using Raylib
//! - [`time`] – update simulation time and delta

pub mod assets;
pub mod avatar;
pub mod framesync;
pub mod movement;
pub mod overlay;
pub mod render;
pub mod time;
