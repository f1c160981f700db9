//! Event types and observers.
//!
//! Submodules:
//! - [`assets`] – jobs for the asset worker and the completions it sends back
//! - [`avatar`] – avatar command messages and the scene shutdown event
//! - [`switchdebug`] – toggle collider and overlay outlines on/off
pub mod assets;
pub mod avatar;
pub mod switchdebug;
