//! Paperdoll: avatar rendering and animation bridge for minigames.
//!
//! An avatar is a collision body in a `bevy_ecs` world plus a vector
//! animation overlay rendered off-screen and composited over the game view.
//! Scenes drive it through a small command surface (play, set look, rescale,
//! destroy) either directly with [`avatar::AvatarHandle`] or by writing
//! [`events::avatar::AvatarCmd`] messages.
//!
//! Loading and texture customization run on a background worker
//! ([`resources::assetbridge`]); their results are resumed on the main thread.

pub mod avatar;
pub mod components;
pub mod events;
pub mod game;
pub mod pipeline;
pub mod resources;
pub mod runtime;
pub mod systems;
