//! ECS resources made available to systems.
//!
//! Overview
//! - `assetbridge` – channels and join handle for the background asset worker
//! - `avatarsettings` – animation source and image request policy for new avatars
//! - `debugmode` – presence toggles debug outlines
//! - `gameconfig` – INI-backed window, avatar and texture settings
//! - `worldtime` – simulation time and delta
pub mod assetbridge;
pub mod avatarsettings;
pub mod debugmode;
pub mod gameconfig;
pub mod worldtime;
