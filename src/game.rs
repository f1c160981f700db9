//! World setup and the per-frame schedule.
//!
//! ```ignore
//! let config = GameConfig::new();
//! let mut world = game::build_world(config.clone());
//! setup_assets(&mut world, game::asset_loader(&config));
//! let mut schedule = game::frame_schedule();
//! loop {
//!     update_world_time(&mut world, dt);
//!     schedule.run(&mut world);
//! }
//! ```

use std::sync::Arc;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;

use crate::events::avatar::AvatarCmd;
use crate::events::switchdebug::switch_debug_observer;
use crate::pipeline::catalog::ImageCatalog;
use crate::pipeline::fetch::DirSource;
use crate::pipeline::{DecodePath, TexturePipeline};
use crate::resources::avatarsettings::AvatarSettings;
use crate::resources::gameconfig::GameConfig;
use crate::resources::worldtime::WorldTime;
use crate::runtime::paperdoll::PaperDollRuntime;
use crate::systems::assets::{AssetLoader, apply_asset_completions};
use crate::systems::avatar::{apply_avatar_commands, observe_scene_shutdown};
use crate::systems::framesync::frame_sync_system;
use crate::systems::movement::movement_system;
use crate::systems::overlay::advance_overlays;

/// Create a world with every resource and observer the avatar systems need.
///
/// The asset bridge is not included; add it with
/// [`setup_assets`](crate::resources::assetbridge::setup_assets) or insert a
/// detached [`AssetBridge`](crate::resources::assetbridge::AssetBridge).
pub fn build_world(config: GameConfig) -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(AvatarSettings::from_config(&config));
    world.insert_resource(Messages::<AvatarCmd>::default());
    world.insert_resource(config);

    world.spawn(Observer::new(observe_scene_shutdown));
    world.spawn(Observer::new(switch_debug_observer));
    world.flush();
    world
}

/// Loader serving assets from the configured directory through the paper-doll runtime.
pub fn asset_loader(config: &GameConfig) -> AssetLoader {
    let decode_path = if config.resample_textures {
        DecodePath::Resample
    } else {
        DecodePath::Raw
    };
    AssetLoader::new(
        TexturePipeline::new(
            Arc::new(DirSource::new(&config.asset_root)),
            Arc::new(PaperDollRuntime),
            Arc::new(ImageCatalog::avatar()),
        )
        .with_decode_path(decode_path),
    )
}

/// Per-frame schedule. The physics step runs first so frame sync always
/// sees this frame's positions.
pub fn frame_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            movement_system,
            apply_asset_completions,
            apply_avatar_commands,
            frame_sync_system,
            advance_overlays,
        )
            .chain(),
    );
    schedule
}
