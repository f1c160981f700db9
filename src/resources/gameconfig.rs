//! Game configuration resource.
//!
//! Settings are loaded from an INI file; anything missing keeps its default,
//! and a missing file leaves every default in place.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 960
//! height = 540
//! target_fps = 60
//!
//! [avatar]
//! asset_root = .
//! animation = /assets/rive/avatar.json
//! artboard = Avatar
//! state_machine = AvatarSM
//! view_model = AvatarVM
//!
//! [textures]
//! resample = true
//! latest_request_wins = true
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::runtime::AnimationSource;

const DEFAULT_WINDOW_WIDTH: u32 = 960;
const DEFAULT_WINDOW_HEIGHT: u32 = 540;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_ASSET_ROOT: &str = ".";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub target_fps: u32,
    /// Directory that absolute asset URLs (`/assets/...`) are served from.
    pub asset_root: PathBuf,
    /// Animation asset and the artboard, state machine and view model to use.
    pub animation: AnimationSource,
    /// Decode and resample fetched textures to their authored size.
    pub resample_textures: bool,
    /// Drop stale same-property image completions (`false` applies them in arrival order).
    pub latest_request_wins: bool,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            animation: AnimationSource::default(),
            resample_textures: true,
            latest_request_wins: true,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }

        // [avatar] section
        if let Some(root) = config.get("avatar", "asset_root") {
            self.asset_root = PathBuf::from(root);
        }
        if let Some(path) = config.get("avatar", "animation") {
            self.animation.path = path;
        }
        if let Some(artboard) = config.get("avatar", "artboard") {
            self.animation.artboard = artboard;
        }
        if let Some(sm) = config.get("avatar", "state_machine") {
            self.animation.state_machine = sm;
        }
        if let Some(vm) = config.get("avatar", "view_model") {
            self.animation.view_model = vm;
        }

        // [textures] section
        if let Some(resample) = config.getbool("textures", "resample").ok().flatten() {
            self.resample_textures = resample;
        }
        if let Some(latest) = config
            .getbool("textures", "latest_request_wins")
            .ok()
            .flatten()
        {
            self.latest_request_wins = latest;
        }

        info!(
            "Loaded config: {}x{} window, fps={}, animation={} ({}/{}), resample={}, latest_request_wins={}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.animation.path,
            self.animation.artboard,
            self.animation.state_machine,
            self.resample_textures,
            self.latest_request_wins
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));

        config.set(
            "avatar",
            "asset_root",
            Some(self.asset_root.to_string_lossy().into_owned()),
        );
        config.set("avatar", "animation", Some(self.animation.path.clone()));
        config.set("avatar", "artboard", Some(self.animation.artboard.clone()));
        config.set(
            "avatar",
            "state_machine",
            Some(self.animation.state_machine.clone()),
        );
        config.set("avatar", "view_model", Some(self.animation.view_model.clone()));

        config.set(
            "textures",
            "resample",
            Some(self.resample_textures.to_string()),
        );
        config.set(
            "textures",
            "latest_request_wins",
            Some(self.latest_request_wins.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}
