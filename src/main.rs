//! Paperdoll demo host.
//!
//! Opens a raylib window, spawns one avatar standing on a floor with gravity
//! and maps keys onto the avatar command surface:
//!
//! - **Left / Right** – previous / next head, then wave (`hi`)
//! - **Up / Down** – previous / next torso, then wave
//! - **+ / -** – grow / shrink the avatar
//! - **J** – jab
//! - **Space** – jump
//! - **F11** – toggle collider and overlay outlines
//! - **Escape** – shut the scene down and exit
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --head 2 --torso 1 --scale 1.5
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::Parser;
use raylib::prelude::*;

use paperdoll::avatar::{AvatarHandle, AvatarSpawn};
use paperdoll::components::boxcollider::BoxCollider;
use paperdoll::components::look::AvatarLook;
use paperdoll::components::mapposition::MapPosition;
use paperdoll::components::overlay::AnimationName;
use paperdoll::components::rigidbody::RigidBody;
use paperdoll::events::avatar::{AvatarCmd, SceneShutdownEvent};
use paperdoll::events::switchdebug::SwitchDebugEvent;
use paperdoll::game;
use paperdoll::resources::assetbridge::{setup_assets, shutdown_assets};
use paperdoll::resources::gameconfig::GameConfig;
use paperdoll::systems::framesync::frame_sync_system;
use paperdoll::systems::movement::movement_system;
use paperdoll::systems::render::{
    OverlayTextures, render_debug_ui, render_pass, upload_overlay_textures,
};
use paperdoll::systems::time::update_world_time;

const GRAVITY: f32 = 1400.0;
const JUMP_SPEED: f32 = 560.0;
const SCALE_STEP: f32 = 0.25;
const FLOOR_MARGIN: f32 = 80.0;

/// Paperdoll avatar demo
#[derive(Parser)]
#[command(version, about = "Avatar rendering and animation bridge demo")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Initial head catalog index (wraps).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    head: i64,

    /// Initial torso catalog index (wraps).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    torso: i64,

    /// Initial visual scale.
    #[arg(long, default_value_t = 2.0)]
    scale: f32,
}

/// World-space y of the floor surface.
#[derive(Resource, Clone, Copy)]
struct Floor(f32);

/// Keep bodies on top of the floor.
fn floor_system(floor: Res<Floor>, mut query: Query<(&mut MapPosition, &BoxCollider, &mut RigidBody)>) {
    for (mut position, collider, mut rigidbody) in query.iter_mut() {
        let (_, max) = collider.aabb(position.pos);
        let overshoot = max.y - floor.0;
        if overshoot > 0.0 {
            position.pos.y -= overshoot;
            if rigidbody.velocity.y > 0.0 {
                rigidbody.velocity.y = 0.0;
            }
        }
    }
}

fn on_floor(world: &World, avatar: AvatarHandle) -> bool {
    let floor = world.resource::<Floor>().0;
    avatar
        .body(world)
        .is_some_and(|(position, collider)| (collider.aabb(position.pos).1.y - floor).abs() < 0.5)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        log::info!("{}; using defaults", e);
    }
    let (window_width, window_height) = config.window_size();

    let (mut rl, thread) = raylib::init()
        .size(window_width as i32, window_height as i32)
        .title("Paperdoll")
        .build();
    rl.set_target_fps(config.target_fps);
    // Escape is handled as a scene shutdown.
    rl.set_exit_key(None);

    // --------------- ECS world + resources ---------------
    let loader = game::asset_loader(&config);
    let mut world = game::build_world(config);
    setup_assets(&mut world, loader);
    let floor = window_height as f32 - FLOOR_MARGIN;
    world.insert_resource(Floor(floor));

    let mut head = cli.head;
    let mut torso = cli.torso;
    let mut scale = cli.scale;

    let avatar = AvatarHandle::spawn(
        &mut world,
        AvatarSpawn {
            position: Vector2::new(window_width as f32 * 0.5, floor - 100.0),
            look: AvatarLook::head(head).with_torso(torso),
            ..Default::default()
        },
    );
    avatar.set_visual_scale(&mut world, scale);
    if let Some(mut rb) = world.get_mut::<RigidBody>(avatar.entity()) {
        rb.add_force("gravity", Vector2::new(0.0, GRAVITY));
    }

    let mut update = game::frame_schedule();
    update.add_systems(floor_system.after(movement_system).before(frame_sync_system));

    let mut textures = OverlayTextures::new();
    let mut airborne = false;

    // --------------- Main loop ---------------
    while !rl.window_should_close() {
        let dt = rl.get_frame_time();
        update_world_time(&mut world, dt);

        if rl.is_key_pressed(KeyboardKey::KEY_ESCAPE) {
            world.trigger(SceneShutdownEvent {});
            break;
        }
        if rl.is_key_pressed(KeyboardKey::KEY_F11) {
            world.trigger(SwitchDebugEvent {});
        }

        let mut look_change = None;
        if rl.is_key_pressed(KeyboardKey::KEY_LEFT) {
            head -= 1;
            look_change = Some(AvatarLook::head(head));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_RIGHT) {
            head += 1;
            look_change = Some(AvatarLook::head(head));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_UP) {
            torso -= 1;
            look_change = Some(AvatarLook::torso(torso));
        }
        if rl.is_key_pressed(KeyboardKey::KEY_DOWN) {
            torso += 1;
            look_change = Some(AvatarLook::torso(torso));
        }
        if let Some(look) = look_change {
            world.write_message(AvatarCmd::SetLook {
                avatar: avatar.entity(),
                look,
            });
            world.write_message(AvatarCmd::Play {
                avatar: avatar.entity(),
                name: AnimationName::Hi,
                looped: false,
            });
        }

        if rl.is_key_pressed(KeyboardKey::KEY_EQUAL) || rl.is_key_pressed(KeyboardKey::KEY_KP_ADD)
        {
            scale += SCALE_STEP;
            world.write_message(AvatarCmd::SetVisualScale {
                avatar: avatar.entity(),
                scale,
            });
        }
        if rl.is_key_pressed(KeyboardKey::KEY_MINUS)
            || rl.is_key_pressed(KeyboardKey::KEY_KP_SUBTRACT)
        {
            scale = (scale - SCALE_STEP).max(SCALE_STEP);
            world.write_message(AvatarCmd::SetVisualScale {
                avatar: avatar.entity(),
                scale,
            });
        }
        if rl.is_key_pressed(KeyboardKey::KEY_J) {
            world.write_message(AvatarCmd::PlayNamed {
                avatar: avatar.entity(),
                name: "jab".to_string(),
            });
        }
        if rl.is_key_pressed(KeyboardKey::KEY_SPACE) && on_floor(&world, avatar) {
            if let Some(mut rb) = world.get_mut::<RigidBody>(avatar.entity()) {
                rb.velocity.y = -JUMP_SPEED;
            }
            airborne = true;
            avatar.play(&mut world, AnimationName::Jump, false);
        }

        update.run(&mut world);

        if airborne {
            let falling = world
                .get::<RigidBody>(avatar.entity())
                .is_some_and(|rb| rb.velocity.y > 0.0);
            if on_floor(&world, avatar) {
                airborne = false;
                avatar.play(&mut world, AnimationName::Idle, true);
            } else if falling {
                avatar.play(&mut world, AnimationName::Fall, false);
            }
        }

        upload_overlay_textures(&mut world, &mut rl, &thread, &mut textures);

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::RAYWHITE);
        d.draw_rectangle(
            0,
            floor as i32,
            window_width as i32,
            FLOOR_MARGIN as i32,
            Color::DARKGRAY,
        );
        render_pass(&mut world, &mut d, &textures);
        render_debug_ui(&mut world, &mut d);
        d.draw_text(
            "arrows: look  +/-: scale  J: jab  space: jump  F11: debug  esc: quit",
            10,
            window_height as i32 - 24,
            14,
            Color::LIGHTGRAY,
        );
    }

    shutdown_assets(&mut world);
}
