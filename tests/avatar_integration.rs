//! Avatar integration tests: a real `World`, the frame schedule, the
//! paper-doll runtime and an in-memory asset source. Asset jobs go through a
//! detached bridge so each test decides when (and in which order) they finish.

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use image::{ImageFormat, Rgba, RgbaImage};
use raylib::prelude::Vector2;

use paperdoll::avatar::{AvatarHandle, AvatarSpawn};
use paperdoll::components::avatar::{Avatar, BoundingBox, MIN_VISUAL_SCALE};
use paperdoll::components::boxcollider::BoxCollider;
use paperdoll::components::framesync::FrameSync;
use paperdoll::components::look::AvatarLook;
use paperdoll::components::overlay::{
    AnimationName, ImageRequestPolicy, MAX_SURFACE_EDGE, MOTION_INPUTS, OverlayState,
};
use paperdoll::components::rigidbody::RigidBody;
use paperdoll::events::assets::AssetJob;
use paperdoll::events::avatar::{AvatarCmd, SceneShutdownEvent};
use paperdoll::game;
use paperdoll::pipeline::TexturePipeline;
use paperdoll::pipeline::catalog::{HEAD_IMAGE, ImageCatalog, TORSO_IMAGE};
use paperdoll::pipeline::fetch::MemorySource;
use paperdoll::resources::assetbridge::{AssetBridge, JobPort, shutdown_assets};
use paperdoll::resources::avatarsettings::AvatarSettings;
use paperdoll::resources::gameconfig::GameConfig;
use paperdoll::resources::worldtime::WorldTime;
use paperdoll::runtime::InputValue;
use paperdoll::runtime::paperdoll::PaperDollRuntime;
use paperdoll::systems::assets::AssetLoader;

const MANIFEST: &str = include_str!("../assets/rive/avatar.json");
const MANIFEST_URL: &str = "/assets/rive/avatar.json";

const GREEN: [u8; 4] = [0, 255, 0, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const GRAY: [u8; 4] = [128, 128, 128, 255];

fn png(color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(4, 4, Rgba(color));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Manifest plus every catalog image. Head 0 is green, head 1 red, head 2
/// blue; everything else is gray.
fn memory_source(with_manifest: bool) -> MemorySource {
    let catalog = ImageCatalog::avatar();
    let mut source = MemorySource::new();
    if with_manifest {
        source.insert(MANIFEST_URL, MANIFEST.as_bytes().to_vec());
    }
    for property in catalog.properties() {
        for (i, url) in property.urls.iter().enumerate() {
            let color = match (property.name.as_str(), i) {
                (HEAD_IMAGE, 0) => GREEN,
                (HEAD_IMAGE, 1) => RED,
                (HEAD_IMAGE, 2) => BLUE,
                _ => GRAY,
            };
            source.insert(url.clone(), png(color));
        }
    }
    source
}

fn loader(source: MemorySource) -> AssetLoader {
    AssetLoader::new(TexturePipeline::new(
        Arc::new(source),
        Arc::new(PaperDollRuntime),
        Arc::new(ImageCatalog::avatar()),
    ))
}

struct Harness {
    world: World,
    port: JobPort,
    loader: AssetLoader,
    schedule: Schedule,
}

impl Harness {
    fn new() -> Self {
        Self::with_source(memory_source(true))
    }

    fn with_source(source: MemorySource) -> Self {
        let mut world = game::build_world(GameConfig::new());
        let (bridge, port) = AssetBridge::detached();
        world.insert_resource(bridge);
        Self {
            world,
            port,
            loader: loader(source),
            schedule: game::frame_schedule(),
        }
    }

    fn tick(&mut self) {
        self.schedule.run(&mut self.world);
    }

    /// Finish every queued job in submission order, then run one frame.
    fn settle(&mut self) -> usize {
        let n = self.port.process_pending(&self.loader);
        self.tick();
        n
    }

    fn spawn(&mut self, spawn: AvatarSpawn) -> AvatarHandle {
        AvatarHandle::spawn(&mut self.world, spawn)
    }

    /// Spawn and complete only the animation load.
    fn spawn_ready(&mut self, spawn: AvatarSpawn) -> AvatarHandle {
        let avatar = self.spawn(spawn);
        let jobs = self.port.pending();
        assert_eq!(jobs.len(), 1);
        for job in jobs {
            let done = self.loader.process(job).unwrap();
            self.port.complete(done);
        }
        self.tick();
        assert_eq!(avatar.state(&self.world), OverlayState::Ready);
        avatar
    }

    fn avatar(&self, handle: AvatarHandle) -> &Avatar {
        self.world.get::<Avatar>(handle.entity()).unwrap()
    }

    fn input(&self, handle: AvatarHandle, name: &str) -> Option<InputValue> {
        self.avatar(handle).overlay()?.input_value(name)
    }

    fn collider(&self, handle: AvatarHandle) -> BoxCollider {
        handle.body(&self.world).unwrap().1
    }
}

fn texture_jobs(jobs: &[AssetJob]) -> Vec<(String, i64)> {
    jobs.iter()
        .filter_map(|j| match j {
            AssetJob::FetchTexture {
                property, index, ..
            } => Some((property.clone(), *index)),
            _ => None,
        })
        .collect()
}

fn active_motions(h: &Harness, avatar: AvatarHandle) -> Vec<&'static str> {
    MOTION_INPUTS
        .into_iter()
        .filter(|m| h.input(avatar, m) == Some(InputValue::Boolean(true)))
        .collect()
}

/// Artboard-sized avatar so head pixels map 1:1 onto the surface.
fn full_size() -> AvatarSpawn {
    AvatarSpawn {
        bbox: BoundingBox::new(460, 900),
        ..Default::default()
    }
}

fn head_pixel(h: &Harness, avatar: AvatarHandle) -> [u8; 4] {
    let surface = h.avatar(avatar).overlay().unwrap().surface().unwrap();
    surface.get_pixel(230, 85).0
}

/// Resampling may be off by a rounding step.
fn close_to(pixel: [u8; 4], expected: [u8; 4]) -> bool {
    pixel
        .iter()
        .zip(expected)
        .all(|(a, b)| a.abs_diff(b) <= 2)
}

#[test]
fn latched_commands_flush_once_look_first() {
    let mut h = Harness::new();
    let avatar = h.spawn(AvatarSpawn::default());
    assert_eq!(avatar.state(&h.world), OverlayState::Loading);

    avatar.play(&mut h.world, AnimationName::Run, true);
    avatar.play(&mut h.world, AnimationName::Win, false);
    avatar.set_look(&mut h.world, &AvatarLook::head(1));
    avatar.set_look(&mut h.world, &AvatarLook::torso(2));
    assert_eq!(
        h.avatar(avatar).pending_animation(),
        Some(AnimationName::Win)
    );
    assert_eq!(
        avatar.look(&h.world),
        Some(AvatarLook::head(1).with_torso(2))
    );

    let jobs = h.port.pending();
    assert!(matches!(jobs.as_slice(), [AssetJob::LoadAnimation { .. }]));
    for job in jobs {
        h.port.complete(h.loader.process(job).unwrap());
    }
    h.tick();

    assert_eq!(avatar.state(&h.world), OverlayState::Ready);
    assert_eq!(h.avatar(avatar).pending_animation(), None);
    assert_eq!(active_motions(&h, avatar), vec!["Win"]);
    assert_eq!(
        texture_jobs(&h.port.pending()),
        vec![(HEAD_IMAGE.to_string(), 1), (TORSO_IMAGE.to_string(), 2)]
    );

    // Nothing is replayed on later frames.
    h.tick();
    h.tick();
    assert!(h.port.pending().is_empty());
}

#[test]
fn new_avatar_starts_idle() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn::default());
    assert_eq!(active_motions(&h, avatar), vec!["Idle"]);
}

#[test]
fn scale_before_ready_then_single_head_request() {
    let mut h = Harness::new();
    let avatar = h.spawn(AvatarSpawn::default());
    avatar.set_visual_scale(&mut h.world, 2.0);
    avatar.set_look(&mut h.world, &AvatarLook::head(0));

    let jobs = h.port.pending();
    assert_eq!(jobs.len(), 1);
    for job in jobs {
        h.port.complete(h.loader.process(job).unwrap());
    }
    h.tick();

    let collider = h.collider(avatar);
    assert_eq!(collider.size, Vector2::new(56.0, 92.0));
    assert_eq!(
        h.avatar(avatar).overlay().unwrap().resolution(),
        (56, 92)
    );
    assert_eq!(
        texture_jobs(&h.port.pending()),
        vec![(HEAD_IMAGE.to_string(), 0)]
    );
}

#[test]
fn motion_inputs_are_exclusive_and_triggers_count() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn::default());

    for name in AnimationName::ALL {
        avatar.play(&mut h.world, name, false);
        assert_eq!(active_motions(&h, avatar).len(), 1, "after {name}");
    }
    avatar.play(&mut h.world, AnimationName::Hurt, false);
    avatar.play(&mut h.world, AnimationName::Jab, false);
    avatar.play_named(&mut h.world, "JAB");
    avatar.play_named(&mut h.world, "moonwalk");
    assert_eq!(active_motions(&h, avatar), vec!["Hurt"]);
    assert_eq!(
        h.input(avatar, "Jab"),
        Some(InputValue::Trigger { fired: 3 })
    );
    assert_eq!(h.input(avatar, "Hi"), Some(InputValue::Trigger { fired: 1 }));
}

#[test]
fn set_look_after_ready_requests_every_merged_field() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn {
        look: AvatarLook::torso(4),
        ..Default::default()
    });
    assert_eq!(
        texture_jobs(&h.port.pending()),
        vec![(TORSO_IMAGE.to_string(), 4)]
    );

    avatar.set_look(&mut h.world, &AvatarLook::head(-1));
    assert_eq!(
        texture_jobs(&h.port.pending()),
        vec![(HEAD_IMAGE.to_string(), -1), (TORSO_IMAGE.to_string(), 4)]
    );
}

#[test]
fn texture_completion_is_drawn() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(full_size());
    avatar.set_look(&mut h.world, &AvatarLook::head(0));
    assert_eq!(h.settle(), 1);
    assert!(close_to(head_pixel(&h, avatar), GREEN));
}

#[test]
fn stale_head_completion_is_dropped() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(full_size());
    avatar.set_look(&mut h.world, &AvatarLook::head(1));
    avatar.set_look(&mut h.world, &AvatarLook::head(2));

    let mut done: Vec<_> = h
        .port
        .pending()
        .into_iter()
        .filter_map(|job| h.loader.process(job))
        .collect();
    assert_eq!(done.len(), 2);
    // Newest (blue) finishes first, the older red one last.
    done.reverse();
    for d in done {
        h.port.complete(d);
    }
    h.tick();
    assert!(close_to(head_pixel(&h, avatar), BLUE));
}

#[test]
fn legacy_policy_lets_last_completion_win() {
    let mut h = Harness::new();
    h.world.insert_resource(AvatarSettings {
        policy: ImageRequestPolicy::LastCompletionWins,
        ..Default::default()
    });
    let avatar = h.spawn_ready(full_size());
    avatar.set_look(&mut h.world, &AvatarLook::head(1));
    avatar.set_look(&mut h.world, &AvatarLook::head(2));

    let mut done: Vec<_> = h
        .port
        .pending()
        .into_iter()
        .filter_map(|job| h.loader.process(job))
        .collect();
    done.reverse();
    for d in done {
        h.port.complete(d);
    }
    h.tick();
    assert!(close_to(head_pixel(&h, avatar), RED));
}

#[test]
fn scale_keeps_center_and_clamps() {
    let mut h = Harness::new();
    let avatar = h.spawn(AvatarSpawn {
        position: Vector2::new(100.0, 200.0),
        ..Default::default()
    });
    let center = |h: &Harness| {
        let (pos, collider) = avatar.body(&h.world).unwrap();
        collider.center(pos.pos)
    };
    assert_eq!(center(&h), Vector2::new(100.0, 200.0));

    avatar.set_visual_scale(&mut h.world, 1.5);
    assert_eq!(h.collider(avatar).size, Vector2::new(42.0, 69.0));
    assert_eq!(center(&h), Vector2::new(100.0, 200.0));

    avatar.set_visual_scale(&mut h.world, 0.0);
    assert_eq!(h.collider(avatar).size, Vector2::new(1.0, 1.0));
    assert_eq!(h.avatar(avatar).visual_scale().get(), MIN_VISUAL_SCALE);
    let zero = h.collider(avatar);

    avatar.set_visual_scale(&mut h.world, -4.0);
    assert_eq!(h.collider(avatar), zero);
    assert_eq!(center(&h), Vector2::new(100.0, 200.0));
}

#[test]
fn scale_change_after_ready_resizes_surface() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn::default());
    h.tick();
    avatar.set_visual_scale(&mut h.world, 3.0);
    h.tick();
    let overlay = h.avatar(avatar).overlay().unwrap();
    assert_eq!(overlay.resolution(), (84, 138));
    assert_eq!(overlay.surface().unwrap().dimensions(), (84, 138));
}

#[test]
fn huge_scale_after_ready_is_capped() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn {
        position: Vector2::new(300.0, 400.0),
        ..Default::default()
    });
    avatar.set_visual_scale(&mut h.world, 1e9);
    h.tick();

    let max = BoundingBox::default().max_scale();
    assert_eq!(h.avatar(avatar).visual_scale().get(), max);
    let overlay = h.avatar(avatar).overlay().unwrap();
    let (w, hgt) = overlay.resolution();
    assert_eq!(hgt, MAX_SURFACE_EDGE);
    assert!(w < MAX_SURFACE_EDGE);
    assert_eq!(overlay.surface().unwrap().dimensions(), (w, hgt));
    assert_eq!(h.collider(avatar).size, Vector2::new(w as f32, hgt as f32));
    let (pos, collider) = avatar.body(&h.world).unwrap();
    assert_eq!(collider.center(pos.pos), Vector2::new(300.0, 400.0));
}

#[test]
fn failed_texture_keeps_previous_head() {
    let mut source = memory_source(true);
    source.insert("/assets/avatar/heads/head_04.png", b"not a png".to_vec());
    let mut h = Harness::with_source(source);
    let avatar = h.spawn_ready(full_size());

    avatar.set_look(&mut h.world, &AvatarLook::head(0));
    h.settle();
    assert!(close_to(head_pixel(&h, avatar), GREEN));

    avatar.set_look(&mut h.world, &AvatarLook::head(4));
    assert_eq!(h.settle(), 1);
    assert_eq!(avatar.state(&h.world), OverlayState::Ready);
    assert!(close_to(head_pixel(&h, avatar), GREEN));

    // The next good request still lands.
    avatar.set_look(&mut h.world, &AvatarLook::head(2));
    h.settle();
    assert!(close_to(head_pixel(&h, avatar), BLUE));
}

#[test]
fn frame_sync_follows_body_after_physics() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn {
        position: Vector2::new(50.0, 60.0),
        ..Default::default()
    });
    h.world.resource_mut::<WorldTime>().delta = 0.5;
    h.world
        .get_mut::<RigidBody>(avatar.entity())
        .unwrap()
        .set_velocity(Vector2::new(10.0, -4.0));

    h.tick();
    let overlay = h.avatar(avatar).overlay().unwrap();
    assert_eq!(overlay.position(), Vector2::new(55.0, 58.0));
    assert_eq!(overlay.resolution(), (28, 46));
    assert_eq!(overlay.top_left(), Vector2::new(41.0, 35.0));
}

#[test]
fn destroy_is_idempotent_and_silences_every_call() {
    let mut h = Harness::new();
    let avatar = h.spawn(AvatarSpawn::default());
    let load = h.port.pending();

    assert!(avatar.destroy(&mut h.world));
    assert!(!avatar.destroy(&mut h.world));
    assert!(h.world.get_entity(avatar.entity()).is_err());
    assert_eq!(avatar.state(&h.world), OverlayState::Destroyed);
    assert!(avatar.body(&h.world).is_none());

    avatar.play(&mut h.world, AnimationName::Run, true);
    avatar.set_look(&mut h.world, &AvatarLook::head(3));
    avatar.set_visual_scale(&mut h.world, 2.0);
    assert_eq!(avatar.look(&h.world), None);

    // The in-flight load lands after destruction and is dropped.
    for job in load {
        h.port.complete(h.loader.process(job).unwrap());
    }
    h.tick();
    assert!(h.port.pending().is_empty());
}

#[test]
fn destroy_after_ready_drops_inflight_textures() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn::default());
    avatar.set_look(&mut h.world, &AvatarLook::head(2).with_torso(1));
    let jobs = h.port.pending();
    assert_eq!(jobs.len(), 2);

    assert!(avatar.destroy(&mut h.world));
    for job in jobs {
        h.port.complete(h.loader.process(job).unwrap());
    }
    h.tick();
    assert!(h.world.query::<&Avatar>().iter(&h.world).next().is_none());
}

#[test]
fn destroy_message_stops_frame_sync() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn::default());
    assert!(h.world.get::<FrameSync>(avatar.entity()).is_some());
    h.world.write_message(AvatarCmd::Destroy {
        avatar: avatar.entity(),
    });
    h.tick();
    assert!(h.world.get::<FrameSync>(avatar.entity()).is_none());
    assert_eq!(avatar.state(&h.world), OverlayState::Destroyed);
}

#[test]
fn load_failure_keeps_commands_latched() {
    let mut h = Harness::with_source(memory_source(false));
    let avatar = h.spawn(AvatarSpawn::default());
    avatar.play(&mut h.world, AnimationName::Jump, false);
    assert_eq!(h.settle(), 1);

    assert_eq!(avatar.state(&h.world), OverlayState::Loading);
    assert_eq!(
        h.avatar(avatar).pending_animation(),
        Some(AnimationName::Jump)
    );
    avatar.set_look(&mut h.world, &AvatarLook::head(1));
    assert!(h.port.pending().is_empty());
    assert!(avatar.destroy(&mut h.world));
}

#[test]
fn missing_view_model_disables_customization_only() {
    let mut h = Harness::new();
    let mut settings = AvatarSettings::default();
    settings.source.view_model = "NoSuchVM".to_string();
    h.world.insert_resource(settings);

    let avatar = h.spawn_ready(AvatarSpawn {
        look: AvatarLook::head(1),
        ..Default::default()
    });
    assert!(!h.avatar(avatar).overlay().unwrap().is_bound());
    assert!(h.port.pending().is_empty());

    avatar.set_look(&mut h.world, &AvatarLook::torso(0));
    assert!(h.port.pending().is_empty());
    avatar.play(&mut h.world, AnimationName::Run, true);
    assert_eq!(active_motions(&h, avatar), vec!["Run"]);
}

#[test]
fn avatar_commands_apply_in_order() {
    let mut h = Harness::new();
    let avatar = h.spawn_ready(AvatarSpawn::default());
    let e = avatar.entity();

    h.world.write_message(AvatarCmd::Play {
        avatar: e,
        name: AnimationName::Jump,
        looped: false,
    });
    h.world.write_message(AvatarCmd::PlayNamed {
        avatar: e,
        name: "fall".to_string(),
    });
    h.world.write_message(AvatarCmd::PlayNamed {
        avatar: e,
        name: "backflip".to_string(),
    });
    h.world.write_message(AvatarCmd::SetLook {
        avatar: e,
        look: AvatarLook::head(5),
    });
    h.world.write_message(AvatarCmd::SetVisualScale {
        avatar: e,
        scale: 2.0,
    });
    h.tick();

    assert_eq!(active_motions(&h, avatar), vec!["Fall"]);
    assert_eq!(h.collider(avatar).size, Vector2::new(56.0, 92.0));
    assert_eq!(
        texture_jobs(&h.port.pending()),
        vec![(HEAD_IMAGE.to_string(), 5)]
    );

    // Drained: the next frame applies nothing again.
    h.tick();
    assert!(h.port.pending().is_empty());
}

#[test]
fn scene_shutdown_destroys_every_avatar() {
    let mut h = Harness::new();
    let a = h.spawn_ready(AvatarSpawn::default());
    let b = h.spawn(AvatarSpawn::default());

    h.world.trigger(SceneShutdownEvent {});
    h.world.flush();

    assert_eq!(a.state(&h.world), OverlayState::Destroyed);
    assert_eq!(b.state(&h.world), OverlayState::Destroyed);
    assert!(h.world.get_entity(a.entity()).is_err());
    assert!(h.world.get_entity(b.entity()).is_err());

    // Pending load for `b` completes into nothing.
    h.settle();
}

#[test]
fn spawn_without_bridge_stays_uninitialized() {
    let mut world = game::build_world(GameConfig::new());
    let avatar = AvatarHandle::spawn(&mut world, AvatarSpawn::default());
    assert_eq!(avatar.state(&world), OverlayState::Uninitialized);
    avatar.play(&mut world, AnimationName::Win, false);
    assert_eq!(
        world.get::<Avatar>(avatar.entity()).unwrap().pending_animation(),
        Some(AnimationName::Win)
    );
    assert!(avatar.destroy(&mut world));
}

#[test]
fn worker_thread_loads_and_binds() {
    let mut world = game::build_world(GameConfig::new());
    world.insert_resource(AssetBridge::spawn(loader(memory_source(true))));
    let mut schedule = game::frame_schedule();

    let avatar = AvatarHandle::spawn(
        &mut world,
        AvatarSpawn {
            look: AvatarLook::head(2),
            ..full_size()
        },
    );

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut drawn = false;
    while Instant::now() < deadline {
        schedule.run(&mut world);
        let pixel = world
            .get::<Avatar>(avatar.entity())
            .and_then(|a| a.overlay())
            .and_then(|o| o.surface())
            .map(|s| s.get_pixel(230, 85).0);
        if pixel.is_some_and(|p| close_to(p, BLUE)) {
            drawn = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(drawn, "head image never reached the surface");
    assert_eq!(avatar.state(&world), OverlayState::Ready);

    shutdown_assets(&mut world);
    assert!(!world.contains_resource::<AssetBridge>());
}
