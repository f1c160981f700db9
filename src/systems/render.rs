//! Overlay compositing with raylib.
//!
//! Overlay surfaces live in CPU memory; [`upload_overlay_textures`] copies
//! every surface whose revision changed into a GPU texture (recreating the
//! texture when the resolution changed), and [`render_pass`] draws them
//! centered on their bodies on top of the game view.

use bevy_ecs::prelude::*;
use log::warn;
use raylib::ffi;
use raylib::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::components::avatar::Avatar;
use crate::components::boxcollider::BoxCollider;
use crate::components::mapposition::MapPosition;
use crate::resources::debugmode::DebugMode;

struct UploadedSurface {
    texture: Texture2D,
    revision: u64,
}

/// GPU textures for overlay surfaces, keyed by overlay id.
#[derive(Default)]
pub struct OverlayTextures {
    map: FxHashMap<u64, UploadedSurface>,
}

impl OverlayTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Sync overlay surfaces into textures. Textures of overlays that are gone
/// are released.
pub fn upload_overlay_textures(
    world: &mut World,
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    store: &mut OverlayTextures,
) {
    let mut live = FxHashSet::default();
    let mut avatars = world.query::<&Avatar>();
    for avatar in avatars.iter(world) {
        let Some(overlay) = avatar.overlay() else {
            continue;
        };
        let Some(surface) = overlay.surface() else {
            continue;
        };
        let id = overlay.id();
        live.insert(id);

        let (w, h) = surface.dimensions();
        let resized = store
            .map
            .get(&id)
            .is_none_or(|u| u.texture.width != w as i32 || u.texture.height != h as i32);
        if resized {
            let blank = Image::gen_image_color(w as i32, h as i32, Color::BLANK);
            match rl.load_texture_from_image(thread, &blank) {
                Ok(texture) => {
                    store.map.insert(
                        id,
                        UploadedSurface {
                            texture,
                            revision: u64::MAX,
                        },
                    );
                }
                Err(e) => {
                    warn!("failed to create overlay texture {}x{}: {}", w, h, e);
                    continue;
                }
            }
        }

        let Some(uploaded) = store.map.get_mut(&id) else {
            continue;
        };
        if uploaded.revision != overlay.revision() {
            // Surface is RGBA8 and exactly the texture's size.
            unsafe {
                ffi::UpdateTexture(
                    *uploaded.texture,
                    surface.as_raw().as_ptr() as *const std::ffi::c_void,
                );
            }
            uploaded.revision = overlay.revision();
        }
    }
    store.map.retain(|id, _| live.contains(id));
}

/// Draw every overlay over the game view, plus debug outlines when
/// [`DebugMode`] is present.
pub fn render_pass(world: &mut World, d: &mut RaylibDrawHandle, store: &OverlayTextures) {
    let mut avatars = world.query::<&Avatar>();
    for avatar in avatars.iter(world) {
        let Some(overlay) = avatar.overlay() else {
            continue;
        };
        if let Some(uploaded) = store.map.get(&overlay.id()) {
            d.draw_texture_v(&uploaded.texture, overlay.top_left(), Color::WHITE);
        }
    }

    if world.contains_resource::<DebugMode>() {
        let mut colliders = world.query::<(&BoxCollider, &MapPosition)>();
        for (collider, position) in colliders.iter(world) {
            let (x, y, w, h) = collider.get_aabb(position.pos);
            d.draw_rectangle_lines(x as i32, y as i32, w as i32, h as i32, Color::RED);

            let c = collider.center(position.pos);
            d.draw_line(c.x as i32 - 5, c.y as i32, c.x as i32 + 5, c.y as i32, Color::GREEN);
            d.draw_line(c.x as i32, c.y as i32 - 5, c.x as i32, c.y as i32 + 5, Color::GREEN);
        }
        for avatar in avatars.iter(world) {
            if let Some(overlay) = avatar.overlay() {
                let tl = overlay.top_left();
                let (w, h) = overlay.resolution();
                d.draw_rectangle_lines(tl.x as i32, tl.y as i32, w as i32, h as i32, Color::BLUE);
            }
        }
    }
}

pub fn render_debug_ui(world: &mut World, d: &mut RaylibDrawHandle) {
    if !world.contains_resource::<DebugMode>() {
        return;
    }
    let fps = d.get_fps();
    d.draw_text(
        &format!("DEBUG MODE (press F11 to toggle) | FPS: {}", fps),
        10,
        10,
        10,
        Color::BLACK,
    );

    let mut avatars = world.query::<&Avatar>();
    for (i, avatar) in avatars.iter(world).enumerate() {
        let look = avatar.look();
        let text = format!(
            "avatar {}: {:?} scale={:.2} head={:?} torso={:?}",
            i,
            avatar.state(),
            avatar.visual_scale().get(),
            look.head_index,
            look.torso_index
        );
        d.draw_text(&text, 10, 30 + 20 * i as i32, 10, Color::BLACK);
    }
}
