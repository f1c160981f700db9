//! Jobs sent *to* the asset worker and completions sent *back*.
//!
//! Every job carries the [`OverlayTicket`] of the overlay that asked for it,
//! and every completion echoes that ticket so the main thread can route it
//! and drop it when its overlay is gone.

use std::fmt;

use bevy_ecs::entity::Entity;

use crate::runtime::{AnimationSource, ImageHandle, RuntimeInstance};

/// Identity of the overlay an asset request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayTicket {
    /// Avatar body entity owning the overlay.
    pub avatar: Entity,
    /// Unique overlay id; never reused within a process.
    pub overlay: u64,
}

#[derive(Debug, Clone)]
pub enum AssetJob {
    LoadAnimation {
        ticket: OverlayTicket,
        source: AnimationSource,
    },
    FetchTexture {
        ticket: OverlayTicket,
        property: String,
        index: i64,
        /// Per-property request token issued by the overlay.
        token: u64,
    },
    Shutdown,
}

pub enum AssetCompletion {
    AnimationLoaded {
        ticket: OverlayTicket,
        instance: Box<dyn RuntimeInstance>,
    },
    AnimationFailed {
        ticket: OverlayTicket,
        error: String,
    },
    TextureReady {
        ticket: OverlayTicket,
        property: String,
        token: u64,
        image: ImageHandle,
    },
    TextureFailed {
        ticket: OverlayTicket,
        property: String,
        token: u64,
        error: String,
    },
}

impl AssetCompletion {
    pub fn ticket(&self) -> OverlayTicket {
        match self {
            AssetCompletion::AnimationLoaded { ticket, .. }
            | AssetCompletion::AnimationFailed { ticket, .. }
            | AssetCompletion::TextureReady { ticket, .. }
            | AssetCompletion::TextureFailed { ticket, .. } => *ticket,
        }
    }

    /// Drop a completion nobody will consume, releasing any loaded instance.
    pub fn discard(self) {
        if let AssetCompletion::AnimationLoaded { mut instance, .. } = self {
            instance.cleanup();
        }
    }
}

impl fmt::Debug for AssetCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetCompletion::AnimationLoaded { ticket, .. } => f
                .debug_struct("AnimationLoaded")
                .field("ticket", ticket)
                .finish_non_exhaustive(),
            AssetCompletion::AnimationFailed { ticket, error } => f
                .debug_struct("AnimationFailed")
                .field("ticket", ticket)
                .field("error", error)
                .finish(),
            AssetCompletion::TextureReady {
                ticket,
                property,
                token,
                image,
            } => f
                .debug_struct("TextureReady")
                .field("ticket", ticket)
                .field("property", property)
                .field("token", token)
                .field("size", &(image.width(), image.height()))
                .finish(),
            AssetCompletion::TextureFailed {
                ticket,
                property,
                token,
                error,
            } => f
                .debug_struct("TextureFailed")
                .field("ticket", ticket)
                .field("property", property)
                .field("token", token)
                .field("error", error)
                .finish(),
        }
    }
}
