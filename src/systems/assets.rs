//! Asset worker and the system that resumes its results on the main thread.
//!
//! - [`asset_thread`] runs on its own OS thread and turns every [`AssetJob`]
//!   into an [`AssetCompletion`] through an [`AssetLoader`].
//! - [`apply_asset_completions`] non-blockingly drains the completions each
//!   frame and routes each one to the avatar whose ticket it carries.
//!
//! All avatar and overlay mutation stays on the main thread; the worker
//! only fetches, decodes and instantiates.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use thiserror::Error;

use crate::components::avatar::Avatar;
use crate::events::assets::{AssetCompletion, AssetJob};
use crate::pipeline::TexturePipeline;
use crate::pipeline::fetch::FetchError;
use crate::resources::assetbridge::AssetBridge;
use crate::runtime::{AnimationSource, RuntimeError, RuntimeInstance};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Performs asset jobs synchronously.
#[derive(Clone)]
pub struct AssetLoader {
    pipeline: TexturePipeline,
}

impl AssetLoader {
    pub fn new(pipeline: TexturePipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &TexturePipeline {
        &self.pipeline
    }

    pub fn load_animation(
        &self,
        source: &AnimationSource,
    ) -> Result<Box<dyn RuntimeInstance>, LoadError> {
        let bytes = self.pipeline.source().fetch(&source.path)?;
        Ok(self.pipeline.runtime().load(source, &bytes)?)
    }

    /// Run one job. `Shutdown` produces no completion.
    pub fn process(&self, job: AssetJob) -> Option<AssetCompletion> {
        match job {
            AssetJob::LoadAnimation { ticket, source } => Some(match self.load_animation(&source) {
                Ok(instance) => {
                    debug!("loaded '{}' for overlay {}", source.path, ticket.overlay);
                    AssetCompletion::AnimationLoaded { ticket, instance }
                }
                Err(e) => AssetCompletion::AnimationFailed {
                    ticket,
                    error: e.to_string(),
                },
            }),
            AssetJob::FetchTexture {
                ticket,
                property,
                index,
                token,
            } => Some(match self.pipeline.run(&property, index) {
                Ok(image) => AssetCompletion::TextureReady {
                    ticket,
                    property,
                    token,
                    image,
                },
                Err(e) => AssetCompletion::TextureFailed {
                    ticket,
                    property,
                    token,
                    error: e.to_string(),
                },
            }),
            AssetJob::Shutdown => None,
        }
    }
}

/// Entry point of the asset worker thread.
///
/// Blocks on the job channel and exits on [`AssetJob::Shutdown`] or when
/// every sender is gone.
pub fn asset_thread(loader: AssetLoader, rx_job: Receiver<AssetJob>, tx_done: Sender<AssetCompletion>) {
    info!(
        "asset worker starting (id={:?})",
        std::thread::current().id()
    );
    for job in rx_job.iter() {
        if matches!(job, AssetJob::Shutdown) {
            break;
        }
        let Some(done) = loader.process(job) else {
            continue;
        };
        if let Err(e) = tx_done.send(done) {
            // Bridge is gone; nobody will read further results.
            e.into_inner().discard();
            break;
        }
    }
    info!("asset worker exiting");
}

/// Route finished asset work to the avatars that asked for it.
///
/// Completions for avatars that no longer exist are released here.
pub fn apply_asset_completions(bridge: Option<Res<AssetBridge>>, mut avatars: Query<&mut Avatar>) {
    let Some(bridge) = bridge else {
        return;
    };
    for completion in bridge.drain() {
        let ticket = completion.ticket();
        match avatars.get_mut(ticket.avatar) {
            Ok(mut avatar) => avatar.handle_completion(completion),
            Err(_) => {
                debug!("discarding completion for despawned avatar {:?}", ticket.avatar);
                completion.discard();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::assets::OverlayTicket;
    use crate::pipeline::catalog::{HEAD_IMAGE, ImageCatalog};
    use crate::pipeline::fetch::MemorySource;
    use crate::runtime::paperdoll::PaperDollRuntime;

    fn ticket() -> OverlayTicket {
        OverlayTicket {
            avatar: World::new().spawn_empty().id(),
            overlay: 1,
        }
    }

    fn loader(source: MemorySource) -> AssetLoader {
        AssetLoader::new(TexturePipeline::new(
            Arc::new(source),
            Arc::new(PaperDollRuntime),
            Arc::new(ImageCatalog::avatar()),
        ))
    }

    #[test]
    fn test_missing_animation_fails() {
        let done = loader(MemorySource::new()).process(AssetJob::LoadAnimation {
            ticket: ticket(),
            source: AnimationSource::default(),
        });
        match done {
            Some(AssetCompletion::AnimationFailed { error, .. }) => {
                assert!(error.contains("not found"), "{}", error);
            }
            other => panic!("unexpected completion {:?}", other),
        }
    }

    #[test]
    fn test_texture_failure_keeps_token() {
        let done = loader(MemorySource::new()).process(AssetJob::FetchTexture {
            ticket: ticket(),
            property: HEAD_IMAGE.to_string(),
            index: 3,
            token: 42,
        });
        match done {
            Some(AssetCompletion::TextureFailed {
                property, token, ..
            }) => {
                assert_eq!(property, HEAD_IMAGE);
                assert_eq!(token, 42);
            }
            other => panic!("unexpected completion {:?}", other),
        }
    }

    #[test]
    fn test_shutdown_produces_nothing() {
        assert!(loader(MemorySource::new()).process(AssetJob::Shutdown).is_none());
    }
}
