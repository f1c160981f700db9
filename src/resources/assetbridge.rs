//! ECS resources that bridge the main thread with the asset worker.
//!
//! Use [`setup_assets`] once during initialization to spawn the worker
//! thread and insert the [`AssetBridge`]. Call [`shutdown_assets`] during
//! teardown to stop the thread.
//!
//! [`AssetBridge::detached`] builds a bridge without a thread and returns
//! the worker side as a [`JobPort`], so jobs can be inspected and completed
//! by hand (tests, single-threaded hosts).

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;

use crate::events::assets::{AssetCompletion, AssetJob};
use crate::systems::assets::{AssetLoader, asset_thread};

/// Shared bridge between the ECS world and the asset worker.
#[derive(Resource)]
pub struct AssetBridge {
    /// Sender for [`AssetJob`] messages (ECS -> worker).
    tx_job: Sender<AssetJob>,
    /// Receiver for [`AssetCompletion`] messages (worker -> ECS).
    rx_done: Receiver<AssetCompletion>,
    /// Join handle of the worker thread, absent for detached bridges.
    handle: Option<std::thread::JoinHandle<()>>,
}

/// Cloneable job submitter handed to every overlay.
#[derive(Clone, Debug)]
pub struct JobSender(Sender<AssetJob>);

impl JobSender {
    /// Queue a job. Returns `false` when the worker is gone.
    pub fn submit(&self, job: AssetJob) -> bool {
        self.0.send(job).is_ok()
    }
}

/// Worker side of a detached [`AssetBridge`].
pub struct JobPort {
    rx_job: Receiver<AssetJob>,
    tx_done: Sender<AssetCompletion>,
}

impl JobPort {
    /// All jobs submitted so far that have not been taken yet.
    pub fn pending(&self) -> Vec<AssetJob> {
        self.rx_job.try_iter().collect()
    }

    pub fn complete(&self, completion: AssetCompletion) {
        if self.tx_done.send(completion).is_err() {
            warn!("asset bridge dropped before completion could be delivered");
        }
    }

    /// Run every pending job through `loader` on the calling thread.
    /// Returns the number of completions produced.
    pub fn process_pending(&self, loader: &AssetLoader) -> usize {
        let mut produced = 0;
        for job in self.pending() {
            if let Some(done) = loader.process(job) {
                self.complete(done);
                produced += 1;
            }
        }
        produced
    }
}

impl AssetBridge {
    /// Spawn the worker thread running `loader`.
    pub fn spawn(loader: AssetLoader) -> Self {
        let (tx_job, rx_job) = unbounded::<AssetJob>();
        let (tx_done, rx_done) = unbounded::<AssetCompletion>();

        let handle = std::thread::Builder::new()
            .name("paperdoll-assets".into())
            .spawn(move || asset_thread(loader, rx_job, tx_done));

        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                warn!("failed to spawn asset worker: {}", e);
                None
            }
        };

        Self {
            tx_job,
            rx_done,
            handle,
        }
    }

    /// Bridge with no worker thread; the caller drives the returned port.
    pub fn detached() -> (Self, JobPort) {
        let (tx_job, rx_job) = unbounded::<AssetJob>();
        let (tx_done, rx_done) = unbounded::<AssetCompletion>();
        (
            Self {
                tx_job,
                rx_done,
                handle: None,
            },
            JobPort { rx_job, tx_done },
        )
    }

    pub fn jobs(&self) -> JobSender {
        JobSender(self.tx_job.clone())
    }

    /// Non-blockingly take every completion delivered so far.
    pub fn drain(&self) -> Vec<AssetCompletion> {
        self.rx_done.try_iter().collect()
    }

    /// Ask the worker to stop and wait for it.
    pub fn shutdown(mut self) {
        let _ = self.tx_job.send(AssetJob::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        for done in self.rx_done.try_iter() {
            done.discard();
        }
    }
}

/// Spawn the asset worker and register the bridge resource.
pub fn setup_assets(world: &mut World, loader: AssetLoader) {
    world.insert_resource(AssetBridge::spawn(loader));
}

/// Gracefully request shutdown of the asset worker and join it.
pub fn shutdown_assets(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<AssetBridge>() {
        bridge.shutdown();
    }
}
