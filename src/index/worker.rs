//! Background indexer task
//!
//! Drives an [`IndexBuilder`] on a dedicated named thread. The task's
//! contract toward the map is small:
//!
//! - submit rebuild: the coordinator moves to `Mutated`
//! - request abort: the coordinator moves to `MutateBegin`
//! - await stable: `Coordinator::wait_until_ready`
//!
//! Dropping the worker stops and joins the thread, so the shared state can
//! never be released while the builder still runs.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::map::Shared;
use crate::observability::Event;

use super::builder::IndexBuilder;
use super::config::IndexConfig;

pub(crate) struct IndexWorker<K, V> {
    shared: Arc<Shared<K, V>>,
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl<K, V> IndexWorker<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Start the background indexer.
    ///
    /// Returns `Err` if the thread cannot be spawned. The builder is dropped
    /// with the closure in that case, which leaves the coordinator in
    /// `QuitDone` and the map usable without an index.
    pub(crate) fn spawn(shared: Arc<Shared<K, V>>, config: &IndexConfig) -> std::io::Result<Self> {
        let builder = IndexBuilder::new(Arc::clone(&shared), config.build_chunk);
        let name = config.worker_name.clone();
        let sample_step = config.sample_step;
        let build_chunk = config.build_chunk;

        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                tracing::info!(
                    event = %Event::WorkerStart,
                    sample_step,
                    build_chunk,
                    "index worker started"
                );
                builder.run();
                tracing::info!(event = %Event::WorkerStop, "index worker stopped");
            })
            .map_err(|e| {
                tracing::error!(
                    event = %Event::WorkerSpawnFailed,
                    worker = %name,
                    error = %e,
                    "failed to spawn index worker"
                );
                e
            })?;

        Ok(Self {
            shared,
            name,
            handle: Some(handle),
        })
    }
}

impl<K, V> IndexWorker<K, V> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Signal `Quit`, wait for `QuitDone`, join the thread. Idempotent.
    pub(crate) fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.shared.coordinator.request_quit();
        self.shared.coordinator.wait_quit_done();

        if handle.join().is_err() {
            tracing::error!(
                event = %Event::WorkerPanicked,
                worker = %self.name,
                "index worker panicked"
            );
        }
    }
}

impl<K, V> Drop for IndexWorker<K, V> {
    fn drop(&mut self) {
        self.stop();
    }
}
