use crate::client::{ClientSettings, TileEndpoint, TileFetchClient};
use crate::error::FetchError;
use crate::jobs::{Job, JobQueue, JobState};
use crate::metrics::LoaderMetrics;
use crossbeam_channel::Sender;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use vtile::{DecodedTile, TileDecoder};

/// Outcome of one job, sent downstream by the worker that ran it.
#[derive(Debug)]
pub enum TileEvent {
    Loaded { job: Arc<Job>, tile: DecodedTile },
    Failed { job: Arc<Job>, error: FetchError },
}

impl TileEvent {
    pub fn job(&self) -> &Arc<Job> {
        match self {
            TileEvent::Loaded { job, .. } | TileEvent::Failed { job, .. } => job,
        }
    }
}

struct Worker {
    id: usize,
    queue: Arc<JobQueue>,
    decoder: Arc<TileDecoder>,
    client: TileFetchClient,
    events: Sender<TileEvent>,
    cancel: CancellationToken,
    settings: ClientSettings,
    metrics: Option<Arc<LoaderMetrics>>,
}

impl Worker {
    fn run(mut self) {
        tracing::debug!(worker = self.id, "worker started");

        loop {
            let Some(job) = self.queue.wait_next(&self.cancel, self.settings.read_poll) else {
                if self.cancel.is_cancelled() {
                    break;
                }
                // Idle: release a keep-alive socket the next fetch would not reuse.
                self.client.close_if_stale();
                continue;
            };
            let started = Instant::now();
            let decoder = &self.decoder;
            let result = self
                .client
                .load_tile(job.tile, |body| decoder.decode(body).collect_tile());

            let event = match result {
                Ok(tile) => {
                    if let Some(m) = &self.metrics {
                        m.tiles_loaded_total.inc();
                        m.features_dropped_total.inc_by(tile.stats.dropped_features as u64);
                        m.tile_load_seconds.observe(started.elapsed().as_secs_f64());
                    }
                    tracing::debug!(
                        worker = self.id,
                        tile = %job.tile,
                        elements = tile.elements.len(),
                        dropped = tile.stats.dropped_features,
                        "tile loaded"
                    );
                    job.set_state(JobState::NewData);
                    TileEvent::Loaded { job, tile }
                }
                Err(FetchError::Cancelled) => {
                    job.set_state(JobState::None);
                    break;
                }
                Err(error) => {
                    if let Some(m) = &self.metrics {
                        m.tiles_failed_total.inc();
                    }
                    tracing::warn!(
                        worker = self.id,
                        tile = %job.tile,
                        error = %error,
                        "tile failed"
                    );
                    job.set_state(JobState::Error);
                    TileEvent::Failed { job, error }
                }
            };

            if self.events.send(event).is_err() {
                tracing::debug!(worker = self.id, "event receiver dropped");
                break;
            }
        }

        self.client.close();
        tracing::debug!(worker = self.id, "worker stopped");
    }
}

/// Fixed set of worker threads draining a [`JobQueue`].
///
/// Each worker owns its own [`TileFetchClient`]; nothing but the queue, the
/// decoder's tag dictionary and the event channel is shared.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        workers: usize,
        queue: Arc<JobQueue>,
        decoder: Arc<TileDecoder>,
        endpoint: TileEndpoint,
        settings: ClientSettings,
        events: Sender<TileEvent>,
        metrics: Option<Arc<LoaderMetrics>>,
    ) -> io::Result<Self> {
        let cancel = CancellationToken::new();
        let mut pool = Self {
            queue,
            cancel,
            handles: Vec::with_capacity(workers),
        };

        for id in 0..workers.max(1) {
            let mut client =
                TileFetchClient::new(endpoint.clone(), settings.clone(), pool.cancel.clone());
            if let Some(m) = &metrics {
                client = client.with_metrics(m.clone());
            }
            let worker = Worker {
                id,
                queue: pool.queue.clone(),
                decoder: decoder.clone(),
                client,
                events: events.clone(),
                cancel: pool.cancel.clone(),
                settings: settings.clone(),
                metrics: metrics.clone(),
            };
            // On failure `pool` drops here and stops the workers already running.
            let handle = thread::Builder::new()
                .name(format!("tile-worker-{id}"))
                .spawn(move || worker.run())?;
            pool.handles.push(handle);
        }

        tracing::info!(workers = pool.handles.len(), host = %endpoint.host, "worker pool started");
        Ok(pool)
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Token that stops the pool when cancelled, e.g. from a signal handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Cancel in-flight fetches and wait for every worker to exit.
    pub fn shutdown(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        self.cancel.cancel();
        self.queue.wake_all();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("tile worker panicked");
            }
        }
        tracing::info!("worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
