use anyhow::Context;
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tile_loader::metrics::spawn_metrics_server;
use tile_loader::{
    Config, JobQueue, JobState, LoaderMetrics, TileEndpoint, TileEvent, Viewport, WorkerPool,
};
use tracing_subscriber::{fmt, EnvFilter};
use vtile::{decode_tile_file, GeometryKind, TagDictionary, TileDecoder};

const EVENT_POLL: Duration = Duration::from_millis(250);

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();
    let config = Config::parse();
    tracing::info!(config = ?config, "tile loader starting");

    let dict = Arc::new(TagDictionary::new());
    let decoder = Arc::new(TileDecoder::with_tile_size(dict, config.tile_size));

    if let Some(path) = &config.tile_file {
        return decode_local(&decoder, path);
    }

    let base_url = config
        .base_url
        .as_deref()
        .context("--base-url is required unless --tile-file is given")?;
    let endpoint = TileEndpoint::parse(base_url, &config.extension)?;

    let metrics = Arc::new(LoaderMetrics::new()?);
    if let Some(addr) = &config.metrics_listen_addr {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("invalid metrics listen address {addr}"))?;
        // Detached: lives until the process exits.
        spawn_metrics_server(metrics.clone(), addr)?;
    }

    let queue = Arc::new(JobQueue::with_metrics(metrics.clone()));
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut pool = WorkerPool::spawn(
        config.workers,
        queue.clone(),
        decoder,
        endpoint,
        config.client_settings(),
        tx,
        Some(metrics),
    )?;

    let cancel = pool.cancellation_token();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, stopping workers");
        cancel.cancel();
    })
    .context("failed to install Ctrl-C handler")?;

    let viewport = Viewport::new(config.center_x, config.center_y, config.zoom);
    let jobs = viewport.batch(config.radius);
    let total = jobs.len();
    queue.submit_batch(jobs);

    let cancel = pool.cancellation_token();
    let deadline = Instant::now() + Duration::from_secs(config.batch_timeout_secs);
    let (mut loaded, mut failed, mut elements, mut dropped) = (0usize, 0usize, 0usize, 0usize);

    while loaded + failed < total && !cancel.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(pending = total - loaded - failed, "batch timed out");
            break;
        }
        match rx.recv_timeout(EVENT_POLL.min(deadline - now)) {
            Ok(TileEvent::Loaded { job, tile }) => {
                loaded += 1;
                elements += tile.elements.len();
                dropped += tile.stats.dropped_features;
                job.set_state(JobState::Ready);
                tracing::info!(
                    tile = %job.tile,
                    distance = job.distance,
                    elements = tile.elements.len(),
                    "tile ready"
                );
            }
            Ok(TileEvent::Failed { job, error }) => {
                failed += 1;
                tracing::debug!(tile = %job.tile, error = %error, "tile failed");
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::info!(total, loaded, failed, elements, dropped, "batch finished");
    pool.shutdown();
    Ok(())
}

fn decode_local(decoder: &TileDecoder, path: &Path) -> anyhow::Result<()> {
    let tile = decode_tile_file(decoder, path)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let count = |kind: GeometryKind| tile.elements.iter().filter(|e| e.kind == kind).count();
    tracing::info!(
        path = %path.display(),
        points = count(GeometryKind::Point),
        lines = count(GeometryKind::Line),
        polygons = count(GeometryKind::Polygon),
        dropped = tile.stats.dropped_features,
        tile_tags = tile.stats.tile_tags,
        bytes = tile.stats.bytes,
        "tile decoded"
    );
    Ok(())
}
