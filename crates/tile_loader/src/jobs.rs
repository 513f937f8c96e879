use crate::metrics::LoaderMetrics;
use crate::sort::sort_by_key_f32;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use vtile::TileCoord;

/// Extra distance per zoom level between a tile and the viewport.
pub const ZOOM_PENALTY: f32 = 1.0;

const BATCH_CAPACITY_HINT: usize = 1 << 12;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not scheduled, or superseded before a worker claimed it.
    None = 0,
    /// Submitted; waiting for or held by a worker.
    Loading = 1,
    /// Decoded and handed downstream.
    NewData = 2,
    /// Consumed downstream.
    Ready = 3,
    Error = 4,
}

impl JobState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => JobState::Loading,
            2 => JobState::NewData,
            3 => JobState::Ready,
            4 => JobState::Error,
            _ => JobState::None,
        }
    }
}

/// One tile to load. Shared between the submitter and the worker that claims it.
#[derive(Debug)]
pub struct Job {
    pub tile: TileCoord,
    pub distance: f32,
    state: AtomicU8,
}

impl Job {
    pub fn new(tile: TileCoord, distance: f32) -> Arc<Self> {
        Arc::new(Self {
            tile,
            distance,
            state: AtomicU8::new(JobState::None as u8),
        })
    }

    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: JobState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Centre of interest, in fractional tile units at `zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(x: f64, y: f64, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Distance from the viewport centre to the centre of `tile`, measured in
    /// tiles at the viewport's zoom, plus [`ZOOM_PENALTY`] per zoom level apart.
    pub fn distance(&self, tile: TileCoord) -> f32 {
        let scale = 2f64.powi(self.zoom as i32 - tile.zoom as i32);
        let cx = (tile.x as f64 + 0.5) * scale;
        let cy = (tile.y as f64 + 0.5) * scale;
        let planar = ((cx - self.x).powi(2) + (cy - self.y).powi(2)).sqrt() as f32;
        planar + ZOOM_PENALTY * self.zoom.abs_diff(tile.zoom) as f32
    }

    /// Jobs for every tile within `radius` tiles of the centre tile, listed
    /// ring by ring outwards. Tiles outside the world are skipped.
    pub fn batch(&self, radius: u32) -> Vec<Arc<Job>> {
        let n = TileCoord::tiles_per_axis(self.zoom) as i64;
        let cx = (self.x.floor() as i64).clamp(0, n - 1);
        let cy = (self.y.floor() as i64).clamp(0, n - 1);
        // Rings past the farthest world edge hold no tiles.
        let reach = cx.max(n - 1 - cx).max(cy).max(n - 1 - cy);
        let r = (radius as i64).min(reach);

        let width = (cx + r).min(n - 1) - (cx - r).max(0) + 1;
        let height = (cy + r).min(n - 1) - (cy - r).max(0) + 1;
        let hint = usize::try_from(width.saturating_mul(height)).unwrap_or(usize::MAX);
        let mut jobs = Vec::with_capacity(hint.min(BATCH_CAPACITY_HINT));

        let mut push = |dx: i64, dy: i64| {
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && x < n && y < n {
                let tile = TileCoord::new(x as u32, y as u32, self.zoom);
                jobs.push(Job::new(tile, self.distance(tile)));
            }
        };
        for ring in 0..=r {
            for dy in -ring..=ring {
                if dy.abs() == ring {
                    for dx in -ring..=ring {
                        push(dx, dy);
                    }
                } else {
                    push(-ring, dy);
                    push(ring, dy);
                }
            }
        }
        jobs
    }
}

#[derive(Default)]
struct Batch {
    jobs: Vec<Arc<Job>>,
    next: usize,
    sorted: bool,
}

impl Batch {
    fn pending(&self) -> &[Arc<Job>] {
        &self.jobs[self.next..]
    }
}

/// Current batch of jobs, handed out nearest first.
///
/// A new batch replaces whatever is left of the previous one. Jobs a worker
/// already claimed are unaffected.
#[derive(Default)]
pub struct JobQueue {
    batch: Mutex<Batch>,
    ready: Condvar,
    metrics: Option<Arc<LoaderMetrics>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<LoaderMetrics>) -> Self {
        Self {
            metrics: Some(metrics),
            ..Self::default()
        }
    }

    fn update_gauge(&self, batch: &Batch) {
        if let Some(m) = &self.metrics {
            m.jobs_pending.set(batch.pending().len() as i64);
        }
    }

    pub fn submit_batch(&self, jobs: Vec<Arc<Job>>) {
        let count = jobs.len();
        let mut batch = self.batch.lock();

        let superseded = batch.pending().len();
        for job in batch.pending() {
            job.set_state(JobState::None);
        }
        for job in &jobs {
            job.set_state(JobState::Loading);
        }
        *batch = Batch {
            jobs,
            next: 0,
            sorted: false,
        };
        self.update_gauge(&batch);
        drop(batch);

        self.ready.notify_all();
        tracing::debug!(jobs = count, superseded, "submitted job batch");
    }

    fn take_next(&self, batch: &mut Batch) -> Option<Arc<Job>> {
        if !batch.sorted {
            let next = batch.next;
            sort_by_key_f32(&mut batch.jobs[next..], |job| job.distance);
            batch.sorted = true;
        }

        let job = batch.jobs.get(batch.next)?.clone();
        batch.next += 1;
        if batch.next == batch.jobs.len() {
            batch.jobs.clear();
            batch.next = 0;
        }
        self.update_gauge(batch);
        Some(job)
    }

    /// Claim the nearest unclaimed job, or `None` if the batch is exhausted.
    pub fn poll_next(&self) -> Option<Arc<Job>> {
        let mut batch = self.batch.lock();
        self.take_next(&mut batch)
    }

    /// Wait up to `timeout` for a job. `None` if the wait timed out or
    /// `cancel` fired; callers tell the two apart through the token.
    pub fn wait_next(&self, cancel: &CancellationToken, timeout: Duration) -> Option<Arc<Job>> {
        let deadline = Instant::now() + timeout;
        let mut batch = self.batch.lock();
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(job) = self.take_next(&mut batch) {
                return Some(job);
            }
            if self.ready.wait_until(&mut batch, deadline).timed_out() {
                return if cancel.is_cancelled() {
                    None
                } else {
                    self.take_next(&mut batch)
                };
            }
        }
    }

    /// Wake every waiting worker, e.g. after cancelling.
    pub fn wake_all(&self) {
        self.ready.notify_all();
    }

    /// Drop all unclaimed jobs, resetting them to [`JobState::None`].
    pub fn clear(&self) {
        let mut batch = self.batch.lock();
        for job in batch.pending() {
            job.set_state(JobState::None);
        }
        *batch = Batch::default();
        self.update_gauge(&batch);
    }

    /// Unclaimed jobs left in the current batch.
    pub fn len(&self) -> usize {
        self.batch.lock().pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
