//! Tile loader: fetches vector tiles around a viewport over keep-alive
//! connections and decodes them on a small pool of worker threads.
//!
//! Jobs are handed out nearest first; each worker owns one connection and
//! streams the response body straight into the `vtile` decoder.

pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod sort;
pub mod worker;

pub use client::{read_response_header, ClientSettings, TileEndpoint, TileFetchClient};
pub use config::Config;
pub use error::FetchError;
pub use jobs::{Job, JobQueue, JobState, Viewport};
pub use metrics::LoaderMetrics;
pub use worker::{TileEvent, WorkerPool};
