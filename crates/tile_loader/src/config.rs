use crate::client::ClientSettings;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// `tile_loader` - fetches and decodes vector map tiles around a viewport.
///
/// Tiles are requested over persistent keep-alive connections, one per
/// worker, nearest to the viewport centre first.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Base URL of the tile server, e.g. `http://tiles.example.org/vtm`.
    ///
    /// Tiles are requested as `<base>/<zoom>/<x>/<y>.<extension>`.
    #[arg(long, env = "TILE_BASE_URL", required_unless_present = "tile_file")]
    pub base_url: Option<String>,

    /// File extension appended to every tile path.
    #[arg(long, env = "TILE_EXTENSION", default_value = "vtm")]
    pub extension: String,

    /// Number of worker threads, each with its own connection.
    #[arg(long, env = "TILE_WORKERS", default_value_t = 3)]
    pub workers: usize,

    /// Renderer tile size that decoded coordinates are scaled to.
    #[arg(long, default_value_t = vtile::DEFAULT_RENDERER_TILE_SIZE)]
    pub tile_size: f32,

    /// Requests sent on one connection before it is replaced.
    #[arg(long, default_value_t = 100)]
    pub requests_per_connection: u32,

    /// Idle time after which a keep-alive connection is not reused.
    #[arg(long, default_value_t = 10)]
    pub idle_timeout_secs: u64,

    #[arg(long, default_value_t = 30)]
    pub connect_timeout_secs: u64,

    /// Socket read timeout; cancellation is checked at least this often.
    #[arg(long, default_value_t = 250)]
    pub read_poll_ms: u64,

    /// Zoom level of the viewport.
    #[arg(long, default_value_t = 14)]
    pub zoom: u8,

    /// Viewport centre in fractional tile units at `--zoom`.
    #[arg(long, default_value_t = 8800.5)]
    pub center_x: f64,

    #[arg(long, default_value_t = 5373.5)]
    pub center_y: f64,

    /// Tiles loaded in each direction around the centre tile.
    #[arg(long, default_value_t = 2)]
    pub radius: u32,

    /// Give up waiting for the batch after this many seconds.
    #[arg(long, default_value_t = 120)]
    pub batch_timeout_secs: u64,

    /// Optional listen address for a Prometheus metrics endpoint.
    #[arg(long, env = "TILE_METRICS_LISTEN_ADDR")]
    pub metrics_listen_addr: Option<String>,

    /// Decode a tile body from disk instead of fetching.
    #[arg(long)]
    pub tile_file: Option<PathBuf>,
}

impl Config {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            requests_per_connection: self.requests_per_connection.max(1),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_poll: Duration::from_millis(self.read_poll_ms.max(1)),
        }
    }
}
