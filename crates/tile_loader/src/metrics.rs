use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, Histogram, IntCounter, IntGauge, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

pub struct LoaderMetrics {
    pub registry: Registry,
    pub tiles_loaded_total: IntCounter,
    pub tiles_failed_total: IntCounter,
    pub features_dropped_total: IntCounter,
    pub connections_opened_total: IntCounter,
    pub request_retries_total: IntCounter,
    pub body_bytes_total: IntCounter,
    pub jobs_pending: IntGauge,
    pub tile_load_seconds: Histogram,
}

impl LoaderMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("tile_loader".into()), None)?;

        macro_rules! reg {
            ($m:expr) => {{
                let m = $m?;
                registry.register(Box::new(m.clone()))?;
                m
            }};
        }

        Ok(Self {
            tiles_loaded_total: reg!(IntCounter::new(
                "tiles_loaded_total",
                "Tiles fetched and decoded successfully"
            )),
            tiles_failed_total: reg!(IntCounter::new(
                "tiles_failed_total",
                "Tiles that failed to fetch or decode"
            )),
            features_dropped_total: reg!(IntCounter::new(
                "features_dropped_total",
                "Malformed features skipped while decoding"
            )),
            connections_opened_total: reg!(IntCounter::new(
                "connections_opened_total",
                "TCP connections opened to the tile server"
            )),
            request_retries_total: reg!(IntCounter::new(
                "request_retries_total",
                "Requests retried on a fresh connection"
            )),
            body_bytes_total: reg!(IntCounter::new(
                "body_bytes_total",
                "Response body bytes announced by the tile server"
            )),
            jobs_pending: reg!(IntGauge::new(
                "jobs_pending",
                "Jobs of the current batch not yet claimed by a worker"
            )),
            tile_load_seconds: reg!(Histogram::with_opts(
                prometheus::HistogramOpts::new(
                    "tile_load_seconds",
                    "Fetch plus decode time per tile"
                )
                .buckets(prometheus::exponential_buckets(0.005, 2.0, 12)?)
            )),
            registry,
        })
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new().route(
            "/metrics",
            get(move || {
                let metrics = self.clone();
                async move {
                    match metrics.render() {
                        Ok(body) => body.into_response(),
                        Err(e) => {
                            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                        }
                    }
                }
            }),
        )
    }
}

/// Serve `/metrics` from a dedicated thread running its own small runtime.
pub fn spawn_metrics_server(
    metrics: Arc<LoaderMetrics>,
    addr: SocketAddr,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("metrics".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_io()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(error = %e, "failed to start metrics runtime");
                    return;
                }
            };

            rt.block_on(async move {
                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::error!(
                            addr = %addr,
                            error = %e,
                            "failed to bind metrics listener"
                        );
                        return;
                    }
                };
                tracing::info!(addr = %addr, "metrics server started");
                if let Err(e) = axum::serve(listener, metrics.router().into_make_service()).await {
                    tracing::error!(error = %e, "metrics server stopped");
                }
            });
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = LoaderMetrics::new().unwrap();
        metrics.tiles_loaded_total.inc_by(3);
        metrics.jobs_pending.set(7);
        let text = metrics.render().unwrap();
        assert!(text.contains("tile_loader_tiles_loaded_total 3"));
        assert!(text.contains("tile_loader_jobs_pending 7"));
    }
}
