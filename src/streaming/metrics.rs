// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Prometheus text exporter fed by the telemetry bus

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::{MetricKind, MetricSample, TelemetryBus};

/// Gauge name prefix for the disk price table, completed by the tier suffix
pub const DISK_PRICE_METRIC_PREFIX: &str = "monitor_wd_hd_price_";

/// Prometheus text exposition content type
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

#[derive(Debug, Clone)]
struct MetricEntry {
    kind: MetricKind,
    help: String,
    value: f64,
}

/// Latest gauge values and running counter totals
#[derive(Clone, Default)]
pub struct MetricsExporter {
    metrics: Arc<RwLock<BTreeMap<String, MetricEntry>>>,
}

impl MetricsExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gauges are replaced, counters accumulate
    pub fn record(&self, sample: &MetricSample) {
        let mut metrics = self.metrics.write();
        let entry = metrics.entry(sample.name.clone()).or_insert_with(|| MetricEntry {
            kind: sample.kind,
            help: sample.help.clone(),
            value: 0.0,
        });

        match sample.kind {
            MetricKind::Gauge => entry.value = sample.value,
            MetricKind::Counter => entry.value += sample.value,
        }
    }

    /// Follow the telemetry bus until shutdown
    pub fn attach(&self, telemetry: &TelemetryBus, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let mut rx = telemetry.subscribe();
        let exporter = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Ok(sample) => exporter.record(&sample),
                        Err(RecvError::Lagged(n)) => warn!("Metrics exporter dropped {} samples", n),
                        Err(RecvError::Closed) => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
            debug!("Metrics exporter detached");
        })
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.metrics.read().get(name).map(|m| m.value)
    }

    /// Text exposition format, metrics sorted by name
    pub fn render(&self) -> String {
        let metrics = self.metrics.read();
        let mut out = String::new();

        for (name, metric) in metrics.iter() {
            let kind = match metric.kind {
                MetricKind::Gauge => "gauge",
                MetricKind::Counter => "counter",
            };
            let _ = writeln!(out, "# HELP {} {}", name, metric.help.replace('\n', " "));
            let _ = writeln!(out, "# TYPE {} {}", name, kind);
            let _ = writeln!(out, "{} {}", name, format_value(metric.value));
        }

        out
    }

    pub async fn bind(port: u16) -> Result<TcpListener> {
        let addr = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&addr).await?;
        info!("Metrics exporter listening on http://{}/metrics", addr);
        Ok(listener)
    }

    /// Router with the single scrape endpoint
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(scrape))
            .with_state(self.clone())
    }

    /// Answer scrapes on `listener` until shutdown
    pub fn serve(&self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let app = self.router();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("Metrics exporter shutting down");
            });

            if let Err(e) = server.await {
                error!("Metrics server error: {}", e);
            }
        })
    }
}

/// GET /metrics
async fn scrape(State(exporter): State<MetricsExporter>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_FORMAT)], exporter.render())
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tower::ServiceExt;

    fn sample(name: &str, kind: MetricKind, value: f64) -> MetricSample {
        MetricSample {
            id: 0,
            name: name.to_string(),
            kind,
            help: "help text".to_string(),
            value,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_gauges_replace_and_counters_add() {
        let exporter = MetricsExporter::new();
        exporter.record(&sample("office_temperature", MetricKind::Gauge, 21.0));
        exporter.record(&sample("office_temperature", MetricKind::Gauge, 21.5));
        exporter.record(&sample("hall_movement_count", MetricKind::Counter, 1.0));
        exporter.record(&sample("hall_movement_count", MetricKind::Counter, 1.0));

        assert_eq!(exporter.value("office_temperature"), Some(21.5));
        assert_eq!(exporter.value("hall_movement_count"), Some(2.0));
    }

    #[test]
    fn test_render_text_format() {
        let exporter = MetricsExporter::new();
        exporter.record(&sample("office_temperature", MetricKind::Gauge, 21.5));
        exporter.record(&sample("hall_movement_count", MetricKind::Counter, 3.0));

        assert_eq!(
            exporter.render(),
            "# HELP hall_movement_count help text\n\
             # TYPE hall_movement_count counter\n\
             hall_movement_count 3\n\
             # HELP office_temperature help text\n\
             # TYPE office_temperature gauge\n\
             office_temperature 21.5\n"
        );
    }

    #[test]
    fn test_special_values() {
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(0.25), "0.25");
    }

    #[tokio::test]
    async fn test_follows_telemetry_bus() {
        let telemetry = TelemetryBus::new(16);
        let exporter = MetricsExporter::new();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = exporter.attach(&telemetry, shutdown_rx);

        telemetry.publish_gauge("window_light_level", "Light", 120.0);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(exporter.value("window_light_level"), Some(120.0));

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_router_serves_scrapes() {
        let exporter = MetricsExporter::new();
        exporter.record(&sample("office_temperature", MetricKind::Gauge, 21.5));

        let response = exporter
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE].to_str().unwrap(), TEXT_FORMAT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "# HELP office_temperature help text\n\
             # TYPE office_temperature gauge\n\
             office_temperature 21.5\n"
        );
    }

    #[tokio::test]
    async fn test_head_and_unknown_paths() {
        let exporter = MetricsExporter::new();

        let head = exporter
            .router()
            .oneshot(Request::head("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(head.status(), StatusCode::OK);

        let missing = exporter
            .router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let exporter = MetricsExporter::new();
        exporter.record(&sample("hall_movement_count", MetricKind::Counter, 4.0));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = exporter.serve(listener, shutdown_rx);

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("hall_movement_count 4\n"));

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
