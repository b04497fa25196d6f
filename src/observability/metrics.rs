//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dot_ai_lifecycle_state` (gauge): ordinal of the current lifecycle state
//! - `dot_ai_stage_duration_seconds` (histogram): time spent per boot stage
//! - `dot_ai_exits_total` (counter): process exits by code

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::lifecycle::LifecycleState;

/// Initialize the Prometheus exporter and bind its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_state(state: LifecycleState) {
    gauge!("dot_ai_lifecycle_state").set(f64::from(state.ordinal()));
}

pub fn record_stage_duration(stage: &'static str, start: Instant) {
    histogram!("dot_ai_stage_duration_seconds", "stage" => stage)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_exit(code: i32) {
    counter!("dot_ai_exits_total", "code" => code.to_string()).increment(1);
}
