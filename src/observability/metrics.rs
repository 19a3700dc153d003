//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_calls_total` (counter): handled calls by method, transport, code
//! - `rpc_rejected_total` (counter): calls stopped by the chain, by method, code
//! - `rpc_stream_messages_total` (counter): stream messages by method, direction
//! - `demux_connections_total` (counter): classified connections by protocol
//! - `demux_dropped_total` (counter): connections dropped unclassified, by reason
//! - `active_connections` (gauge): connections currently held

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use tonic::{Code, Status};

use crate::rpc::{CallInfo, Payload, StreamRequestObserver, StreamResponseObserver, UnaryObserver};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

fn code_label(code: Code) -> String {
    format!("{code:?}")
}

pub fn record_rejection(method: &'static str, code: Code) {
    counter!("rpc_rejected_total", "method" => method, "code" => code_label(code)).increment(1);
}

pub fn record_connection(protocol: &'static str) {
    counter!("demux_connections_total", "protocol" => protocol).increment(1);
}

pub fn record_dropped_connection(reason: &'static str) {
    counter!("demux_dropped_total", "reason" => reason).increment(1);
}

pub fn set_active_connections(count: u64) {
    gauge!("active_connections").set(count as f64);
}

/// Counts observed calls and stream messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl MetricsObserver {
    pub const NAME: &'static str = "metrics";
}

impl UnaryObserver for MetricsObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn observe_unary(&self, info: &CallInfo, _request: &dyn Payload, response: Result<&dyn Payload, &Status>) {
        let code = response.map_or_else(|status| status.code(), |_| Code::Ok);
        counter!(
            "rpc_calls_total",
            "method" => info.method,
            "transport" => info.transport.as_str(),
            "code" => code_label(code)
        )
        .increment(1);
    }
}

impl StreamRequestObserver for MetricsObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn observe_stream_request(&self, info: &CallInfo, request: Result<Option<&dyn Payload>, &Status>) {
        if let Ok(Some(_)) = request {
            counter!("rpc_stream_messages_total", "method" => info.method, "direction" => "recv").increment(1);
        }
    }
}

impl StreamResponseObserver for MetricsObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn observe_stream_response(&self, info: &CallInfo, _response: &dyn Payload, error: Option<&Status>) {
        if error.is_none() {
            counter!("rpc_stream_messages_total", "method" => info.method, "direction" => "send").increment(1);
        }
    }
}
