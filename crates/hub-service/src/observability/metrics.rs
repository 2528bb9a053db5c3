//! Metrics definitions for Hub Service
//!
//! All metrics follow Prometheus naming conventions:
//! - `hub_` prefix
//! - `_total` suffix for counters

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("hub_broadcast_fanout".to_string()),
            &[0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0],
        )
        .map_err(|e| format!("Failed to set broadcast fan-out buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Registry gauges
// ============================================================================

/// Metric: `hub_connections_registered`
pub fn set_connections_registered(count: usize) {
    // usize to f64 conversion is safe for realistic connection counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("hub_connections_registered").set(count as f64);
}

/// Metric: `hub_areas_active`
pub fn set_areas_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("hub_areas_active").set(count as f64);
}

// ============================================================================
// Connection lifecycle
// ============================================================================

/// Metric: `hub_connections_active`
pub fn connection_opened() {
    gauge!("hub_connections_active").increment(1.0);
}

/// Metric: `hub_connections_active`, `hub_connections_closed_total`
pub fn connection_closed(reason: &'static str) {
    gauge!("hub_connections_active").decrement(1.0);
    counter!("hub_connections_closed_total", "reason" => reason).increment(1);
}

/// Metric: `hub_protocol_violations_total`
pub fn record_protocol_violation() {
    counter!("hub_protocol_violations_total").increment(1);
}

// ============================================================================
// Fan-out
// ============================================================================

/// Metric: `hub_messages_broadcast_total`, `hub_broadcast_fanout`
pub fn record_broadcast(recipients: usize) {
    counter!("hub_messages_broadcast_total").increment(1);
    #[allow(clippy::cast_precision_loss)]
    histogram!("hub_broadcast_fanout").record(recipients as f64);
}

/// Metric: `hub_messages_dropped_total`
///
/// Labels: `reason` (`queue_full`, `closed`)
pub fn record_message_dropped(reason: &'static str) {
    counter!("hub_messages_dropped_total", "reason" => reason).increment(1);
}

/// Metric: `hub_forced_disconnects_total`
pub fn record_forced_disconnect() {
    counter!("hub_forced_disconnects_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render_with_expected_names() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            connection_opened();
            set_connections_registered(3);
            set_areas_active(2);
            record_broadcast(2);
            record_message_dropped("queue_full");
            record_forced_disconnect();
            record_protocol_violation();
            connection_closed("peer_closed");
        });

        let rendered = handle.render();
        for name in [
            "hub_connections_active",
            "hub_connections_registered",
            "hub_areas_active",
            "hub_messages_broadcast_total",
            "hub_messages_dropped_total",
            "hub_forced_disconnects_total",
            "hub_protocol_violations_total",
            "hub_connections_closed_total",
        ] {
            assert!(rendered.contains(name), "missing {name} in:\n{rendered}");
        }
        assert!(rendered.contains("reason=\"queue_full\""));
    }

    #[test]
    fn test_metric_functions_without_recorder() {
        // No recorder installed: calls are no-ops
        set_connections_registered(0);
        set_areas_active(0);
        record_broadcast(0);
        record_message_dropped("closed");
    }
}
