use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("monitor_ticks_total").absolute(0);
    counter!("price_signals_total").absolute(0);
    counter!("feed_errors_total").absolute(0);
    counter!("backups_total").absolute(0);
    counter!("restores_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("active_positions").set(0.0);
    gauge!("monitored_primaries").set(0.0);

    handle
}
