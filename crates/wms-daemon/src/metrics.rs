//! Prometheus metrics for the command pipeline.

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, Encoder,
    HistogramVec, IntCounterVec, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    /// Labels: command, outcome (`ok` or the error kind).
    pub commands_total: IntCounterVec,
    /// Labels: command.
    pub command_duration_seconds: HistogramVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let commands_total = register_int_counter_vec_with_registry!(
            "wms_commands_total",
            "Inventory commands processed, by command and outcome",
            &["command", "outcome"],
            registry
        )
        .expect("commands_total registration");
        let command_duration_seconds = register_histogram_vec_with_registry!(
            "wms_command_duration_seconds",
            "Inventory command latency",
            &["command"],
            registry
        )
        .expect("command_duration registration");

        Self {
            registry,
            commands_total,
            command_duration_seconds,
        }
    }

    pub fn observe(&self, command: &str, outcome: &str, seconds: f64) {
        self.commands_total
            .with_label_values(&[command, outcome])
            .inc();
        self.command_duration_seconds
            .with_label_values(&[command])
            .observe(seconds);
    }

    /// Prometheus text exposition of everything registered.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if encoder
            .encode(&self.registry.gather(), &mut buf)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
