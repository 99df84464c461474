//! Prometheus metrics for the game service.

use prometheus::{Counter, Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Metrics registry shared across handlers and session drivers.
pub struct GameMetrics {
    registry: Registry,

    pub sessions_open: IntGauge,
    pub sessions_created_total: IntCounter,
    pub rounds_started_total: IntCounter,
    pub rounds_crashed_total: IntCounter,
    pub cashouts_total: IntCounter,
    pub bets_rejected_total: IntCounter,
    /// Total amount staked across all accepted bets.
    pub wagered_total: Counter,
    /// Total amount credited back through cash-outs.
    pub paid_out_total: Counter,
}

impl GameMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let sessions_open =
            IntGauge::with_opts(Opts::new("crashlab_sessions_open", "Open game sessions"))
                .expect("valid metric opts");
        let sessions_created_total = IntCounter::with_opts(Opts::new(
            "crashlab_sessions_created_total",
            "Sessions created since start",
        ))
        .expect("valid metric opts");
        let rounds_started_total = IntCounter::with_opts(Opts::new(
            "crashlab_rounds_started_total",
            "Rounds started (bets accepted)",
        ))
        .expect("valid metric opts");
        let rounds_crashed_total = IntCounter::with_opts(Opts::new(
            "crashlab_rounds_crashed_total",
            "Rounds that reached their crash point",
        ))
        .expect("valid metric opts");
        let cashouts_total = IntCounter::with_opts(Opts::new(
            "crashlab_cashouts_total",
            "Successful cash-outs",
        ))
        .expect("valid metric opts");
        let bets_rejected_total = IntCounter::with_opts(Opts::new(
            "crashlab_bets_rejected_total",
            "Bets rejected by validation",
        ))
        .expect("valid metric opts");
        let wagered_total = Counter::with_opts(Opts::new(
            "crashlab_wagered_total",
            "Total amount staked across accepted bets",
        ))
        .expect("valid metric opts");
        let paid_out_total = Counter::with_opts(Opts::new(
            "crashlab_paid_out_total",
            "Total amount credited through cash-outs",
        ))
        .expect("valid metric opts");

        for metric in [
            Box::new(sessions_created_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(rounds_started_total.clone()),
            Box::new(rounds_crashed_total.clone()),
            Box::new(cashouts_total.clone()),
            Box::new(bets_rejected_total.clone()),
        ] {
            registry.register(metric).expect("metric registers once");
        }
        registry
            .register(Box::new(sessions_open.clone()))
            .expect("metric registers once");
        registry
            .register(Box::new(wagered_total.clone()))
            .expect("metric registers once");
        registry
            .register(Box::new(paid_out_total.clone()))
            .expect("metric registers once");

        Self {
            registry,
            sessions_open,
            sessions_created_total,
            rounds_started_total,
            rounds_crashed_total,
            cashouts_total,
            bets_rejected_total,
            wagered_total,
            paid_out_total,
        }
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
