use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicI64;
use std::sync::{Arc, Mutex};

/// Prometheus metrics for the consensus core. One instance per process,
/// shared via `Arc` with every view task.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Mutex<Registry>>,

    pub current_view: Gauge<i64, AtomicI64>,
    pub proposals_produced: Counter,
    pub proposals_received: Counter,
    pub votes_accepted: Counter,
    pub votes_rejected: Counter,
    pub duplicate_votes: Counter,
    pub qcs_formed: Counter,
    pub view_timeouts: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let current_view = Gauge::<i64, AtomicI64>::default();
        registry.register("hotstuff_current_view", "Current active view", current_view.clone());

        let proposals_produced = Counter::default();
        registry.register("hotstuff_proposals_produced_total", "Proposals produced as leader", proposals_produced.clone());

        let proposals_received = Counter::default();
        registry.register("hotstuff_proposals_received_total", "Valid proposals received", proposals_received.clone());

        let votes_accepted = Counter::default();
        registry.register("hotstuff_votes_accepted_total", "Votes counted toward quorum", votes_accepted.clone());

        let votes_rejected = Counter::default();
        registry.register("hotstuff_votes_rejected_total", "Votes rejected", votes_rejected.clone());

        let duplicate_votes = Counter::default();
        registry.register("hotstuff_duplicate_votes_total", "Duplicate votes from seen signers", duplicate_votes.clone());

        let qcs_formed = Counter::default();
        registry.register("hotstuff_qcs_formed_total", "Quorum certificates formed", qcs_formed.clone());

        let view_timeouts = Counter::default();
        registry.register("hotstuff_view_timeouts_total", "Views timed out before quorum", view_timeouts.clone());

        Self {
            registry: Arc::new(Mutex::new(registry)),
            current_view,
            proposals_produced,
            proposals_received,
            votes_accepted,
            votes_rejected,
            duplicate_votes,
            qcs_formed,
            view_timeouts,
        }
    }

    /// Text exposition format, for whatever endpoint the embedding node runs.
    pub fn gather(&self) -> String {
        let mut out = String::new();
        if let Ok(registry) = self.registry.lock() {
            let _ = encode(&mut out, &registry);
        }
        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
