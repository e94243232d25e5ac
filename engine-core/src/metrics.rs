use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub actions_submitted: IntCounterVec,
    pub actions_succeeded: IntCounterVec,
    pub actions_failed: IntCounterVec,
    pub txs_included: IntCounter,
    pub balance_refreshes: IntCounter,
    pub poll_failures: IntCounterVec,
}

impl Metrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Arc<Self>> {
        let actions_submitted = IntCounterVec::new(
            Opts::new("market_actions_submitted", "Marketplace actions started"),
            &["action"],
        )?;
        let actions_succeeded = IntCounterVec::new(
            Opts::new("market_actions_succeeded", "Marketplace actions completed"),
            &["action"],
        )?;
        let actions_failed = IntCounterVec::new(
            Opts::new("market_actions_failed", "Marketplace actions failed"),
            &["action"],
        )?;
        let txs_included =
            IntCounter::with_opts(Opts::new("market_txs_included", "Transactions included"))?;
        let balance_refreshes = IntCounter::with_opts(Opts::new(
            "market_balance_refreshes",
            "Balance vectors applied to the state store",
        ))?;
        let poll_failures = IntCounterVec::new(
            Opts::new("market_poll_failures", "Indexer poll ticks that reported an error"),
            &["query"],
        )?;
        registry.register(Box::new(actions_submitted.clone())).ok();
        registry.register(Box::new(actions_succeeded.clone())).ok();
        registry.register(Box::new(actions_failed.clone())).ok();
        registry.register(Box::new(txs_included.clone())).ok();
        registry.register(Box::new(balance_refreshes.clone())).ok();
        registry.register(Box::new(poll_failures.clone())).ok();
        Ok(Arc::new(Self {
            actions_submitted,
            actions_succeeded,
            actions_failed,
            txs_included,
            balance_refreshes,
            poll_failures,
        }))
    }

    pub fn unregistered() -> Arc<Self> {
        match Self::new(&Registry::new()) {
            Ok(m) => m,
            // Metric names and labels are static; construction cannot fail.
            Err(err) => unreachable!("static metric definitions rejected: {err}"),
        }
    }
}
