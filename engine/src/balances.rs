use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use engine_core::{wei_to_amount, BalanceVector, ChainConnection, CurrencyRegistry, Metrics};
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::store::{StateStore, StateUpdate};

fn zeros(len: usize) -> BalanceVector {
    vec!["0".to_string(); len]
}

#[derive(Clone)]
pub struct BalanceAggregator {
    chain: Arc<dyn ChainConnection>,
    registry: CurrencyRegistry,
    metrics: Arc<Metrics>,
}

impl BalanceAggregator {
    pub fn new(
        chain: Arc<dyn ChainConnection>,
        registry: CurrencyRegistry,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            chain,
            registry,
            metrics,
        }
    }

    // one decimal amount per identifier; all "0" when anonymous or when any fetch fails
    pub async fn check_balances(&self, store: &StateStore, tokens: &[String]) -> BalanceVector {
        self.balances_of(store.session().address(), tokens).await
    }

    async fn balances_of(&self, owner: Option<Address>, tokens: &[String]) -> BalanceVector {
        let Some(owner) = owner else {
            return zeros(tokens.len());
        };
        debug!(target: "balances", owner = %owner, tokens = ?tokens, "checking balances");
        match self.fetch_all(owner, tokens).await {
            Ok(values) => values.into_iter().map(wei_to_amount).collect(),
            Err(err) => {
                warn!(target: "balances", owner = %owner, error = %format!("{err:#}"), "checkBalances failed");
                zeros(tokens.len())
            }
        }
    }

    async fn fetch_all(&self, owner: Address, tokens: &[String]) -> Result<Vec<U256>> {
        try_join_all(tokens.iter().map(|t| self.fetch_one(owner, t))).await
    }

    async fn fetch_one(&self, owner: Address, token: &str) -> Result<U256> {
        if self.registry.is_native(token) {
            return self
                .chain
                .native_balance(owner)
                .await
                .context("native balance");
        }
        let address = Address::from_str(token.trim())
            .with_context(|| format!("token identifier '{}'", token))?;
        self.chain
            .token(address)
            .balance_of(owner)
            .await
            .with_context(|| format!("balanceOf on {}", address))
    }

    pub async fn refresh(&self, store: &StateStore) -> BalanceVector {
        let owner = store.session().address();
        let tokens = self.registry.identifiers();
        let balances = self.balances_of(owner, &tokens).await;
        // the session may have changed while the fetch was in flight
        if store.session().address() != owner {
            debug!(target: "balances", "session changed during refresh; result dropped");
            return balances;
        }
        store.apply(StateUpdate::Balances(balances.clone()));
        self.metrics.balance_refreshes.inc();
        balances
    }
}
