use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use engine_core::*;
use prometheus::Registry;
use tokio::task::JoinHandle;
use tracing::info;

use crate::balances::BalanceAggregator;
use crate::config::MarketConfig;
use crate::credential::JwtDecoder;
use crate::graphql::GraphqlIndexer;
use crate::http_api::ApiClient;
use crate::orchestrator::{ActionResult, OrderOrchestrator};
use crate::poller::{spawn_pollers, PollContext};
use crate::rpc::JsonRpcChain;
use crate::session::{configure_outbound_auth, SessionManager};
use crate::store::{StateStore, StateUpdate};

#[derive(Clone)]
pub struct Adapters {
    pub chain: Arc<dyn ChainConnection>,
    pub decoder: Arc<dyn CredentialDecoder>,
    pub indexer: Arc<dyn IndexerQueries>,
    pub requests: Arc<dyn RequestLayer>,
}

fn contract_address(name: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("contracts.{name} '{value}'"))
}

pub struct MarketClient {
    cfg: MarketConfig,
    store: StateStore,
    registry: CurrencyRegistry,
    sessions: SessionManager,
    orders: OrderOrchestrator,
    balances: BalanceAggregator,
    indexer: Arc<dyn IndexerQueries>,
    requests: Arc<dyn RequestLayer>,
    metrics: Arc<Metrics>,
}

impl MarketClient {
    pub fn new(cfg: MarketConfig, adapters: Adapters, metrics: Arc<Metrics>) -> Result<Self> {
        let registry = CurrencyRegistry::new(cfg.currency_entries())
            .ok_or_else(|| anyhow!("at least one currency must be configured"))?;
        let nft = contract_address("nft", &cfg.contracts.nft)?;
        let marketplace = contract_address("marketplace", &cfg.contracts.marketplace)?;

        let store = StateStore::new(registry.entries().to_vec());
        let sessions = SessionManager::new(adapters.decoder, Arc::clone(&adapters.chain));
        let orders = OrderOrchestrator::new(
            store.clone(),
            registry.clone(),
            nft,
            marketplace,
            Arc::clone(&metrics),
        );
        let balances =
            BalanceAggregator::new(adapters.chain, registry.clone(), Arc::clone(&metrics));
        Ok(Self {
            cfg,
            store,
            registry,
            sessions,
            orders,
            balances,
            indexer: adapters.indexer,
            requests: adapters.requests,
            metrics,
        })
    }

    pub fn connect(cfg: MarketConfig, registry: &Registry) -> Result<Self> {
        let chain = JsonRpcChain::new(&cfg.rpc).context("rpc connection")?;
        let api = ApiClient::new(&cfg.api).context("api client")?;
        let indexer = GraphqlIndexer::new(api.clone(), cfg.api.graphql_path.clone());
        let decoder = JwtDecoder::from_secret(cfg.jwt_secret.as_deref());
        let metrics = Metrics::new(registry).context("register metrics")?;
        info!(
            target: "market",
            rpc = %cfg.rpc.url,
            chain_id = chain.chain_id(),
            api = %cfg.api.base_url,
            verified_credentials = cfg.jwt_secret.is_some(),
            "market client configured"
        );
        Self::new(
            cfg,
            Adapters {
                chain: Arc::new(chain),
                decoder: Arc::new(decoder),
                indexer: Arc::new(indexer),
                requests: Arc::new(api),
            },
            metrics,
        )
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn registry(&self) -> &CurrencyRegistry {
        &self.registry
    }

    pub fn orders(&self) -> &OrderOrchestrator {
        &self.orders
    }

    pub fn get_currency(&self, token: &str) -> CurrencyEntry {
        self.registry.resolve(token)
    }

    pub fn login(&self, credential: &str) -> Result<Session, SessionError> {
        let session = self.sessions.derive_session(credential)?;
        configure_outbound_auth(self.requests.as_ref(), &session);
        self.store.apply(StateUpdate::Auth(session.clone()));
        Ok(session)
    }

    pub fn logout(&self) {
        configure_outbound_auth(self.requests.as_ref(), &Session::Anonymous);
        self.store.apply(StateUpdate::Auth(Session::Anonymous));
        self.store.apply(StateUpdate::UserInfo(None));
        self.store.apply(StateUpdate::Balances(Vec::new()));
        info!(target: "session", "logged out");
    }

    pub async fn check_balances(&self, tokens: &[String]) -> BalanceVector {
        self.balances.check_balances(&self.store, tokens).await
    }

    pub async fn refresh_balances(&self) -> BalanceVector {
        self.balances.refresh(&self.store).await
    }

    async fn settle(&self, result: ActionResult) -> ActionResult {
        if result.is_ok() {
            self.refresh_balances().await;
        }
        result
    }

    pub async fn mint(&self, metadata_url: &str) -> ActionResult {
        let result = self.orders.mint(metadata_url).await;
        self.settle(result).await
    }

    pub async fn list_for_sale(&self, params: &ListParams) -> ActionResult {
        let result = self.orders.list_for_sale(params).await;
        self.settle(result).await
    }

    pub async fn cancel_order(&self, params: &CancelParams) -> ActionResult {
        let result = self.orders.cancel_order(params).await;
        self.settle(result).await
    }

    pub async fn buy(&self, params: &BuyParams) -> ActionResult {
        let result = self.orders.buy(params).await;
        self.settle(result).await
    }

    pub async fn bid(&self, params: &BidParams) -> ActionResult {
        let result = self.orders.bid(params).await;
        self.settle(result).await
    }

    pub async fn accept_bid(&self, params: &AcceptBidParams) -> ActionResult {
        let result = self.orders.accept_bid(params).await;
        self.settle(result).await
    }

    pub fn spawn_pollers(&self) -> Vec<JoinHandle<()>> {
        let period = Duration::from_millis(self.cfg.poll_interval_ms.max(1));
        spawn_pollers(
            PollContext {
                indexer: Arc::clone(&self.indexer),
                store: self.store.clone(),
                balances: self.balances.clone(),
                metrics: Arc::clone(&self.metrics),
            },
            period,
        )
    }
}
