use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use engine_core::*;
use tracing::{info, warn};

use crate::store::StateStore;

pub type ActionResult = Result<ActionReceipt, OrderError>;

fn parse_address(field: &'static str, value: &str) -> Result<Address, OrderError> {
    Address::from_str(value.trim()).map_err(|_| OrderError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

async fn confirm(
    step: &'static str,
    pending: anyhow::Result<PendingTx>,
    metrics: &Metrics,
    receipt: &mut ActionReceipt,
) -> Result<(), OrderError> {
    let pending = pending.map_err(|e| OrderError::chain(step, e))?;
    let hash = pending.tx_hash();
    info!(target: "orders", step, tx = %hash, "submitted, awaiting inclusion");
    let included = pending
        .included()
        .await
        .map_err(|e| OrderError::chain(step, e))?;
    metrics.txs_included.inc();
    receipt.steps.push(included);
    Ok(())
}

// each step is awaited to inclusion before the next one is submitted
#[derive(Clone)]
pub struct OrderOrchestrator {
    store: StateStore,
    registry: CurrencyRegistry,
    nft: Address,
    marketplace: Address,
    metrics: Arc<Metrics>,
}

impl OrderOrchestrator {
    pub fn new(
        store: StateStore,
        registry: CurrencyRegistry,
        nft: Address,
        marketplace: Address,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            registry,
            nft,
            marketplace,
            metrics,
        }
    }

    fn identity(&self) -> Result<Identity, OrderError> {
        match self.store.session() {
            Session::Authenticated(id) => Ok(id),
            Session::Anonymous => Err(OrderError::NotAuthenticated),
        }
    }

    fn currency_kind(&self, token: &str) -> Result<CurrencyKind, OrderError> {
        self.registry
            .kind_of(token)
            .ok_or_else(|| OrderError::UnsupportedCurrency(token.to_string()))
    }

    fn record(&self, action: &'static str, result: &ActionResult) {
        match result {
            Ok(receipt) => {
                self.metrics
                    .actions_succeeded
                    .with_label_values(&[action])
                    .inc();
                info!(target: "orders", action, steps = receipt.steps.len(), "action completed");
            }
            Err(err) => {
                self.metrics.actions_failed.with_label_values(&[action]).inc();
                warn!(target: "orders", action, error = %err, "action failed");
            }
        }
    }

    async fn run<F>(&self, action: &'static str, fut: F) -> ActionResult
    where
        F: std::future::Future<Output = ActionResult>,
    {
        self.metrics
            .actions_submitted
            .with_label_values(&[action])
            .inc();
        let result = fut.await;
        self.record(action, &result);
        result
    }

    pub async fn mint(&self, metadata_url: &str) -> ActionResult {
        self.run("mint", async {
            let id = self.identity()?;
            let chain = id.wallet.chain();
            let mut receipt = ActionReceipt::default();
            let pending = chain
                .nft(self.nft)
                .mint(id.wallet.signer(), metadata_url)
                .await;
            confirm("mint", pending, &self.metrics, &mut receipt).await?;
            Ok(receipt)
        })
        .await
    }

    pub async fn list_for_sale(&self, params: &ListParams) -> ActionResult {
        self.run("list_for_sale", async {
            let id = self.identity()?;
            let nft = parse_address("nftAddress", &params.nft_address)?;
            let currency = parse_address("currency", &params.currency)?;
            let asset_id = asset_id_to_u256(params.asset_id);
            let price = amount_to_wei(params.price)?;
            let signer = id.wallet.signer();
            let chain = id.wallet.chain();
            let mut receipt = ActionReceipt::default();

            let pending = chain.nft(nft).approve(signer, self.marketplace, asset_id).await;
            confirm("approve", pending, &self.metrics, &mut receipt).await?;

            let pending = chain
                .marketplace(self.marketplace)
                .create_order(
                    signer,
                    nft,
                    id.address,
                    asset_id,
                    currency,
                    price,
                    U256::from(params.expires_at),
                )
                .await;
            confirm("createOrder", pending, &self.metrics, &mut receipt).await?;
            Ok(receipt)
        })
        .await
    }

    pub async fn cancel_order(&self, params: &CancelParams) -> ActionResult {
        self.run("cancel_order", async {
            let id = self.identity()?;
            let nft = parse_address("nftAddress", &params.nft_address)?;
            let mut receipt = ActionReceipt::default();
            let pending = id
                .wallet
                .chain()
                .marketplace(self.marketplace)
                .cancel_order(id.wallet.signer(), nft, asset_id_to_u256(params.asset_id))
                .await;
            confirm("cancelOrder", pending, &self.metrics, &mut receipt).await?;
            Ok(receipt)
        })
        .await
    }

    async fn approve_spend(
        &self,
        id: &Identity,
        token: Address,
        price: U256,
        receipt: &mut ActionReceipt,
    ) -> Result<(), OrderError> {
        let pending = id
            .wallet
            .chain()
            .token(token)
            .approve(id.wallet.signer(), self.marketplace, price)
            .await;
        confirm("approve", pending, &self.metrics, receipt).await
    }

    pub async fn buy(&self, params: &BuyParams) -> ActionResult {
        self.run("buy", async {
            let id = self.identity()?;
            let kind = self.currency_kind(&params.accepted_token)?;
            let nft = parse_address("nftAddress", &params.nft_address)?;
            let asset_id = asset_id_to_u256(params.asset_id);
            let price = amount_to_wei(params.price)?;
            let mut receipt = ActionReceipt::default();

            let value = match kind {
                CurrencyKind::Native => Some(price),
                CurrencyKind::Token(token) => {
                    self.approve_spend(&id, token, price, &mut receipt).await?;
                    None
                }
            };
            let pending = id
                .wallet
                .chain()
                .marketplace(self.marketplace)
                .execute_order(id.wallet.signer(), nft, asset_id, price, value)
                .await;
            confirm("executeOrder", pending, &self.metrics, &mut receipt).await?;
            Ok(receipt)
        })
        .await
    }

    pub async fn bid(&self, params: &BidParams) -> ActionResult {
        self.run("bid", async {
            let id = self.identity()?;
            let kind = self.currency_kind(&params.accepted_token)?;
            let nft = parse_address("nftAddress", &params.nft_address)?;
            let asset_id = asset_id_to_u256(params.asset_id);
            let price = amount_to_wei(params.price)?;
            let mut receipt = ActionReceipt::default();

            let value = match kind {
                CurrencyKind::Native => Some(price),
                CurrencyKind::Token(token) => {
                    self.approve_spend(&id, token, price, &mut receipt).await?;
                    None
                }
            };
            let pending = id
                .wallet
                .chain()
                .marketplace(self.marketplace)
                .place_bid(
                    id.wallet.signer(),
                    nft,
                    asset_id,
                    price,
                    U256::from(params.expires_at),
                    value,
                )
                .await;
            confirm("placeBid", pending, &self.metrics, &mut receipt).await?;
            Ok(receipt)
        })
        .await
    }

    pub async fn accept_bid(&self, params: &AcceptBidParams) -> ActionResult {
        self.run("accept_bid", async {
            let id = self.identity()?;
            let nft = parse_address("address", &params.address)?;
            let price = amount_to_wei(params.price)?;
            let mut receipt = ActionReceipt::default();
            let pending = id
                .wallet
                .chain()
                .marketplace(self.marketplace)
                .accept_bid(id.wallet.signer(), nft, asset_id_to_u256(params.id), price)
                .await;
            confirm("acceptBid", pending, &self.metrics, &mut receipt).await?;
            Ok(receipt)
        })
        .await
    }
}
