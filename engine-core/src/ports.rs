use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::model::*;

#[async_trait]
pub trait PendingTransaction: Send {
    fn tx_hash(&self) -> B256;

    async fn included(self: Box<Self>) -> anyhow::Result<TxReceipt>;
}

pub type PendingTx = Box<dyn PendingTransaction>;

#[async_trait]
pub trait NftContract: Send + Sync {
    async fn mint(&self, from: &PrivateKeySigner, token_uri: &str) -> anyhow::Result<PendingTx>;
    async fn approve(
        &self,
        from: &PrivateKeySigner,
        to: Address,
        token_id: U256,
    ) -> anyhow::Result<PendingTx>;
}

#[async_trait]
pub trait TokenContract: Send + Sync {
    async fn balance_of(&self, owner: Address) -> anyhow::Result<U256>;
    async fn approve(
        &self,
        from: &PrivateKeySigner,
        spender: Address,
        amount: U256,
    ) -> anyhow::Result<PendingTx>;
}

#[async_trait]
pub trait MarketplaceContract: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn create_order(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        seller: Address,
        asset_id: U256,
        currency: Address,
        price: U256,
        expires_at: U256,
    ) -> anyhow::Result<PendingTx>;

    async fn cancel_order(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
    ) -> anyhow::Result<PendingTx>;

    // `value` is only set when paying in the native coin
    async fn execute_order(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
        value: Option<U256>,
    ) -> anyhow::Result<PendingTx>;

    #[allow(clippy::too_many_arguments)]
    async fn place_bid(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
        expires_at: U256,
        value: Option<U256>,
    ) -> anyhow::Result<PendingTx>;

    async fn accept_bid(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
    ) -> anyhow::Result<PendingTx>;
}

#[async_trait]
pub trait ChainConnection: Send + Sync {
    async fn native_balance(&self, owner: Address) -> anyhow::Result<U256>;
    fn nft(&self, address: Address) -> Arc<dyn NftContract>;
    fn token(&self, address: Address) -> Arc<dyn TokenContract>;
    fn marketplace(&self, address: Address) -> Arc<dyn MarketplaceContract>;
}

pub trait CredentialDecoder: Send + Sync {
    fn decode(&self, token: &str) -> anyhow::Result<CredentialClaims>;
}

#[async_trait]
pub trait IndexerQueries: Send + Sync {
    async fn all_listings(&self) -> QueryState<Vec<Listing>>;
    async fn collection_listings(&self) -> QueryState<Vec<Listing>>;
    async fn user(&self, address: &str) -> QueryState<Option<UserRecord>>;
    async fn users(&self) -> QueryState<Vec<UserRecord>>;
}

pub trait RequestLayer: Send + Sync {
    fn set_default_authorization(&self, credential: Option<&str>);
}
