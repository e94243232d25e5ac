use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ports::ChainConnection;

pub type TimestampSecs = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyEntry {
    pub label: String,
    pub value: String,
}

impl CurrencyEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyKind {
    Native,
    Token(Address),
}

// fields the client does not read are kept verbatim in `extra`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default)]
    pub nft_address: String,
    #[serde(default)]
    pub asset_id: Value,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub expires_at: Value,
    #[serde(default)]
    pub seller: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub address: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type UsersByAddress = HashMap<String, UserRecord>;

pub type BalanceVector = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> QueryState<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            QueryState::Ready(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialClaims {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub private_key: String,
}

#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain: Arc<dyn ChainConnection>,
}

impl Wallet {
    pub fn new(signer: PrivateKeySigner, chain: Arc<dyn ChainConnection>) -> Self {
        Self { signer, chain }
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn chain(&self) -> &Arc<dyn ChainConnection> {
        &self.chain
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Identity {
    pub display_name: String,
    pub email: String,
    pub bio: String,
    pub address: Address,
    // address string exactly as the credential carries it; the indexer keys users by it
    pub account: String,
    pub credential: String,
    pub wallet: Wallet,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("address", &self.address)
            .field("account", &self.account)
            .field("wallet", &self.wallet)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(id) => Some(id),
            Session::Anonymous => None,
        }
    }

    pub fn address(&self) -> Option<Address> {
        self.identity().map(|id| id.address)
    }

    pub fn account(&self) -> Option<&str> {
        self.identity().map(|id| id.account.as_str())
    }

    pub fn address_string(&self) -> String {
        self.address()
            .map(|a| a.to_checksum(None))
            .unwrap_or_default()
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        self.identity().map(|id| &id.wallet)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    pub nft_address: String,
    pub asset_id: u64,
    pub currency: String,
    pub price: Decimal,
    pub expires_at: TimestampSecs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelParams {
    pub nft_address: String,
    pub asset_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyParams {
    pub nft_address: String,
    pub asset_id: u64,
    pub accepted_token: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidParams {
    pub nft_address: String,
    pub asset_id: u64,
    pub accepted_token: String,
    pub price: Decimal,
    pub expires_at: TimestampSecs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptBidParams {
    pub address: String,
    pub id: u64,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReceipt {
    pub steps: Vec<TxReceipt>,
}

impl ActionReceipt {
    pub fn last_hash(&self) -> Option<B256> {
        self.steps.last().map(|r| r.tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_keeps_unknown_indexer_fields() {
        let raw = json!({
            "nftAddress": "0x1111111111111111111111111111111111111111",
            "assetId": "7",
            "currency": "0x2222222222222222222222222222222222222222",
            "price": "1.5",
            "expiresAt": 1700000000,
            "seller": "0x3333333333333333333333333333333333333333",
            "metadata": { "name": "Ape" }
        });
        let listing: Listing = serde_json::from_value(raw).unwrap();
        assert_eq!(listing.asset_id, json!("7"));
        assert_eq!(listing.extra.get("metadata"), Some(&json!({ "name": "Ape" })));
    }

    #[test]
    fn anonymous_session_has_no_address() {
        let s = Session::default();
        assert!(!s.is_authenticated());
        assert_eq!(s.address_string(), "");
        assert!(s.wallet().is_none());
    }

    #[test]
    fn query_state_only_yields_ready_values() {
        assert_eq!(QueryState::Ready(3).ready(), Some(3));
        assert_eq!(QueryState::<i32>::Loading.ready(), None);
        assert_eq!(QueryState::<i32>::Failed("x".into()).ready(), None);
    }
}
