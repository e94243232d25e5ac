//! Recording fakes of the collaborator ports, shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use engine_core::*;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::store::StateStore;

/// First well-known development key; its address is `DEV_ADDRESS`.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const NATIVE_MARKER: &str = "NATIVE";

pub fn addr(last: u8) -> Address {
    Address::with_last_byte(last)
}

pub fn token_address() -> Address {
    addr(0x71)
}

pub fn nft_address() -> Address {
    addr(0x0a)
}

pub fn market_address() -> Address {
    addr(0x0b)
}

pub fn dev_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_str(DEV_KEY).unwrap()
}

pub fn wei(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

pub fn registry() -> CurrencyRegistry {
    CurrencyRegistry::new(vec![
        CurrencyEntry::new("BNB", NATIVE_MARKER),
        CurrencyEntry::new("BUSD", token_address().to_string()),
    ])
    .unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    NativeBalance(Address),
    TokenBalance {
        token: Address,
        owner: Address,
    },
    Mint {
        nft: Address,
        uri: String,
    },
    NftApprove {
        nft: Address,
        to: Address,
        token_id: U256,
    },
    TokenApprove {
        token: Address,
        spender: Address,
        amount: U256,
    },
    CreateOrder {
        nft: Address,
        seller: Address,
        asset_id: U256,
        currency: Address,
        price: U256,
        expires_at: U256,
    },
    CancelOrder {
        nft: Address,
        asset_id: U256,
    },
    ExecuteOrder {
        nft: Address,
        asset_id: U256,
        price: U256,
        value: Option<U256>,
    },
    PlaceBid {
        nft: Address,
        asset_id: U256,
        price: U256,
        expires_at: U256,
        value: Option<U256>,
    },
    AcceptBid {
        nft: Address,
        asset_id: U256,
        price: U256,
    },
}

#[derive(Default)]
struct ChainState {
    calls: Vec<Call>,
    timeline: Vec<String>,
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    reject: HashSet<&'static str>,
    revert: HashSet<&'static str>,
    failing_tokens: HashSet<Address>,
    native_gate: Option<Arc<Notify>>,
    next_hash: u8,
}

/// In-memory chain. Every call is recorded; named steps can be made to fail
/// at submission (`reject`) or at inclusion (`revert`).
#[derive(Clone, Default)]
pub struct FakeChain {
    state: Arc<Mutex<ChainState>>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native(self, owner: Address, amount: U256) -> Self {
        self.state.lock().native.insert(owner, amount);
        self
    }

    pub fn with_token(self, token: Address, owner: Address, amount: U256) -> Self {
        self.state.lock().tokens.insert((token, owner), amount);
        self
    }

    pub fn reject(&self, step: &'static str) {
        self.state.lock().reject.insert(step);
    }

    pub fn revert(&self, step: &'static str) {
        self.state.lock().revert.insert(step);
    }

    pub fn fail_token(&self, token: Address) {
        self.state.lock().failing_tokens.insert(token);
    }

    /// Native balance reads wait for `gate` before answering.
    pub fn hold_native(&self, gate: Arc<Notify>) {
        self.state.lock().native_gate = Some(gate);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Submission and inclusion events, e.g. `submit:approve`, `included:approve`.
    pub fn timeline(&self) -> Vec<String> {
        self.state.lock().timeline.clone()
    }

    fn submit(&self, step: &'static str, call: Call) -> Result<PendingTx> {
        let mut st = self.state.lock();
        st.calls.push(call);
        st.timeline.push(format!("submit:{step}"));
        if st.reject.contains(step) {
            return Err(anyhow!("{step} rejected by node"));
        }
        st.next_hash = st.next_hash.wrapping_add(1);
        let hash = B256::with_last_byte(st.next_hash);
        Ok(Box::new(FakePending {
            step,
            hash,
            revert: st.revert.contains(step),
            chain: self.clone(),
        }))
    }
}

struct FakePending {
    step: &'static str,
    hash: B256,
    revert: bool,
    chain: FakeChain,
}

#[async_trait]
impl PendingTransaction for FakePending {
    fn tx_hash(&self) -> B256 {
        self.hash
    }

    async fn included(self: Box<Self>) -> Result<TxReceipt> {
        tokio::task::yield_now().await;
        if self.revert {
            return Err(anyhow!("{} reverted", self.step));
        }
        self.chain
            .state
            .lock()
            .timeline
            .push(format!("included:{}", self.step));
        Ok(TxReceipt {
            tx_hash: self.hash,
            block_number: Some(1),
        })
    }
}

struct FakeContract {
    address: Address,
    chain: FakeChain,
}

#[async_trait]
impl ChainConnection for FakeChain {
    async fn native_balance(&self, owner: Address) -> Result<U256> {
        let gate = {
            let mut st = self.state.lock();
            st.calls.push(Call::NativeBalance(owner));
            st.native_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.state.lock().native.get(&owner).copied().unwrap_or_default())
    }

    fn nft(&self, address: Address) -> Arc<dyn NftContract> {
        Arc::new(FakeContract {
            address,
            chain: self.clone(),
        })
    }

    fn token(&self, address: Address) -> Arc<dyn TokenContract> {
        Arc::new(FakeContract {
            address,
            chain: self.clone(),
        })
    }

    fn marketplace(&self, address: Address) -> Arc<dyn MarketplaceContract> {
        Arc::new(FakeContract {
            address,
            chain: self.clone(),
        })
    }
}

#[async_trait]
impl NftContract for FakeContract {
    async fn mint(&self, _from: &PrivateKeySigner, token_uri: &str) -> Result<PendingTx> {
        self.chain.submit(
            "mint",
            Call::Mint {
                nft: self.address,
                uri: token_uri.to_string(),
            },
        )
    }

    async fn approve(
        &self,
        _from: &PrivateKeySigner,
        to: Address,
        token_id: U256,
    ) -> Result<PendingTx> {
        self.chain.submit(
            "approve",
            Call::NftApprove {
                nft: self.address,
                to,
                token_id,
            },
        )
    }
}

#[async_trait]
impl TokenContract for FakeContract {
    async fn balance_of(&self, owner: Address) -> Result<U256> {
        let mut st = self.chain.state.lock();
        st.calls.push(Call::TokenBalance {
            token: self.address,
            owner,
        });
        if st.failing_tokens.contains(&self.address) {
            return Err(anyhow!("balanceOf reverted"));
        }
        Ok(st
            .tokens
            .get(&(self.address, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn approve(
        &self,
        _from: &PrivateKeySigner,
        spender: Address,
        amount: U256,
    ) -> Result<PendingTx> {
        self.chain.submit(
            "approve",
            Call::TokenApprove {
                token: self.address,
                spender,
                amount,
            },
        )
    }
}

#[async_trait]
impl MarketplaceContract for FakeContract {
    async fn create_order(
        &self,
        _from: &PrivateKeySigner,
        nft: Address,
        seller: Address,
        asset_id: U256,
        currency: Address,
        price: U256,
        expires_at: U256,
    ) -> Result<PendingTx> {
        self.chain.submit(
            "create_order",
            Call::CreateOrder {
                nft,
                seller,
                asset_id,
                currency,
                price,
                expires_at,
            },
        )
    }

    async fn cancel_order(
        &self,
        _from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
    ) -> Result<PendingTx> {
        self.chain
            .submit("cancel_order", Call::CancelOrder { nft, asset_id })
    }

    async fn execute_order(
        &self,
        _from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
        value: Option<U256>,
    ) -> Result<PendingTx> {
        self.chain.submit(
            "execute_order",
            Call::ExecuteOrder {
                nft,
                asset_id,
                price,
                value,
            },
        )
    }

    async fn place_bid(
        &self,
        _from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
        expires_at: U256,
        value: Option<U256>,
    ) -> Result<PendingTx> {
        self.chain.submit(
            "place_bid",
            Call::PlaceBid {
                nft,
                asset_id,
                price,
                expires_at,
                value,
            },
        )
    }

    async fn accept_bid(
        &self,
        _from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
    ) -> Result<PendingTx> {
        self.chain.submit(
            "accept_bid",
            Call::AcceptBid {
                nft,
                asset_id,
                price,
            },
        )
    }
}

/// Decoder over a fixed table of credentials.
#[derive(Default)]
pub struct FakeDecoder {
    table: HashMap<String, CredentialClaims>,
}

impl FakeDecoder {
    pub fn with(mut self, token: &str, claims: CredentialClaims) -> Self {
        self.table.insert(token.to_string(), claims);
        self
    }
}

impl CredentialDecoder for FakeDecoder {
    fn decode(&self, token: &str) -> Result<CredentialClaims> {
        self.table
            .get(token)
            .cloned()
            .ok_or_else(|| anyhow!("malformed credential"))
    }
}

pub fn dev_claims() -> CredentialClaims {
    CredentialClaims {
        name: "Ann".to_string(),
        email: "ann@example.com".to_string(),
        bio: String::new(),
        address: DEV_ADDRESS.to_string(),
        private_key: DEV_KEY.to_string(),
    }
}

#[derive(Default)]
pub struct FakeRequestLayer {
    pub history: Mutex<Vec<Option<String>>>,
}

impl FakeRequestLayer {
    pub fn current(&self) -> Option<String> {
        self.history.lock().last().cloned().flatten()
    }
}

impl RequestLayer for FakeRequestLayer {
    fn set_default_authorization(&self, credential: Option<&str>) {
        self.history.lock().push(credential.map(str::to_string));
    }
}

/// Indexer that replays scripted ticks per query, then repeats the last one.
#[derive(Default)]
pub struct FakeIndexer {
    listings: Mutex<VecDeque<QueryState<Vec<Listing>>>>,
    collection: Mutex<VecDeque<QueryState<Vec<Listing>>>>,
    user: Mutex<VecDeque<QueryState<Option<UserRecord>>>>,
    users: Mutex<VecDeque<QueryState<Vec<UserRecord>>>>,
    pub user_lookups: Mutex<Vec<String>>,
}

fn next_tick<T: Clone>(queue: &Mutex<VecDeque<QueryState<T>>>) -> QueryState<T> {
    let mut q = queue.lock();
    if q.len() > 1 {
        q.pop_front().unwrap_or(QueryState::Loading)
    } else {
        q.front().cloned().unwrap_or(QueryState::Loading)
    }
}

impl FakeIndexer {
    pub fn script_listings(&self, ticks: Vec<QueryState<Vec<Listing>>>) {
        *self.listings.lock() = ticks.into();
    }

    pub fn script_collection(&self, ticks: Vec<QueryState<Vec<Listing>>>) {
        *self.collection.lock() = ticks.into();
    }

    pub fn script_user(&self, ticks: Vec<QueryState<Option<UserRecord>>>) {
        *self.user.lock() = ticks.into();
    }

    pub fn script_users(&self, ticks: Vec<QueryState<Vec<UserRecord>>>) {
        *self.users.lock() = ticks.into();
    }
}

#[async_trait]
impl IndexerQueries for FakeIndexer {
    async fn all_listings(&self) -> QueryState<Vec<Listing>> {
        next_tick(&self.listings)
    }

    async fn collection_listings(&self) -> QueryState<Vec<Listing>> {
        next_tick(&self.collection)
    }

    async fn user(&self, address: &str) -> QueryState<Option<UserRecord>> {
        self.user_lookups.lock().push(address.to_string());
        next_tick(&self.user)
    }

    async fn users(&self) -> QueryState<Vec<UserRecord>> {
        next_tick(&self.users)
    }
}

pub fn listing(asset_id: u64) -> Listing {
    serde_json::from_value(serde_json::json!({
        "nftAddress": nft_address().to_string(),
        "assetId": asset_id.to_string(),
        "currency": NATIVE_MARKER,
        "price": "1.0",
        "expiresAt": 0,
        "seller": DEV_ADDRESS,
    }))
    .unwrap()
}

pub fn user_record(address: &str, name: &str) -> UserRecord {
    serde_json::from_value(serde_json::json!({ "address": address, "name": name })).unwrap()
}

/// Store with the test registry and an authenticated session on `chain`.
pub fn authenticated_store(chain: &FakeChain) -> StateStore {
    let store = StateStore::new(registry().entries().to_vec());
    store.apply(crate::store::StateUpdate::Auth(authenticated_session(chain)));
    store
}

pub fn authenticated_session(chain: &FakeChain) -> Session {
    let signer = dev_signer();
    Session::Authenticated(Identity {
        display_name: "Ann".to_string(),
        email: String::new(),
        bio: String::new(),
        address: signer.address(),
        account: DEV_ADDRESS.to_string(),
        credential: "token".to_string(),
        wallet: Wallet::new(signer, Arc::new(chain.clone())),
    })
}
