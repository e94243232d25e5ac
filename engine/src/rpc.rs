use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{hex, Address, Bytes, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use engine_core::{
    ChainConnection, MarketplaceContract, NftContract, PendingTransaction, PendingTx,
    TokenContract, TxReceipt,
};
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::config::RpcConfig;
use crate::contracts::{MarketplaceHandle, NftHandle, TokenHandle};

pub(crate) fn parse_u256_hex(v: &Value) -> Result<U256> {
    let s = v.as_str().ok_or_else(|| anyhow!("quantity is not a string: {}", v))?;
    let digits = s.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).with_context(|| format!("parse quantity '{}'", s))
}

pub(crate) fn parse_u64_hex(v: &Value) -> Result<u64> {
    let s = v.as_str().ok_or_else(|| anyhow!("quantity is not a string: {}", v))?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .with_context(|| format!("parse quantity '{}'", s))
}

fn quantity(v: U256) -> String {
    format!("{:#x}", v)
}

pub(crate) fn parse_receipt(v: &Value) -> Result<TxReceipt> {
    let tx_hash: B256 = v
        .get("transactionHash")
        .and_then(|h| h.as_str())
        .ok_or_else(|| anyhow!("receipt without transactionHash"))?
        .parse()
        .context("parse transactionHash")?;
    let block_number = v.get("blockNumber").map(parse_u64_hex).transpose()?;
    match v.get("status").and_then(|s| s.as_str()) {
        Some("0x1") | None => Ok(TxReceipt {
            tx_hash,
            block_number,
        }),
        Some(status) => Err(anyhow!("transaction {} reverted (status {})", tx_hash, status)),
    }
}

struct RpcInner {
    client: Client,
    url: Url,
    chain_id: u64,
    receipt_poll: Duration,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct JsonRpcChain {
    inner: Arc<RpcInner>,
}

impl JsonRpcChain {
    pub fn new(cfg: &RpcConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_millis(cfg.timeout_ms))
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("build rpc client")?;
        // ws endpoints share the http path on most providers
        let url = if cfg.url.starts_with("wss://") {
            cfg.url.replacen("wss://", "https://", 1)
        } else if cfg.url.starts_with("ws://") {
            cfg.url.replacen("ws://", "http://", 1)
        } else {
            cfg.url.clone()
        };
        Ok(Self {
            inner: Arc::new(RpcInner {
                client,
                url: Url::parse(&url).context("parse rpc url")?,
                chain_id: cfg.chain_id,
                receipt_poll: Duration::from_millis(cfg.receipt_poll_ms.max(50)),
                next_id: AtomicU64::new(1),
            }),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let resp: Value = self
            .inner
            .client
            .post(self.inner.url.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} request", method))?
            .json()
            .await
            .with_context(|| format!("{} response", method))?;
        if let Some(err) = resp.get("error") {
            let msg = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            bail!("{} failed: {}", method, msg);
        }
        resp.get("result")
            .cloned()
            .ok_or_else(|| anyhow!("{} returned no result", method))
    }

    pub async fn call(&self, to: Address, data: &[u8]) -> Result<Bytes> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": hex::encode_prefixed(data) }, "latest"]),
            )
            .await?;
        let s = result
            .as_str()
            .ok_or_else(|| anyhow!("eth_call result is not a string"))?;
        Ok(Bytes::from(hex::decode(s).context("decode eth_call result")?))
    }

    pub async fn balance(&self, owner: Address) -> Result<U256> {
        let result = self
            .request("eth_getBalance", json!([owner.to_string(), "latest"]))
            .await?;
        parse_u256_hex(&result)
    }

    pub async fn send_transaction(
        &self,
        from: &PrivateKeySigner,
        to: Address,
        data: Vec<u8>,
        value: U256,
    ) -> Result<PendingTx> {
        let sender = from.address();
        let input = hex::encode_prefixed(&data);
        let nonce = parse_u64_hex(
            &self
                .request("eth_getTransactionCount", json!([sender.to_string(), "pending"]))
                .await?,
        )?;
        let gas_price = parse_u256_hex(&self.request("eth_gasPrice", json!([])).await?)?;
        let gas_limit = parse_u64_hex(
            &self
                .request(
                    "eth_estimateGas",
                    json!([{
                        "from": sender.to_string(),
                        "to": to.to_string(),
                        "data": input,
                        "value": quantity(value),
                    }]),
                )
                .await?,
        )?;

        let tx = TxLegacy {
            chain_id: Some(self.inner.chain_id),
            nonce,
            gas_price: u128::try_from(gas_price).context("gas price overflows u128")?,
            gas_limit,
            to: TxKind::Call(to),
            value,
            input: Bytes::from(data),
        };
        let signature = from
            .sign_hash_sync(&tx.signature_hash())
            .context("sign transaction")?;
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        let raw = hex::encode_prefixed(envelope.encoded_2718());

        let hash: B256 = self
            .request("eth_sendRawTransaction", json!([raw]))
            .await?
            .as_str()
            .ok_or_else(|| anyhow!("eth_sendRawTransaction returned no hash"))?
            .parse()
            .context("parse transaction hash")?;
        debug!(target: "rpc", tx = %hash, from = %sender, to = %to, nonce, "transaction broadcast");
        Ok(Box::new(RpcPendingTx {
            chain: self.clone(),
            hash,
        }))
    }

    async fn receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        parse_receipt(&result).map(Some)
    }
}

struct RpcPendingTx {
    chain: JsonRpcChain,
    hash: B256,
}

#[async_trait]
impl PendingTransaction for RpcPendingTx {
    fn tx_hash(&self) -> B256 {
        self.hash
    }

    async fn included(self: Box<Self>) -> Result<TxReceipt> {
        loop {
            if let Some(receipt) = self.chain.receipt(self.hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.chain.inner.receipt_poll).await;
        }
    }
}

#[async_trait]
impl ChainConnection for JsonRpcChain {
    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.balance(owner).await
    }

    fn nft(&self, address: Address) -> Arc<dyn NftContract> {
        Arc::new(NftHandle::new(self.clone(), address))
    }

    fn token(&self, address: Address) -> Arc<dyn TokenContract> {
        Arc::new(TokenHandle::new(self.clone(), address))
    }

    fn marketplace(&self, address: Address) -> Arc<dyn MarketplaceContract> {
        Arc::new(MarketplaceHandle::new(self.clone(), address))
    }
}
