use engine_core::CurrencyEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    pub chain_id: u64,
    pub timeout_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
}

fn default_receipt_poll_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_graphql_path")]
    pub graphql_path: String,
    pub timeout_ms: u64,
}

fn default_graphql_path() -> String {
    "/graphql".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub nft: String,
    pub marketplace: String,
    pub wrapped_native: String,
    pub test_token: String,
}

fn default_poll_interval_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub rpc: RpcConfig,
    pub api: ApiConfig,
    pub contracts: ContractAddresses,
    #[serde(default)]
    pub currencies: Vec<CurrencyEntry>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

impl MarketConfig {
    pub fn currency_entries(&self) -> Vec<CurrencyEntry> {
        if !self.currencies.is_empty() {
            return self.currencies.clone();
        }
        vec![
            CurrencyEntry::new("BNB", self.contracts.wrapped_native.clone()),
            CurrencyEntry::new("BUSD", self.contracts.test_token.clone()),
        ]
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                url: "https://data-seed-prebsc-1-s1.binance.org:8545".to_string(),
                chain_id: 97,
                timeout_ms: 15_000,
                receipt_poll_ms: default_receipt_poll_ms(),
            },
            api: ApiConfig {
                base_url: "http://localhost:5000".to_string(),
                graphql_path: default_graphql_path(),
                timeout_ms: 10_000,
            },
            contracts: ContractAddresses {
                nft: "0x0000000000000000000000000000000000000000".to_string(),
                marketplace: "0x0000000000000000000000000000000000000000".to_string(),
                wrapped_native: "0xae13d989daC2f0dEbFf460aC112a837C89BAa7cd".to_string(),
                test_token: "0x0000000000000000000000000000000000000000".to_string(),
            },
            currencies: Vec::new(),
            poll_interval_ms: default_poll_interval_ms(),
            jwt_secret: None,
        }
    }
}
