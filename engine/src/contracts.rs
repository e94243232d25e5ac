use alloy_primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolCall};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use engine_core::{MarketplaceContract, NftContract, PendingTx, TokenContract};

use crate::rpc::JsonRpcChain;

sol! {
    interface IMarketNft {
        function mint(string tokenURI) external;
        function approve(address to, uint256 tokenId) external;
    }

    interface IErc20 {
        function balanceOf(address owner) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface IMarketplace {
        function createOrder(
            address nftAddress,
            address seller,
            uint256 assetId,
            address acceptedToken,
            uint256 priceInWei,
            uint256 expiresAt
        ) external;
        function cancelOrder(address nftAddress, uint256 assetId) external;
        function ExecuteOrder(address nftAddress, uint256 assetId, uint256 price) external payable;
        function PlaceBid(
            address nftAddress,
            uint256 assetId,
            uint256 priceInWei,
            uint256 expiresAt
        ) external payable;
        function acceptBid(address nftAddress, uint256 assetId, uint256 priceInWei) external;
    }
}

fn decode_word(ret: &[u8]) -> Result<U256> {
    if ret.len() < 32 {
        return Err(anyhow!("short return data: {} bytes", ret.len()));
    }
    Ok(U256::from_be_slice(&ret[..32]))
}

pub struct NftHandle {
    chain: JsonRpcChain,
    address: Address,
}

impl NftHandle {
    pub fn new(chain: JsonRpcChain, address: Address) -> Self {
        Self { chain, address }
    }
}

#[async_trait]
impl NftContract for NftHandle {
    async fn mint(&self, from: &PrivateKeySigner, token_uri: &str) -> Result<PendingTx> {
        let data = IMarketNft::mintCall {
            tokenURI: token_uri.to_string(),
        }
        .abi_encode();
        self.chain
            .send_transaction(from, self.address, data, U256::ZERO)
            .await
    }

    async fn approve(
        &self,
        from: &PrivateKeySigner,
        to: Address,
        token_id: U256,
    ) -> Result<PendingTx> {
        let data = IMarketNft::approveCall {
            to,
            tokenId: token_id,
        }
        .abi_encode();
        self.chain
            .send_transaction(from, self.address, data, U256::ZERO)
            .await
    }
}

pub struct TokenHandle {
    chain: JsonRpcChain,
    address: Address,
}

impl TokenHandle {
    pub fn new(chain: JsonRpcChain, address: Address) -> Self {
        Self { chain, address }
    }
}

#[async_trait]
impl TokenContract for TokenHandle {
    async fn balance_of(&self, owner: Address) -> Result<U256> {
        let data = IErc20::balanceOfCall { owner }.abi_encode();
        let ret = self.chain.call(self.address, &data).await?;
        decode_word(&ret)
    }

    async fn approve(
        &self,
        from: &PrivateKeySigner,
        spender: Address,
        amount: U256,
    ) -> Result<PendingTx> {
        let data = IErc20::approveCall { spender, amount }.abi_encode();
        self.chain
            .send_transaction(from, self.address, data, U256::ZERO)
            .await
    }
}

pub struct MarketplaceHandle {
    chain: JsonRpcChain,
    address: Address,
}

impl MarketplaceHandle {
    pub fn new(chain: JsonRpcChain, address: Address) -> Self {
        Self { chain, address }
    }

    async fn send(&self, from: &PrivateKeySigner, data: Vec<u8>, value: Option<U256>) -> Result<PendingTx> {
        self.chain
            .send_transaction(from, self.address, data, value.unwrap_or(U256::ZERO))
            .await
    }
}

#[async_trait]
impl MarketplaceContract for MarketplaceHandle {
    async fn create_order(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        seller: Address,
        asset_id: U256,
        currency: Address,
        price: U256,
        expires_at: U256,
    ) -> Result<PendingTx> {
        let data = IMarketplace::createOrderCall {
            nftAddress: nft,
            seller,
            assetId: asset_id,
            acceptedToken: currency,
            priceInWei: price,
            expiresAt: expires_at,
        }
        .abi_encode();
        self.send(from, data, None).await
    }

    async fn cancel_order(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
    ) -> Result<PendingTx> {
        let data = IMarketplace::cancelOrderCall {
            nftAddress: nft,
            assetId: asset_id,
        }
        .abi_encode();
        self.send(from, data, None).await
    }

    async fn execute_order(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
        value: Option<U256>,
    ) -> Result<PendingTx> {
        let data = IMarketplace::ExecuteOrderCall {
            nftAddress: nft,
            assetId: asset_id,
            price,
        }
        .abi_encode();
        self.send(from, data, value).await
    }

    async fn place_bid(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
        expires_at: U256,
        value: Option<U256>,
    ) -> Result<PendingTx> {
        let data = IMarketplace::PlaceBidCall {
            nftAddress: nft,
            assetId: asset_id,
            priceInWei: price,
            expiresAt: expires_at,
        }
        .abi_encode();
        self.send(from, data, value).await
    }

    async fn accept_bid(
        &self,
        from: &PrivateKeySigner,
        nft: Address,
        asset_id: U256,
        price: U256,
    ) -> Result<PendingTx> {
        let data = IMarketplace::acceptBidCall {
            nftAddress: nft,
            assetId: asset_id,
            priceInWei: price,
        }
        .abi_encode();
        self.send(from, data, None).await
    }
}
