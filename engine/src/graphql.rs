use anyhow::{anyhow, Result};
use async_trait::async_trait;
use engine_core::{IndexerQueries, Listing, QueryState, UserRecord};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::http_api::ApiClient;

const LISTING_FIELDS: &str = "nftAddress assetId currency price expiresAt seller";

fn all_nfts_query() -> String {
    format!("query {{ getAllNFTs {{ {LISTING_FIELDS} }} }}")
}

fn collection_nfts_query() -> String {
    format!("query {{ getCollectionNFTs {{ {LISTING_FIELDS} }} }}")
}

const USER_FIELDS: &str = "address name email bio image coverImage";

fn user_query() -> String {
    format!("query ($account: String) {{ getUserInfo(account: $account) {{ {USER_FIELDS} }} }}")
}

fn users_query() -> String {
    format!("query {{ getUsersInfo {{ {USER_FIELDS} }} }}")
}

fn extract<T: DeserializeOwned>(resp: Value, field: &str) -> Result<T> {
    if let Some(errors) = resp.get("errors").and_then(|v| v.as_array()) {
        if !errors.is_empty() {
            let msg = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(anyhow!("graphql error: {}", msg));
        }
    }
    let data = resp
        .get("data")
        .and_then(|d| d.get(field))
        .cloned()
        .ok_or_else(|| anyhow!("missing data.{}", field))?;
    Ok(serde_json::from_value(data)?)
}

fn into_state<T>(res: Result<T>) -> QueryState<T> {
    match res {
        Ok(v) => QueryState::Ready(v),
        Err(err) => QueryState::Failed(format!("{err:#}")),
    }
}

#[derive(Clone)]
pub struct GraphqlIndexer {
    api: ApiClient,
    path: String,
}

impl GraphqlIndexer {
    pub fn new(api: ApiClient, path: impl Into<String>) -> Self {
        Self {
            api,
            path: path.into(),
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<T> {
        let body = json!({ "query": query, "variables": variables });
        let resp = self.api.post_json(&self.path, &body).await?;
        extract(resp, field)
    }
}

#[async_trait]
impl IndexerQueries for GraphqlIndexer {
    async fn all_listings(&self) -> QueryState<Vec<Listing>> {
        into_state(self.query(&all_nfts_query(), json!({}), "getAllNFTs").await)
    }

    async fn collection_listings(&self) -> QueryState<Vec<Listing>> {
        into_state(
            self.query(&collection_nfts_query(), json!({}), "getCollectionNFTs")
                .await,
        )
    }

    async fn user(&self, address: &str) -> QueryState<Option<UserRecord>> {
        into_state(
            self.query(&user_query(), json!({ "account": address }), "getUserInfo")
                .await,
        )
    }

    async fn users(&self) -> QueryState<Vec<UserRecord>> {
        into_state(self.query(&users_query(), json!({}), "getUsersInfo").await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_field_is_extracted() {
        let resp = json!({ "data": { "getUsersInfo": [ { "address": "0xA1", "name": "Ann" } ] } });
        let users: Vec<UserRecord> = extract(resp, "getUsersInfo").unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].address, "0xA1");
    }

    #[test]
    fn user_queries_select_profile_fields() {
        assert!(user_query().contains("getUserInfo(account: $account) { address name email bio image"));
        assert!(users_query().contains("getUsersInfo { address name"));
    }

    #[test]
    fn profile_fields_survive_extraction() {
        let resp = json!({ "data": { "getUserInfo": {
            "address": "0xA1", "name": "Ann", "bio": "collector", "image": "ipfs://a"
        } } });
        let user: Option<UserRecord> = extract(resp, "getUserInfo").unwrap();
        let user = user.unwrap();
        assert_eq!(user.extra.get("bio"), Some(&json!("collector")));
        assert_eq!(user.extra.get("image"), Some(&json!("ipfs://a")));
    }

    #[test]
    fn null_user_is_none() {
        let resp = json!({ "data": { "getUserInfo": null } });
        let user: Option<UserRecord> = extract(resp, "getUserInfo").unwrap();
        assert!(user.is_none());
    }

    #[test]
    fn graphql_errors_fail_the_tick() {
        let resp = json!({ "errors": [ { "message": "unauthorized" } ], "data": null });
        let state = into_state(extract::<Vec<Listing>>(resp, "getAllNFTs"));
        assert_eq!(state, QueryState::Failed("graphql error: unauthorized".into()));
    }

    #[test]
    fn listing_query_selects_read_fields() {
        assert!(all_nfts_query().contains("getAllNFTs { nftAddress assetId"));
        assert!(collection_nfts_query().starts_with("query { getCollectionNFTs"));
    }
}
