use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use engine_core::RequestLayer;
use parking_lot::RwLock;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, ClientBuilder,
};
use serde_json::Value;
use url::Url;

use crate::config::ApiConfig;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    headers: Arc<RwLock<HeaderMap>>,
}

impl ApiClient {
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .connect_timeout(Duration::from_millis(cfg.timeout_ms))
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("build reqwest client")?;
        let base = Url::parse(&cfg.base_url).context("parse api base url")?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(Self {
            client,
            base,
            headers: Arc::new(RwLock::new(headers)),
        })
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).context("parse absolute url");
        }
        self.base.join(path).context("join url")
    }

    pub fn authorization(&self) -> Option<String> {
        self.headers
            .read()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.build_url(path)?;
        let headers = self.headers.read().clone();
        let resp = self
            .client
            .post(url.clone())
            .headers(headers)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {}", url))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("http {}: {}", status, text));
        }
        resp.json::<Value>()
            .await
            .with_context(|| format!("decode json from {}", url))
    }
}

impl RequestLayer for ApiClient {
    fn set_default_authorization(&self, credential: Option<&str>) {
        let mut headers = self.headers.write();
        match credential.map(HeaderValue::from_str) {
            Some(Ok(value)) => {
                headers.insert(AUTHORIZATION, value);
            }
            Some(Err(err)) => {
                tracing::warn!(target: "http", ?err, "credential is not a valid header value");
                headers.remove(AUTHORIZATION);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
    }
}
