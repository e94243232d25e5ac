use std::{env, path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use app::config::{credential_from_env, load_config};
use engine::{market::MarketClient, orchestrator::ActionResult};
use engine_core::{AcceptBidParams, BidParams, BuyParams, CancelParams, ListParams};
use prometheus::{Encoder, Registry, TextEncoder};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: marketd <config.json> [watch | balances | mint <url> \
| list <nft> <id> <currency> <price> <expires> | cancel <nft> <id> \
| buy <nft> <id> <token> <price> | bid <nft> <id> <token> <price> <expires> \
| accept <nft> <id> <price>]";

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing <{}>\n{}", name, USAGE))
}

fn arg_u64(args: &[String], idx: usize, name: &str) -> Result<u64> {
    arg(args, idx, name)?
        .parse()
        .with_context(|| format!("<{}> must be an integer", name))
}

fn arg_price(args: &[String], idx: usize) -> Result<Decimal> {
    Decimal::from_str(arg(args, idx, "price")?).context("<price> must be a decimal")
}

fn report(action: &str, result: ActionResult) -> Result<()> {
    let receipt = result.with_context(|| format!("{} failed", action))?;
    for (i, step) in receipt.steps.iter().enumerate() {
        info!(action, step = i + 1, tx = %step.tx_hash, block = ?step.block_number, "included");
    }
    println!("{} ok ({} transaction(s))", action, receipt.steps.len());
    Ok(())
}

fn dump_metrics(registry: &Registry) {
    let mut buf = Vec::new();
    if let Err(err) = TextEncoder::new().encode(&registry.gather(), &mut buf) {
        warn!(?err, "encode metrics");
        return;
    }
    info!("metrics:\n{}", String::from_utf8_lossy(&buf));
}

async fn watch(client: &MarketClient, registry: &Registry) -> Result<()> {
    let handles = client.spawn_pollers();
    let mut rx = client.store().subscribe();
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = rx.borrow_and_update().clone();
                info!(
                    address = %snap.session.address_string(),
                    all_nfts = snap.all_nfts.len(),
                    collection_nfts = snap.collection_nfts.len(),
                    users = snap.users_info.len(),
                    balances = ?snap.balances,
                    "state updated"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }
    for h in handles {
        h.abort();
    }
    dump_metrics(registry);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let config_path = PathBuf::from(
        args.get(1)
            .cloned()
            .unwrap_or_else(|| "config.json".to_string()),
    );
    let cfg = load_config(&config_path).await?;

    let registry = Registry::new();
    let client = MarketClient::connect(cfg, &registry)?;

    if let Some(credential) = credential_from_env() {
        let session = client.login(&credential).context("login")?;
        info!(address = %session.address_string(), "logged in");
    }

    let command = args.get(2).map(String::as_str).unwrap_or("watch");
    let rest = args.get(3..).unwrap_or_default();
    match command {
        "watch" => watch(&client, &registry).await,
        "balances" => {
            let tokens = client.registry().identifiers();
            let balances = client.check_balances(&tokens).await;
            for (token, amount) in tokens.iter().zip(balances) {
                println!("{:>8} {}", client.get_currency(token).label, amount);
            }
            Ok(())
        }
        "mint" => report("mint", client.mint(arg(rest, 0, "url")?).await),
        "list" => {
            let params = ListParams {
                nft_address: arg(rest, 0, "nft")?.to_string(),
                asset_id: arg_u64(rest, 1, "id")?,
                currency: arg(rest, 2, "currency")?.to_string(),
                price: arg_price(rest, 3)?,
                expires_at: arg_u64(rest, 4, "expires")?,
            };
            report("list", client.list_for_sale(&params).await)
        }
        "cancel" => {
            let params = CancelParams {
                nft_address: arg(rest, 0, "nft")?.to_string(),
                asset_id: arg_u64(rest, 1, "id")?,
            };
            report("cancel", client.cancel_order(&params).await)
        }
        "buy" => {
            let params = BuyParams {
                nft_address: arg(rest, 0, "nft")?.to_string(),
                asset_id: arg_u64(rest, 1, "id")?,
                accepted_token: arg(rest, 2, "token")?.to_string(),
                price: arg_price(rest, 3)?,
            };
            report("buy", client.buy(&params).await)
        }
        "bid" => {
            let params = BidParams {
                nft_address: arg(rest, 0, "nft")?.to_string(),
                asset_id: arg_u64(rest, 1, "id")?,
                accepted_token: arg(rest, 2, "token")?.to_string(),
                price: arg_price(rest, 3)?,
                expires_at: arg_u64(rest, 4, "expires")?,
            };
            report("bid", client.bid(&params).await)
        }
        "accept" => {
            let params = AcceptBidParams {
                address: arg(rest, 0, "nft")?.to_string(),
                id: arg_u64(rest, 1, "id")?,
                price: arg_price(rest, 2)?,
            };
            report("accept", client.accept_bid(&params).await)
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}
