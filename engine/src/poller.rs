use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use engine_core::{IndexerQueries, Metrics, QueryState};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::balances::BalanceAggregator;
use crate::store::{index_users, StateStore, StateUpdate};

#[derive(Clone)]
pub struct PollContext {
    pub indexer: Arc<dyn IndexerQueries>,
    pub store: StateStore,
    pub balances: BalanceAggregator,
    pub metrics: Arc<Metrics>,
}

impl PollContext {
    // loading ticks are skipped silently, failed ones are counted and logged
    fn settle<T>(&self, query: &'static str, state: QueryState<T>) -> Option<T> {
        match state {
            QueryState::Ready(v) => Some(v),
            QueryState::Loading => None,
            QueryState::Failed(err) => {
                self.metrics.poll_failures.with_label_values(&[query]).inc();
                warn!(target: "poller", query, error = %err, "poll failed");
                None
            }
        }
    }
}

pub async fn all_listings_tick(ctx: &PollContext) {
    let state = ctx.indexer.all_listings().await;
    if let Some(listings) = ctx.settle("allNFT", state) {
        ctx.store.apply(StateUpdate::AllNfts(listings));
    }
}

pub async fn collection_listings_tick(ctx: &PollContext) {
    let state = ctx.indexer.collection_listings().await;
    if let Some(listings) = ctx.settle("collectionNFT", state) {
        ctx.store.apply(StateUpdate::CollectionNfts(listings));
    }
}

// while anonymous the record is cleared instead of queried
pub async fn current_user_tick(ctx: &PollContext) {
    let session = ctx.store.session();
    let (Some(address), Some(account)) = (session.address(), session.account()) else {
        if ctx.store.snapshot().user_info.is_some() {
            ctx.store.apply(StateUpdate::UserInfo(None));
        }
        return;
    };
    let state = ctx.indexer.user(account).await;
    let Some(record) = ctx.settle("userInfo", state) else {
        return;
    };
    // the session may have changed while the query was in flight
    if ctx.store.session().address() != Some(address) {
        return;
    }
    ctx.store.apply(StateUpdate::UserInfo(record));
    ctx.balances.refresh(&ctx.store).await;
}

pub async fn all_users_tick(ctx: &PollContext) {
    let state = ctx.indexer.users().await;
    if let Some(users) = ctx.settle("usersInfo", state) {
        ctx.store.apply(StateUpdate::UsersInfo(index_users(users)));
    }
}

fn spawn_periodic<F, Fut>(
    query: &'static str,
    period: Duration,
    ctx: PollContext,
    tick: F,
) -> JoinHandle<()>
where
    F: Fn(PollContext) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        info!(target: "poller", query, interval_ms = period.as_millis() as u64, "poller started");
        let mut iv = tokio::time::interval(period);
        iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            iv.tick().await;
            tick(ctx.clone()).await;
        }
    })
}

pub fn spawn_pollers(ctx: PollContext, period: Duration) -> Vec<JoinHandle<()>> {
    vec![
        spawn_periodic("allNFT", period, ctx.clone(), |c| async move {
            all_listings_tick(&c).await
        }),
        spawn_periodic("collectionNFT", period, ctx.clone(), |c| async move {
            collection_listings_tick(&c).await
        }),
        spawn_periodic("userInfo", period, ctx.clone(), |c| async move {
            current_user_tick(&c).await
        }),
        spawn_periodic("usersInfo", period, ctx, |c| async move {
            all_users_tick(&c).await
        }),
    ]
}
