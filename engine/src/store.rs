use std::sync::Arc;

use engine_core::{BalanceVector, CurrencyEntry, Listing, Session, UserRecord, UsersByAddress};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub session: Session,
    pub currencies: Vec<CurrencyEntry>,
    pub all_nfts: Vec<Listing>,
    pub collection_nfts: Vec<Listing>,
    pub user_info: Option<UserRecord>,
    pub users_info: UsersByAddress,
    pub balances: BalanceVector,
}

#[derive(Debug, Clone)]
pub enum StateUpdate {
    Auth(Session),
    AllNfts(Vec<Listing>),
    CollectionNfts(Vec<Listing>),
    UserInfo(Option<UserRecord>),
    UsersInfo(UsersByAddress),
    Balances(BalanceVector),
}

impl StateUpdate {
    pub fn category(&self) -> &'static str {
        match self {
            StateUpdate::Auth(_) => "auth",
            StateUpdate::AllNfts(_) => "allNFT",
            StateUpdate::CollectionNfts(_) => "collectionNFT",
            StateUpdate::UserInfo(_) => "userInfo",
            StateUpdate::UsersInfo(_) => "usersInfo",
            StateUpdate::Balances(_) => "balances",
        }
    }
}

impl AppState {
    fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::Auth(session) => self.session = session,
            StateUpdate::AllNfts(v) => self.all_nfts = v,
            StateUpdate::CollectionNfts(v) => self.collection_nfts = v,
            StateUpdate::UserInfo(v) => self.user_info = v,
            StateUpdate::UsersInfo(v) => self.users_info = v,
            StateUpdate::Balances(v) => self.balances = v,
        }
    }
}

#[derive(Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<Arc<AppState>>>,
}

impl StateStore {
    pub fn new(currencies: Vec<CurrencyEntry>) -> Self {
        let initial = AppState {
            currencies,
            ..AppState::default()
        };
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<AppState> {
        self.tx.borrow().clone()
    }

    pub fn session(&self) -> Session {
        self.tx.borrow().session.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.tx.subscribe()
    }

    pub fn apply(&self, update: StateUpdate) {
        let category = update.category();
        self.tx.send_modify(|state| {
            let mut next = (**state).clone();
            next.apply(update);
            *state = Arc::new(next);
        });
        tracing::trace!(target: "store", category, "state updated");
    }
}

pub fn index_users(records: Vec<UserRecord>) -> UsersByAddress {
    records
        .into_iter()
        .map(|r| (r.address.clone(), r))
        .collect()
}
