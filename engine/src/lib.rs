pub mod balances;
pub mod config;
pub mod contracts;
pub mod credential;
pub mod graphql;
pub mod http_api;
pub mod market;
pub mod orchestrator;
pub mod poller;
pub mod rpc;
pub mod session;
pub mod store;

#[cfg(test)]
mod testkit;

pub use balances::*;
pub use config::*;
pub use market::*;
pub use orchestrator::*;
pub use session::*;
pub use store::*;
