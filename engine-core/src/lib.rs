pub mod currency;
pub mod error;
pub mod math;
pub mod metrics;
pub mod model;
pub mod ports;

pub use currency::*;
pub use error::*;
pub use math::*;
pub use metrics::*;
pub use model::*;
pub use ports::*;
