//! Earnings data providers.

pub mod provider;
pub mod replay;
pub mod yahoo;

pub use provider::{
    EarningsProvider, EarningsTable, ProviderError, UnavailableProvider, DEFAULT_LIMIT,
};
pub use replay::ReplayProvider;
pub use yahoo::YahooProvider;
