pub mod alpha_vantage;
pub mod provider;
pub mod service;
pub mod throttle;
pub mod types;

pub use provider::{MarketDataError, MarketDataProvider, OutputSize};
pub use service::fetch_stock_data;
