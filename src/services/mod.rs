pub mod assistant;
pub mod auth_service;
pub mod commodity_data_service;
pub mod llm;
pub mod market_reference;
pub mod nse_stock_list_service;
pub mod prompt;
pub mod rate_limit;
pub mod stock_data_service;
pub mod translation;
pub mod web_search;

pub use llm::{ProviderChain, ProviderError};
pub use web_search::WebSearch;
