pub mod market_refresh;
