//! PageSure runtime: headless-browser page scraping, the page and review
//! store, and the HTTP API that serves them.

pub mod audit;
pub mod cli;
pub mod config;
pub mod pool;
pub mod renderer;
pub mod scrape;
pub mod server;
pub mod store;
