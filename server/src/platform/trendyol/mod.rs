//! Trendyol marketplace integration.

mod client;
mod mapper;
mod types;

pub use client::TrendyolClient;
