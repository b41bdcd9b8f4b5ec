//! Vendored Technicolor gateway client
//!
//! - `client`: session handling, modal page fetches, scrape parsers
//! - `models`: wire records reported by the gateway
//!
//! Everything network-facing goes through the `GatewayClient` trait so the
//! tracker can run against a scripted double in tests.

pub mod client;
pub mod models;

pub use client::{normalize_mac, GatewayClient, TechnicolorGateway};
