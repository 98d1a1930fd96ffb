//! Coastal hazard reporting service.
//!
//! Citizens and officials file hazard reports; analysts browse them and a
//! live social feed through filter and aggregation views gated by role.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod model;
pub mod offline;
pub mod sample;
pub mod session;
pub mod stats;
pub mod storage;
