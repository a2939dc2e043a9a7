pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod generation;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod proxy;
pub mod retry;
pub mod state;
