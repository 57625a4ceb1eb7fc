//! Engine API surface: liveness routes, cluster-token gate, and the
//! per-request debug session gate feeding realtime debug channels.

pub mod auth;
pub mod config;
pub mod debug_gate;
pub mod error;
pub mod server;


pub use config::Config;
pub use server::{AppState, build_router};
