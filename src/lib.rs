// src/lib.rs

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

// Router entry point for main and the integration tests
pub use routes::create_router;
