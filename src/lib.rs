pub mod allocation;
pub mod api;
pub mod board;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod notify;
pub mod observability;
pub mod state;
