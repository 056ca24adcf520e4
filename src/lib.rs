pub mod api;
pub mod app;
pub mod audit;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;

pub use app::app;

#[cfg(test)]
pub mod testing;
