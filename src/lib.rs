pub mod adapters;
pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod services;

pub use adapters::PostgresStore;
pub use config::AppConfig;
pub use engine::{Engine, Rules};
pub use error::{PuntError, Result, WagerError};
pub use services::{Quote, QuoteBoard, QuoteService};
