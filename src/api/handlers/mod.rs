pub mod admin;
pub mod auth;
pub mod bets;
pub mod casino;
pub mod combos;
pub mod system;
pub mod wagers;
pub mod wallet;

pub use admin::*;
pub use auth::*;
pub use bets::*;
pub use casino::*;
pub use combos::*;
pub use system::*;
pub use wagers::*;
pub use wallet::*;
