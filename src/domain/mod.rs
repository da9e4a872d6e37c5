pub mod bet;
pub mod casino;
pub mod combo;
pub mod transaction;
pub mod user;

pub use bet::*;
pub use casino::*;
pub use combo::*;
pub use transaction::*;
pub use user::*;
