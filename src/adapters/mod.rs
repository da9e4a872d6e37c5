pub mod postgres;

pub use postgres::{
    BetDetail, BetWithOutcomes, ComboSelectionView, ComboView, PostgresStore, WagerView,
};
