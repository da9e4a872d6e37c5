pub mod quotes;

pub use quotes::{Quote, QuoteBoard, QuoteFeed, QuoteService, SimulatedFeed};
