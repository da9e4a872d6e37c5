//! Market quote board shown on the site.
//!
//! Prices are simulated in-process. The board is an owned component: the
//! feed runs in a spawned refresh loop with an explicit interval and a
//! broadcast shutdown channel, and handlers read a shared cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{info, warn};

/// Opening prices are seeded in this range (cents)
const SEED_PRICE_MIN_CENTS: i64 = 2_500;
const SEED_PRICE_MAX_CENTS: i64 = 75_000;

/// Largest per-tick move in basis points
const MAX_STEP_BPS: i64 = 50;

/// One market quote
#[derive(Debug, Clone)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    /// Percent move since the feed opened
    pub change_pct: Decimal,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Quote Board
// ============================================================================

/// Thread-safe cache of the latest quote per symbol
#[derive(Debug, Clone, Default)]
pub struct QuoteBoard {
    quotes: Arc<RwLock<HashMap<String, Quote>>>,
}

impl QuoteBoard {
    pub fn new() -> Self {
        Self {
            quotes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace the quote for a symbol
    pub async fn update(&self, quote: Quote) {
        let mut quotes = self.quotes.write().await;
        quotes.insert(quote.symbol.clone(), quote);
    }

    /// Get the latest quote for a symbol
    pub async fn get(&self, symbol: &str) -> Option<Quote> {
        let quotes = self.quotes.read().await;
        quotes.get(symbol).cloned()
    }

    /// All current quotes, in map order
    pub async fn snapshot(&self) -> Vec<Quote> {
        let quotes = self.quotes.read().await;
        quotes.values().cloned().collect()
    }

    /// Number of tracked symbols
    pub async fn len(&self) -> usize {
        let quotes = self.quotes.read().await;
        quotes.len()
    }

    /// Check if the board is empty
    pub async fn is_empty(&self) -> bool {
        let quotes = self.quotes.read().await;
        quotes.is_empty()
    }
}

// ============================================================================
// Quote Feed
// ============================================================================

/// Source of fresh quotes, polled by the refresh loop
#[async_trait]
pub trait QuoteFeed: Send {
    /// Produce the next batch of quotes
    async fn poll(&mut self) -> Vec<Quote>;
}

/// Random-walk price simulator
pub struct SimulatedFeed {
    symbols: Vec<SimSymbol>,
    rng: StdRng,
}

struct SimSymbol {
    symbol: String,
    open: Decimal,
    last: Decimal,
}

impl SimulatedFeed {
    pub fn new(symbols: &[String]) -> Self {
        let mut rng = StdRng::from_entropy();
        let symbols = symbols
            .iter()
            .map(|symbol| {
                let cents = rng.gen_range(SEED_PRICE_MIN_CENTS..=SEED_PRICE_MAX_CENTS);
                let open = Decimal::new(cents, 2);
                SimSymbol {
                    symbol: symbol.clone(),
                    open,
                    last: open,
                }
            })
            .collect();

        Self { symbols, rng }
    }
}

#[async_trait]
impl QuoteFeed for SimulatedFeed {
    async fn poll(&mut self) -> Vec<Quote> {
        let now = Utc::now();
        self.symbols
            .iter_mut()
            .map(|sim| {
                // Step by at most ±MAX_STEP_BPS, floored at 1.00
                let bps = self.rng.gen_range(-MAX_STEP_BPS..=MAX_STEP_BPS);
                let factor = Decimal::ONE + Decimal::new(bps, 4);
                sim.last = (sim.last * factor).round_dp(2).max(Decimal::ONE);

                let change_pct = ((sim.last - sim.open) / sim.open * Decimal::from(100)).round_dp(2);

                Quote {
                    symbol: sim.symbol.clone(),
                    price: sim.last,
                    change_pct,
                    updated_at: now,
                }
            })
            .collect()
    }
}

// ============================================================================
// Quote Service
// ============================================================================

/// Owns the refresh loop. Built once at startup, shut down once at exit.
pub struct QuoteService {
    board: QuoteBoard,
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl QuoteService {
    /// Spawn the refresh loop. The board fills on the first tick.
    pub fn spawn<F: QuoteFeed + 'static>(mut feed: F, refresh: Duration) -> Self {
        let board = QuoteBoard::new();
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let task_board = board.clone();
        let handle = tokio::spawn(async move {
            let mut tick = interval(refresh);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        for quote in feed.poll().await {
                            task_board.update(quote).await;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Quote feed received shutdown signal");
                        break;
                    }
                }
            }
        });

        Self {
            board,
            shutdown_tx,
            handle,
        }
    }

    /// Handle to the shared board
    pub fn board(&self) -> QuoteBoard {
        self.board.clone()
    }

    /// Stop the refresh loop and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            warn!("Quote feed task ended badly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    mockall::mock! {
        Feed {}

        #[async_trait]
        impl QuoteFeed for Feed {
            async fn poll(&mut self) -> Vec<Quote>;
        }
    }

    fn quote(symbol: &str, price: Decimal) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            change_pct: dec!(0.00),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_board_replaces_by_symbol() {
        let board = QuoteBoard::new();

        board.update(quote("AAPL", dec!(210.00))).await;
        board.update(quote("MSFT", dec!(415.00))).await;
        board.update(quote("AAPL", dec!(211.50))).await;

        assert_eq!(board.len().await, 2);
        let aapl = board.get("AAPL").await;
        assert!(aapl.is_some());
        assert_eq!(aapl.unwrap().price, dec!(211.50));
        assert!(board.get("TSLA").await.is_none());
    }

    #[tokio::test]
    async fn test_simulated_feed_covers_all_symbols() {
        let symbols: Vec<String> = ["AAPL", "GOOG", "MSFT"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut feed = SimulatedFeed::new(&symbols);

        let quotes = feed.poll().await;
        assert_eq!(quotes.len(), 3);
        for q in &quotes {
            assert!(q.price >= Decimal::ONE);
            // One step from open stays within a percent
            assert!(q.change_pct.abs() <= dec!(1.00));
        }

        // Prices keep walking on later polls
        let again = feed.poll().await;
        assert_eq!(again.len(), 3);
    }

    #[tokio::test]
    async fn test_service_fills_board_and_shuts_down() {
        let mut feed = MockFeed::new();
        feed.expect_poll()
            .returning(|| vec![quote("TSLA", dec!(250.00))]);

        let service = QuoteService::spawn(feed, Duration::from_millis(10));
        let board = service.board();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let tsla = board.get("TSLA").await;
        assert!(tsla.is_some());
        assert_eq!(tsla.unwrap().price, dec!(250.00));

        // Joins the task; hangs here if the loop ignores shutdown
        service.shutdown().await;
    }
}
