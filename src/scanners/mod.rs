// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/roomsense

//! Background scanners - slow external sources on their own cadence
//!
//! Each scanner owns a single-slot result cell. A failed fetch or parse
//! leaves the previous result in place.

mod disk_prices;
mod fetch;
mod weather;

pub use disk_prices::{
    build_price_table, parse_listings, CapacityTier, DiskListing, DiskPriceJob, PriceTable,
    DEFAULT_DISK_PRICES_URL,
};
pub use fetch::{Fetcher, HttpFetcher, DEFAULT_USER_AGENT, FETCH_TIMEOUT};
pub use weather::{
    compass_to_degrees, parse_observation, WeatherJob, WeatherObservation, DEFAULT_WEATHER_URL,
};

#[cfg(test)]
pub(crate) use fetch::canned;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::core::Scheduler;
use crate::error::ScanError;

/// One fetch-and-parse attempt against an external source
#[async_trait]
pub trait ScanJob: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn name(&self) -> &str;

    async fn scan(&self) -> Result<Self::Output, ScanError>;
}

/// Latest-value cell with atomic replacement.
///
/// Readers get either the old or the new `Arc`, never a partial write.
pub struct ResultCell<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> ResultCell<T> {
    pub fn new() -> Self {
        Self { slot: RwLock::new(None) }
    }

    pub fn load(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    pub fn store(&self, value: T) {
        *self.slot.write() = Some(Arc::new(value));
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().is_none()
    }
}

impl<T> Default for ResultCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// `Idle -> Fetching -> {Parsed | Failed}`
///
/// `Idle` only precedes the first run. Between runs the scanner rests in
/// the outcome of the last attempt until the next one starts fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    Idle,
    Fetching,
    Parsed,
    Failed,
}

pub struct Scanner<J: ScanJob> {
    job: J,
    interval: Duration,
    cell: ResultCell<J::Output>,
    state: Mutex<ScanState>,
}

impl<J: ScanJob> Scanner<J> {
    pub fn new(job: J, interval: Duration) -> Self {
        Self {
            job,
            interval,
            cell: ResultCell::new(),
            state: Mutex::new(ScanState::Idle),
        }
    }

    /// Fetch once, then hand the scanner to `scheduler` for recurring runs
    pub async fn start(job: J, interval: Duration, scheduler: &Scheduler) -> Arc<Self> {
        let scanner = Arc::new(Self::new(job, interval));
        scanner.run_once().await;

        let worker = scanner.clone();
        scheduler.schedule_singleton(scanner.name(), interval, move || {
            let worker = worker.clone();
            async move {
                match worker.run_once().await {
                    ScanState::Failed => Err(anyhow::anyhow!("{} scan failed", worker.name())),
                    _ => Ok(()),
                }
            }
        });

        info!("Scanner '{}' started, refreshing every {:?}", scanner.name(), interval);
        scanner
    }

    /// One fetch-and-parse attempt. Returns the terminal state it reached.
    pub async fn run_once(&self) -> ScanState {
        *self.state.lock() = ScanState::Fetching;

        let outcome = match self.job.scan().await {
            Ok(result) => {
                self.cell.store(result);
                debug!("Scanner '{}' updated, next run in {:?}", self.name(), self.interval);
                ScanState::Parsed
            }
            Err(e) => {
                warn!("Scanner '{}' failed, keeping previous result: {}", self.name(), e);
                ScanState::Failed
            }
        };

        *self.state.lock() = outcome;
        outcome
    }

    pub fn name(&self) -> &str {
        self.job.name()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> ScanState {
        *self.state.lock()
    }

    pub fn latest(&self) -> Option<Arc<J::Output>> {
        self.cell.load()
    }

    /// Put a known result in the cell without fetching
    pub fn seed(&self, value: J::Output) {
        self.cell.store(value);
    }
}

/// Owner of the process-wide scanner instances.
///
/// Each scanner is built on first request and shared from then on, so any
/// number of sensors can wrap the same weather feed.
pub struct ScannerHub {
    fetcher: Arc<dyn Fetcher>,
    scheduler: Arc<Scheduler>,
    config: ScannerConfig,
    weather: OnceCell<Arc<Scanner<WeatherJob>>>,
    disk_prices: OnceCell<Arc<Scanner<DiskPriceJob>>>,
}

impl ScannerHub {
    pub fn new(fetcher: Arc<dyn Fetcher>, scheduler: Arc<Scheduler>, config: ScannerConfig) -> Self {
        Self {
            fetcher,
            scheduler,
            config,
            weather: OnceCell::new(),
            disk_prices: OnceCell::new(),
        }
    }

    pub async fn weather(&self) -> Arc<Scanner<WeatherJob>> {
        self.weather
            .get_or_init(|| async {
                let job = WeatherJob::new(self.fetcher.clone(), &self.config.weather_url);
                Scanner::start(job, self.config.weather_interval(), &self.scheduler).await
            })
            .await
            .clone()
    }

    pub async fn disk_prices(&self) -> Arc<Scanner<DiskPriceJob>> {
        self.disk_prices
            .get_or_init(|| async {
                let job = DiskPriceJob::new(self.fetcher.clone(), &self.config.disk_prices_url);
                Scanner::start(job, self.config.disk_prices_interval(), &self.scheduler).await
            })
            .await
            .clone()
    }

    /// Latest price table, if the disk price scanner has been started
    pub fn latest_prices(&self) -> Option<Arc<PriceTable>> {
        self.disk_prices.get().and_then(|scanner| scanner.latest())
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{ParseError, ReadError, TransportError};

    const URL: &str = "http://weather.test/obs.json";

    const FEED: &str = r#"{"observations": {"data": [
        {"air_temp": 17.4, "wind_spd_kmh": 13, "gust_kmh": 22, "wind_dir": "SSW"}
    ]}}"#;

    struct CountingJob {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl ScanJob for CountingJob {
        type Output = usize;

        fn name(&self) -> &str { "counting" }

        async fn scan(&self) -> Result<usize, ScanError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            Ok(n)
        }
    }

    #[tokio::test]
    async fn test_failed_scan_keeps_seeded_result() {
        let fetcher = Arc::new(canned::CannedFetcher::new());
        fetcher.respond(URL, "{\"observations\": ");
        let scanner = Scanner::new(WeatherJob::new(fetcher.clone(), URL), Duration::from_secs(300));

        let seeded = WeatherObservation {
            air_temp: 14.2,
            wind_speed: 11.0,
            wind_gust: 19.0,
            wind_direction: 202.5,
        };
        scanner.seed(seeded.clone());

        assert_eq!(scanner.run_once().await, ScanState::Failed);
        assert_eq!(*scanner.latest().unwrap(), seeded);
        assert_eq!(scanner.state(), ScanState::Failed);

        fetcher.fail(URL, TransportError::Status(503));
        assert_eq!(scanner.run_once().await, ScanState::Failed);
        assert_eq!(*scanner.latest().unwrap(), seeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_follows_slow_fetch() {
        let fetcher = Arc::new(canned::CannedFetcher::slow(Duration::from_secs(20)));
        fetcher.respond(URL, FEED);
        let scanner = Arc::new(Scanner::new(WeatherJob::new(fetcher.clone(), URL), Duration::from_secs(300)));
        assert_eq!(scanner.state(), ScanState::Idle);

        let worker = scanner.clone();
        let run = tokio::spawn(async move { worker.run_once().await });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(scanner.state(), ScanState::Fetching);
        assert!(scanner.latest().is_none());

        assert_eq!(run.await.unwrap(), ScanState::Parsed);
        assert_eq!(scanner.state(), ScanState::Parsed);
        assert_eq!(scanner.latest().unwrap().air_temp, 17.4);

        // Outcome holds until the next attempt starts
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(scanner.state(), ScanState::Parsed);

        fetcher.fail(URL, TransportError::Status(503));
        assert_eq!(scanner.run_once().await, ScanState::Failed);
        assert_eq!(scanner.state(), ScanState::Failed);
        assert_eq!(scanner.latest().unwrap().air_temp, 17.4);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_skips_overlapping_firings() {
        let scheduler = Scheduler::new();
        let fetcher = Arc::new(canned::CannedFetcher::slow(Duration::from_secs(25)));
        fetcher.respond(URL, FEED);

        // First fetch completes at t=25s, the timer then fires every 10s
        let scanner = Scanner::start(WeatherJob::new(fetcher.clone(), URL), Duration::from_secs(10), &scheduler).await;
        assert_eq!(fetcher.calls(), 1);

        // Firing at t=35s is in flight until t=60s; t=45s and t=55s are skipped
        tokio::time::sleep(Duration::from_secs(32)).await;
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(scanner.state(), ScanState::Fetching);

        let stats = scheduler.stats("weather").unwrap();
        assert!(stats.skipped > 0);
        assert_eq!(scanner.latest().unwrap().air_temp, 17.4);
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_scan_is_never_run_concurrently() {
        let scheduler = Scheduler::new();
        let job = CountingJob {
            calls: AtomicUsize::new(0),
            delay: Duration::from_secs(25),
        };

        // Construction performs the first fetch before returning
        let scanner = Scanner::start(job, Duration::from_secs(10), &scheduler).await;
        assert_eq!(*scanner.latest().unwrap(), 1);

        // First firing 10s after start runs for 25s; the next two are skipped
        tokio::time::sleep(Duration::from_secs(32)).await;

        let stats = scheduler.stats("counting").unwrap();
        assert_eq!(stats.runs, 1);
        assert!(stats.skipped > 0);
        assert_eq!(scanner.job.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*scanner.latest().unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*scanner.latest().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_hub_shares_one_scanner() {
        let fetcher = Arc::new(canned::CannedFetcher::new());
        let config = ScannerConfig {
            weather_url: URL.to_string(),
            ..ScannerConfig::default()
        };
        let hub = ScannerHub::new(fetcher.clone(), Arc::new(Scheduler::new()), config);

        let first = hub.weather().await;
        let second = hub.weather().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls(), 1);
        assert!(hub.latest_prices().is_none());
    }

    #[test]
    fn test_scan_error_kinds() {
        let err = ScanError::parse("weather", ParseError::Empty);
        assert!(err.to_string().contains("weather"));

        let err: ScanError = ReadError::new("weather", TransportError::Status(500)).into();
        assert!(matches!(err, ScanError::Read(_)));
    }
}
