//! 거래소 API 호출용 토큰 버킷 rate limiter.
//!
//! 모든 거래소 호출이 하나의 인스턴스를 공유합니다(`Arc<RateLimiter>`).
//! 토큰이 부족하면 거부하지 않고 다음 토큰이 생길 때까지 대기하며,
//! 대기 중 취소되면 예약한 토큰을 반환하고 에러를 돌려줍니다.

use crate::error::ExchangeError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// 통계 보고 주기.
const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Rate limiter 설정.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// 초당 토큰 충전량
    pub rate_per_second: u32,
    /// 최대 토큰 수 (버스트)
    pub burst: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            rate_per_second: 10,
            burst: 10,
        }
    }
}

/// 토큰 버킷 상태.
///
/// `tokens` 는 음수가 될 수 있으며, 음수 값은 대기 중인 예약 수를 뜻합니다.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    max_tokens: f64,
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: RateLimiterConfig) -> Self {
        let max_tokens = f64::from(config.burst.max(1));
        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_rate: f64::from(config.rate_per_second.max(1)),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// 토큰 하나를 예약하고, 사용 가능해질 때까지의 대기 시간을 반환합니다.
    fn reserve(&mut self, now: Instant) -> Duration {
        self.refill(now);
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / self.refill_rate)
        }
    }

    fn release(&mut self) {
        self.tokens = (self.tokens + 1.0).min(self.max_tokens);
    }
}

/// Rate limiter 통계 스냅샷.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterStats {
    pub total_requests: u64,
    pub total_errors: u64,
    pub last_minute_requests: u64,
    pub last_minute_errors: u64,
}

/// 프로세스 전역 토큰 버킷 rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    bucket: Mutex<TokenBucket>,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    minute_requests: AtomicU64,
    minute_errors: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            bucket: Mutex::new(TokenBucket::new(config)),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            minute_requests: AtomicU64::new(0),
            minute_errors: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimiterConfig::default())
    }

    pub fn config(&self) -> RateLimiterConfig {
        self.config
    }

    /// 토큰을 획득합니다. 토큰이 없으면 충전될 때까지 대기합니다.
    ///
    /// 대기 중 `cancel` 이 취소되면 예약을 반환하고
    /// `ExchangeError::RateLimiterCancelled` 를 반환합니다.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), ExchangeError> {
        if cancel.is_cancelled() {
            return Err(ExchangeError::RateLimiterCancelled);
        }

        let wait = self.with_bucket(|bucket| bucket.reserve(Instant::now()));
        if wait.is_zero() {
            return Ok(());
        }

        debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limiter token");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.with_bucket(TokenBucket::release);
                Err(ExchangeError::RateLimiterCancelled)
            }
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }

    /// 호출 결과를 통계에 반영합니다.
    pub fn record_result(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.minute_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
            self.minute_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_errors: self.total_errors.load(Ordering::Relaxed),
            last_minute_requests: self.minute_requests.load(Ordering::Relaxed),
            last_minute_errors: self.minute_errors.load(Ordering::Relaxed),
        }
    }

    /// 현재 사용 가능한 토큰 수 (대기 중인 예약이 있으면 음수).
    pub fn available_tokens(&self) -> f64 {
        self.with_bucket(|bucket| {
            bucket.refill(Instant::now());
            bucket.tokens
        })
    }

    /// 지난 1분 통계를 기록하고 분 단위 카운터를 초기화합니다.
    pub fn report_and_reset(&self) -> RateLimiterStats {
        let stats = RateLimiterStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_errors: self.total_errors.load(Ordering::Relaxed),
            last_minute_requests: self.minute_requests.swap(0, Ordering::Relaxed),
            last_minute_errors: self.minute_errors.swap(0, Ordering::Relaxed),
        };

        info!(
            total_requests = stats.total_requests,
            total_errors = stats.total_errors,
            last_minute_requests = stats.last_minute_requests,
            last_minute_errors = stats.last_minute_errors,
            rate_per_second = self.config.rate_per_second,
            burst = self.config.burst,
            "Exchange rate limiter stats"
        );

        metrics::gauge!("exchange_requests_last_minute").set(stats.last_minute_requests as f64);
        metrics::gauge!("exchange_errors_last_minute").set(stats.last_minute_errors as f64);

        stats
    }

    /// 1분마다 통계를 보고하는 백그라운드 태스크를 시작합니다.
    pub fn spawn_stats_reporter(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(STATS_INTERVAL);
            // 첫 tick 은 즉시 완료되므로 건너뜀
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Rate limiter stats reporter stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        self.report_and_reset();
                    }
                }
            }
        })
    }

    fn with_bucket<T>(&self, f: impl FnOnce(&mut TokenBucket) -> T) -> T {
        let mut bucket = self
            .bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut bucket)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rate: u32, burst: u32) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            rate_per_second: rate,
            burst,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_immediate() {
        let limiter = limiter(10, 10);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        for _ in 0..10 {
            limiter.acquire(&cancel).await.unwrap();
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_beyond_burst_are_delayed_not_rejected() {
        let limiter = Arc::new(limiter(10, 10));
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..15 {
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move { limiter.acquire(&cancel).await }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        // 초과 5건은 100ms 간격으로 충전되는 토큰을 기다림
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "elapsed = {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(600), "elapsed = {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_returns_token() {
        let limiter = Arc::new(limiter(1, 1));
        let cancel = CancellationToken::new();

        limiter.acquire(&cancel).await.unwrap();

        let waiter = {
            let limiter = limiter.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { limiter.acquire(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ExchangeError::RateLimiterCancelled)));

        // 예약이 반환되어 1초 후에는 토큰이 하나 다시 생김
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(limiter.available_tokens() >= 1.0 - f64::EPSILON);
    }

    #[tokio::test]
    async fn test_already_cancelled_fails_fast() {
        let limiter = limiter(10, 10);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = limiter.acquire(&cancel).await;
        assert!(matches!(result, Err(ExchangeError::RateLimiterCancelled)));
        assert!((limiter.available_tokens() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_counters_and_reset() {
        let limiter = limiter(10, 10);
        limiter.record_result(true);
        limiter.record_result(false);
        limiter.record_result(true);

        let stats = limiter.report_and_reset();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.last_minute_requests, 3);
        assert_eq!(stats.last_minute_errors, 1);

        let after = limiter.stats();
        assert_eq!(after.total_requests, 3);
        assert_eq!(after.last_minute_requests, 0);
        assert_eq!(after.last_minute_errors, 0);
    }
}
