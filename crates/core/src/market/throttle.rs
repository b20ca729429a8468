use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1100);

/// Enforces a minimum spacing between outbound requests to the market-data
/// provider. Waiters queue on the lock, so requests start one at a time in
/// arrival order.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

/// Proof that a caller was given a slot.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct ThrottlePermit {
    pub granted_at: Instant,
    pub waited: Duration,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// The process-wide throttle. Created on first use with the interval from
    /// `ALPHA_VANTAGE_MIN_INTERVAL_MS`; never reset afterwards.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<RequestThrottle>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                let min_interval = std::env::var("ALPHA_VANTAGE_MIN_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_MIN_INTERVAL);
                Arc::new(Self::new(min_interval))
            })
            .clone()
    }

    /// Waits until `min_interval` has passed since the previous grant. The
    /// lock is held across the sleep.
    pub async fn acquire(&self) -> ThrottlePermit {
        let mut last = self.last_request.lock().await;
        let mut waited = Duration::ZERO;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                waited = self.min_interval - elapsed;
                tokio::time::sleep(waited).await;
            }
        }
        let granted_at = Instant::now();
        *last = Some(granted_at);
        ThrottlePermit { granted_at, waited }
    }
}
