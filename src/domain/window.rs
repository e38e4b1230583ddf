// Session clock and visible time window
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

pub const DEFAULT_TRAILING_MS: i64 = 10_000;
pub const DEFAULT_LEADING_MS: i64 = 500;

/// Wall-clock source in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock, shared by cloning
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Time anchor of one insight session
#[derive(Clone)]
pub struct SessionClock {
    clock: Arc<dyn Clock>,
    start_ms: i64,
}

impl SessionClock {
    /// Captures the session start from `clock`; it never moves afterwards
    pub fn start(clock: Arc<dyn Clock>) -> Self {
        let start_ms = clock.now_ms();
        Self { clock, start_ms }
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Milliseconds since start; a clock stepping backwards clamps to zero
    pub fn elapsed_at(&self, now_ms: i64) -> u64 {
        now_ms.saturating_sub(self.start_ms).max(0) as u64
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed_at(self.now_ms())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSpan {
    pub trailing_ms: i64,
    pub leading_ms: i64,
}

impl Default for WindowSpan {
    fn default() -> Self {
        Self {
            trailing_ms: DEFAULT_TRAILING_MS,
            leading_ms: DEFAULT_LEADING_MS,
        }
    }
}

/// X-axis range handed to the chart, in session-relative milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibleWindow {
    pub min_ms: i64,
    pub max_ms: i64,
}

impl VisibleWindow {
    pub fn trailing(elapsed_ms: u64, span: WindowSpan) -> Self {
        let elapsed = elapsed_ms as i64;
        Self {
            min_ms: elapsed - span.trailing_ms,
            max_ms: elapsed + span.leading_ms,
        }
    }
}
