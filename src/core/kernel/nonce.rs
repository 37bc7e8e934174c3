use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Highest sub-millisecond counter value
pub const MAX_COUNTER: u64 = 999;

const COUNTER_SLOTS: u64 = 10_000;

/// A request nonce: Unix milliseconds followed by a four digit,
/// zero-padded sub-millisecond counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonce(u64);

impl Nonce {
    pub const fn new(millis: u64, counter: u64) -> Self {
        Self(millis * COUNTER_SLOTS + counter)
    }

    pub const fn millis(self) -> u64 {
        self.0 / COUNTER_SLOTS
    }

    pub const fn counter(self) -> u64 {
        self.0 % COUNTER_SLOTS
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.millis(), self.counter())
    }
}

/// Source of wall-clock milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        // A clock before the epoch falls back to the generator's last value
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

#[derive(Debug, Default)]
struct NonceState {
    last_millis: u64,
    counter: u64,
}

/// Per-client nonce generator.
///
/// Guarantees strictly increasing nonces for all callers sharing it. When the
/// counter for one millisecond is exhausted, or the wall clock steps back, the
/// generator keeps counting from its own last millisecond instead of
/// blocking.
pub struct NonceGenerator {
    clock: Arc<dyn Clock>,
    state: Mutex<NonceState>,
}

impl fmt::Debug for NonceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("NonceGenerator")
            .field("last_millis", &state.last_millis)
            .field("counter", &state.counter)
            .finish_non_exhaustive()
    }
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(NonceState::default()),
        }
    }

    pub fn generate(&self) -> Nonce {
        let now = self.clock.now_millis();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now > state.last_millis {
            state.last_millis = now;
            state.counter = 0;
        } else if state.counter < MAX_COUNTER {
            state.counter += 1;
        } else {
            state.last_millis += 1;
            state.counter = 0;
        }

        Nonce::new(state.last_millis, state.counter)
    }
}
