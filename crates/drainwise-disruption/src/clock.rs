//! Time source used to age nodes.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of "now". Injected so lifetime decay can be tested against a
/// fixed instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Time elapsed since `instant`. Zero if `instant` is in the future.
    fn since(&self, instant: SystemTime) -> Duration {
        self.now().duration_since(instant).unwrap_or_default()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FakeClock {
    now: RwLock<SystemTime>,
}

impl FakeClock {
    pub fn new(now: SystemTime) -> Self {
        Self { now: RwLock::new(now) }
    }

    /// A clock pinned to `secs` seconds after the Unix epoch.
    pub fn at_epoch_secs(secs: u64) -> Self {
        Self::new(UNIX_EPOCH + Duration::from_secs(secs))
    }

    pub fn set(&self, now: SystemTime) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn step(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}
