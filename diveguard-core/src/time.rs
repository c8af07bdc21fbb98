//! Monotonic tick handling
//!
//! The platform supplies a free-running millisecond counter that wraps at
//! 2³². Every debounce window in the core (buzzer, fallback) is an elapsed
//! time comparison against that counter, so elapsed-time arithmetic must
//! survive the wrap instead of underflowing.

/// Millisecond tick counter, wraps at 2³²
pub type Tick = u32;

/// Source of the monotonic tick
///
/// On hardware this reads the SysTick/RTC counter. Tests use [`FixedTick`].
pub trait TickSource {
    /// Current tick in milliseconds
    fn now(&self) -> Tick;
}

/// Milliseconds elapsed from `start` to `now`, wrap-aware
///
/// When `now` is smaller than `start` the counter wrapped in between; the
/// modular difference is the exact elapsed time as long as less than one
/// full counter period passed.
pub fn elapsed_ms(start: Tick, now: Tick) -> u32 {
    now.wrapping_sub(start)
}

/// Fixed tick source for testing
#[derive(Debug, Clone)]
pub struct FixedTick {
    tick: Tick,
}

impl FixedTick {
    /// Create a source frozen at `tick`
    pub fn new(tick: Tick) -> Self {
        Self { tick }
    }

    /// Jump to an absolute tick
    pub fn set(&mut self, tick: Tick) {
        self.tick = tick;
    }

    /// Advance by `ms`, wrapping like the hardware counter
    pub fn advance(&mut self, ms: u32) {
        self.tick = self.tick.wrapping_add(ms);
    }
}

impl TickSource for FixedTick {
    fn now(&self) -> Tick {
        self.tick
    }
}
