//! Millisecond tick arithmetic.
//!
//! Timestamps are `u32` milliseconds since boot, the width the ESP32's
//! 32-bit atomics can store in a single indivisible write.  The counter
//! wraps every ~49.7 days, so every comparison goes through the wrapping
//! helpers below rather than plain subtraction.

/// Milliseconds since boot (wrapping).
pub type Millis = u32;

/// How far "ahead" of `now` a timestamp may be and still count as the
/// present.  Covers an ISR that records a hit after the main loop sampled
/// its own `now`.
pub const PREEMPT_SLACK_MS: u32 = 1_000;

/// Half the wrap period.  Differences beyond this are ambiguous.
pub const HALF_RANGE_MS: u32 = 1 << 31;

/// Wrapping distance from `earlier` to `now`.
///
/// A timestamp up to [`PREEMPT_SLACK_MS`] in the future of `now` yields 0.
#[inline]
pub fn elapsed(now: Millis, earlier: Millis) -> u32 {
    let diff = now.wrapping_sub(earlier);
    if diff > u32::MAX - PREEMPT_SLACK_MS {
        0
    } else {
        diff
    }
}

/// `true` if `a` is strictly later than `b` on the wrapping timeline.
#[inline]
pub fn is_after(a: Millis, b: Millis) -> bool {
    let diff = a.wrapping_sub(b);
    diff != 0 && diff < HALF_RANGE_MS
}
