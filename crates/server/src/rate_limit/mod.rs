//! Per-IP request throttling, in two passes.
//!
//! The coarse limiter is a lock-free pre-filter that sheds obvious floods;
//! the sliding limiter is the precise one behind a lock. A request is
//! rejected only when both agree the peer is over budget, so the coarse
//! pass absorbing a collision never blocks a well-behaved client on its own.

pub mod coarse;
pub mod sliding;

pub use coarse::CoarseRateLimiter;
pub use sliding::SlidingRateLimiter;
