//! Process-local request-path state: response cache, rate limiter, and the
//! sweeper that keeps both bounded.

pub mod rate_limiter;
pub mod response_cache;
pub mod sweeper;

pub use rate_limiter::{Admission, RateLimiter};
pub use response_cache::{keys, ResponseCache};
pub use sweeper::Sweeper;
