pub mod circuit;
pub mod error;
pub mod rate;
pub mod wrapper;

pub use circuit::{CircuitBreaker, CircuitConfig, CircuitState};
pub use error::ResilienceError;
pub use rate::{RateConfig, RateLimiter};
pub use wrapper::ResilienceWrapper;
