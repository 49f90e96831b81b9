//! Exponential and Fibonacci backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff: `base * 2^(attempt-1)`, capped at `max_ms`.
pub fn exponential_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Fibonacci backoff: `base * fib(attempt)` with fib(1) = fib(2) = 1.
pub fn fibonacci_delay(attempt: u32, base_ms: u64) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(fibonacci(attempt)))
}

fn fibonacci(n: u32) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

/// Add up to `ratio` of `delay` as random jitter.
pub fn with_jitter(delay: Duration, ratio: f64) -> Duration {
    let jitter_range = (delay.as_millis() as f64 * ratio) as u64;
    if jitter_range == 0 {
        return delay;
    }

    let jitter = rand::thread_rng().gen_range(0..jitter_range);
    delay + Duration::from_millis(jitter)
}
