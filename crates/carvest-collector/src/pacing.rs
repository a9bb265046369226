//! Randomized think time between page interactions.

use carvest_core::DelayRange;
use rand::Rng;
use std::time::Duration;

/// Draw a delay uniformly from the range.
pub fn sample_delay(range: DelayRange) -> Duration {
    if range.max_ms <= range.min_ms {
        return range.min();
    }
    let ms = rand::thread_rng().gen_range(range.min_ms..=range.max_ms);
    Duration::from_millis(ms)
}

/// Sleep for a randomized delay drawn from the range.
pub async fn pause(range: DelayRange) {
    let delay = sample_delay(range);
    if !delay.is_zero() {
        tracing::trace!("Pausing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_within_bounds() {
        let range = DelayRange::new(1500, 3500);
        for _ in 0..200 {
            let delay = sample_delay(range);
            assert!(delay >= range.min() && delay <= range.max());
        }
    }

    #[test]
    fn test_degenerate_ranges() {
        assert_eq!(sample_delay(DelayRange::none()), Duration::ZERO);
        assert_eq!(sample_delay(DelayRange::new(40, 40)), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_zero_pause_returns_immediately() {
        let start = std::time::Instant::now();
        pause(DelayRange::none()).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
