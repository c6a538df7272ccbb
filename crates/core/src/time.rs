use std::time::Duration;

/// Milliseconds, rounded to 5 decimal places.
pub fn elapsed_ms(elapsed: Duration) -> f64 {
    round_ms(elapsed.as_secs_f64() * 1000.0)
}

pub fn round_ms(ms: f64) -> f64 {
    (ms * 100_000.0).round() / 100_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_five_places() {
        assert_eq!(round_ms(1.234_567_89), 1.234_57);
        assert_eq!(round_ms(0.0), 0.0);
    }

    #[test]
    fn converts_duration() {
        assert_eq!(elapsed_ms(Duration::from_micros(1_500)), 1.5);
        assert_eq!(elapsed_ms(Duration::from_secs(2)), 2000.0);
    }
}
