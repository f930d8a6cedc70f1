//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u64 range, returning 0 for non-finite or
/// negative values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.min(max).floor();
    cast::<f64, u64>(clamped).unwrap_or(0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Round a f64 of simulated seconds to whole milliseconds, clamped to i64.
#[must_use]
pub fn secs_to_ms(secs: f64) -> i64 {
    if !secs.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = (secs * 1_000.0).clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_edges() {
        assert_eq!(floor_f64_to_u64(3.9), 3);
        assert_eq!(floor_f64_to_u64(-1.0), 0);
        assert_eq!(floor_f64_to_u64(f64::NAN), 0);
        assert_eq!(floor_f64_to_u64(f64::INFINITY), 0);
    }

    #[test]
    fn conversions_round_trip_small_values() {
        assert!((u64_to_f64(42) - 42.0).abs() < f64::EPSILON);
        assert!((i64_to_f64(-42) + 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn secs_to_ms_rounds() {
        assert_eq!(secs_to_ms(1.2345), 1_235);
        assert_eq!(secs_to_ms(f64::NAN), 0);
    }
}
