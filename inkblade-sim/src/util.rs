//! Formatting helpers shared by the report writers.

const SUFFIXES: [&str; 7] = ["", "K", "M", "B", "T", "Qa", "Qi"];

/// Compact number formatting: 950, 1.25K, 3.40M, 12.5B...
#[must_use]
pub fn fmt_num(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() < 1_000.0 {
        return format!("{}", n.floor());
    }
    let tier = (n.abs().log10() / 3.0).floor();
    let tier_idx = usize::min(tier as usize, SUFFIXES.len() - 1);
    let scale = 1_000.0f64.powi(i32::try_from(tier_idx).unwrap_or(0));
    let scaled = n / scale;
    let digits = if scaled.abs() < 10.0 {
        2
    } else if scaled.abs() < 100.0 {
        1
    } else {
        0
    };
    format!("{scaled:.digits$}{}", SUFFIXES[tier_idx])
}

/// `h:mm:ss` above an hour, `mm:ss` below.
#[must_use]
pub fn fmt_time(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    let h = total / 3_600;
    let m = (total % 3_600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// A ratio as a rounded percentage.
#[must_use]
pub fn fmt_pct(ratio: f64) -> String {
    format!("{}%", (ratio * 100.0).round())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_format_compactly() {
        assert_eq!(fmt_num(0.0), "0");
        assert_eq!(fmt_num(950.7), "950");
        assert_eq!(fmt_num(1_250.0), "1.25K");
        assert_eq!(fmt_num(34_500.0), "34.5K");
        assert_eq!(fmt_num(250_000.0), "250K");
        assert_eq!(fmt_num(3_400_000.0), "3.40M");
        assert_eq!(fmt_num(12_500_000_000.0), "12.5B");
    }

    #[test]
    fn times_format_by_magnitude() {
        assert_eq!(fmt_time(0.0), "00:00");
        assert_eq!(fmt_time(75.0), "01:15");
        assert_eq!(fmt_time(3_675.0), "1:01:15");
    }

    #[test]
    fn percentages_round() {
        assert_eq!(fmt_pct(0.333), "33%");
        assert_eq!(fmt_pct(1.0), "100%");
    }
}
