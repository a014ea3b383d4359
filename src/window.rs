/**
 * Validity window: how far apart in time a match may be
 */

use crate::error::Result;
use crate::timestamp::CaptureTime;

pub const DEFAULT_MAX_DIFF_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    max_diff_days: u32,
}

impl ValidityWindow {
    pub fn new(max_diff_days: u32) -> Self {
        Self { max_diff_days }
    }

    pub fn max_diff_days(&self) -> u32 {
        self.max_diff_days
    }

    /// Whole days between the two capture times, rounded down.
    pub fn elapsed_days(a: &CaptureTime, b: &CaptureTime) -> i64 {
        // num_days truncates toward zero, which is a floor for a non-negative delta.
        a.distance(b).num_days()
    }

    /// 14 days 23 hours still counts as 14 days; exactly 15 days does not.
    pub fn admits(&self, a: &CaptureTime, b: &CaptureTime) -> bool {
        Self::elapsed_days(a, b) <= i64::from(self.max_diff_days)
    }
}

impl Default for ValidityWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIFF_DAYS)
    }
}

/// Raw-string form of [`ValidityWindow::admits`].
pub fn in_bounds(date_a: &str, date_b: &str, max_diff_days: u32) -> Result<bool> {
    let a = CaptureTime::parse(date_a)?;
    let b = CaptureTime::parse(date_b)?;
    Ok(ValidityWindow::new(max_diff_days).admits(&a, &b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeotagError;

    #[test]
    fn test_boundary_days() {
        let base = "2024:01:01 00:00:00";
        assert!(in_bounds(base, "2024:01:15 00:00:00", 14).unwrap());
        assert!(in_bounds(base, "2024:01:15 01:00:00", 14).unwrap());
        assert!(in_bounds(base, "2024:01:15 23:59:59", 14).unwrap());
        assert!(!in_bounds(base, "2024:01:16 00:00:00", 14).unwrap());
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("2024:01:01 10:00:00", "2024:01:10 10:00:00"),
            ("2024:02:01 10:00:00", "2024:01:10 10:00:00"),
            ("2024:03:01 00:00:00", "2024:03:16 00:00:01"),
        ];
        for (a, b) in pairs {
            for days in [0, 1, 14, 30] {
                assert_eq!(in_bounds(a, b, days).unwrap(), in_bounds(b, a, days).unwrap());
            }
        }
    }

    #[test]
    fn test_same_instant_with_zero_window() {
        assert!(in_bounds("2024:01:01 10:00:00", "2024:01:01 10:00:00", 0).unwrap());
        assert!(in_bounds("2024:01:01 10:00:00", "2024:01:01 23:59:59", 0).unwrap());
        assert!(!in_bounds("2024:01:01 10:00:00", "2024:01:02 10:00:00", 0).unwrap());
    }

    #[test]
    fn test_crosses_leap_day() {
        assert!(in_bounds("2024:02:20 12:00:00", "2024:03:05 12:00:00", 14).unwrap());
        assert!(!in_bounds("2024:02:20 12:00:00", "2024:03:06 12:00:00", 14).unwrap());
    }

    #[test]
    fn test_malformed_input() {
        let result = in_bounds("2024:01:01", "2024:01:01 10:00:00", 14);
        assert!(matches!(result, Err(GeotagError::MalformedTimestamp(_))));
    }

    #[test]
    fn test_default_is_fourteen_days() {
        assert_eq!(ValidityWindow::default().max_diff_days(), 14);
    }
}
