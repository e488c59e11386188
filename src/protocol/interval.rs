//! Interval values and their flattening into a linear duration.

use chrono::TimeDelta;

/// Days an interval month stands for when flattened to a duration.
pub const DAYS_PER_MONTH: i64 = 30;

/// Microseconds per interval day.
pub const MICROS_PER_DAY: i64 = 86_400_000_000;

/// The 16-byte interval wire triple.
///
/// Wire format:
/// - microseconds (8 bytes, big-endian signed)
/// - days (4 bytes, big-endian signed)
/// - months (4 bytes, big-endian signed)
///
/// The three components are independent on the wire; [`duration_micros`]
/// (PgInterval::duration_micros) flattens them into one microsecond count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PgInterval {
    /// Sub-day part, in microseconds.
    pub microseconds: i64,
    /// Whole days.
    pub days: i32,
    /// Whole months.
    pub months: i32,
}

impl PgInterval {
    /// Create an interval from its wire components.
    pub const fn new(microseconds: i64, days: i32, months: i32) -> Self {
        Self {
            microseconds,
            days,
            months,
        }
    }

    /// Flatten the triple into a single microsecond count.
    ///
    /// Months convert at 30 days each, days at 86 400 000 000 microseconds
    /// each. The sum is formed in 128-bit arithmetic and clamped once to the
    /// `i64` range, so saturation is symmetric and exact: a combination whose
    /// mathematical sum fits in `i64` never saturates, even when a single
    /// component's contribution alone would overflow 64 bits.
    pub const fn duration_micros(&self) -> i64 {
        let total = self.microseconds as i128
            + self.days as i128 * MICROS_PER_DAY as i128
            + self.months as i128 * DAYS_PER_MONTH as i128 * MICROS_PER_DAY as i128;
        if total > i64::MAX as i128 {
            i64::MAX
        } else if total < i64::MIN as i128 {
            i64::MIN
        } else {
            total as i64
        }
    }

    /// The flattened duration as a [`chrono::TimeDelta`].
    pub fn to_timedelta(&self) -> TimeDelta {
        TimeDelta::microseconds(self.duration_micros())
    }
}

impl From<PgInterval> for TimeDelta {
    fn from(interval: PgInterval) -> Self {
        interval.to_timedelta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattening_sums_all_three_components() {
        // 7y 8m 9d 10h 11m 12s 13ms 14us
        let interval = PgInterval::new(36_672_013_014, 9, 92);
        assert_eq!(interval.duration_micros(), 239_278_272_013_014);
    }

    #[test]
    fn test_single_component_contributions() {
        assert_eq!(
            PgInterval::new(3_333_333_333_333_333, 0, 0).duration_micros(),
            3_333_333_333_333_333
        );
        assert_eq!(
            PgInterval::new(0, 200_000, 0).duration_micros(),
            17_280_000_000_000_000
        );
        assert_eq!(
            PgInterval::new(0, 0, 5555).duration_micros(),
            14_398_560_000_000_000
        );
    }

    #[test]
    fn test_saturates_at_i64_bounds() {
        assert_eq!(
            PgInterval::new(14_454_775_808, 106_751_991, 0).duration_micros(),
            i64::MAX
        );
        assert_eq!(
            PgInterval::new(-14_454_775_809, -106_751_991, 0).duration_micros(),
            i64::MIN
        );
    }

    #[test]
    fn test_opposing_components_cancel_before_clamping() {
        // The days contribution alone overflows i64; the months contribution
        // cancels it back into range.
        let interval = PgInterval::new(9_223_370_740_854_775_807, 555_555_555, -18_518_518);
        assert_eq!(interval.duration_micros(), i64::MAX);
    }

    #[test]
    fn test_timedelta_carries_the_flattened_count() {
        let interval = PgInterval::new(36_672_013_014, 9, 92);
        assert_eq!(
            interval.to_timedelta(),
            TimeDelta::microseconds(239_278_272_013_014)
        );
    }
}
