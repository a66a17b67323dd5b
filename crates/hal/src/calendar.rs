//! Calendar time for the RTC role.
//!
//! The representable range is 2000-01-01 00:00:00 to 2099-12-31 23:59:59, the
//! window a two-digit BCD year register covers. Inside it every year divisible
//! by four is a leap year.

use crate::error::{HalError, HalResult};

/// First representable year.
pub const EPOCH_YEAR: u16 = 2000;
/// Last representable year.
pub const LAST_YEAR: u16 = 2099;
/// Seconds in one day.
pub const SECONDS_PER_DAY: u32 = 86_400;

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// `true` for leap years inside the supported range.
#[must_use]
pub const fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Days in `month` (1..=12) of `year`; 0 for an invalid month.
#[must_use]
pub fn days_in_month(year: u16, month: u8) -> u8 {
    let base = month
        .checked_sub(1)
        .and_then(|i| DAYS_IN_MONTH.get(usize::from(i)))
        .copied()
        .unwrap_or(0);
    if month == 2 && is_leap_year(year) {
        base.saturating_add(1)
    } else {
        base
    }
}

const fn days_in_year(year: u16) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// A validated calendar date and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Default for DateTime {
    /// 2000-01-01 00:00:00
    fn default() -> Self {
        Self {
            year: EPOCH_YEAR,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    /// Build a date-time, rejecting anything outside the calendar or the
    /// 2000..=2099 window with [`HalError::InvalidArgument`].
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> HalResult<Self> {
        if !(EPOCH_YEAR..=LAST_YEAR).contains(&year)
            || !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(HalError::InvalidArgument);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Year (2000..=2099)
    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    /// Month (1..=12)
    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Day of month (1..=31)
    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Hour (0..=23)
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0..=59)
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second (0..=59)
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Seconds elapsed since midnight.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // Safety: fields validated; max 86_399
    pub fn seconds_of_day(&self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second)
    }

    /// Days elapsed since 2000-01-01.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // Safety: bounded by 100 years of days
    pub fn days_since_epoch(&self) -> u32 {
        let years: u32 = (EPOCH_YEAR..self.year).map(days_in_year).sum();
        let months: u32 = (1..self.month)
            .map(|m| u32::from(days_in_month(self.year, m)))
            .sum();
        years + months + u32::from(self.day) - 1
    }

    /// ISO weekday, 1 = Monday .. 7 = Sunday.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // Safety: modulo of a bounded day count
    pub fn weekday(&self) -> u8 {
        // 2000-01-01 was a Saturday
        let idx = (self.days_since_epoch() + 5) % 7;
        u8::try_from(idx).unwrap_or(0).saturating_add(1)
    }

    /// Seconds elapsed since 2000-01-01 00:00:00.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // Safety: < 100 * 366 * 86_400 fits u64
    pub fn to_epoch_seconds(&self) -> u64 {
        u64::from(self.days_since_epoch()) * u64::from(SECONDS_PER_DAY)
            + u64::from(self.seconds_of_day())
    }

    /// Inverse of [`DateTime::to_epoch_seconds`]. Instants past
    /// 2099-12-31 23:59:59 are [`HalError::InvalidArgument`].
    #[allow(clippy::arithmetic_side_effects)] // Safety: divisions by non-zero constants
    #[allow(clippy::cast_possible_truncation)] // Safety: every narrowed value is range-bounded
    pub fn from_epoch_seconds(seconds: u64) -> HalResult<Self> {
        let mut days = seconds / u64::from(SECONDS_PER_DAY);
        let rem = (seconds % u64::from(SECONDS_PER_DAY)) as u32;

        let mut year = EPOCH_YEAR;
        loop {
            let len = u64::from(days_in_year(year));
            if days < len {
                break;
            }
            days -= len;
            year = year.checked_add(1).ok_or(HalError::InvalidArgument)?;
            if year > LAST_YEAR {
                return Err(HalError::InvalidArgument);
            }
        }

        let mut month = 1_u8;
        loop {
            let len = u64::from(days_in_month(year, month));
            if days < len {
                break;
            }
            days -= len;
            month += 1;
        }

        Self::new(
            year,
            month,
            days as u8 + 1,
            (rem / 3600) as u8,
            ((rem % 3600) / 60) as u8,
            (rem % 60) as u8,
        )
    }

    /// The alarm time-of-day this instant matches.
    #[must_use]
    pub const fn time_of_day(&self) -> AlarmTime {
        AlarmTime {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }
}

/// Time-of-day match for a one-shot RTC alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
    second: u8,
}

impl AlarmTime {
    /// Validate and build an alarm time.
    pub fn new(hour: u8, minute: u8, second: u8) -> HalResult<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(HalError::InvalidArgument);
        }
        Ok(Self {
            hour,
            minute,
            second,
        })
    }

    /// Hour (0..=23)
    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute (0..=59)
    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Second (0..=59)
    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Seconds after midnight at which the alarm matches.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // Safety: fields validated; max 86_399
    pub fn seconds_of_day(&self) -> u32 {
        u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_zero_seconds() {
        assert_eq!(DateTime::default().to_epoch_seconds(), 0);
        assert_eq!(DateTime::from_epoch_seconds(0).unwrap(), DateTime::default());
    }

    #[test]
    fn leap_day_2024_is_valid_and_2023_is_not() {
        assert!(DateTime::new(2024, 2, 29, 0, 0, 0).is_ok());
        assert_eq!(
            DateTime::new(2023, 2, 29, 0, 0, 0),
            Err(HalError::InvalidArgument)
        );
    }

    #[test]
    fn out_of_window_years_rejected() {
        assert!(DateTime::new(1999, 12, 31, 23, 59, 59).is_err());
        assert!(DateTime::new(2100, 1, 1, 0, 0, 0).is_err());
    }

    #[test]
    fn last_instant_round_trips_and_next_is_rejected() {
        let last = DateTime::new(2099, 12, 31, 23, 59, 59).unwrap();
        let secs = last.to_epoch_seconds();
        assert_eq!(DateTime::from_epoch_seconds(secs).unwrap(), last);
        assert_eq!(
            DateTime::from_epoch_seconds(secs + 1),
            Err(HalError::InvalidArgument)
        );
    }

    #[test]
    fn known_instant_converts() {
        // 2000-03-01 is day 60 (leap February)
        let dt = DateTime::new(2000, 3, 1, 12, 30, 15).unwrap();
        assert_eq!(dt.days_since_epoch(), 60);
        assert_eq!(dt.to_epoch_seconds(), 60 * 86_400 + 12 * 3600 + 30 * 60 + 15);
    }

    #[test]
    fn weekday_of_epoch_is_saturday() {
        assert_eq!(DateTime::default().weekday(), 6);
        // 2024-01-01 was a Monday
        assert_eq!(DateTime::new(2024, 1, 1, 0, 0, 0).unwrap().weekday(), 1);
    }

    #[test]
    fn alarm_time_validates_fields() {
        assert!(AlarmTime::new(23, 59, 59).is_ok());
        assert_eq!(AlarmTime::new(24, 0, 0), Err(HalError::InvalidArgument));
        assert_eq!(AlarmTime::new(7, 30, 0).unwrap().seconds_of_day(), 27_000);
    }
}
