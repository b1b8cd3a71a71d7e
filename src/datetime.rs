//! Calendar time and its mapping onto the seven time registers.
//!
//! The DS3232 stores date and time in 7 consecutive BCD registers:
//! seconds, minutes, hours, day, date, month, year. [`CalendarTime`] is the
//! decoded form of those registers. Conversion between the two does no range
//! checking; conversion to and from chrono's `NaiveDateTime` (and therefore
//! epoch seconds) does, reporting failures as [`DateTimeError`].

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::bcd::{bcd_to_decimal, decimal_to_bcd};
use crate::registers::{CENTURY, CLOCK_HALT, HOURS_12_24};

/// The year register holds an offset from this year.
pub const EPOCH_YEAR: u16 = 2000;

/// Decoded contents of the time registers.
///
/// `hour` is always in 24-hour form. `weekday` is passed through unchanged;
/// this driver writes 1 for Sunday through 7 for Saturday. `year` is the full
/// year; only years 2000-2099 are representable on the chip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalendarTime {
    /// Seconds (0-59)
    pub second: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Hours (0-23)
    pub hour: u8,
    /// Day of week (1-7)
    pub weekday: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Month (1-12)
    pub month: u8,
    /// Full year (2000-2099)
    pub year: u16,
}

/// Errors that can occur converting between [`CalendarTime`] and chrono types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// The decoded or requested date/time does not exist
    InvalidDateTime,
    /// The year is not in 2000-2099
    YearOutOfRange,
}

impl CalendarTime {
    /// Converts to a chrono `NaiveDateTime`.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidDateTime`] if the fields do not form a
    /// real date and time, which is the case for a chip that was never set.
    pub fn to_naive(&self) -> Result<NaiveDateTime, DateTimeError> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
        .ok_or(DateTimeError::InvalidDateTime)
    }

    /// Builds a calendar time from a chrono `NaiveDateTime`, numbering
    /// weekdays from 1 = Sunday.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::YearOutOfRange`] for years outside 2000-2099.
    pub fn from_naive(datetime: &NaiveDateTime) -> Result<Self, DateTimeError> {
        let year = u16::try_from(datetime.year())
            .ok()
            .filter(|y| (EPOCH_YEAR..EPOCH_YEAR + 100).contains(y))
            .ok_or(DateTimeError::YearOutOfRange)?;
        let narrow = |v: u32| u8::try_from(v).map_err(|_| DateTimeError::InvalidDateTime);
        Ok(CalendarTime {
            second: narrow(datetime.second())?,
            minute: narrow(datetime.minute())?,
            hour: narrow(datetime.hour())?,
            weekday: narrow(datetime.weekday().number_from_sunday())?,
            day: narrow(datetime.day())?,
            month: narrow(datetime.month())?,
            year,
        })
    }

    /// Seconds since 1970-01-01T00:00:00 UTC.
    ///
    /// # Errors
    ///
    /// Fails like [`CalendarTime::to_naive`].
    pub fn to_epoch_seconds(&self) -> Result<i64, DateTimeError> {
        Ok(self.to_naive()?.and_utc().timestamp())
    }

    /// Calendar time for a count of seconds since 1970-01-01T00:00:00 UTC.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::YearOutOfRange`] if the instant does not fall
    /// in 2000-2099.
    pub fn from_epoch_seconds(seconds: i64) -> Result<Self, DateTimeError> {
        let datetime =
            DateTime::from_timestamp(seconds, 0).ok_or(DateTimeError::YearOutOfRange)?;
        Self::from_naive(&datetime.naive_utc())
    }
}

impl From<[u8; 7]> for CalendarTime {
    /// Decodes the raw time registers, ignoring the clock halt, 12/24 and
    /// century bits.
    fn from(data: [u8; 7]) -> Self {
        CalendarTime {
            second: bcd_to_decimal(data[0] & !CLOCK_HALT),
            minute: bcd_to_decimal(data[1]),
            hour: bcd_to_decimal(data[2] & !HOURS_12_24),
            weekday: data[3],
            day: bcd_to_decimal(data[4]),
            month: bcd_to_decimal(data[5] & !CENTURY),
            year: EPOCH_YEAR + u16::from(bcd_to_decimal(data[6])),
        }
    }
}

impl From<&CalendarTime> for [u8; 7] {
    /// Encodes the time registers in 24-hour mode with the clock halt and
    /// century bits clear.
    fn from(time: &CalendarTime) -> [u8; 7] {
        // year offsets wrap per century
        let year = (time.year.wrapping_sub(EPOCH_YEAR) % 100) as u8;
        [
            decimal_to_bcd(time.second) & !CLOCK_HALT,
            decimal_to_bcd(time.minute),
            decimal_to_bcd(time.hour) & !HOURS_12_24,
            time.weekday,
            decimal_to_bcd(time.day),
            decimal_to_bcd(time.month) & !CENTURY,
            decimal_to_bcd(year),
        ]
    }
}
