//! Alarm configuration for the DS3232 RTC.
//!
//! The chip has two independent alarms. Each one has a set of match
//! registers, an interrupt enable bit in the control register and a flag bit
//! in the status register that the chip sets on a match.
//!
//! Every match register carries a mask bit (bit 7). A set mask bit removes
//! that field from the comparison. The day/date register also has a DY/DT bit
//! (bit 6) choosing between day-of-week and day-of-month matching. Alarm 2 has
//! no seconds register and always fires at 00 seconds.
//!
//! [`AlarmType`] names the eleven supported mask combinations, and
//! [`AlarmRegisters`] is the encoded register image written by
//! [`DS3232::set_alarm`](crate::DS3232::set_alarm).

use crate::bcd::{bcd_to_decimal, decimal_to_bcd};
use crate::registers::{Control, RegAddr, Status, ALARM_MASK, DAY_DATE_SELECT, HOURS_12_24};

/// Selects one of the two alarms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm {
    /// Alarm 1, seconds resolution
    Alarm1 = 1,
    /// Alarm 2, minutes resolution
    Alarm2 = 2,
}

impl Alarm {
    /// First register of this alarm's match registers.
    #[must_use]
    pub const fn start_register(self) -> RegAddr {
        match self {
            Alarm::Alarm1 => RegAddr::Alarm1Seconds,
            Alarm::Alarm2 => RegAddr::Alarm2Minutes,
        }
    }

    pub(crate) fn set_interrupt_enable(self, control: &mut Control, enabled: bool) {
        match self {
            Alarm::Alarm1 => control.set_alarm1_interrupt_enable(enabled),
            Alarm::Alarm2 => control.set_alarm2_interrupt_enable(enabled),
        }
    }

    pub(crate) fn flag(self, status: Status) -> bool {
        match self {
            Alarm::Alarm1 => status.alarm1_flag(),
            Alarm::Alarm2 => status.alarm2_flag(),
        }
    }

    pub(crate) fn clear_flag(self, status: &mut Status) {
        match self {
            Alarm::Alarm1 => status.set_alarm1_flag(false),
            Alarm::Alarm2 => status.set_alarm2_flag(false),
        }
    }
}

/// Which fields an alarm compares.
///
/// The discriminant is the mask code: bits 0-3 mask seconds, minutes, hours
/// and day/date, bit 4 selects the day of week, bit 7 selects alarm 2.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AlarmType {
    /// Alarm 1 fires once per second
    Alarm1EverySecond = 0x0F,
    /// Alarm 1 fires when seconds match
    Alarm1MatchSeconds = 0x0E,
    /// Alarm 1 fires when minutes and seconds match
    Alarm1MatchMinutes = 0x0C,
    /// Alarm 1 fires when hours, minutes and seconds match
    Alarm1MatchHours = 0x08,
    /// Alarm 1 fires when date, hours, minutes and seconds match
    Alarm1MatchDate = 0x00,
    /// Alarm 1 fires when day of week, hours, minutes and seconds match
    Alarm1MatchDay = 0x10,
    /// Alarm 2 fires once per minute
    Alarm2EveryMinute = 0x8E,
    /// Alarm 2 fires when minutes match
    Alarm2MatchMinutes = 0x8C,
    /// Alarm 2 fires when hours and minutes match
    Alarm2MatchHours = 0x88,
    /// Alarm 2 fires when date, hours and minutes match
    Alarm2MatchDate = 0x80,
    /// Alarm 2 fires when day of week, hours and minutes match
    Alarm2MatchDay = 0x90,
}

const MASK_SECONDS: u8 = 0x01;
const MASK_MINUTES: u8 = 0x02;
const MASK_HOURS: u8 = 0x04;
const MASK_DAY_DATE: u8 = 0x08;
const SELECT_DAY: u8 = 0x10;
const SELECT_ALARM2: u8 = 0x80;

const ALL_TYPES: [AlarmType; 11] = [
    AlarmType::Alarm1EverySecond,
    AlarmType::Alarm1MatchSeconds,
    AlarmType::Alarm1MatchMinutes,
    AlarmType::Alarm1MatchHours,
    AlarmType::Alarm1MatchDate,
    AlarmType::Alarm1MatchDay,
    AlarmType::Alarm2EveryMinute,
    AlarmType::Alarm2MatchMinutes,
    AlarmType::Alarm2MatchHours,
    AlarmType::Alarm2MatchDate,
    AlarmType::Alarm2MatchDay,
];

impl AlarmType {
    /// The alarm this type configures.
    #[must_use]
    pub const fn alarm(self) -> Alarm {
        if self as u8 & SELECT_ALARM2 == 0 {
            Alarm::Alarm1
        } else {
            Alarm::Alarm2
        }
    }

    /// Raw mask code of this type.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up the type with the given mask code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        ALL_TYPES.into_iter().find(|t| t.code() == code)
    }

    const fn has(self, bit: u8) -> bool {
        self as u8 & bit != 0
    }
}

/// Encoded match registers of one alarm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmRegisters {
    alarm: Alarm,
    seconds: u8,
    minutes: u8,
    hours: u8,
    day_date: u8,
}

impl AlarmRegisters {
    /// Encodes the match registers for `alarm_type`.
    ///
    /// Values are BCD-encoded without range checks, hours in 24-hour form.
    /// `day_or_date` is a day of week (1-7) for the `MatchDay` types and a
    /// day of month (1-31) otherwise. Alarm 2 has no seconds register, so
    /// `seconds` is dropped for the alarm 2 types.
    #[must_use]
    pub fn new(alarm_type: AlarmType, seconds: u8, minutes: u8, hours: u8, day_or_date: u8) -> Self {
        let alarm = alarm_type.alarm();
        let mask = |bit: u8| if alarm_type.has(bit) { ALARM_MASK } else { 0 };

        let seconds = match alarm {
            Alarm::Alarm1 => decimal_to_bcd(seconds) | mask(MASK_SECONDS),
            Alarm::Alarm2 => 0,
        };
        let minutes = decimal_to_bcd(minutes) | mask(MASK_MINUTES);
        let hours = (decimal_to_bcd(hours) & !HOURS_12_24) | mask(MASK_HOURS);
        let mut day_date = decimal_to_bcd(day_or_date) | mask(MASK_DAY_DATE);
        if alarm_type.has(SELECT_DAY) {
            day_date |= DAY_DATE_SELECT;
        }

        AlarmRegisters {
            alarm,
            seconds,
            minutes,
            hours,
            day_date,
        }
    }

    /// Wraps match registers read back from the chip. For alarm 2 `seconds`
    /// is ignored.
    #[must_use]
    pub fn from_registers(alarm: Alarm, seconds: u8, minutes: u8, hours: u8, day_date: u8) -> Self {
        AlarmRegisters {
            alarm,
            seconds: if alarm == Alarm::Alarm1 { seconds } else { 0 },
            minutes,
            hours,
            day_date,
        }
    }

    /// Builds the write frame: start register followed by the match
    /// registers. Returns the frame and the number of bytes in use.
    pub(crate) fn frame(&self) -> ([u8; 5], usize) {
        let start = self.alarm.start_register() as u8;
        match self.alarm {
            Alarm::Alarm1 => (
                [start, self.seconds, self.minutes, self.hours, self.day_date],
                5,
            ),
            Alarm::Alarm2 => ([start, self.minutes, self.hours, self.day_date, 0], 4),
        }
    }

    /// The alarm these registers belong to.
    #[must_use]
    pub fn alarm(&self) -> Alarm {
        self.alarm
    }

    /// The type matching the mask bits, or `None` for a mask combination the
    /// chip does not document.
    #[must_use]
    pub fn alarm_type(&self) -> Option<AlarmType> {
        let bit = |reg: u8, flag: u8, out: u8| if reg & flag != 0 { out } else { 0 };
        let mut code = bit(self.minutes, ALARM_MASK, MASK_MINUTES)
            | bit(self.hours, ALARM_MASK, MASK_HOURS)
            | bit(self.day_date, ALARM_MASK, MASK_DAY_DATE)
            | bit(self.day_date, DAY_DATE_SELECT, SELECT_DAY);
        code |= match self.alarm {
            Alarm::Alarm1 => bit(self.seconds, ALARM_MASK, MASK_SECONDS),
            Alarm::Alarm2 => SELECT_ALARM2,
        };
        AlarmType::from_code(code)
    }

    /// Raw seconds register (always 0 for alarm 2)
    #[must_use]
    pub fn raw_seconds(&self) -> u8 {
        self.seconds
    }

    /// Raw minutes register
    #[must_use]
    pub fn raw_minutes(&self) -> u8 {
        self.minutes
    }

    /// Raw hours register
    #[must_use]
    pub fn raw_hours(&self) -> u8 {
        self.hours
    }

    /// Raw day/date register
    #[must_use]
    pub fn raw_day_date(&self) -> u8 {
        self.day_date
    }

    /// Decoded match seconds
    #[must_use]
    pub fn seconds(&self) -> u8 {
        bcd_to_decimal(self.seconds & !ALARM_MASK)
    }

    /// Decoded match minutes
    #[must_use]
    pub fn minutes(&self) -> u8 {
        bcd_to_decimal(self.minutes & !ALARM_MASK)
    }

    /// Decoded match hours
    #[must_use]
    pub fn hours(&self) -> u8 {
        bcd_to_decimal(self.hours & !(ALARM_MASK | HOURS_12_24))
    }

    /// Decoded day of week or day of month
    #[must_use]
    pub fn day_or_date(&self) -> u8 {
        bcd_to_decimal(self.day_date & !(ALARM_MASK | DAY_DATE_SELECT))
    }
}
