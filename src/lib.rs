//! A platform-agnostic driver for the DS3232 and DS3231 real-time clocks.
//!
//! The driver is generic over an [`embedded_hal::i2c::I2c`] bus and covers:
//!
//! - reading and setting the time, as a [`CalendarTime`], a chrono
//!   `NaiveDateTime` or epoch seconds
//! - both alarms, their interrupt enables and their status flags
//! - square wave output, the oscillator stop flag, the temperature sensor,
//!   the aging offset and the DS3232's battery-backed SRAM
//! - raw register block access
//!
//! The chip is always run in 24-hour mode.
//!
//! An async driver with the same operations lives in [`asynch`] behind the
//! `async` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3232::{AlarmType, Alarm, SquareWave, DS3232, DEFAULT_ADDRESS};
//!
//! let mut rtc = DS3232::new(i2c, DEFAULT_ADDRESS);
//! if rtc.oscillator_stopped(false)? {
//!     rtc.set_epoch_seconds(1_700_000_000)?;
//! }
//! rtc.set_square_wave(SquareWave::Disabled)?;
//! rtc.set_alarm(AlarmType::Alarm1MatchHours, 0, 30, 7, 0)?;
//! rtc.enable_alarm_interrupt(Alarm::Alarm1, true)?;
//! // later
//! if rtc.consume_alarm_flag(Alarm::Alarm1)? {
//!     // wake up
//! }
//! ```
//!
//! # Concurrency
//!
//! Every operation blocks until the bus transactions finish. Flag and
//! control updates are read-modify-write sequences of two transactions; a
//! flag the chip sets between the read and the write of a status update is
//! lost until the alarm matches again. Nothing is retried.
//!
//! # Features
//!
//! - `async`: the [`asynch`] driver on `embedded-hal-async`
//! - `log` / `defmt`: debug logging through the chosen backend
//! - `temperature_f32`: `DS3232::temperature_f32`

#![no_std]

cfg_if::cfg_if! {
    if #[cfg(all(feature = "log", feature = "defmt"))] {
        compile_error!("the `log` and `defmt` features are mutually exclusive");
    }
}

#[cfg(feature = "log")]
macro_rules! debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}
#[cfg(feature = "log")]
macro_rules! warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}
#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}
#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! debug {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! warn {
    ($($arg:tt)*) => {{ let _ = core::format_args!($($arg)*); }};
}

pub mod alarm;
#[cfg(feature = "async")]
pub mod asynch;
pub mod bcd;
pub mod datetime;
pub mod registers;

use chrono::NaiveDateTime;
use embedded_hal::i2c::{ErrorKind, I2c};
use paste::paste;

pub use crate::alarm::{Alarm, AlarmRegisters, AlarmType};
pub use crate::bcd::{bcd_to_decimal, decimal_to_bcd};
pub use crate::datetime::{CalendarTime, DateTimeError};
pub use crate::registers::{
    AgingOffset, Control, InterruptControl, Oscillator, RegAddr, SquareWaveFrequency, Status,
    SRAM_SIZE, SRAM_START,
};

/// Fixed 7-bit bus address of the DS3232 and DS3231.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Largest payload of a single block write.
pub const MAX_WRITE_LEN: usize = 31;

/// Largest payload of a single block read.
pub const MAX_READ_LEN: usize = 32;

/// Control register settings applied by [`DS3232::configure`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub square_wave_frequency: SquareWaveFrequency,
    pub interrupt_control: InterruptControl,
    pub battery_backed_square_wave: bool,
    pub oscillator_enable: Oscillator,
}

impl Default for Config {
    /// The chip's power-on control register settings.
    fn default() -> Self {
        Self {
            square_wave_frequency: SquareWaveFrequency::Hz8192,
            interrupt_control: InterruptControl::Interrupt,
            battery_backed_square_wave: false,
            oscillator_enable: Oscillator::Enabled,
        }
    }
}

impl Config {
    pub(crate) fn apply(&self, control: &mut Control) {
        control.set_oscillator_enable(self.oscillator_enable);
        control.set_battery_backed_square_wave(self.battery_backed_square_wave);
        control.set_square_wave_frequency(self.square_wave_frequency);
        control.set_interrupt_control(self.interrupt_control);
    }
}

/// Square wave output setting of the INT/SQW pin.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWave {
    /// 1 Hz
    Hz1,
    /// 1.024 kHz
    Hz1024,
    /// 4.096 kHz
    Hz4096,
    /// 8.192 kHz
    Hz8192,
    /// No square wave; the pin signals alarm interrupts instead
    Disabled,
}

impl SquareWave {
    /// The RS2:RS1 frequency, `None` for [`SquareWave::Disabled`].
    #[must_use]
    pub const fn frequency(self) -> Option<SquareWaveFrequency> {
        match self {
            SquareWave::Hz1 => Some(SquareWaveFrequency::Hz1),
            SquareWave::Hz1024 => Some(SquareWaveFrequency::Hz1024),
            SquareWave::Hz4096 => Some(SquareWaveFrequency::Hz4096),
            SquareWave::Hz8192 => Some(SquareWaveFrequency::Hz8192),
            SquareWave::Disabled => None,
        }
    }

    /// Updates INTCN and RS2:RS1, leaving every other control bit alone.
    pub(crate) fn apply(self, control: &mut Control) {
        match self.frequency() {
            Some(frequency) => {
                control.set_interrupt_control(InterruptControl::SquareWave);
                control.set_square_wave_frequency(frequency);
            }
            None => control.set_interrupt_control(InterruptControl::Interrupt),
        }
    }
}

/// Errors returned by the DS3232 drivers.
#[derive(Debug)]
pub enum DS3232Error<I2CE> {
    /// The bus transaction failed
    I2c(I2CE),
    /// The time could not be converted to or from a chrono/epoch value
    DateTime(DateTimeError),
    /// A block transfer of this many bytes exceeds the transport limits
    InvalidLength(usize),
    /// The SRAM access does not fit in the 236 bytes of SRAM
    SramOutOfRange,
}

impl<I2CE> From<I2CE> for DS3232Error<I2CE> {
    fn from(e: I2CE) -> Self {
        DS3232Error::I2c(e)
    }
}

/// Converts a transport result, remembering the kind of any failure.
pub(crate) fn record<T, E: embedded_hal::i2c::Error>(
    last_error: &mut Option<ErrorKind>,
    result: Result<T, E>,
) -> Result<T, DS3232Error<E>> {
    result.map_err(|e| {
        *last_error = Some(e.kind());
        DS3232Error::I2c(e)
    })
}

pub(crate) fn check_block_len<E>(len: usize, max: usize) -> Result<(), DS3232Error<E>> {
    if (1..=max).contains(&len) {
        Ok(())
    } else {
        Err(DS3232Error::InvalidLength(len))
    }
}

/// Register address of SRAM byte `offset`, if `len` bytes fit from there.
pub(crate) fn sram_register<E>(offset: usize, len: usize) -> Result<u8, DS3232Error<E>> {
    offset
        .checked_add(len)
        .filter(|end| *end <= SRAM_SIZE)
        .and_then(|_| u8::try_from(usize::from(SRAM_START) + offset).ok())
        .ok_or(DS3232Error::SramOutOfRange)
}

/// DS3232/DS3231 real-time clock driver.
pub struct DS3232<I2C: I2c> {
    i2c: I2C,
    address: u8,
    last_error: Option<ErrorKind>,
}

impl<I2C: I2c> DS3232<I2C> {
    /// Creates a driver for the chip at `address` (normally
    /// [`DEFAULT_ADDRESS`]). No bus traffic happens until the first call.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            last_error: None,
        }
    }

    /// Releases the bus.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    /// Kind of the most recent transport failure, kept until the next
    /// failure or [`DS3232::clear_last_error`].
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    /// Writes `values` to consecutive registers starting at `register` in a
    /// single transaction.
    ///
    /// # Errors
    ///
    /// [`DS3232Error::InvalidLength`] without touching the bus if `values` is
    /// empty or longer than [`MAX_WRITE_LEN`]; otherwise any bus error.
    pub fn write_block(
        &mut self,
        register: u8,
        values: &[u8],
    ) -> Result<(), DS3232Error<I2C::Error>> {
        check_block_len::<I2C::Error>(values.len(), MAX_WRITE_LEN)?;
        let mut frame = [0u8; MAX_WRITE_LEN + 1];
        frame[0] = register;
        frame[1..=values.len()].copy_from_slice(values);
        debug!("DS3232: write {} bytes at {}", values.len(), register);
        let result = self.i2c.write(self.address, &frame[..=values.len()]);
        record(&mut self.last_error, result)
    }

    /// Fills `values` from consecutive registers starting at `register`:
    /// one transaction selecting the register, then one reading the bytes.
    /// The read is skipped if selecting the register fails.
    ///
    /// # Errors
    ///
    /// [`DS3232Error::InvalidLength`] without touching the bus if `values` is
    /// empty or longer than [`MAX_READ_LEN`]; otherwise any bus error.
    pub fn read_block(
        &mut self,
        register: u8,
        values: &mut [u8],
    ) -> Result<(), DS3232Error<I2C::Error>> {
        check_block_len::<I2C::Error>(values.len(), MAX_READ_LEN)?;
        let result = self.i2c.write(self.address, &[register]);
        record(&mut self.last_error, result)?;
        let result = self.i2c.read(self.address, values);
        record(&mut self.last_error, result)
    }

    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), DS3232Error<I2C::Error>> {
        self.write_block(register, &[value])
    }

    pub fn read_register(&mut self, register: u8) -> Result<u8, DS3232Error<I2C::Error>> {
        let mut data = [0];
        self.read_block(register, &mut data)?;
        Ok(data[0])
    }

    /// Reads the time registers.
    ///
    /// The values are returned as stored; a chip that was never set reads
    /// back as all zero fields. Check [`DS3232::oscillator_stopped`] to know
    /// whether the time can be trusted.
    pub fn read_time(&mut self) -> Result<CalendarTime, DS3232Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_block(RegAddr::Seconds as u8, &mut data)?;
        let time = CalendarTime::from(data);
        debug!("DS3232: read time {:?}", time);
        Ok(time)
    }

    /// Writes the time registers in one transaction, then clears the
    /// oscillator stop flag.
    ///
    /// The flag is cleared even if the time write failed. The result is that
    /// of the time write; a failure clearing the flag is only recorded in
    /// [`DS3232::last_error`].
    pub fn write_time(&mut self, time: &CalendarTime) -> Result<(), DS3232Error<I2C::Error>> {
        let data: [u8; 7] = time.into();
        debug!("DS3232: write time {:?}", time);
        let result = self.write_block(RegAddr::Seconds as u8, &data);
        if self.clear_oscillator_stop_flag().is_err() {
            warn!("DS3232: could not clear the oscillator stop flag");
        }
        result
    }

    fn clear_oscillator_stop_flag(&mut self) -> Result<(), DS3232Error<I2C::Error>> {
        let mut status = self.status()?;
        status.set_oscillator_stop_flag(false);
        self.set_status(status)
    }

    /// Current time as seconds since the Unix epoch, or `0` if the time
    /// could not be read or is not a valid date. Use [`DS3232::datetime`] to
    /// tell the two apart.
    pub fn epoch_seconds(&mut self) -> i64 {
        self.read_time()
            .ok()
            .and_then(|time| time.to_epoch_seconds().ok())
            .unwrap_or(0)
    }

    /// Sets the time from seconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// [`DS3232Error::DateTime`] if the instant is outside 2000-2099,
    /// otherwise as [`DS3232::write_time`].
    pub fn set_epoch_seconds(&mut self, seconds: i64) -> Result<(), DS3232Error<I2C::Error>> {
        let time = CalendarTime::from_epoch_seconds(seconds).map_err(DS3232Error::DateTime)?;
        self.write_time(&time)
    }

    /// Current time as a chrono `NaiveDateTime`.
    pub fn datetime(&mut self) -> Result<NaiveDateTime, DS3232Error<I2C::Error>> {
        self.read_time()?.to_naive().map_err(DS3232Error::DateTime)
    }

    /// Sets the time from a chrono `NaiveDateTime`.
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), DS3232Error<I2C::Error>> {
        let time = CalendarTime::from_naive(datetime).map_err(DS3232Error::DateTime)?;
        self.write_time(&time)
    }

    /// Sets the match registers of the alarm selected by `alarm_type`.
    ///
    /// Only the alarm registers are written; use
    /// [`DS3232::enable_alarm_interrupt`] to drive the INT pin on a match.
    /// For alarm 2, which has no seconds register, `seconds` is ignored.
    pub fn set_alarm(
        &mut self,
        alarm_type: AlarmType,
        seconds: u8,
        minutes: u8,
        hours: u8,
        day_or_date: u8,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let registers = AlarmRegisters::new(alarm_type, seconds, minutes, hours, day_or_date);
        debug!("DS3232: set {:?} {:?}", alarm_type, registers);
        self.write_alarm_registers(&registers)
    }

    /// [`DS3232::set_alarm`] with the seconds set to zero.
    pub fn set_alarm_hm(
        &mut self,
        alarm_type: AlarmType,
        minutes: u8,
        hours: u8,
        day_or_date: u8,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        self.set_alarm(alarm_type, 0, minutes, hours, day_or_date)
    }

    /// Writes encoded alarm registers in one transaction.
    pub fn write_alarm_registers(
        &mut self,
        registers: &AlarmRegisters,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let (frame, len) = registers.frame();
        self.write_block(frame[0], &frame[1..len])
    }

    /// Reads back the match registers of `alarm`.
    pub fn alarm_registers(&mut self, alarm: Alarm) -> Result<AlarmRegisters, DS3232Error<I2C::Error>> {
        let start = alarm.start_register() as u8;
        match alarm {
            Alarm::Alarm1 => {
                let mut data = [0; 4];
                self.read_block(start, &mut data)?;
                Ok(AlarmRegisters::from_registers(
                    alarm, data[0], data[1], data[2], data[3],
                ))
            }
            Alarm::Alarm2 => {
                let mut data = [0; 3];
                self.read_block(start, &mut data)?;
                Ok(AlarmRegisters::from_registers(
                    alarm, 0, data[0], data[1], data[2],
                ))
            }
        }
    }

    /// Enables or disables the INT pin assertion for `alarm`.
    pub fn enable_alarm_interrupt(
        &mut self,
        alarm: Alarm,
        enabled: bool,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let mut control = self.control()?;
        alarm.set_interrupt_enable(&mut control, enabled);
        self.set_control(control)
    }

    /// Returns whether `alarm` has fired since its flag was last cleared,
    /// clearing the flag if so. Returns `false` without writing otherwise.
    ///
    /// A match in between the status read and write is lost.
    pub fn consume_alarm_flag(&mut self, alarm: Alarm) -> Result<bool, DS3232Error<I2C::Error>> {
        self.take_alarm_flag(alarm)
    }

    /// Returns whether `alarm` has fired, leaving the flag untouched.
    pub fn peek_alarm_flag(&mut self, alarm: Alarm) -> Result<bool, DS3232Error<I2C::Error>> {
        Ok(alarm.flag(self.status()?))
    }

    /// Clears the flag of `alarm` if it is set, returning its prior state.
    pub fn clear_alarm_flag(&mut self, alarm: Alarm) -> Result<bool, DS3232Error<I2C::Error>> {
        self.take_alarm_flag(alarm)
    }

    fn take_alarm_flag(&mut self, alarm: Alarm) -> Result<bool, DS3232Error<I2C::Error>> {
        let mut status = self.status()?;
        if !alarm.flag(status) {
            return Ok(false);
        }
        alarm.clear_flag(&mut status);
        self.set_status(status)?;
        Ok(true)
    }

    /// Selects the square wave output. [`SquareWave::Disabled`] switches the
    /// pin to alarm interrupts.
    pub fn set_square_wave(&mut self, square_wave: SquareWave) -> Result<(), DS3232Error<I2C::Error>> {
        let mut control = self.control()?;
        square_wave.apply(&mut control);
        debug!("DS3232: control {:?}", control);
        self.set_control(control)
    }

    /// Applies `config` to the control register, keeping the alarm interrupt
    /// enables and the conversion bit.
    pub fn configure(&mut self, config: &Config) -> Result<(), DS3232Error<I2C::Error>> {
        let mut control = self.control()?;
        config.apply(&mut control);
        debug!("DS3232: control {:?}", control);
        self.set_control(control)
    }

    /// Returns the oscillator stop flag, clearing it if it is set and
    /// `clear_flag` is true.
    ///
    /// A set flag means the oscillator stopped at some point, for example on
    /// power loss without a battery, and the time registers should not be
    /// trusted until the time is set again.
    pub fn oscillator_stopped(&mut self, clear_flag: bool) -> Result<bool, DS3232Error<I2C::Error>> {
        let mut status = self.status()?;
        let stopped = status.oscillator_stop_flag();
        if stopped && clear_flag {
            status.set_oscillator_stop_flag(false);
            self.set_status(status)?;
        }
        Ok(stopped)
    }

    /// Enables or disables the 32kHz output pin.
    pub fn set_32khz_output(&mut self, enabled: bool) -> Result<(), DS3232Error<I2C::Error>> {
        let mut status = self.status()?;
        status.set_enable_32khz_output(enabled);
        self.set_status(status)
    }

    /// Die temperature in quarter degrees Celsius.
    ///
    /// The LSB register is read before the MSB register.
    pub fn temperature(&mut self) -> Result<i16, DS3232Error<I2C::Error>> {
        let lsb = self.read_register(RegAddr::LSBTemp as u8)?;
        let msb = self.read_register(RegAddr::MSBTemp as u8)?;
        Ok(i16::from_be_bytes([msb, lsb]) / 64)
    }

    /// Die temperature in degrees Celsius.
    #[cfg(feature = "temperature_f32")]
    pub fn temperature_f32(&mut self) -> Result<f32, DS3232Error<I2C::Error>> {
        Ok(f32::from(self.temperature()?) / 4.0)
    }

    /// Reads battery-backed SRAM starting `offset` bytes into it.
    ///
    /// # Errors
    ///
    /// [`DS3232Error::SramOutOfRange`] if the read runs past the end of SRAM.
    pub fn read_sram(&mut self, offset: usize, values: &mut [u8]) -> Result<(), DS3232Error<I2C::Error>> {
        let register = sram_register::<I2C::Error>(offset, values.len())?;
        self.read_block(register, values)
    }

    /// Writes battery-backed SRAM starting `offset` bytes into it.
    ///
    /// # Errors
    ///
    /// [`DS3232Error::SramOutOfRange`] if the write runs past the end of SRAM.
    pub fn write_sram(&mut self, offset: usize, values: &[u8]) -> Result<(), DS3232Error<I2C::Error>> {
        let register = sram_register::<I2C::Error>(offset, values.len())?;
        self.write_block(register, values)
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> DS3232<I2C> {
            $(
                paste! {
                    #[doc = concat!("Reads the ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, DS3232Error<I2C::Error>> {
                        Ok(<$typ>::from(self.read_register($regaddr as u8)?))
                    }

                    #[doc = concat!("Writes the ", stringify!($name), " register.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), DS3232Error<I2C::Error>> {
                        self.write_register($regaddr as u8, value.into())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (control, RegAddr::Control, Control),
    (status, RegAddr::Status, Status),
    (aging_offset, RegAddr::AgingOffset, AgingOffset)
);

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use alloc::vec;
    use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, Operation};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x68;

    fn setup_mock(expectations: &[I2cTrans]) -> I2cMock {
        I2cMock::new(expectations)
    }

    /// Register read as two legs: select, then read.
    fn read_trans(register: u8, data: &[u8]) -> [I2cTrans; 2] {
        [
            I2cTrans::write(DEVICE_ADDRESS, vec![register]),
            I2cTrans::read(DEVICE_ADDRESS, data.to_vec()),
        ]
    }

    fn expectations<const N: usize>(groups: [&[I2cTrans]; N]) -> alloc::vec::Vec<I2cTrans> {
        groups.iter().flat_map(|g| g.iter().cloned()).collect()
    }

    /// A chip stand-in: 256 registers and an auto-incrementing pointer.
    struct RegisterFile {
        regs: [u8; 256],
        pointer: u8,
    }

    impl RegisterFile {
        fn new() -> Self {
            Self {
                regs: [0; 256],
                pointer: 0,
            }
        }
    }

    impl ErrorType for RegisterFile {
        type Error = ErrorKind;
    }

    impl I2c for RegisterFile {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address != DEVICE_ADDRESS {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for operation in operations.iter_mut() {
                match operation {
                    Operation::Write(bytes) => {
                        if let Some((register, data)) = bytes.split_first() {
                            self.pointer = *register;
                            for byte in data {
                                self.regs[usize::from(self.pointer)] = *byte;
                                self.pointer = self.pointer.wrapping_add(1);
                            }
                        }
                    }
                    Operation::Read(buffer) => {
                        for byte in buffer.iter_mut() {
                            *byte = self.regs[usize::from(self.pointer)];
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn register_file_rtc() -> DS3232<RegisterFile> {
        DS3232::new(RegisterFile::new(), DEVICE_ADDRESS)
    }

    #[test]
    fn test_read_time() {
        let mock = setup_mock(&read_trans(0x00, &[0x45, 0x30, 0x15, 0x05, 0x14, 0x03, 0x24]));
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);

        let time = dev.read_time().unwrap();
        assert_eq!(
            time,
            CalendarTime {
                second: 45,
                minute: 30,
                hour: 15,
                weekday: 5,
                day: 14,
                month: 3,
                year: 2024,
            }
        );
        assert_eq!(dev.last_error(), None);
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_select_failure_skips_read() {
        let mock = setup_mock(&[
            I2cTrans::write(DEVICE_ADDRESS, vec![0x00]).with_error(ErrorKind::Other)
        ]);
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);

        let err = dev.read_time().unwrap_err();
        assert!(matches!(err, DS3232Error::I2c(ErrorKind::Other)));
        assert_eq!(dev.last_error(), Some(ErrorKind::Other));
        dev.i2c.done();
    }

    #[test]
    fn test_read_time_block_read_failure() {
        let mock = setup_mock(&[
            I2cTrans::write(DEVICE_ADDRESS, vec![0x00]),
            I2cTrans::read(DEVICE_ADDRESS, vec![0; 7]).with_error(ErrorKind::Overrun),
        ]);
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);

        assert!(dev.read_time().is_err());
        assert_eq!(dev.last_error(), Some(ErrorKind::Overrun));
        dev.clear_last_error();
        assert_eq!(dev.last_error(), None);
        dev.i2c.done();
    }

    #[test]
    fn test_write_time_clears_oscillator_stop_flag() {
        let expected = expectations([
            &[I2cTrans::write(
                DEVICE_ADDRESS,
                vec![0x00, 0x00, 0x30, 0x15, 0x05, 0x14, 0x03, 0x24],
            )],
            &read_trans(0x0F, &[0x88]),
            &[I2cTrans::write(DEVICE_ADDRESS, vec![0x0F, 0x08])],
        ]);
        let mut dev = DS3232::new(setup_mock(&expected), DEVICE_ADDRESS);

        dev.write_time(&CalendarTime {
            second: 0,
            minute: 30,
            hour: 15,
            weekday: 5,
            day: 14,
            month: 3,
            year: 2024,
        })
        .unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_write_time_failure_still_clears_flag() {
        let expected = expectations([
            &[I2cTrans::write(
                DEVICE_ADDRESS,
                vec![0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x00],
            )
            .with_error(ErrorKind::ArbitrationLoss)],
            &read_trans(0x0F, &[0x80]),
            &[I2cTrans::write(DEVICE_ADDRESS, vec![0x0F, 0x00])],
        ]);
        let mut dev = DS3232::new(setup_mock(&expected), DEVICE_ADDRESS);

        let time = CalendarTime {
            second: 0,
            minute: 0,
            hour: 0,
            weekday: 1,
            day: 1,
            month: 1,
            year: 2000,
        };
        let err = dev.write_time(&time).unwrap_err();
        assert!(matches!(err, DS3232Error::I2c(ErrorKind::ArbitrationLoss)));
        dev.i2c.done();
    }

    #[test]
    fn test_write_time_hides_flag_clear_failure() {
        let mock = setup_mock(&[
            I2cTrans::write(
                DEVICE_ADDRESS,
                vec![0x00, 0x59, 0x59, 0x23, 0x07, 0x31, 0x12, 0x99],
            ),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x0F]).with_error(ErrorKind::Other),
        ]);
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);

        let time = CalendarTime {
            second: 59,
            minute: 59,
            hour: 23,
            weekday: 7,
            day: 31,
            month: 12,
            year: 2099,
        };
        assert!(dev.write_time(&time).is_ok());
        assert_eq!(dev.last_error(), Some(ErrorKind::Other));
        dev.i2c.done();
    }

    #[test]
    fn test_time_roundtrip_on_register_file() {
        let mut dev = register_file_rtc();
        for time in [
            CalendarTime {
                second: 0,
                minute: 0,
                hour: 0,
                weekday: 1,
                day: 1,
                month: 1,
                year: 2000,
            },
            CalendarTime {
                second: 59,
                minute: 59,
                hour: 23,
                weekday: 7,
                day: 31,
                month: 12,
                year: 2099,
            },
            CalendarTime {
                second: 7,
                minute: 48,
                hour: 19,
                weekday: 4,
                day: 29,
                month: 2,
                year: 2024,
            },
        ] {
            dev.i2c.regs[0x0F] = 0x80;
            dev.write_time(&time).unwrap();
            assert_eq!(dev.read_time().unwrap(), time);
            assert_eq!(dev.i2c.regs[0x0F], 0x00);
            assert_eq!(dev.i2c.regs[0x02] & 0x40, 0);
        }
    }

    #[test]
    fn test_zeroed_chip_reads_epoch_2000_fields() {
        let mut dev = register_file_rtc();
        let time = dev.read_time().unwrap();
        assert_eq!(
            time,
            CalendarTime {
                second: 0,
                minute: 0,
                hour: 0,
                weekday: 0,
                day: 0,
                month: 0,
                year: 2000,
            }
        );
        // not a valid date, so the epoch sentinel comes back
        assert_eq!(dev.epoch_seconds(), 0);
        assert!(matches!(
            dev.datetime(),
            Err(DS3232Error::DateTime(DateTimeError::InvalidDateTime))
        ));
    }

    #[test]
    fn test_epoch_seconds_roundtrip() {
        let mut dev = register_file_rtc();
        dev.set_epoch_seconds(1_700_000_000).unwrap();
        assert_eq!(dev.epoch_seconds(), 1_700_000_000);
        // 2023-11-14T22:13:20Z, a Tuesday
        assert_eq!(
            &dev.i2c.regs[..7],
            &[0x20, 0x13, 0x22, 0x03, 0x14, 0x11, 0x23]
        );
    }

    #[test]
    fn test_epoch_seconds_sentinel_on_bus_error() {
        let mock = setup_mock(&[
            I2cTrans::write(DEVICE_ADDRESS, vec![0x00]).with_error(ErrorKind::Other)
        ]);
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);
        assert_eq!(dev.epoch_seconds(), 0);
        dev.i2c.done();
    }

    #[test]
    fn test_set_epoch_seconds_out_of_range() {
        let mut dev = register_file_rtc();
        assert!(matches!(
            dev.set_epoch_seconds(0),
            Err(DS3232Error::DateTime(DateTimeError::YearOutOfRange))
        ));
    }

    #[test]
    fn test_set_datetime() {
        let mut dev = register_file_rtc();
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 12, 20)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        dev.set_datetime(&dt).unwrap();
        assert_eq!(dev.datetime().unwrap(), dt);
        // 2024-12-20 is a Friday
        assert_eq!(dev.i2c.regs[0x03], 6);
    }

    #[test]
    fn test_block_length_limits() {
        let mut dev = DS3232::new(setup_mock(&[]), DEVICE_ADDRESS);
        assert!(matches!(
            dev.write_block(0x14, &[0; 32]),
            Err(DS3232Error::InvalidLength(32))
        ));
        assert!(matches!(
            dev.write_block(0x14, &[]),
            Err(DS3232Error::InvalidLength(0))
        ));
        assert!(matches!(
            dev.read_block(0x14, &mut [0; 33]),
            Err(DS3232Error::InvalidLength(33))
        ));
        dev.i2c.done();
    }

    #[test]
    fn test_block_access() {
        let mut data = vec![0x14];
        data.extend(0..31u8);
        let mock = setup_mock(&[
            I2cTrans::write(DEVICE_ADDRESS, data),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x20]),
            I2cTrans::read(DEVICE_ADDRESS, (0..32u8).collect()),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x10, 0xF6]),
            I2cTrans::write(DEVICE_ADDRESS, vec![0x10]),
            I2cTrans::read(DEVICE_ADDRESS, vec![0xF6]),
        ]);
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);

        let values: [u8; 31] = core::array::from_fn(|i| i as u8);
        dev.write_block(0x14, &values).unwrap();
        let mut read = [0u8; 32];
        dev.read_block(0x20, &mut read).unwrap();
        assert_eq!(read[31], 31);
        dev.write_register(0x10, 0xF6).unwrap();
        assert_eq!(dev.aging_offset().unwrap().aging_offset(), -10);
        dev.i2c.done();
    }

    #[test]
    fn test_set_alarm1_match_seconds() {
        let mock = setup_mock(&[I2cTrans::write(
            DEVICE_ADDRESS,
            vec![0x07, 0x30, 0x95, 0x88, 0x83],
        )]);
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);
        dev.set_alarm(AlarmType::Alarm1MatchSeconds, 30, 15, 8, 3)
            .unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_alarm2_single_transaction() {
        let mock = setup_mock(&[I2cTrans::write(
            DEVICE_ADDRESS,
            vec![0x0B, 0x45, 0x06, 0x42],
        )]);
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);
        // seconds ignored for alarm 2
        dev.set_alarm(AlarmType::Alarm2MatchDay, 12, 45, 6, 2).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_set_alarm_hm_zeroes_seconds() {
        let mut dev = register_file_rtc();
        dev.i2c.regs[0x07] = 0x59;
        dev.set_alarm_hm(AlarmType::Alarm1MatchHours, 30, 7, 0).unwrap();
        assert_eq!(&dev.i2c.regs[0x07..0x0B], &[0x00, 0x30, 0x07, 0x80]);

        let alarm = dev.alarm_registers(Alarm::Alarm1).unwrap();
        assert_eq!(alarm.alarm_type(), Some(AlarmType::Alarm1MatchHours));
        assert_eq!((alarm.hours(), alarm.minutes(), alarm.seconds()), (7, 30, 0));
    }

    #[test]
    fn test_alarm2_registers_readback() {
        let mut dev = register_file_rtc();
        dev.set_alarm_hm(AlarmType::Alarm2MatchDate, 5, 22, 15).unwrap();
        // alarm 1 untouched
        assert_eq!(&dev.i2c.regs[0x07..0x0B], &[0; 4]);
        let alarm = dev.alarm_registers(Alarm::Alarm2).unwrap();
        assert_eq!(alarm.alarm_type(), Some(AlarmType::Alarm2MatchDate));
        assert_eq!(alarm.day_or_date(), 15);
    }

    #[test]
    fn test_enable_alarm_interrupt() {
        let expected = expectations([
            &read_trans(0x0E, &[0x1C]),
            &[I2cTrans::write(DEVICE_ADDRESS, vec![0x0E, 0x1E])],
            &read_trans(0x0E, &[0x1F]),
            &[I2cTrans::write(DEVICE_ADDRESS, vec![0x0E, 0x1E])],
        ]);
        let mut dev = DS3232::new(setup_mock(&expected), DEVICE_ADDRESS);
        dev.enable_alarm_interrupt(Alarm::Alarm2, true).unwrap();
        dev.enable_alarm_interrupt(Alarm::Alarm1, false).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_consume_alarm_flag_writes_only_when_set() {
        let expected = expectations([
            &read_trans(0x0F, &[0x83]),
            &[I2cTrans::write(DEVICE_ADDRESS, vec![0x0F, 0x82])],
            &read_trans(0x0F, &[0x82]),
        ]);
        let mut dev = DS3232::new(setup_mock(&expected), DEVICE_ADDRESS);
        assert!(dev.consume_alarm_flag(Alarm::Alarm1).unwrap());
        assert!(!dev.consume_alarm_flag(Alarm::Alarm1).unwrap());
        dev.i2c.done();
    }

    #[test]
    fn test_alarm_flag_once_per_match() {
        let mut dev = register_file_rtc();
        assert!(!dev.consume_alarm_flag(Alarm::Alarm2).unwrap());

        // chip-side match
        dev.i2c.regs[0x0F] |= 0x02;
        assert!(dev.peek_alarm_flag(Alarm::Alarm2).unwrap());
        assert!(dev.peek_alarm_flag(Alarm::Alarm2).unwrap());
        assert_eq!(dev.i2c.regs[0x0F], 0x02);
        assert!(!dev.peek_alarm_flag(Alarm::Alarm1).unwrap());

        assert!(dev.consume_alarm_flag(Alarm::Alarm2).unwrap());
        assert!(!dev.consume_alarm_flag(Alarm::Alarm2).unwrap());
        assert_eq!(dev.i2c.regs[0x0F], 0x00);

        dev.i2c.regs[0x0F] |= 0x01;
        assert!(dev.clear_alarm_flag(Alarm::Alarm1).unwrap());
        assert!(!dev.clear_alarm_flag(Alarm::Alarm1).unwrap());
    }

    #[test]
    fn test_peek_alarm_flag_never_writes() {
        let expected = expectations([&read_trans(0x0F, &[0x01]), &read_trans(0x0F, &[0x01])]);
        let mut dev = DS3232::new(setup_mock(&expected), DEVICE_ADDRESS);
        assert!(dev.peek_alarm_flag(Alarm::Alarm1).unwrap());
        assert!(dev.peek_alarm_flag(Alarm::Alarm1).unwrap());
        dev.i2c.done();
    }

    #[test]
    fn test_square_wave_disabled_sets_intcn_only() {
        let expected = expectations([
            &read_trans(0x0E, &[0x03]),
            &[I2cTrans::write(DEVICE_ADDRESS, vec![0x0E, 0x07])],
        ]);
        let mut dev = DS3232::new(setup_mock(&expected), DEVICE_ADDRESS);
        dev.set_square_wave(SquareWave::Disabled).unwrap();
        dev.i2c.done();
    }

    #[test]
    fn test_square_wave_frequencies() {
        let mut dev = register_file_rtc();
        for (square_wave, index) in [
            (SquareWave::Hz1, 0u8),
            (SquareWave::Hz1024, 1),
            (SquareWave::Hz4096, 2),
            (SquareWave::Hz8192, 3),
        ] {
            dev.i2c.regs[0x0E] = 0xFF;
            dev.set_square_wave(square_wave).unwrap();
            assert_eq!(dev.i2c.regs[0x0E], 0xE3 | (index << 3));
        }
    }

    #[test]
    fn test_configure() {
        let mut dev = register_file_rtc();
        dev.i2c.regs[0x0E] = 0x03;
        dev.configure(&Config {
            square_wave_frequency: SquareWaveFrequency::Hz1024,
            interrupt_control: InterruptControl::SquareWave,
            battery_backed_square_wave: true,
            oscillator_enable: Oscillator::Enabled,
        })
        .unwrap();
        assert_eq!(dev.i2c.regs[0x0E], 0x4B);

        dev.configure(&Config::default()).unwrap();
        assert_eq!(dev.i2c.regs[0x0E], 0x1F);
    }

    #[test]
    fn test_oscillator_stopped() {
        let mut dev = register_file_rtc();
        dev.i2c.regs[0x0F] = 0x80;
        assert!(dev.oscillator_stopped(false).unwrap());
        assert_eq!(dev.i2c.regs[0x0F], 0x80);
        assert!(dev.oscillator_stopped(true).unwrap());
        assert_eq!(dev.i2c.regs[0x0F], 0x00);
        assert!(!dev.oscillator_stopped(true).unwrap());
    }

    #[test]
    fn test_oscillator_running_is_not_written() {
        let mock = setup_mock(&read_trans(0x0F, &[0x08]));
        let mut dev = DS3232::new(mock, DEVICE_ADDRESS);
        assert!(!dev.oscillator_stopped(true).unwrap());
        dev.i2c.done();
    }

    #[test]
    fn test_32khz_output() {
        let mut dev = register_file_rtc();
        dev.i2c.regs[0x0F] = 0x80;
        dev.set_32khz_output(true).unwrap();
        assert_eq!(dev.i2c.regs[0x0F], 0x88);
        dev.set_32khz_output(false).unwrap();
        assert_eq!(dev.i2c.regs[0x0F], 0x80);
    }

    #[test]
    fn test_temperature_reads_lsb_then_msb() {
        let expected = expectations([&read_trans(0x12, &[0x40]), &read_trans(0x11, &[0x19])]);
        let mut dev = DS3232::new(setup_mock(&expected), DEVICE_ADDRESS);
        // 0x1940 / 64 = 101 quarter degrees = 25.25°C
        assert_eq!(dev.temperature().unwrap(), 101);
        dev.i2c.done();
    }

    #[test]
    fn test_negative_temperature() {
        let mut dev = register_file_rtc();
        // -10.25°C: MSB 0xF5, LSB 0xC0
        dev.i2c.regs[0x11] = 0xF5;
        dev.i2c.regs[0x12] = 0xC0;
        assert_eq!(dev.temperature().unwrap(), -41);
    }

    #[cfg(feature = "temperature_f32")]
    #[test]
    fn test_temperature_f32() {
        let mut dev = register_file_rtc();
        dev.i2c.regs[0x11] = 0x19;
        dev.i2c.regs[0x12] = 0x40;
        assert_eq!(dev.temperature_f32().unwrap(), 25.25);
    }

    #[test]
    fn test_sram() {
        let mut dev = register_file_rtc();
        dev.write_sram(0, &[0xDE, 0xAD]).unwrap();
        dev.write_sram(SRAM_SIZE - 1, &[0x42]).unwrap();
        assert_eq!(&dev.i2c.regs[0x14..0x16], &[0xDE, 0xAD]);
        assert_eq!(dev.i2c.regs[0xFF], 0x42);

        let mut data = [0; 2];
        dev.read_sram(0, &mut data).unwrap();
        assert_eq!(data, [0xDE, 0xAD]);

        assert!(matches!(
            dev.write_sram(SRAM_SIZE - 1, &[0, 0]),
            Err(DS3232Error::SramOutOfRange)
        ));
        assert!(matches!(
            dev.read_sram(usize::MAX, &mut data),
            Err(DS3232Error::SramOutOfRange)
        ));
    }

    #[test]
    fn test_wrong_address_records_error() {
        let mut dev = DS3232::new(RegisterFile::new(), 0x57);
        assert!(dev.read_register(0x0F).is_err());
        assert_eq!(
            dev.last_error(),
            Some(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
        let _bus = dev.destroy();
    }
}
