//! Async implementation of the DS3232 driver.
//!
//! This module mirrors [`crate::DS3232`] on top of the `embedded-hal-async`
//! traits. It is only available when the `async` feature is enabled. The
//! wire format, flag handling and error reporting are the same as for the
//! blocking driver.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3232::asynch::DS3232;
//! use ds3232::{Alarm, DEFAULT_ADDRESS};
//!
//! let mut rtc = DS3232::new(i2c, DEFAULT_ADDRESS);
//! let now = rtc.datetime().await?;
//! if rtc.consume_alarm_flag(Alarm::Alarm2).await? {
//!     // handle the alarm
//! }
//! ```

use chrono::NaiveDateTime;
use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{
    check_block_len, record, sram_register, AgingOffset, Alarm, AlarmRegisters, AlarmType,
    CalendarTime, Config, Control, DS3232Error, RegAddr, SquareWave, Status, MAX_READ_LEN,
    MAX_WRITE_LEN,
};

/// DS3232/DS3231 real-time clock async driver.
pub struct DS3232<I2C: I2c> {
    i2c: I2C,
    address: u8,
    last_error: Option<ErrorKind>,
}

impl<I2C: I2c> DS3232<I2C> {
    /// Creates a driver for the chip at `address`.
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

    /// See [`crate::DS3232::last_error`].
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    /// Writes `values` to consecutive registers starting at `register` in a
    /// single transaction.
    pub async fn write_block(
        &mut self,
        register: u8,
        values: &[u8],
    ) -> Result<(), DS3232Error<I2C::Error>> {
        check_block_len::<I2C::Error>(values.len(), MAX_WRITE_LEN)?;
        let mut frame = [0u8; MAX_WRITE_LEN + 1];
        frame[0] = register;
        frame[1..=values.len()].copy_from_slice(values);
        debug!("DS3232: write {} bytes at {}", values.len(), register);
        let result = self.i2c.write(self.address, &frame[..=values.len()]).await;
        record(&mut self.last_error, result)
    }

    /// Selects `register`, then reads `values.len()` bytes from it.
    pub async fn read_block(
        &mut self,
        register: u8,
        values: &mut [u8],
    ) -> Result<(), DS3232Error<I2C::Error>> {
        check_block_len::<I2C::Error>(values.len(), MAX_READ_LEN)?;
        let result = self.i2c.write(self.address, &[register]).await;
        record(&mut self.last_error, result)?;
        let result = self.i2c.read(self.address, values).await;
        record(&mut self.last_error, result)
    }

    pub async fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        self.write_block(register, &[value]).await
    }

    pub async fn read_register(&mut self, register: u8) -> Result<u8, DS3232Error<I2C::Error>> {
        let mut data = [0];
        self.read_block(register, &mut data).await?;
        Ok(data[0])
    }

    pub async fn read_time(&mut self) -> Result<CalendarTime, DS3232Error<I2C::Error>> {
        let mut data = [0; 7];
        self.read_block(RegAddr::Seconds as u8, &mut data).await?;
        let time = CalendarTime::from(data);
        debug!("DS3232: read time {:?}", time);
        Ok(time)
    }

    /// Writes the time registers, then clears the oscillator stop flag
    /// whatever the outcome of the time write.
    pub async fn write_time(&mut self, time: &CalendarTime) -> Result<(), DS3232Error<I2C::Error>> {
        let data: [u8; 7] = time.into();
        debug!("DS3232: write time {:?}", time);
        let result = self.write_block(RegAddr::Seconds as u8, &data).await;
        if self.clear_oscillator_stop_flag().await.is_err() {
            warn!("DS3232: could not clear the oscillator stop flag");
        }
        result
    }

    async fn clear_oscillator_stop_flag(&mut self) -> Result<(), DS3232Error<I2C::Error>> {
        let mut status = self.status().await?;
        status.set_oscillator_stop_flag(false);
        self.set_status(status).await
    }

    /// Seconds since the Unix epoch, `0` on any failure.
    pub async fn epoch_seconds(&mut self) -> i64 {
        match self.read_time().await {
            Ok(time) => time.to_epoch_seconds().unwrap_or(0),
            Err(_) => 0,
        }
    }

    pub async fn set_epoch_seconds(&mut self, seconds: i64) -> Result<(), DS3232Error<I2C::Error>> {
        let time = CalendarTime::from_epoch_seconds(seconds).map_err(DS3232Error::DateTime)?;
        self.write_time(&time).await
    }

    pub async fn datetime(&mut self) -> Result<NaiveDateTime, DS3232Error<I2C::Error>> {
        self.read_time()
            .await?
            .to_naive()
            .map_err(DS3232Error::DateTime)
    }

    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let time = CalendarTime::from_naive(datetime).map_err(DS3232Error::DateTime)?;
        self.write_time(&time).await
    }

    /// Sets the match registers of the alarm selected by `alarm_type`.
    pub async fn set_alarm(
        &mut self,
        alarm_type: AlarmType,
        seconds: u8,
        minutes: u8,
        hours: u8,
        day_or_date: u8,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let registers = AlarmRegisters::new(alarm_type, seconds, minutes, hours, day_or_date);
        debug!("DS3232: set {:?} {:?}", alarm_type, registers);
        self.write_alarm_registers(&registers).await
    }

    pub async fn set_alarm_hm(
        &mut self,
        alarm_type: AlarmType,
        minutes: u8,
        hours: u8,
        day_or_date: u8,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        self.set_alarm(alarm_type, 0, minutes, hours, day_or_date)
            .await
    }

    pub async fn write_alarm_registers(
        &mut self,
        registers: &AlarmRegisters,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let (frame, len) = registers.frame();
        self.write_block(frame[0], &frame[1..len]).await
    }

    pub async fn alarm_registers(
        &mut self,
        alarm: Alarm,
    ) -> Result<AlarmRegisters, DS3232Error<I2C::Error>> {
        let start = alarm.start_register() as u8;
        let mut data = [0; 4];
        let registers = match alarm {
            Alarm::Alarm1 => {
                self.read_block(start, &mut data).await?;
                AlarmRegisters::from_registers(alarm, data[0], data[1], data[2], data[3])
            }
            Alarm::Alarm2 => {
                self.read_block(start, &mut data[1..]).await?;
                AlarmRegisters::from_registers(alarm, 0, data[1], data[2], data[3])
            }
        };
        Ok(registers)
    }

    pub async fn enable_alarm_interrupt(
        &mut self,
        alarm: Alarm,
        enabled: bool,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let mut control = self.control().await?;
        alarm.set_interrupt_enable(&mut control, enabled);
        self.set_control(control).await
    }

    /// Returns whether `alarm` fired, clearing its flag if so.
    pub async fn consume_alarm_flag(
        &mut self,
        alarm: Alarm,
    ) -> Result<bool, DS3232Error<I2C::Error>> {
        self.take_alarm_flag(alarm).await
    }

    pub async fn peek_alarm_flag(&mut self, alarm: Alarm) -> Result<bool, DS3232Error<I2C::Error>> {
        Ok(alarm.flag(self.status().await?))
    }

    pub async fn clear_alarm_flag(
        &mut self,
        alarm: Alarm,
    ) -> Result<bool, DS3232Error<I2C::Error>> {
        self.take_alarm_flag(alarm).await
    }

    async fn take_alarm_flag(&mut self, alarm: Alarm) -> Result<bool, DS3232Error<I2C::Error>> {
        let mut status = self.status().await?;
        if !alarm.flag(status) {
            return Ok(false);
        }
        alarm.clear_flag(&mut status);
        self.set_status(status).await?;
        Ok(true)
    }

    pub async fn set_square_wave(
        &mut self,
        square_wave: SquareWave,
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let mut control = self.control().await?;
        square_wave.apply(&mut control);
        debug!("DS3232: control {:?}", control);
        self.set_control(control).await
    }

    /// Configures the device according to the provided configuration.
    pub async fn configure(&mut self, config: &Config) -> Result<(), DS3232Error<I2C::Error>> {
        let mut control = self.control().await?;
        config.apply(&mut control);
        debug!("DS3232: control {:?}", control);
        self.set_control(control).await
    }

    pub async fn oscillator_stopped(
        &mut self,
        clear_flag: bool,
    ) -> Result<bool, DS3232Error<I2C::Error>> {
        let mut status = self.status().await?;
        let stopped = status.oscillator_stop_flag();
        if stopped && clear_flag {
            status.set_oscillator_stop_flag(false);
            self.set_status(status).await?;
        }
        Ok(stopped)
    }

    pub async fn set_32khz_output(&mut self, enabled: bool) -> Result<(), DS3232Error<I2C::Error>> {
        let mut status = self.status().await?;
        status.set_enable_32khz_output(enabled);
        self.set_status(status).await
    }

    /// Die temperature in quarter degrees Celsius, LSB read first.
    pub async fn temperature(&mut self) -> Result<i16, DS3232Error<I2C::Error>> {
        let lsb = self.read_register(RegAddr::LSBTemp as u8).await?;
        let msb = self.read_register(RegAddr::MSBTemp as u8).await?;
        Ok(i16::from_be_bytes([msb, lsb]) / 64)
    }

    #[cfg(feature = "temperature_f32")]
    pub async fn temperature_f32(&mut self) -> Result<f32, DS3232Error<I2C::Error>> {
        Ok(f32::from(self.temperature().await?) / 4.0)
    }

    pub async fn read_sram(
        &mut self,
        offset: usize,
        values: &mut [u8],
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let register = sram_register::<I2C::Error>(offset, values.len())?;
        self.read_block(register, values).await
    }

    pub async fn write_sram(
        &mut self,
        offset: usize,
        values: &[u8],
    ) -> Result<(), DS3232Error<I2C::Error>> {
        let register = sram_register::<I2C::Error>(offset, values.len())?;
        self.write_block(register, values).await
    }
}

macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> DS3232<I2C> {
            $(
                paste! {
                    #[doc = concat!("Reads the ", stringify!($name), " register.")]
                    pub async fn $name(&mut self) -> Result<$typ, DS3232Error<I2C::Error>> {
                        Ok(<$typ>::from(self.read_register($regaddr as u8).await?))
                    }

                    #[doc = concat!("Writes the ", stringify!($name), " register.")]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), DS3232Error<I2C::Error>> {
                        self.write_register($regaddr as u8, value.into()).await
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
