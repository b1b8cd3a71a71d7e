//! Register map and bitfield structures for the DS3232/DS3231 RTC.
//!
//! Only the control, status and aging registers are modelled as bitfields.
//! Time and alarm registers are plain BCD bytes with a few flag bits, which
//! are described by the bit constants below.

use bitfield::bitfield;

/// Register addresses for the DS3232/DS3231 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (0-23, the driver always runs in 24-hour mode)
    Hours = 0x02,
    /// Day of week register (1-7)
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12) and century bit
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Alarm 1 seconds register
    Alarm1Seconds = 0x07,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x08,
    /// Alarm 1 hours register
    Alarm1Hours = 0x09,
    /// Alarm 1 day/date register
    Alarm1DayDate = 0x0A,
    /// Alarm 2 minutes register
    Alarm2Minutes = 0x0B,
    /// Alarm 2 hours register
    Alarm2Hours = 0x0C,
    /// Alarm 2 day/date register
    Alarm2DayDate = 0x0D,
    /// Control register
    Control = 0x0E,
    /// Status register
    Status = 0x0F,
    /// Aging offset register
    AgingOffset = 0x10,
    /// Temperature MSB register
    MSBTemp = 0x11,
    /// Temperature LSB register
    LSBTemp = 0x12,
    /// First byte of battery-backed SRAM (DS3232 only)
    Sram = 0x14,
}

impl From<RegAddr> for u8 {
    fn from(v: RegAddr) -> Self {
        v as u8
    }
}

/// Clock halt bit of the seconds register (DS1307 compatibility).
pub const CLOCK_HALT: u8 = 1 << 7;
/// 12/24 hour select bit of the hours registers (0 = 24-hour).
pub const HOURS_12_24: u8 = 1 << 6;
/// Century bit of the month register.
pub const CENTURY: u8 = 1 << 7;
/// Mask bit of every alarm register (A1Mx / A2Mx).
pub const ALARM_MASK: u8 = 1 << 7;
/// DY/DT bit of the alarm day/date registers (1 = day of week).
pub const DAY_DATE_SELECT: u8 = 1 << 6;

/// Register address of the first SRAM byte.
pub const SRAM_START: u8 = RegAddr::Sram as u8;
/// Number of bytes of battery-backed SRAM on the DS3232.
pub const SRAM_SIZE: usize = 236;

/// Oscillator control (EOSC bit, active low).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    /// Oscillator runs on battery power
    Enabled = 0,
    /// Oscillator stops when running on battery power
    Disabled = 1,
}
impl From<u8> for Oscillator {
    fn from(v: u8) -> Self {
        match v & 0b1 {
            0 => Oscillator::Enabled,
            _ => Oscillator::Disabled,
        }
    }
}
impl From<Oscillator> for u8 {
    fn from(v: Oscillator) -> Self {
        v as u8
    }
}

/// Function of the INT/SQW pin (INTCN bit).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Output square wave on INT/SQW pin
    SquareWave = 0,
    /// Output alarm interrupt signal on INT/SQW pin
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    fn from(v: u8) -> Self {
        match v & 0b1 {
            0 => InterruptControl::SquareWave,
            _ => InterruptControl::Interrupt,
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

/// Square wave frequency, the RS2:RS1 field of the control register.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    /// 1 Hz square wave output
    Hz1 = 0b00,
    /// 1.024 kHz square wave output
    Hz1024 = 0b01,
    /// 4.096 kHz square wave output
    Hz4096 = 0b10,
    /// 8.192 kHz square wave output
    Hz8192 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    fn from(v: u8) -> Self {
        match v & 0b11 {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz1024,
            0b10 => SquareWaveFrequency::Hz4096,
            _ => SquareWaveFrequency::Hz8192,
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control register (0x0E).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Oscillator enable/disable control
    pub from into Oscillator, oscillator_enable, set_oscillator_enable: 7, 7;
    /// Enable square wave output on battery power
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Force temperature conversion
    pub convert_temperature, set_convert_temperature: 5;
    /// Square wave output frequency selection
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 4, 3;
    /// INT/SQW pin function control
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    /// Enable alarm 2 interrupt
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Enable alarm 1 interrupt
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        match self.oscillator_enable() {
            Oscillator::Enabled => defmt::write!(f, "Oscillator enabled"),
            Oscillator::Disabled => defmt::write!(f, "Oscillator disabled"),
        }
        if self.battery_backed_square_wave() {
            defmt::write!(f, ", BBSQW");
        }
        if self.convert_temperature() {
            defmt::write!(f, ", CONV");
        }
        match self.interrupt_control() {
            InterruptControl::SquareWave => {
                defmt::write!(f, ", square wave {}", self.square_wave_frequency())
            }
            InterruptControl::Interrupt => defmt::write!(f, ", interrupt output"),
        }
        if self.alarm2_interrupt_enable() {
            defmt::write!(f, ", A2IE");
        }
        if self.alarm1_interrupt_enable() {
            defmt::write!(f, ", A1IE");
        }
    }
}

bitfield! {
    /// Status register (0x0F).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// Keep the 32kHz output running on battery power (DS3232)
    pub battery_backed_32khz, set_battery_backed_32khz: 6;
    /// Temperature conversion rate on battery power (DS3232)
    pub conversion_rate, set_conversion_rate: 5, 4;
    /// Enable 32kHz output
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// Device busy flag
    pub busy, set_busy: 2;
    /// Alarm 2 triggered flag
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 triggered flag
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status(");
        let mut first = true;
        for (set, name) in [
            (self.oscillator_stop_flag(), "OSF"),
            (self.battery_backed_32khz(), "BB32kHz"),
            (self.enable_32khz_output(), "EN32kHz"),
            (self.busy(), "BSY"),
            (self.alarm2_flag(), "A2F"),
            (self.alarm1_flag(), "A1F"),
        ] {
            if set {
                if !first {
                    defmt::write!(f, ", ");
                }
                defmt::write!(f, "{=str}", name);
                first = false;
            }
        }
        if first {
            defmt::write!(f, "clear");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Aging offset register for oscillator adjustment.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AgingOffset(u8);
    impl Debug;
    /// Aging offset value (-128 to +127)
    pub i8, aging_offset, set_aging_offset: 7, 0;
}
from_register_u8!(AgingOffset);

#[cfg(feature = "defmt")]
impl defmt::Format for AgingOffset {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "AgingOffset({})", self.aging_offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_conversions_use_field_bits_only() {
        assert_eq!(Oscillator::from(0), Oscillator::Enabled);
        assert_eq!(Oscillator::from(1), Oscillator::Disabled);
        assert_eq!(Oscillator::from(2), Oscillator::Enabled);
        assert_eq!(InterruptControl::from(1), InterruptControl::Interrupt);
        assert_eq!(InterruptControl::from(0xFE), InterruptControl::SquareWave);
        assert_eq!(SquareWaveFrequency::from(0b10), SquareWaveFrequency::Hz4096);
        assert_eq!(SquareWaveFrequency::from(0b111), SquareWaveFrequency::Hz8192);
        assert_eq!(u8::from(SquareWaveFrequency::Hz1024), 0b01);
        assert_eq!(u8::from(RegAddr::Sram), 0x14);
    }

    #[test]
    fn test_control_register_conversions() {
        let control = Control::from(0xFF);
        assert_eq!(control.oscillator_enable(), Oscillator::Disabled);
        assert!(control.battery_backed_square_wave());
        assert!(control.convert_temperature());
        assert_eq!(control.square_wave_frequency(), SquareWaveFrequency::Hz8192);
        assert_eq!(control.interrupt_control(), InterruptControl::Interrupt);
        assert!(control.alarm2_interrupt_enable());
        assert!(control.alarm1_interrupt_enable());
        assert_eq!(u8::from(control), 0xFF);

        // Power-on default: INTCN set, RS2:RS1 = 8.192kHz
        let control = Control::from(0x1C);
        assert_eq!(control.oscillator_enable(), Oscillator::Enabled);
        assert!(!control.battery_backed_square_wave());
        assert_eq!(control.square_wave_frequency(), SquareWaveFrequency::Hz8192);
        assert_eq!(control.interrupt_control(), InterruptControl::Interrupt);
        assert!(!control.alarm2_interrupt_enable());
        assert!(!control.alarm1_interrupt_enable());
    }

    #[test]
    fn test_status_register_conversions() {
        let status = Status::from(0xFF);
        assert!(status.oscillator_stop_flag());
        assert!(status.battery_backed_32khz());
        assert_eq!(status.conversion_rate(), 0b11);
        assert!(status.enable_32khz_output());
        assert!(status.busy());
        assert!(status.alarm2_flag());
        assert!(status.alarm1_flag());

        let status = Status::from(0x88);
        assert!(status.oscillator_stop_flag());
        assert!(!status.battery_backed_32khz());
        assert_eq!(status.conversion_rate(), 0);
        assert!(status.enable_32khz_output());
        assert!(!status.alarm2_flag());
        assert!(!status.alarm1_flag());
        assert_eq!(u8::from(status), 0x88);
    }

    #[test]
    fn test_register_bitfield_setters() {
        let mut control = Control::default();
        control.set_square_wave_frequency(SquareWaveFrequency::Hz4096);
        control.set_interrupt_control(InterruptControl::Interrupt);
        control.set_alarm2_interrupt_enable(true);
        assert_eq!(u8::from(control), 0b0001_0110);

        let mut status = Status::from(0x8B);
        status.set_oscillator_stop_flag(false);
        status.set_alarm1_flag(false);
        assert_eq!(u8::from(status), 0x0A);
    }

    #[test]
    fn test_aging_offset_register_conversions() {
        assert_eq!(AgingOffset::from(0x05).aging_offset(), 5);
        assert_eq!(AgingOffset::from(0xF6).aging_offset(), -10);
        assert_eq!(AgingOffset::from(0x80).aging_offset(), -128);

        let mut aging_offset = AgingOffset::default();
        aging_offset.set_aging_offset(-10);
        assert_eq!(u8::from(aging_offset), 0xF6);
    }
}
