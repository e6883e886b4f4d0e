// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Register access over SCCB.
//!
//! SCCB is close enough to I²C that the `embedded-hal` I²C traits can drive it: a register write
//! is a two byte write (address, value), and a register read is a one byte write of the address
//! followed by a one byte read. The only real complication is the bank select register, so
//! [`Sccb`] tracks which bank was last selected and skips redundant bank switches.
use core::convert::TryFrom;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

use crate::error::{Error, LibraryError};
use crate::register::{Bank, BitField, BANK_SEL};

/// The default SCCB address of the OV2640.
pub const DEFAULT_ADDRESS: u8 = 0x30;

/// Time to wait between each register in a bulk register write.
pub const WRITE_LIST_DELAY_MS: u32 = 1;

/// An OV2640 on an SCCB (or I²C) bus.
#[derive(Clone, Debug)]
pub struct Sccb<I2C> {
    /// The bus the sensor is accessible on.
    bus: I2C,

    /// The address the sensor is accessible at.
    address: u8,

    /// The last bank written to the bank select register, if known.
    bank: Option<Bank>,
}

impl<I2C> Sccb<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    /// Create a new `Sccb`. Nothing is sent to the sensor until a register is accessed.
    pub fn new(bus: I2C, address: u8) -> Self {
        Self {
            bus,
            address,
            bank: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// The bank the sensor is believed to have selected, or `None` if it hasn't been set yet.
    pub fn current_bank(&self) -> Option<Bank> {
        self.bank
    }

    /// Forget the cached bank, forcing the next banked access to select it again.
    ///
    /// A soft reset of the sensor resets the bank select register, so this must be called after
    /// one.
    pub fn forget_bank(&mut self) {
        self.bank = None;
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.bus
    }

    /// Write a single register in the currently selected bank.
    ///
    /// Writes to [`BANK_SEL`] are skipped if that bank is already selected.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<I2C>> {
        let selected = if register == BANK_SEL {
            let bank = Bank::try_from(value)
                .map_err(|_| LibraryError::InvalidData("Invalid bank select value given"))?;
            if self.bank == Some(bank) {
                return Ok(());
            }
            Some(bank)
        } else {
            None
        };
        log::trace!("Writing {:#04x} to {:#04x}", value, register);
        self.bus
            .write(self.address, &[register, value])
            .map_err(Error::I2cWriteError)?;
        if selected.is_some() {
            self.bank = selected;
        }
        Ok(())
    }

    /// Read a single register from the currently selected bank.
    pub fn read_register(&mut self, register: u8) -> Result<u8, Error<I2C>> {
        let mut value = [0u8; 1];
        self.bus
            .write_read(self.address, &[register], &mut value)
            .map_err(Error::I2cWriteReadError)?;
        log::trace!("Read {:#04x} from {:#04x}", value[0], register);
        Ok(value[0])
    }

    /// Select a bank, unless it already is selected.
    pub fn select_bank(&mut self, bank: Bank) -> Result<(), Error<I2C>> {
        self.write_register(BANK_SEL, bank.into())
    }

    pub fn write_bank_register(
        &mut self,
        bank: Bank,
        register: u8,
        value: u8,
    ) -> Result<(), Error<I2C>> {
        self.select_bank(bank)?;
        self.write_register(register, value)
    }

    pub fn read_bank_register(&mut self, bank: Bank, register: u8) -> Result<u8, Error<I2C>> {
        self.select_bank(bank)?;
        self.read_register(register)
    }

    /// Write a list of `(register, value)` pairs in order, pausing briefly after each one.
    ///
    /// Bank switches are expected to be part of the list as writes to [`BANK_SEL`].
    pub fn write_list<D>(&mut self, registers: &[(u8, u8)], delay: &mut D) -> Result<(), Error<I2C>>
    where
        D: DelayMs<u32>,
    {
        for &(register, value) in registers {
            self.write_register(register, value)?;
            delay.delay_ms(WRITE_LIST_DELAY_MS);
        }
        Ok(())
    }

    /// Read the value of a field.
    pub fn read_field(&mut self, field: &BitField) -> Result<u8, Error<I2C>> {
        let raw = self.read_bank_register(field.bank, field.register)?;
        Ok(field.extract(raw))
    }

    /// Change the value of a field, without changing the other bits in the register.
    ///
    /// Values that don't fit in the field are rejected before anything is sent to the sensor.
    pub fn write_field(&mut self, field: &BitField, value: u8) -> Result<(), Error<I2C>> {
        field.check(value)?;
        let raw = self.read_bank_register(field.bank, field.register)?;
        let updated = field.insert(raw, value)?;
        self.write_bank_register(field.bank, field.register, updated)
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use super::*;
    use crate::register::{dsp, sensor, GAIN_CEILING, TEST_PATTERN};
    use crate::test::*;

    fn create_sccb() -> (Sccb<MockSensorBus>, MockSensorBus) {
        // Not the default address, to make sure the address is actually being passed through.
        let address = 0x21;
        let mock_bus = MockSensorBus::new(address);
        (Sccb::new(mock_bus.clone(), address), mock_bus)
    }

    #[test]
    fn bank_select_elided() {
        let (mut sccb, mock_bus) = create_sccb();
        sccb.write_bank_register(Bank::Sensor, sensor::AEC, 0x12)
            .unwrap();
        sccb.write_bank_register(Bank::Sensor, sensor::AEC, 0x34)
            .unwrap();
        assert_eq!(mock_bus.bank_selects(), 1);
        assert_eq!(mock_bus.operation_count(), 3);
        assert_eq!(mock_bus.register(Bank::Sensor, sensor::AEC), 0x34);
        assert_eq!(sccb.current_bank(), Some(Bank::Sensor));
    }

    #[test]
    fn bank_switching() {
        let (mut sccb, mock_bus) = create_sccb();
        sccb.write_bank_register(Bank::Sensor, sensor::AEC, 0x01)
            .unwrap();
        sccb.write_bank_register(Bank::Dsp, dsp::CTRL3, 0x02).unwrap();
        sccb.write_bank_register(Bank::Sensor, sensor::AEC, 0x03)
            .unwrap();
        assert_eq!(mock_bus.bank_selects(), 3);
        assert_eq!(mock_bus.register(Bank::Dsp, dsp::CTRL3), 0x02);
        assert_eq!(mock_bus.register(Bank::Sensor, sensor::AEC), 0x03);
    }

    #[test]
    fn raw_bank_select_elided() {
        let (mut sccb, mock_bus) = create_sccb();
        sccb.write_register(BANK_SEL, 0).unwrap();
        sccb.write_register(BANK_SEL, 0).unwrap();
        assert_eq!(mock_bus.operation_count(), 1);
        sccb.forget_bank();
        sccb.write_register(BANK_SEL, 0).unwrap();
        assert_eq!(mock_bus.operation_count(), 2);
    }

    #[test]
    fn invalid_bank_rejected() {
        let (mut sccb, mock_bus) = create_sccb();
        let res = sccb.write_register(BANK_SEL, 7);
        assert!(matches!(
            res,
            Err(Error::LibraryError(LibraryError::InvalidData(_)))
        ));
        assert_eq!(mock_bus.operation_count(), 0);
    }

    #[test]
    fn read_register_single_operation() {
        let (mut sccb, mock_bus) = create_sccb();
        mock_bus.set_register(Bank::Sensor, sensor::REG_PID, 0x26);
        sccb.select_bank(Bank::Sensor).unwrap();
        mock_bus.clear_recent_operations();
        assert_eq!(sccb.read_register(sensor::REG_PID).unwrap(), 0x26);
        assert_eq!(
            &mock_bus.recent_operations()[..],
            &[I2cOperation::Read {
                bank: Bank::Sensor,
                register: sensor::REG_PID
            }]
        );
    }

    #[test]
    fn field_round_trip() {
        let (mut sccb, mock_bus) = create_sccb();
        mock_bus.set_register(Bank::Sensor, sensor::COM9, 0x08);
        sccb.write_field(&GAIN_CEILING, 0b011).unwrap();
        assert_eq!(mock_bus.register(Bank::Sensor, sensor::COM9), 0x68);
        assert_eq!(sccb.read_field(&GAIN_CEILING).unwrap(), 0b011);
    }

    #[test]
    fn field_write_preserves_neighbours() {
        let (mut sccb, mock_bus) = create_sccb();
        mock_bus.set_register(Bank::Sensor, sensor::COM7, 0x20);
        sccb.write_field(&TEST_PATTERN, 1).unwrap();
        assert_eq!(mock_bus.register(Bank::Sensor, sensor::COM7), 0x22);
        sccb.write_field(&TEST_PATTERN, 0).unwrap();
        assert_eq!(mock_bus.register(Bank::Sensor, sensor::COM7), 0x20);
    }

    #[test]
    fn field_out_of_range_is_side_effect_free() {
        let (mut sccb, mock_bus) = create_sccb();
        let field = BitField::new(Bank::Sensor, sensor::COM9, 5, 0x07);
        let res = sccb.write_field(&field, 0x08);
        assert!(matches!(
            res,
            Err(Error::LibraryError(LibraryError::OutOfRange {
                value: 0x08,
                mask: 0x07
            }))
        ));
        assert_eq!(mock_bus.operation_count(), 0);
    }

    #[test]
    fn write_list_delays_each_write() {
        let (mut sccb, mock_bus) = create_sccb();
        let mut delay = MockDelay::new();
        let list = [
            (BANK_SEL, 1),
            (sensor::AEC, 0x10),
            (BANK_SEL, 1),
            (sensor::REG45, 0x01),
        ];
        sccb.write_list(&list, &mut delay).unwrap();
        // The duplicate bank select is skipped, but still waited on
        assert_eq!(mock_bus.operation_count(), 3);
        assert_eq!(delay.total_ms(), 4);
        assert_eq!(mock_bus.register(Bank::Sensor, sensor::REG45), 0x01);
    }

    #[test]
    fn transport_fault_propagates() {
        let (mut sccb, mock_bus) = create_sccb();
        mock_bus.fail_after(1);
        sccb.write_bank_register(Bank::Dsp, dsp::CTRL3, 0x50).unwrap_err();
        // The bank select went through, the register write did not.
        assert_eq!(sccb.current_bank(), Some(Bank::Dsp));
        assert_eq!(mock_bus.register(Bank::Dsp, dsp::CTRL3), 0x00);
        let res = sccb.read_register(dsp::CTRL3);
        assert!(matches!(res, Err(Error::I2cWriteReadError(_))));
    }

    #[test]
    fn failed_bank_select_not_cached() {
        let (mut sccb, mock_bus) = create_sccb();
        mock_bus.fail_after(0);
        let res = sccb.select_bank(Bank::Sensor);
        assert!(matches!(res, Err(Error::I2cWriteError(_))));
        assert_eq!(sccb.current_bank(), None);
        assert_eq!(mock_bus.bank(), Bank::Dsp);
    }

    #[test]
    fn wrong_address_is_an_error() {
        let mock_bus = MockSensorBus::new(0x30);
        let mut sccb = Sccb::new(mock_bus, 0x31);
        assert!(sccb.select_bank(Bank::Dsp).is_err());
    }
}
