// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Register map for the OV2640.
//!
//! The sensor exposes two banks of 256 byte-wide registers. Which bank an address refers to is
//! chosen by writing to the bank select register ([`BANK_SEL`]), which is present at the same
//! address in both banks. The [`dsp`] bank holds the image processing and output formatting
//! registers, while the [`sensor`] bank holds the pixel array timing, exposure and gain registers.
use core::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::LibraryError;

/// The bank select register. Bank independent.
pub const BANK_SEL: u8 = 0xFF;

/// The two register banks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Bank {
    /// Image processing (DSP) registers.
    Dsp = 0,

    /// Raw sensor registers.
    Sensor = 1,
}

/// Registers in the DSP bank (`BANK_SEL` = 0).
pub mod dsp {
    pub const R_BYPASS: u8 = 0x05;
    pub const QS: u8 = 0x44;
    pub const CTRLI: u8 = 0x50;
    pub const HSIZE: u8 = 0x51;
    pub const VSIZE: u8 = 0x52;
    pub const XOFFL: u8 = 0x53;
    pub const YOFFL: u8 = 0x54;
    pub const VHYX: u8 = 0x55;
    pub const DPRP: u8 = 0x56;
    pub const TEST: u8 = 0x57;
    pub const ZMOW: u8 = 0x5A;
    pub const ZMOH: u8 = 0x5B;
    pub const ZMHH: u8 = 0x5C;
    pub const BPADDR: u8 = 0x7C;
    pub const BPDATA: u8 = 0x7D;
    pub const CTRL2: u8 = 0x86;
    pub const CTRL3: u8 = 0x87;
    pub const SIZEL: u8 = 0x8C;
    pub const HSIZE8: u8 = 0xC0;
    pub const VSIZE8: u8 = 0xC1;
    pub const CTRL0: u8 = 0xC2;
    pub const CTRL1: u8 = 0xC3;
    pub const R_DVP_SP: u8 = 0xD3;
    pub const IMAGE_MODE: u8 = 0xDA;
    pub const RESET: u8 = 0xE0;
    pub const MS_SP: u8 = 0xF0;
    pub const SS_ID: u8 = 0xF7;
    pub const MC_BIST: u8 = 0xF9;
    pub const MC_AL: u8 = 0xFA;
    pub const MC_AH: u8 = 0xFB;
    pub const MC_D: u8 = 0xFC;
    pub const P_CMD: u8 = 0xFD;
    pub const P_STATUS: u8 = 0xFE;

    pub const CTRLI_LP_DP: u8 = 0x80;
    pub const CTRLI_ROUND: u8 = 0x40;

    pub const CTRL0_AEC_EN: u8 = 0x80;
    pub const CTRL0_AEC_SEL: u8 = 0x40;
    pub const CTRL0_STAT_SEL: u8 = 0x20;
    pub const CTRL0_VFIRST: u8 = 0x10;
    pub const CTRL0_YUV422: u8 = 0x08;
    pub const CTRL0_YUV_EN: u8 = 0x04;
    pub const CTRL0_RGB_EN: u8 = 0x02;
    pub const CTRL0_RAW_EN: u8 = 0x01;

    pub const CTRL2_DCW_EN: u8 = 0x20;
    pub const CTRL2_SDE_EN: u8 = 0x10;
    pub const CTRL2_UV_ADJ_EN: u8 = 0x08;
    pub const CTRL2_UV_AVG_EN: u8 = 0x04;
    pub const CTRL2_CMX_EN: u8 = 0x01;

    pub const CTRL3_BPC_EN: u8 = 0x80;
    pub const CTRL3_WPC_EN: u8 = 0x40;

    pub const R_DVP_SP_AUTO_MODE: u8 = 0x80;

    pub const R_BYPASS_DSP_EN: u8 = 0x00;
    pub const R_BYPASS_DSP_BYPASS: u8 = 0x01;

    pub const IMAGE_MODE_Y8_DVP_EN: u8 = 0x40;
    pub const IMAGE_MODE_JPEG_EN: u8 = 0x10;
    pub const IMAGE_MODE_YUV422: u8 = 0x00;
    pub const IMAGE_MODE_RAW10: u8 = 0x04;
    pub const IMAGE_MODE_RGB565: u8 = 0x08;
    pub const IMAGE_MODE_HREF_VSYNC: u8 = 0x02;
    pub const IMAGE_MODE_LBYTE_FIRST: u8 = 0x01;

    pub const RESET_MICROC: u8 = 0x40;
    pub const RESET_SCCB: u8 = 0x20;
    pub const RESET_JPEG: u8 = 0x10;
    pub const RESET_DVP: u8 = 0x04;
    pub const RESET_IPU: u8 = 0x02;
    pub const RESET_CIF: u8 = 0x01;

    pub const MC_BIST_RESET: u8 = 0x80;
    pub const MC_BIST_BOOT_ROM_SEL: u8 = 0x40;
}

/// Registers in the sensor bank (`BANK_SEL` = 1).
pub mod sensor {
    pub const GAIN: u8 = 0x00;
    pub const COM1: u8 = 0x03;
    pub const REG04: u8 = 0x04;
    pub const REG08: u8 = 0x08;
    pub const COM2: u8 = 0x09;
    pub const REG_PID: u8 = 0x0A;
    pub const REG_VER: u8 = 0x0B;
    pub const COM3: u8 = 0x0C;
    pub const COM4: u8 = 0x0D;
    pub const AEC: u8 = 0x10;
    pub const CLKRC: u8 = 0x11;
    pub const COM7: u8 = 0x12;
    pub const COM8: u8 = 0x13;
    /// AGC gain ceiling.
    pub const COM9: u8 = 0x14;
    pub const COM10: u8 = 0x15;
    pub const HSTART: u8 = 0x17;
    pub const HSTOP: u8 = 0x18;
    pub const VSTART: u8 = 0x19;
    pub const VSTOP: u8 = 0x1A;
    pub const MIDH: u8 = 0x1C;
    pub const MIDL: u8 = 0x1D;
    pub const AEW: u8 = 0x24;
    pub const AEB: u8 = 0x25;
    pub const VV: u8 = 0x26;
    pub const REG2A: u8 = 0x2A;
    pub const FRARL: u8 = 0x2B;
    pub const ADDVSL: u8 = 0x2D;
    pub const ADDVSH: u8 = 0x2E;
    pub const YAVG: u8 = 0x2F;
    pub const HSDY: u8 = 0x30;
    pub const HEDY: u8 = 0x31;
    pub const REG32: u8 = 0x32;
    pub const ARCOM2: u8 = 0x34;
    pub const REG45: u8 = 0x45;
    pub const FLL: u8 = 0x46;
    pub const FLH: u8 = 0x47;
    pub const COM19: u8 = 0x48;
    pub const ZOOMS: u8 = 0x49;
    pub const COM22: u8 = 0x4B;
    pub const COM25: u8 = 0x4E;
    pub const BD50: u8 = 0x4F;
    pub const BD60: u8 = 0x50;
    pub const REG5D: u8 = 0x5D;
    pub const REG5E: u8 = 0x5E;
    pub const REG5F: u8 = 0x5F;
    pub const REG60: u8 = 0x60;
    pub const HISTO_LOW: u8 = 0x61;
    pub const HISTO_HIGH: u8 = 0x62;

    pub const REG04_DEFAULT: u8 = 0x28;
    pub const REG04_HFLIP_IMG: u8 = 0x80;
    pub const REG04_VFLIP_IMG: u8 = 0x40;
    pub const REG04_VREF_EN: u8 = 0x10;
    pub const REG04_HREF_EN: u8 = 0x08;
    /// The low two bits of REG04 hold AEC[1:0].
    pub const REG04_AEC_MASK: u8 = 0x03;

    pub const COM2_STDBY: u8 = 0x10;
    pub const COM2_OUT_DRIVE_1X: u8 = 0x00;
    pub const COM2_OUT_DRIVE_2X: u8 = 0x01;
    pub const COM2_OUT_DRIVE_3X: u8 = 0x02;
    pub const COM2_OUT_DRIVE_4X: u8 = 0x03;

    pub const COM3_DEFAULT: u8 = 0x38;
    pub const COM3_BAND_50HZ: u8 = 0x04;
    pub const COM3_BAND_60HZ: u8 = 0x00;
    pub const COM3_BAND_AUTO: u8 = 0x02;

    pub const COM7_SRST: u8 = 0x80;
    pub const COM7_RES_UXGA: u8 = 0x00;
    pub const COM7_RES_SVGA: u8 = 0x40;
    pub const COM7_RES_CIF: u8 = 0x20;
    pub const COM7_ZOOM_EN: u8 = 0x04;
    pub const COM7_COLOR_BAR: u8 = 0x02;

    pub const COM8_DEFAULT: u8 = 0xC0;
    pub const COM8_BNDF_EN: u8 = 0x20;
    pub const COM8_AGC_EN: u8 = 0x04;
    pub const COM8_AEC_EN: u8 = 0x01;

    pub const COM9_DEFAULT: u8 = 0x08;

    pub const COM10_HREF_EN: u8 = 0x80;
    pub const COM10_HSYNC_EN: u8 = 0x40;
    pub const COM10_PCLK_FREE: u8 = 0x20;
    pub const COM10_PCLK_EDGE: u8 = 0x10;
    pub const COM10_HREF_NEG: u8 = 0x08;
    pub const COM10_VSYNC_NEG: u8 = 0x02;
    pub const COM10_HSYNC_NEG: u8 = 0x01;

    pub const CTRL1_AWB: u8 = 0x08;

    pub const REG32_UXGA: u8 = 0x36;
    pub const REG32_SVGA: u8 = 0x09;
    pub const REG32_CIF: u8 = 0x89;

    pub const CLKRC_2X: u8 = 0x80;

    /// Pack the AGC high and low thresholds into the VV register.
    pub const fn vv_agc_threshold(high: u8, low: u8) -> u8 {
        (high << 4) | (low & 0x0F)
    }
}

/// A sub-byte field within a register.
///
/// `mask` is relative to the field, so a three bit field starting at bit 5 has a `shift` of 5 and
/// a `mask` of `0b111`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BitField {
    pub bank: Bank,
    pub register: u8,
    pub shift: u8,
    pub mask: u8,
}

impl BitField {
    pub const fn new(bank: Bank, register: u8, shift: u8, mask: u8) -> Self {
        Self {
            bank,
            register,
            shift,
            mask,
        }
    }

    /// Pull this field's value out of the raw register value.
    pub fn extract(&self, raw: u8) -> u8 {
        (raw >> self.shift) & self.mask
    }

    /// Check that a value fits in this field.
    pub fn check(&self, value: u8) -> Result<(), LibraryError> {
        if value & !self.mask != 0 {
            Err(LibraryError::OutOfRange {
                value,
                mask: self.mask,
            })
        } else {
            Ok(())
        }
    }

    /// Replace this field's bits in `raw` with `value`, leaving every other bit alone.
    pub fn insert(&self, raw: u8, value: u8) -> Result<u8, LibraryError> {
        self.check(value)?;
        let cleared = raw & !(self.mask << self.shift);
        Ok(cleared | (value << self.shift))
    }
}

/// Color bar test pattern enable (COM7 bit 1).
pub const TEST_PATTERN: BitField = BitField::new(Bank::Sensor, sensor::COM7, 1, 0b1);

/// AGC gain ceiling (COM9 bits 7:5).
pub const GAIN_CEILING: BitField = BitField::new(Bank::Sensor, sensor::COM9, 5, 0b111);

/// Black pixel correction enable.
pub const BPC: BitField = BitField::new(Bank::Dsp, dsp::CTRL3, 7, 0b1);

/// White pixel correction enable.
pub const WPC: BitField = BitField::new(Bank::Dsp, dsp::CTRL3, 6, 0b1);

/// Lens correction enable.
pub const LENC: BitField = BitField::new(Bank::Dsp, dsp::CTRL1, 1, 0b1);

/// AEC[1:0].
pub const EXPOSURE_LOW: BitField = BitField::new(Bank::Sensor, sensor::REG04, 0, 0b11);

/// AEC[9:2].
pub const EXPOSURE_MIDDLE: BitField = BitField::new(Bank::Sensor, sensor::AEC, 0, 0xFF);

/// AEC[15:10].
pub const EXPOSURE_HIGH: BitField = BitField::new(Bank::Sensor, sensor::REG45, 0, 0b11_1111);

/// The maximum gain the automatic gain control may apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum GainCeiling {
    /// 2x, which is what the sensor is configured to after initialization.
    Two = 0,
    Four = 1,
    Eight = 2,
    Sixteen = 3,
    ThirtyTwo = 4,
    SixtyFour = 5,
    OneHundredTwentyEight = 6,
}

impl Default for GainCeiling {
    fn default() -> Self {
        Self::Two
    }
}

impl GainCeiling {
    /// The full COM9 register value for this ceiling.
    pub const fn com9(self) -> u8 {
        sensor::COM9_DEFAULT | ((self as u8) << 5)
    }
}

/// Conversion between a typed value and the raw bits of a [`BitField`].
pub trait FieldValue: Sized {
    fn from_field(raw: u8) -> Result<Self, LibraryError>;

    fn into_field(self) -> u8;
}

impl FieldValue for bool {
    fn from_field(raw: u8) -> Result<Self, LibraryError> {
        Ok(raw != 0)
    }

    fn into_field(self) -> u8 {
        self as u8
    }
}

impl FieldValue for GainCeiling {
    fn from_field(raw: u8) -> Result<Self, LibraryError> {
        GainCeiling::try_from(raw)
            .map_err(|_| LibraryError::InvalidData("Invalid gain ceiling value given"))
    }

    fn into_field(self) -> u8 {
        self.into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extract_field() {
        assert_eq!(GAIN_CEILING.extract(0b1010_1000), 0b101);
        assert_eq!(TEST_PATTERN.extract(0x22), 1);
        assert_eq!(TEST_PATTERN.extract(0x20), 0);
        assert_eq!(EXPOSURE_HIGH.extract(0xFF), 0x3F);
    }

    #[test]
    fn insert_preserves_other_bits() {
        assert_eq!(GAIN_CEILING.insert(0xFF, 0).unwrap(), 0x1F);
        assert_eq!(GAIN_CEILING.insert(0x08, 0b110).unwrap(), 0xC8);
        assert_eq!(WPC.insert(0x90, 1).unwrap(), 0xD0);
        assert_eq!(BPC.insert(0xD0, 0).unwrap(), 0x50);
        assert_eq!(EXPOSURE_LOW.insert(0x28, 0b11).unwrap(), 0x2B);
    }

    #[test]
    fn insert_rejects_wide_values() {
        assert_eq!(
            GAIN_CEILING.insert(0x00, 0x08),
            Err(LibraryError::OutOfRange {
                value: 0x08,
                mask: 0x07
            })
        );
        assert!(LENC.insert(0x00, 2).is_err());
        assert!(EXPOSURE_HIGH.insert(0x00, 0x40).is_err());
    }

    #[test]
    fn bank_from_raw() {
        assert_eq!(Bank::try_from(0u8).unwrap(), Bank::Dsp);
        assert_eq!(Bank::try_from(1u8).unwrap(), Bank::Sensor);
        assert!(Bank::try_from(2u8).is_err());
        assert_eq!(u8::from(Bank::Sensor), 1);
    }

    #[test]
    fn gain_ceiling_field() {
        assert_eq!(GainCeiling::from_field(0).unwrap(), GainCeiling::Two);
        assert_eq!(
            GainCeiling::from_field(6).unwrap(),
            GainCeiling::OneHundredTwentyEight
        );
        assert!(GainCeiling::from_field(7).is_err());
        assert_eq!(GainCeiling::Eight.into_field(), 2);
        assert_eq!(GainCeiling::Eight.com9(), 0x48);
    }

    #[test]
    fn bool_field() {
        assert!(bool::from_field(1).unwrap());
        assert!(!bool::from_field(0).unwrap());
        assert_eq!(true.into_field(), 1);
    }

    #[test]
    fn agc_threshold() {
        assert_eq!(sensor::vv_agc_threshold(8, 2), 0x82);
    }
}
