// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Bulk register settings.
//!
//! Each table is an ordered list of `(register, value)` pairs, meant to be written one at a time
//! with [`Sccb::write_list`](crate::sccb::Sccb::write_list). Bank switches are part of the
//! tables, as writes to [`BANK_SEL`]. Most of the values come from OmniVision's reference
//! settings and are undocumented.
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::register::{dsp::*, sensor::*, Bank, GainCeiling, BANK_SEL};
use crate::resolution::OperatingMode;

const DSP: u8 = Bank::Dsp as u8;
const SENSOR: u8 = Bank::Sensor as u8;

/// One-time initialization, leaving the sensor in CIF mode at 30 fps with a 24 MHz clock.
pub const INIT: &[(u8, u8)] = &[
    (BANK_SEL, DSP),
    (0x2C, 0xFF),
    (0x2E, 0xDF),
    (BANK_SEL, SENSOR),
    (0x3C, 0x32),
    (CLKRC, 0x01),
    (COM2, COM2_OUT_DRIVE_3X),
    (REG04, REG04_DEFAULT),
    (COM8, COM8_DEFAULT | COM8_BNDF_EN | COM8_AGC_EN | COM8_AEC_EN),
    (COM9, GainCeiling::Eight.com9()),
    (0x2C, 0x0C),
    (0x33, 0x78),
    (0x3A, 0x33),
    (0x3B, 0xFB),
    (0x3E, 0x00),
    (0x43, 0x11),
    (0x16, 0x10),
    (0x39, 0x92),
    (0x35, 0xDA),
    (0x22, 0x1A),
    (0x37, 0xC3),
    (0x23, 0x00),
    (ARCOM2, 0xC0),
    (0x06, 0x88),
    (0x07, 0xC0),
    (COM4, 0x87),
    (0x0E, 0x41),
    (0x4C, 0x00),
    (0x4A, 0x81),
    (0x21, 0x99),
    (AEW, 0x40),
    (AEB, 0x38),
    (VV, vv_agc_threshold(8, 2)),
    (0x5C, 0x00),
    (0x63, 0x00),
    (HISTO_LOW, 0x70),
    (HISTO_HIGH, 0x80),
    (0x7C, 0x05),
    (0x20, 0x80),
    (0x28, 0x30),
    (0x6C, 0x00),
    (0x6D, 0x80),
    (0x6E, 0x00),
    (0x70, 0x02),
    (0x71, 0x94),
    (0x73, 0xC1),
    (0x3D, 0x34),
    (0x5A, 0x57),
    (BD50, 0xBB),
    (BD60, 0x9C),
    (COM7, COM7_RES_CIF),
    (HSTART, 0x11),
    (HSTOP, 0x43),
    (VSTART, 0x00),
    (VSTOP, 0x25),
    (REG32, 0x89),
    (0x37, 0xC0),
    (BD50, 0xCA),
    (BD60, 0xA8),
    (0x6D, 0x00),
    (0x3D, 0x38),
    (BANK_SEL, DSP),
    (0xE5, 0x7F),
    (MC_BIST, MC_BIST_RESET | MC_BIST_BOOT_ROM_SEL),
    (0x41, 0x24),
    (RESET, RESET_JPEG | RESET_DVP),
    (0x76, 0xFF),
    (0x33, 0xA0),
    (0x42, 0x20),
    (0x43, 0x18),
    (0x4C, 0x00),
    (CTRL3, CTRL3_WPC_EN | 0x10),
    (0x88, 0x3F),
    (0xD7, 0x03),
    (0xD9, 0x10),
    (R_DVP_SP, R_DVP_SP_AUTO_MODE | 0x02),
    (0xC8, 0x08),
    (0xC9, 0x80),
    (BPADDR, 0x00),
    (BPDATA, 0x00),
    (BPADDR, 0x03),
    (BPDATA, 0x48),
    (BPDATA, 0x48),
    (BPADDR, 0x08),
    (BPDATA, 0x20),
    (BPDATA, 0x10),
    (BPDATA, 0x0E),
    // Gamma curve
    (0x90, 0x00),
    (0x91, 0x0E),
    (0x91, 0x1A),
    (0x91, 0x31),
    (0x91, 0x5A),
    (0x91, 0x69),
    (0x91, 0x75),
    (0x91, 0x7E),
    (0x91, 0x88),
    (0x91, 0x8F),
    (0x91, 0x96),
    (0x91, 0xA3),
    (0x91, 0xAF),
    (0x91, 0xC4),
    (0x91, 0xD7),
    (0x91, 0xE8),
    (0x91, 0x20),
    (0x92, 0x00),
    (0x93, 0x06),
    (0x93, 0xE3),
    (0x93, 0x05),
    (0x93, 0x05),
    (0x93, 0x00),
    (0x93, 0x04),
    (0x93, 0x00),
    (0x93, 0x00),
    (0x93, 0x00),
    (0x93, 0x00),
    (0x93, 0x00),
    (0x93, 0x00),
    (0x93, 0x00),
    (0x96, 0x00),
    (0x97, 0x08),
    (0x97, 0x19),
    (0x97, 0x02),
    (0x97, 0x0C),
    (0x97, 0x24),
    (0x97, 0x30),
    (0x97, 0x28),
    (0x97, 0x26),
    (0x97, 0x02),
    (0x97, 0x98),
    (0x97, 0x80),
    (0x97, 0x00),
    (0x97, 0x00),
    (0xA4, 0x00),
    (0xA8, 0x00),
    (0xC5, 0x11),
    (0xC6, 0x51),
    (0xBF, 0x80),
    (0xC7, 0x10),
    (0xB6, 0x66),
    (0xB8, 0xA5),
    (0xB7, 0x64),
    (0xB9, 0x7C),
    (0xB3, 0xAF),
    (0xB4, 0x97),
    (0xB5, 0xFF),
    (0xB0, 0xC5),
    (0xB1, 0x94),
    (0xB2, 0x0F),
    (0xC4, 0x5C),
    (CTRL1, 0xFD),
    (0x7F, 0x00),
    (0xE5, 0x1F),
    (0xE1, 0x67),
    (0xDD, 0x7F),
    (IMAGE_MODE, 0x00),
    (RESET, 0x00),
    (R_BYPASS, R_BYPASS_DSP_EN),
];

/// Switch the pixel array to CIF (400x300) readout.
pub const TO_CIF: &[(u8, u8)] = &[
    (BANK_SEL, SENSOR),
    (COM7, COM7_RES_CIF),
    // Sensor output window
    (COM1, 0x0A),
    (REG32, REG32_CIF),
    (HSTART, 0x11),
    (HSTOP, 0x43),
    (VSTART, 0x00),
    (VSTOP, 0x25),
    (BD50, 0xCA),
    (BD60, 0xA8),
    (0x5A, 0x23),
    (0x6D, 0x00),
    (0x3D, 0x38),
    (0x39, 0x92),
    (0x35, 0xDA),
    (0x22, 0x1A),
    (0x37, 0xC3),
    (0x23, 0x00),
    (ARCOM2, 0xC0),
    (0x06, 0x88),
    (0x07, 0xC0),
    (COM4, 0x87),
    (0x0E, 0x41),
    (0x4C, 0x00),
    (BANK_SEL, DSP),
    (RESET, RESET_DVP),
    // Sensor resolution
    (HSIZE8, 0x32),
    (VSIZE8, 0x25),
    (SIZEL, 0x00),
    // Image window, must be at least the output size
    (HSIZE, 0x64),
    (VSIZE, 0x4A),
    (XOFFL, 0x00),
    (YOFFL, 0x00),
    (VHYX, 0x00),
    (TEST, 0x00),
    (CTRL2, CTRL2_DCW_EN | 0x1D),
    (CTRLI, CTRLI_LP_DP),
];

/// Switch the pixel array to SVGA (800x600) readout.
pub const TO_SVGA: &[(u8, u8)] = &[
    (BANK_SEL, SENSOR),
    (COM7, COM7_RES_SVGA),
    // Sensor output window
    (COM1, 0x0A),
    (REG32, REG32_SVGA),
    (HSTART, 0x11),
    (HSTOP, 0x43),
    (VSTART, 0x00),
    (VSTOP, 0x4B),
    (0x37, 0xC0),
    (BD50, 0xCA),
    (BD60, 0xA8),
    (0x5A, 0x23),
    (0x6D, 0x00),
    (0x3D, 0x38),
    (0x39, 0x92),
    (0x35, 0xDA),
    (0x22, 0x1A),
    (0x37, 0xC3),
    (0x23, 0x00),
    (ARCOM2, 0xC0),
    (0x06, 0x88),
    (0x07, 0xC0),
    (COM4, 0x87),
    (0x0E, 0x41),
    (0x42, 0x03),
    (0x4C, 0x00),
    (BANK_SEL, DSP),
    (RESET, RESET_DVP),
    // Sensor resolution
    (HSIZE8, 0x64),
    (VSIZE8, 0x4B),
    (SIZEL, 0x00),
    // Image window, must be at least the output size
    (HSIZE, 0xC8),
    (VSIZE, 0x96),
    (XOFFL, 0x00),
    (YOFFL, 0x00),
    (VHYX, 0x00),
    (TEST, 0x00),
    (CTRL2, CTRL2_DCW_EN | 0x1D),
    (CTRLI, CTRLI_LP_DP),
];

/// Switch the pixel array to full (1600x1200) readout.
pub const TO_UXGA: &[(u8, u8)] = &[
    (BANK_SEL, SENSOR),
    (COM7, COM7_RES_UXGA),
    // Sensor output window
    (COM1, 0x0F),
    (REG32, REG32_UXGA),
    (HSTART, 0x11),
    (HSTOP, 0x75),
    (VSTART, 0x01),
    (VSTOP, 0x97),
    (0x3D, 0x34),
    (BD50, 0xBB),
    (BD60, 0x9C),
    (0x5A, 0x57),
    (0x6D, 0x80),
    (0x39, 0x82),
    (0x23, 0x00),
    (0x07, 0xC0),
    (0x4C, 0x00),
    (0x35, 0x88),
    (0x22, 0x0A),
    (0x37, 0x40),
    (ARCOM2, 0xA0),
    (0x06, 0x02),
    (COM4, 0xB7),
    (0x0E, 0x01),
    (0x42, 0x83),
    (BANK_SEL, DSP),
    (RESET, RESET_DVP),
    // Sensor resolution
    (HSIZE8, 0xC8),
    (VSIZE8, 0x96),
    (SIZEL, 0x00),
    // Image window, must be at least the output size
    (HSIZE, 0x90),
    (VSIZE, 0x2C),
    (XOFFL, 0x00),
    (YOFFL, 0x00),
    (VHYX, 0x88),
    (TEST, 0x00),
    (CTRL2, CTRL2_DCW_EN | 0x1D),
    (CTRLI, 0x00),
];

pub const JPEG: &[(u8, u8)] = &[
    (BANK_SEL, DSP),
    (RESET, RESET_JPEG | RESET_DVP),
    (IMAGE_MODE, IMAGE_MODE_JPEG_EN | IMAGE_MODE_HREF_VSYNC),
    (0xD7, 0x03),
    (0xE1, 0x77),
    (0xE5, 0x1F),
    (0xD9, 0x10),
    (0xDF, 0x80),
    (0x33, 0x80),
    (0x3C, 0x10),
    (0xEB, 0x30),
    (0xDD, 0x7F),
    (RESET, 0x00),
];

pub const YUV422: &[(u8, u8)] = &[
    (BANK_SEL, DSP),
    (RESET, RESET_DVP),
    (IMAGE_MODE, IMAGE_MODE_YUV422),
    (0xD7, 0x01),
    (0xE1, 0x67),
    (RESET, 0x00),
];

pub const RGB565: &[(u8, u8)] = &[
    (BANK_SEL, DSP),
    (RESET, RESET_DVP),
    (IMAGE_MODE, IMAGE_MODE_RGB565),
    (0xD7, 0x03),
    (0xE1, 0x77),
    (RESET, 0x00),
];

impl OperatingMode {
    /// The register settings to switch the sensor into this mode.
    pub fn settings(self) -> &'static [(u8, u8)] {
        match self {
            Self::Cif => TO_CIF,
            Self::Svga => TO_SVGA,
            Self::Uxga => TO_UXGA,
        }
    }
}

/// The pixel formats the sensor can output.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Colorspace {
    /// 16 bits per pixel, RGB565.
    Rgb565 = 0,

    /// 16 bits per pixel, YUV 4:2:2.
    Yuv422 = 1,

    /// JPEG compressed images.
    Jpeg = 2,
}

impl Colorspace {
    pub fn settings(self) -> &'static [(u8, u8)] {
        match self {
            Self::Rgb565 => RGB565,
            Self::Yuv422 => YUV422,
            Self::Jpeg => JPEG,
        }
    }
}

impl Default for Colorspace {
    fn default() -> Self {
        Self::Rgb565
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use core::convert::TryFrom;

    use super::*;

    const ALL_TABLES: [(&str, &[(u8, u8)]); 7] = [
        ("INIT", INIT),
        ("TO_CIF", TO_CIF),
        ("TO_SVGA", TO_SVGA),
        ("TO_UXGA", TO_UXGA),
        ("JPEG", JPEG),
        ("YUV422", YUV422),
        ("RGB565", RGB565),
    ];

    /// Walk a table, returning the bank and value for every register write that isn't a bank
    /// select.
    fn banked_writes(table: &[(u8, u8)]) -> impl Iterator<Item = (Bank, u8, u8)> + '_ {
        let mut bank = None;
        table.iter().filter_map(move |&(register, value)| {
            if register == BANK_SEL {
                bank = Some(Bank::try_from(value).unwrap());
                None
            } else {
                Some((bank.unwrap(), register, value))
            }
        })
    }

    #[test]
    fn tables_start_with_bank_select() {
        for (name, table) in ALL_TABLES.iter() {
            assert!(!table.is_empty(), "{} is empty", name);
            assert_eq!(table[0].0, BANK_SEL, "{} doesn't select a bank first", name);
        }
    }

    #[test]
    fn bank_selects_valid() {
        for (name, table) in ALL_TABLES.iter() {
            for &(register, value) in table.iter() {
                if register == BANK_SEL {
                    assert!(Bank::try_from(value).is_ok(), "{} selects bank {}", name, value);
                }
            }
        }
    }

    #[test]
    fn tables_never_soft_reset() {
        for (name, table) in ALL_TABLES.iter() {
            let resets = banked_writes(table).filter(|&(bank, register, value)| {
                bank == Bank::Sensor && register == COM7 && value & COM7_SRST != 0
            });
            assert_eq!(resets.count(), 0, "{} resets the sensor", name);
        }
    }

    #[test]
    fn mode_tables_set_resolution() {
        let modes = [
            (OperatingMode::Cif, COM7_RES_CIF, REG32_CIF),
            (OperatingMode::Svga, COM7_RES_SVGA, REG32_SVGA),
            (OperatingMode::Uxga, COM7_RES_UXGA, REG32_UXGA),
        ];
        for (mode, com7, reg32) in modes.iter() {
            let writes: std::vec::Vec<_> = banked_writes(mode.settings()).collect();
            assert!(writes.contains(&(Bank::Sensor, COM7, *com7)), "{:?}", mode);
            assert!(writes.contains(&(Bank::Sensor, REG32, *reg32)), "{:?}", mode);
            // Every mode table finishes in the DSP bank, which is where the window registers are.
            assert_eq!(writes.last().map(|w| w.0), Some(Bank::Dsp), "{:?}", mode);
        }
    }

    #[test]
    fn colorspace_tables_release_reset() {
        let colorspaces = [
            (Colorspace::Rgb565, IMAGE_MODE_RGB565),
            (Colorspace::Yuv422, IMAGE_MODE_YUV422),
            (Colorspace::Jpeg, IMAGE_MODE_JPEG_EN | IMAGE_MODE_HREF_VSYNC),
        ];
        for (colorspace, image_mode) in colorspaces.iter() {
            let table = colorspace.settings();
            assert_eq!(table[1].0, RESET, "{:?}", colorspace);
            assert_ne!(table[1].1 & RESET_DVP, 0, "{:?}", colorspace);
            assert_eq!(table[2], (IMAGE_MODE, *image_mode), "{:?}", colorspace);
            assert_eq!(table.last(), Some(&(RESET, 0x00)), "{:?}", colorspace);
        }
    }

    #[test]
    fn init_enables_dsp() {
        assert_eq!(INIT.last(), Some(&(R_BYPASS, R_BYPASS_DSP_EN)));
        // The gain ceiling is set to 8x by the table, and changed to 2x afterwards.
        assert!(banked_writes(INIT).any(|w| w == (Bank::Sensor, COM9, 0x48)));
    }

    #[test]
    fn colorspace_default() {
        assert_eq!(Colorspace::default(), Colorspace::Rgb565);
        assert_eq!(Colorspace::try_from(2u8).unwrap(), Colorspace::Jpeg);
    }
}
