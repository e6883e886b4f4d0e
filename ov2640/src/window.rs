// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Reprogramming the sensor for a new output size.
//!
//! Changing the output size touches registers in both banks, and the sensor produces garbage if
//! it tries to output an image while they're only partly updated. The DSP is bypassed for the
//! duration, and the steps are always performed in the same order:
//!
//! 1. Bypass the DSP.
//! 2. Write the operating mode's base settings.
//! 3. Write the crop and scaling window registers.
//! 4. Write the sensor clock divider (CLKRC).
//! 5. Write the pixel clock divider (R_DVP_SP).
//! 6. Re-enable the DSP.
//! 7. Wait for the sensor to settle.
//!
//! The base settings reset the image mode registers, so the colorspace has to be applied again
//! afterwards with [`apply_colorspace`].
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

use crate::error::Error;
use crate::register::{dsp, sensor, Bank, BANK_SEL};
use crate::resolution::{Geometry, OperatingMode};
use crate::sccb::Sccb;
use crate::settings::Colorspace;

/// How long to wait after re-enabling the DSP, or after changing the colorspace.
pub const SETTLE_DELAY_MS: u32 = 10;

/// The number of register writes in [`window_registers`] (including the bank select).
pub const WINDOW_REGISTER_COUNT: usize = 10;

/// Calculate the DSP window registers for a resolved geometry.
///
/// The window and output size registers count in units of four pixels, with the overflow bits
/// packed into VHYX, TEST and ZMHH.
pub fn window_registers(geometry: &Geometry) -> [(u8, u8); WINDOW_REGISTER_COUNT] {
    let window = &geometry.window;
    let max_x = window.max_width / 4;
    let max_y = window.max_height / 4;
    let offset_x = window.offset_x / 4;
    let offset_y = window.offset_y / 4;
    let width = geometry.width / 4;
    let height = geometry.height / 4;
    // Bits 2:0 of VHYX hold bits 10:8 of the X offset, as laid out in the datasheet.
    let vhyx = ((max_y >> 1) & 0x80)
        | ((offset_y >> 4) & 0x70)
        | ((max_x >> 5) & 0x08)
        | ((offset_x >> 8) & 0x07);
    [
        (BANK_SEL, Bank::Dsp.into()),
        (dsp::HSIZE, max_x as u8),
        (dsp::VSIZE, max_y as u8),
        (dsp::XOFFL, offset_x as u8),
        (dsp::YOFFL, offset_y as u8),
        (dsp::VHYX, vhyx as u8),
        (dsp::TEST, ((max_x >> 2) & 0x80) as u8),
        (dsp::ZMOW, width as u8),
        (dsp::ZMOH, height as u8),
        (dsp::ZMHH, (((height >> 6) & 0x04) | ((width >> 8) & 0x03)) as u8),
    ]
}

/// Clock divider settings for an operating mode and colorspace.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClockSettings {
    /// Let the DVP pick the pixel clock divider.
    pub pclk_auto: bool,

    /// Pixel clock divider. Only seven bits wide.
    pub pclk_div: u8,

    /// Sensor clock divider. Only six bits wide.
    pub clk_div: u8,

    /// Double the sensor clock.
    pub clk_2x: bool,
}

impl ClockSettings {
    pub fn new(mode: OperatingMode, colorspace: Colorspace) -> Self {
        let (pclk_auto, mut pclk_div) = match (colorspace, mode) {
            (Colorspace::Jpeg, _) => (false, 8),
            (_, OperatingMode::Cif) => (true, 3),
            _ => (true, 7),
        };
        if mode == OperatingMode::Uxga {
            pclk_div = 12;
        }
        Self {
            pclk_auto,
            pclk_div,
            clk_div: 0,
            clk_2x: false,
        }
    }

    /// The value for the sensor bank CLKRC register.
    pub fn clkrc(&self) -> u8 {
        let doubler = if self.clk_2x { sensor::CLKRC_2X } else { 0 };
        (self.clk_div & 0x3F) | doubler
    }

    /// The value for the DSP bank R_DVP_SP register.
    pub fn r_dvp_sp(&self) -> u8 {
        let auto = if self.pclk_auto {
            dsp::R_DVP_SP_AUTO_MODE
        } else {
            0
        };
        (self.pclk_div & 0x7F) | auto
    }
}

/// Reprogram the sensor for a new geometry.
///
/// If this fails partway through, the sensor is left in an unknown state. Calling it again from
/// the start will recover, as every step is written unconditionally.
pub fn program_window<I2C, D>(
    sccb: &mut Sccb<I2C>,
    delay: &mut D,
    geometry: &Geometry,
    colorspace: Colorspace,
) -> Result<(), Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u32>,
{
    let clocks = ClockSettings::new(geometry.mode, colorspace);
    log::debug!("Programming {:?} with {:?}", geometry, clocks);
    sccb.write_bank_register(Bank::Dsp, dsp::R_BYPASS, dsp::R_BYPASS_DSP_BYPASS)?;
    sccb.write_list(geometry.mode.settings(), delay)?;
    sccb.write_list(&window_registers(geometry), delay)?;
    sccb.write_bank_register(Bank::Sensor, sensor::CLKRC, clocks.clkrc())?;
    sccb.write_bank_register(Bank::Dsp, dsp::R_DVP_SP, clocks.r_dvp_sp())?;
    sccb.write_bank_register(Bank::Dsp, dsp::R_BYPASS, dsp::R_BYPASS_DSP_EN)?;
    delay.delay_ms(SETTLE_DELAY_MS);
    Ok(())
}

/// Write the settings for a colorspace.
///
/// The settings are written twice, then the sensor is given time to settle. The second pass is
/// what reference drivers do, and isn't known to be necessary.
pub fn apply_colorspace<I2C, D>(
    sccb: &mut Sccb<I2C>,
    delay: &mut D,
    colorspace: Colorspace,
) -> Result<(), Error<I2C>>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u32>,
{
    log::debug!("Applying colorspace {:?}", colorspace);
    let settings = colorspace.settings();
    sccb.write_list(settings, delay)?;
    sccb.write_list(settings, delay)?;
    delay.delay_ms(SETTLE_DELAY_MS);
    Ok(())
}
