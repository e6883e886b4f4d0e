// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;
use embedded_hal::digital::v2::OutputPin;
use paste::paste;

use crate::capture::{Frame, MasterClock, NoClock, NoPin, ParallelCapture};
use crate::error::{Error, LibraryError};
use crate::register::*;
use crate::resolution::{resolve, FrameSize};
use crate::sccb::{Sccb, DEFAULT_ADDRESS};
use crate::settings::{Colorspace, INIT};
use crate::window::{apply_colorspace, program_window};

/// How long the shutdown line is held high, and then how long to wait after releasing it.
const SHUTDOWN_PULSE_MS: (u32, u32) = (100, 300);

/// How long the reset line is held low, and then how long to wait after releasing it.
const RESET_PULSE_MS: (u32, u32) = (100, 100);

/// How long to wait after a soft reset.
const SOFT_RESET_DELAY_MS: u32 = 1;

/// The default master clock frequency, 20 MHz.
pub const DEFAULT_MCLK_FREQUENCY: u32 = 20_000_000;

/// DRY macro for the methods on `Ov2640` that read and write a single register field.
///
/// Most of the fields are boolean values, so that's the default type. Otherwise, add the type in
/// before the docstring.
macro_rules! register_field {
    { $field:ident, $descriptor:ident, $doc:literal } => {
        register_field! {
            $field,
            $descriptor,
            bool,
            $doc
        }
    };
    { $field:ident, $descriptor:ident, $typ:ty, $doc:literal } => {
    paste! {
        #[doc = $doc]
        pub fn $field(&mut self) -> Result<$typ, Error<I2C>> {
            let raw = self.sccb.read_field(&$descriptor)?;
            Ok(<$typ as FieldValue>::from_field(raw)?)
        }

        #[doc = $doc]
        pub fn [< set_ $field >](&mut self, new_value: $typ) -> Result<(), Error<I2C>> {
            self.sccb.write_field(&$descriptor, new_value.into_field())
        }
    }};
}

/// Settings used when bringing up the sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// The address of the sensor on the SCCB bus.
    pub address: u8,

    /// The master clock frequency to request from the clock generator, if there is one.
    pub mclk_frequency: u32,

    /// The initial output size.
    pub size: FrameSize,

    /// The initial output colorspace.
    pub colorspace: Colorspace,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            mclk_frequency: DEFAULT_MCLK_FREQUENCY,
            size: FrameSize::default(),
            colorspace: Colorspace::default(),
        }
    }
}

/// The optional control lines and clock for a sensor.
///
/// Any of these can be left as `None` if they're not connected, or managed elsewhere.
#[derive(Clone, Debug)]
pub struct Control<SHDN, RST, CLK> {
    /// The power down line (PWDN), active high.
    pub shutdown: Option<SHDN>,

    /// The reset line (RESETB), active low.
    pub reset: Option<RST>,

    /// The generator for the master clock (XVCLK).
    pub clock: Option<CLK>,
}

impl<SHDN, RST, CLK> Default for Control<SHDN, RST, CLK> {
    fn default() -> Self {
        Self {
            shutdown: None,
            reset: None,
            clock: None,
        }
    }
}

/// Everything a sensor driver owned, returned by [`Ov2640::deinit`].
#[derive(Debug)]
pub struct Parts<I2C, CAP, D, SHDN, RST, CLK> {
    pub bus: I2C,
    pub capture: CAP,
    pub delay: D,
    pub control: Control<SHDN, RST, CLK>,
}

/// A driver for the OmniVision OV2640.
///
/// The OV2640 is a 2 megapixel (1600x1200) sensor with an on-chip image processor that can scale
/// the image down and compress it to JPEG. It is controlled over SCCB (which is close enough to
/// I²C to use the same peripheral), and outputs pixels on an 8-bit parallel bus.
///
/// Creating an `Ov2640` resets the sensor and configures it for the size and colorspace in
/// [`Config`]. Changing either of those later reprograms the sensor, which blocks for a few tens
/// of milliseconds.
#[derive(Debug)]
pub struct Ov2640<I2C, CAP, D, SHDN = NoPin, RST = NoPin, CLK = NoClock> {
    /// Register access to the sensor.
    sccb: Sccb<I2C>,

    /// The peripheral receiving frames from the sensor.
    capture: CAP,

    delay: D,

    control: Control<SHDN, RST, CLK>,

    /// The master clock frequency actually being generated, if we're generating it.
    mclk_frequency: Option<u32>,

    size: FrameSize,

    colorspace: Colorspace,

    /// The output width in pixels. Cached from `size`.
    width: u16,

    /// The output height in pixels. Cached from `size`.
    height: u16,

    flip_x: bool,

    flip_y: bool,

    /// Whether the color bar test pattern has been enabled.
    ///
    /// Changing the size or colorspace clears the test pattern bit, so it's tracked here to be
    /// restored afterwards.
    test_pattern: bool,
}

impl<I2C, CAP, D> Ov2640<I2C, CAP, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    CAP: ParallelCapture,
    D: DelayMs<u32>,
{
    /// Create a new driver for a sensor with no control lines connected, and an external master
    /// clock.
    pub fn new(bus: I2C, capture: CAP, delay: D, config: Config) -> Result<Self, Error<I2C>> {
        Self::new_with_control(bus, capture, delay, Control::default(), config)
    }
}

impl<I2C, CAP, D, SHDN, RST, CLK> Ov2640<I2C, CAP, D, SHDN, RST, CLK>
where
    I2C: i2c::WriteRead + i2c::Write,
    CAP: ParallelCapture,
    D: DelayMs<u32>,
    SHDN: OutputPin,
    RST: OutputPin,
    CLK: MasterClock,
{
    /// Create a new driver, bringing the sensor up from power on.
    ///
    /// The master clock is started, the sensor is power cycled and reset with the given control
    /// lines (if present), then reset again over SCCB and configured from scratch.
    pub fn new_with_control(
        bus: I2C,
        capture: CAP,
        delay: D,
        control: Control<SHDN, RST, CLK>,
        config: Config,
    ) -> Result<Self, Error<I2C>> {
        let (width, height, _) = config.size.info();
        let mut driver = Self {
            sccb: Sccb::new(bus, config.address),
            capture,
            delay,
            control,
            mclk_frequency: None,
            size: config.size,
            colorspace: config.colorspace,
            width,
            height,
            flip_x: false,
            flip_y: false,
            test_pattern: false,
        };
        let res = driver
            .power_up(config.mclk_frequency)
            .and_then(|()| driver.initialize());
        match res {
            Ok(()) => Ok(driver),
            Err(err) => {
                // The caller never gets the driver back, so nothing else can stop the clock.
                driver.shut_down();
                Err(err)
            }
        }
    }

    /// Start the master clock and cycle the control lines.
    fn power_up(&mut self, mclk_frequency: u32) -> Result<(), Error<I2C>> {
        if let Some(clock) = self.control.clock.as_mut() {
            let actual = clock.start(mclk_frequency).map_err(|err| {
                log::error!("Unable to start master clock: {:?}", err);
                LibraryError::ResourceUnavailable("master clock")
            })?;
            log::debug!(
                "Master clock running at {} Hz ({} Hz requested)",
                actual,
                mclk_frequency
            );
            self.mclk_frequency = Some(actual);
        }
        if let Some(shutdown) = self.control.shutdown.as_mut() {
            let (held, settle) = SHUTDOWN_PULSE_MS;
            pulse(shutdown, true, held, settle, &mut self.delay).map_err(|_| {
                log::error!("Unable to drive the shutdown line");
                LibraryError::ResourceUnavailable("shutdown line")
            })?;
        }
        if let Some(reset) = self.control.reset.as_mut() {
            let (held, settle) = RESET_PULSE_MS;
            pulse(reset, false, held, settle, &mut self.delay).map_err(|_| {
                log::error!("Unable to drive the reset line");
                LibraryError::ResourceUnavailable("reset line")
            })?;
        }
        Ok(())
    }

    /// Reset the sensor over SCCB and load the default settings.
    fn initialize(&mut self) -> Result<(), Error<I2C>> {
        log::debug!("Initializing OV2640 at {:#04x}", self.sccb.address());
        self.sccb
            .write_bank_register(Bank::Sensor, sensor::COM7, sensor::COM7_SRST)?;
        // The bank select register is reset along with everything else.
        self.sccb.forget_bank();
        self.delay.delay_ms(SOFT_RESET_DELAY_MS);
        self.sccb.write_list(INIT, &mut self.delay)?;
        self.reconfigure()?;
        self.set_gain_ceiling(GainCeiling::Two)?;
        self.set_bpc(false)?;
        self.set_wpc(true)?;
        self.set_lenc(true)
    }

    /// Program the sensor for the current size and colorspace.
    fn reconfigure(&mut self) -> Result<(), Error<I2C>> {
        let geometry = resolve(self.size);
        self.width = geometry.width;
        self.height = geometry.height;
        program_window(&mut self.sccb, &mut self.delay, &geometry, self.colorspace)?;
        apply_colorspace(&mut self.sccb, &mut self.delay, self.colorspace)?;
        if self.test_pattern {
            self.sccb.write_field(&TEST_PATTERN, true.into_field())?;
        }
        Ok(())
    }

    /// Capture a single frame into `buffer`.
    ///
    /// In JPEG mode the returned frame is trimmed to the end of the image. `buffer` should be
    /// at least [`capture_buffer_size`](Self::capture_buffer_size) bytes long.
    pub fn capture<'b>(&mut self, buffer: &'b mut [u8]) -> Frame<'b> {
        self.capture.capture(buffer);
        let buffer: &'b [u8] = buffer;
        match self.colorspace {
            Colorspace::Jpeg => Frame::jpeg(buffer),
            Colorspace::Rgb565 | Colorspace::Yuv422 => Frame::Raw(buffer),
        }
    }

    /// The buffer size needed to capture a frame with the current settings.
    ///
    /// RGB565 and YUV422 use two bytes per pixel. The size of JPEG images varies, so the
    /// buffer size is a rough upper bound.
    pub fn capture_buffer_size(&self) -> usize {
        let pixels = self.width as usize * self.height as usize;
        match self.colorspace {
            Colorspace::Jpeg => pixels / 5,
            Colorspace::Rgb565 | Colorspace::Yuv422 => pixels * 2,
        }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Change the output size.
    ///
    /// If this fails, the sensor is in an undefined state until a size or colorspace is
    /// successfully set.
    pub fn set_size(&mut self, size: FrameSize) -> Result<(), Error<I2C>> {
        self.size = size;
        self.reconfigure()
    }

    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Change the output colorspace.
    ///
    /// The pixel clock depends on the colorspace, so this reprograms the sensor the same way as
    /// [`set_size`](Self::set_size).
    pub fn set_colorspace(&mut self, colorspace: Colorspace) -> Result<(), Error<I2C>> {
        self.colorspace = colorspace;
        self.reconfigure()
    }

    /// The output image width in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// The output image height in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    /// Mirror the image horizontally.
    pub fn set_flip_x(&mut self, flip_x: bool) -> Result<(), Error<I2C>> {
        self.flip_x = flip_x;
        self.write_flip()
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    /// Flip the image vertically.
    pub fn set_flip_y(&mut self, flip_y: bool) -> Result<(), Error<I2C>> {
        self.flip_y = flip_y;
        self.write_flip()
    }

    fn write_flip(&mut self) -> Result<(), Error<I2C>> {
        let mut flip = sensor::REG04_DEFAULT;
        if self.flip_x {
            flip |= sensor::REG04_HFLIP_IMG;
        }
        if self.flip_y {
            flip |= sensor::REG04_VFLIP_IMG | sensor::REG04_VREF_EN;
        }
        // The bottom bits of REG04 are part of the exposure, keep them.
        let current = self.sccb.read_bank_register(Bank::Sensor, sensor::REG04)?;
        let value = flip | (current & sensor::REG04_AEC_MASK);
        self.sccb
            .write_bank_register(Bank::Sensor, sensor::REG04, value)
    }

    /// Whether the color bar test pattern is enabled.
    pub fn test_pattern(&mut self) -> Result<bool, Error<I2C>> {
        let raw = self.sccb.read_field(&TEST_PATTERN)?;
        Ok(bool::from_field(raw)?)
    }

    /// Replace the image with color bars.
    pub fn set_test_pattern(&mut self, test_pattern: bool) -> Result<(), Error<I2C>> {
        self.sccb
            .write_field(&TEST_PATTERN, test_pattern.into_field())?;
        self.test_pattern = test_pattern;
        Ok(())
    }

    register_field! {
        gain_ceiling,
        GAIN_CEILING,
        GainCeiling,
        "The maximum gain the automatic gain control will apply."
    }

    register_field! { bpc, BPC, "Black pixel correction." }

    register_field! { wpc, WPC, "White pixel correction." }

    register_field! { lenc, LENC, "Lens correction." }

    /// The exposure time, in units of rows.
    ///
    /// The exposure is split across three registers: AEC[1:0] in REG04, AEC[9:2] in AEC, and
    /// AEC[15:10] in REG45.
    pub fn exposure(&mut self) -> Result<u16, Error<I2C>> {
        let low = self.sccb.read_field(&EXPOSURE_LOW)? as u16;
        let middle = self.sccb.read_field(&EXPOSURE_MIDDLE)? as u16;
        let high = self.sccb.read_field(&EXPOSURE_HIGH)? as u16;
        Ok(low | (middle << 2) | (high << 10))
    }

    /// Set the exposure time, in units of rows.
    ///
    /// This only has a lasting effect if automatic exposure control is disabled.
    pub fn set_exposure(&mut self, exposure: u16) -> Result<(), Error<I2C>> {
        let low = (exposure & 0x03) as u8;
        let middle = ((exposure >> 2) & 0xFF) as u8;
        let high = (exposure >> 10) as u8;
        self.sccb.write_field(&EXPOSURE_MIDDLE, middle)?;
        self.sccb.write_field(&EXPOSURE_HIGH, high)?;
        self.sccb.write_field(&EXPOSURE_LOW, low)
    }

    /// The product ID register. Should be 0x26.
    pub fn product_id(&mut self) -> Result<u8, Error<I2C>> {
        self.sccb.read_bank_register(Bank::Sensor, sensor::REG_PID)
    }

    /// The product version register. Should be 0x4x.
    pub fn product_version(&mut self) -> Result<u8, Error<I2C>> {
        self.sccb.read_bank_register(Bank::Sensor, sensor::REG_VER)
    }

    /// The master clock frequency actually being generated, or `None` if the master clock is
    /// supplied externally.
    pub fn mclk_frequency(&self) -> Option<u32> {
        self.mclk_frequency
    }

    /// Shut down the capture peripheral and master clock, and give back the hardware.
    pub fn deinit(mut self) -> Parts<I2C, CAP, D, SHDN, RST, CLK> {
        self.shut_down();
        Parts {
            bus: self.sccb.release(),
            capture: self.capture,
            delay: self.delay,
            control: self.control,
        }
    }

    /// Release the capture peripheral and stop the master clock if it was started.
    fn shut_down(&mut self) {
        self.capture.release();
        if self.mclk_frequency.take().is_some() {
            if let Some(clock) = self.control.clock.as_mut() {
                clock.stop();
            }
        }
    }
}

/// Drive `pin` to `active` for `held` ms, then release it and wait another `settle` ms.
fn pulse<P, D>(
    pin: &mut P,
    active: bool,
    held: u32,
    settle: u32,
    delay: &mut D,
) -> Result<(), P::Error>
where
    P: OutputPin,
    D: DelayMs<u32>,
{
    set_pin(pin, active)?;
    delay.delay_ms(held);
    set_pin(pin, !active)?;
    delay.delay_ms(settle);
    Ok(())
}

fn set_pin<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}
