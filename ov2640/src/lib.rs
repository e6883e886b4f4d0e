// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! A pure-Rust driver for the OmniVision OV2640 image sensor.
//!
//! The OV2640 is a cheap 2 megapixel sensor found on a lot of hobbyist camera modules. Along with
//! the pixel array, it has an image processor (the "DSP") that can crop, scale, and compress
//! images to JPEG before they leave the sensor. It is configured over SCCB (an I²C look-alike),
//! and sends pixel data over an 8-bit parallel bus.
//!
//! This library uses the [`embedded-hal`][embedded-hal] I²C, delay and digital output traits,
//! so it should work on any platform with an `embedded-hal` implementation. Receiving the pixel
//! data is very platform specific, so that is left to an implementation of
//! [`ParallelCapture`]. This library is `no_std` compatible.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal/0.2/embedded_hal/
//!
//! # High-Level API
//! ```no_run
//! # use ov2640::ParallelCapture;
//! # struct Dma;
//! # impl ParallelCapture for Dma {
//! #     fn capture(&mut self, buffer: &mut [u8]) {}
//! #     fn release(&mut self) {}
//! # }
//! # let dma = Dma;
//! use linux_embedded_hal::{Delay, I2cdev};
//! use ov2640::{Colorspace, Config, FrameSize, Ov2640};
//!
//! let i2c_bus = I2cdev::new("/dev/i2c-1").expect("/dev/i2c-1 needs to be an I2C controller");
//! let config = Config {
//!     size: FrameSize::Svga,
//!     colorspace: Colorspace::Jpeg,
//!     ..Config::default()
//! };
//! let mut camera = Ov2640::new(i2c_bus, dma, Delay, config)?;
//! let mut buffer = vec![0u8; camera.capture_buffer_size()];
//! let image = camera.capture(&mut buffer);
//! println!("Captured a {} byte JPEG", image.len());
//! # Ok::<(), ov2640::Error<I2cdev>>(())
//! ```
//! [`Ov2640`] takes care of resetting and configuring the sensor. The shutdown and reset lines
//! and the master clock can optionally be managed by the driver as well, by passing them in a
//! [`Control`] to [`Ov2640::new_with_control`].
//!
//! # Low-Level API
//! Everything `Ov2640` does is built on the public modules. [`sccb`] handles register access
//! (including tracking the selected register bank), [`register`] has the register map,
//! [`resolution`] and [`window`] work out and program the sensor geometry for an output size,
//! and [`settings`] has the bulk register tables.
//!
//! # Reconfiguration
//! Changing the size or colorspace rewrites a large number of registers across both banks, and
//! the sensor is not usable until all of them have been written. If one of those writes fails,
//! the sensor is left in an unknown state. Repeating the same call will reprogram everything
//! from the start.

#![no_std]

pub mod capture;
#[doc(hidden)]
pub mod driver;
#[doc(hidden)]
pub mod error;
pub mod register;
pub mod resolution;
pub mod sccb;
pub mod settings;
pub mod window;

#[cfg(test)]
mod test;

#[doc(inline)]
pub use capture::{Frame, MasterClock, NoClock, NoPin, ParallelCapture};
#[doc(inline)]
pub use driver::{Config, Control, Ov2640, Parts, DEFAULT_MCLK_FREQUENCY};
#[doc(inline)]
pub use error::{Error, LibraryError};
pub use register::{Bank, GainCeiling};
pub use resolution::{AspectRatio, FrameSize, OperatingMode};
pub use sccb::DEFAULT_ADDRESS;
pub use settings::Colorspace;
