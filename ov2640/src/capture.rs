// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! The hardware the sensor depends on besides the control bus, and the frames it produces.
//!
//! Pixel data comes out of the OV2640 on an 8-bit parallel bus (plus pixel clock, VSYNC and HREF
//! lines). Receiving that is very much platform specific (usually a DMA driven peripheral), so
//! it is abstracted as [`ParallelCapture`]. The sensor also needs a master clock, which may be
//! provided by a clock generator on the host ([`MasterClock`]) or from an external oscillator.
use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::v2::OutputPin;

/// The JPEG end of image marker.
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// A peripheral that receives frames from the sensor's parallel data bus.
pub trait ParallelCapture {
    /// Fill `buffer` with a single frame.
    ///
    /// This blocks until the end of the frame. Any part of `buffer` past the end of the frame is
    /// left with unspecified contents.
    fn capture(&mut self, buffer: &mut [u8]);

    /// Stop capturing and release any hardware resources.
    fn release(&mut self);
}

/// A clock generator driving the sensor's XVCLK input.
pub trait MasterClock {
    type Error: fmt::Debug;

    /// Start generating a clock as close to `frequency` (in Hz) as possible, returning the
    /// frequency actually generated.
    fn start(&mut self, frequency: u32) -> Result<u32, Self::Error>;

    fn stop(&mut self);
}

/// Placeholder for a control line that isn't connected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoPin;

impl OutputPin for NoPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Placeholder for when the master clock is supplied externally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoClock;

impl MasterClock for NoClock {
    type Error = Infallible;

    fn start(&mut self, frequency: u32) -> Result<u32, Self::Error> {
        Ok(frequency)
    }

    fn stop(&mut self) {}
}

/// Find the end of a JPEG image in `buffer`.
///
/// Returns the length of the image including the end of image marker, or `None` if there is no
/// marker.
pub fn jpeg_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(JPEG_EOI.len())
        .position(|pair| pair == JPEG_EOI)
        .map(|index| index + JPEG_EOI.len())
}

/// A captured frame, borrowed from the buffer it was captured into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame<'b> {
    /// RGB565 or YUV422 pixel data, filling the entire buffer.
    Raw(&'b [u8]),

    /// A JPEG image, ending with the end of image marker.
    Jpeg(&'b [u8]),

    /// JPEG data where no end of image marker was found. The entire buffer is included.
    ///
    /// This is usually the result of the buffer being too small for the compressed image.
    UnterminatedJpeg(&'b [u8]),
}

impl<'b> Frame<'b> {
    /// Wrap a buffer holding JPEG data, trimming anything after the end of the image.
    pub fn jpeg(buffer: &'b [u8]) -> Self {
        match jpeg_end(buffer) {
            Some(end) => Frame::Jpeg(&buffer[..end]),
            None => {
                log::warn!(
                    "No JPEG end of image marker found in {} byte buffer",
                    buffer.len()
                );
                Frame::UnterminatedJpeg(buffer)
            }
        }
    }

    /// The bytes of the frame.
    pub fn data(&self) -> &'b [u8] {
        match *self {
            Frame::Raw(data) | Frame::Jpeg(data) | Frame::UnterminatedJpeg(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

impl AsRef<[u8]> for Frame<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn eoi_found() {
        let buffer = [0xFF, 0xD8, 0x12, 0x34, 0xFF, 0xD9, 0x00, 0xAA, 0xFF];
        assert_eq!(jpeg_end(&buffer), Some(6));
        let frame = Frame::jpeg(&buffer);
        assert_eq!(frame, Frame::Jpeg(&buffer[..6]));
        assert_eq!(frame.len(), 6);
    }

    #[test]
    fn eoi_at_end() {
        let buffer = [0x01, 0x02, 0xFF, 0xD9];
        assert_eq!(Frame::jpeg(&buffer).data(), &buffer[..]);
    }

    #[test]
    fn eoi_first_marker_wins() {
        let buffer = [0xFF, 0xD9, 0xFF, 0xD9];
        assert_eq!(jpeg_end(&buffer), Some(2));
    }

    #[test]
    fn eoi_missing() {
        // A lone 0xFF at the end, or the bytes in the wrong order, are not a marker.
        let buffer = [0xD9, 0xFF, 0x00, 0xFF];
        assert_eq!(jpeg_end(&buffer), None);
        let frame = Frame::jpeg(&buffer);
        assert!(matches!(frame, Frame::UnterminatedJpeg(_)));
        assert_eq!(frame.len(), buffer.len());
        assert_eq!(jpeg_end(&[]), None);
        assert!(Frame::jpeg(&[]).is_empty());
    }

    #[test]
    fn placeholders() {
        let mut pin = NoPin;
        assert!(pin.set_high().is_ok());
        assert!(pin.set_low().is_ok());
        let mut clock = NoClock;
        assert_eq!(clock.start(20_000_000), Ok(20_000_000));
    }
}
