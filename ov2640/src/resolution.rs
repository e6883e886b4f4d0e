// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Output sizes and the sensor window geometry needed to produce them.
//!
//! The OV2640 pixel array is 1600x1200 (UXGA), and can be read out in three modes: every pixel
//! (UXGA), every other pixel (SVGA, 800x600) or every fourth pixel (CIF, 400x300). An output
//! size is produced by choosing the smallest mode that covers it, cropping the array to a
//! window matching the output's aspect ratio, then letting the DSP scale the window down to the
//! requested size.
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The largest vertical window the sensor supports in CIF mode.
pub const CIF_MAX_HEIGHT: u16 = 296;

/// The output image sizes the driver supports.
///
/// The variants are ordered from smallest to largest, and that ordering is used to pick the
/// sensor's [`OperatingMode`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FrameSize {
    /// 96x96.
    Square96 = 0,

    /// 160x120.
    Qqvga = 1,

    /// 176x144.
    Qcif = 2,

    /// 240x176.
    Hqvga = 3,

    /// 240x240.
    Square240 = 4,

    /// 320x240.
    Qvga = 5,

    /// 400x296.
    Cif = 6,

    /// 480x320.
    Hvga = 7,

    /// 640x480.
    Vga = 8,

    /// 800x600.
    Svga = 9,

    /// 1024x768.
    Xga = 10,

    /// 1280x720.
    Hd = 11,

    /// 1280x1024.
    Sxga = 12,

    /// 1600x1200, the full sensor.
    Uxga = 13,
}

impl FrameSize {
    /// Every size, smallest first.
    pub const ALL: [FrameSize; 14] = [
        FrameSize::Square96,
        FrameSize::Qqvga,
        FrameSize::Qcif,
        FrameSize::Hqvga,
        FrameSize::Square240,
        FrameSize::Qvga,
        FrameSize::Cif,
        FrameSize::Hvga,
        FrameSize::Vga,
        FrameSize::Svga,
        FrameSize::Xga,
        FrameSize::Hd,
        FrameSize::Sxga,
        FrameSize::Uxga,
    ];

    /// The output width, height, and aspect ratio of this size.
    pub const fn info(self) -> (u16, u16, AspectRatio) {
        match self {
            Self::Square96 => (96, 96, AspectRatio::Square),
            Self::Qqvga => (160, 120, AspectRatio::FourThree),
            Self::Qcif => (176, 144, AspectRatio::FiveFour),
            Self::Hqvga => (240, 176, AspectRatio::FourThree),
            Self::Square240 => (240, 240, AspectRatio::Square),
            Self::Qvga => (320, 240, AspectRatio::FourThree),
            Self::Cif => (400, 296, AspectRatio::FourThree),
            Self::Hvga => (480, 320, AspectRatio::ThreeTwo),
            Self::Vga => (640, 480, AspectRatio::FourThree),
            Self::Svga => (800, 600, AspectRatio::FourThree),
            Self::Xga => (1024, 768, AspectRatio::FourThree),
            Self::Hd => (1280, 720, AspectRatio::SixteenNine),
            Self::Sxga => (1280, 1024, AspectRatio::FiveFour),
            Self::Uxga => (1600, 1200, AspectRatio::FourThree),
        }
    }

    pub const fn width(self) -> u16 {
        self.info().0
    }

    pub const fn height(self) -> u16 {
        self.info().1
    }

    pub const fn aspect_ratio(self) -> AspectRatio {
        self.info().2
    }

    /// The sensor readout mode used for this size.
    pub fn operating_mode(self) -> OperatingMode {
        if self <= Self::Cif {
            OperatingMode::Cif
        } else if self <= Self::Svga {
            OperatingMode::Svga
        } else {
            OperatingMode::Uxga
        }
    }
}

impl Default for FrameSize {
    fn default() -> Self {
        Self::Qqvga
    }
}

/// The aspect ratios output sizes are cropped to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum AspectRatio {
    FourThree = 0,
    ThreeTwo = 1,
    SixteenTen = 2,
    FiveThree = 3,
    SixteenNine = 4,
    TwentyOneNine = 5,
    FiveFour = 6,
    Square = 7,
    NineSixteen = 8,
}

impl AspectRatio {
    /// The crop window for this aspect ratio in full resolution (UXGA) sensor coordinates.
    pub const fn window(self) -> Window {
        let (offset_x, offset_y, max_width, max_height) = match self {
            Self::FourThree => (0, 0, 1600, 1200),
            Self::ThreeTwo => (8, 72, 1584, 1056),
            Self::SixteenTen => (0, 100, 1600, 1000),
            Self::FiveThree => (0, 120, 1600, 960),
            Self::SixteenNine => (0, 150, 1600, 900),
            Self::TwentyOneNine => (2, 258, 1596, 684),
            Self::FiveFour => (50, 0, 1500, 1200),
            Self::Square => (200, 0, 1200, 1200),
            Self::NineSixteen => (462, 0, 676, 1200),
        };
        Window {
            offset_x,
            offset_y,
            max_width,
            max_height,
        }
    }
}

/// The sensor's pixel array readout modes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum OperatingMode {
    /// Every fourth pixel, 400x300.
    Cif,

    /// Every other pixel, 800x600.
    Svga,

    /// Every pixel, 1600x1200.
    Uxga,
}

impl OperatingMode {
    /// How many full resolution pixels are combined into one pixel in this mode.
    pub const fn divisor(self) -> u16 {
        match self {
            Self::Cif => 4,
            Self::Svga => 2,
            Self::Uxga => 1,
        }
    }
}

/// A crop window on the sensor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    pub offset_x: u16,
    pub offset_y: u16,
    pub max_width: u16,
    pub max_height: u16,
}

impl Window {
    /// Scale the window into the coordinates of the given mode.
    pub fn scaled_for(&self, mode: OperatingMode) -> Self {
        let divisor = mode.divisor();
        let mut scaled = Self {
            offset_x: self.offset_x / divisor,
            offset_y: self.offset_y / divisor,
            max_width: self.max_width / divisor,
            max_height: self.max_height / divisor,
        };
        if mode == OperatingMode::Cif {
            scaled.max_height = scaled.max_height.min(CIF_MAX_HEIGHT);
        }
        scaled
    }
}

/// Everything needed to program the sensor for an output size.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Geometry {
    pub mode: OperatingMode,

    /// The crop window, in the coordinates of `mode`.
    pub window: Window,

    /// The output width in pixels.
    pub width: u16,

    /// The output height in pixels.
    pub height: u16,
}

/// Work out the mode, crop window, and output size for a frame size.
pub fn resolve(size: FrameSize) -> Geometry {
    let (width, height, aspect_ratio) = size.info();
    let mode = size.operating_mode();
    let window = aspect_ratio.window().scaled_for(mode);
    Geometry {
        mode,
        window,
        width,
        height,
    }
}
