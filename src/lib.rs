//! GIF to PNG/APNG conversion.
//!
//! GIF v89a: https://www.w3.org/Graphics/GIF/spec-gif89a.txt
//! PNG: https://www.w3.org/TR/png/
//! APNG: https://wiki.mozilla.org/APNG_Specification

pub mod chunk;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod filter;
pub(crate) mod gif;
pub mod reader;

pub use crate::decoder::decode;
pub use crate::encoder::{encode, EncodeOptions, Encoder};
pub use crate::error::{
    DecodingError, DecodingResult, EncodingError, EncodingResult, FormatError, Unsupported,
};
pub use crate::filter::Filter;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Ordered color table, the pixel value is the index.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub const MAX_COLORS: usize = 256;

    /// Returns `None` when there are more than 256 colors.
    pub fn new(colors: Vec<Color>) -> Option<Self> {
        if colors.len() > Self::MAX_COLORS {
            return None;
        }
        Some(Self { colors })
    }

    /// Builds a palette from packed RGB triplets, as found in GIF color tables.
    pub fn from_rgb(bytes: &[u8]) -> Option<Self> {
        if bytes.len() % 3 != 0 {
            return None;
        }
        let colors = bytes
            .chunks_exact(3)
            .map(|rgb| Color::new(rgb[0], rgb[1], rgb[2]))
            .collect();
        Self::new(colors)
    }

    // GIF color tables hold at most 256 entries, the size field is 3 bits.
    pub(crate) fn from_color_table(table: &[u8]) -> Self {
        let colors = table
            .chunks_exact(3)
            .map(|rgb| Color::new(rgb[0], rgb[1], rgb[2]))
            .collect();
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<Color> {
        self.colors.get(idx).copied()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Packed RGB triplets in index order, the layout of a PNG `PLTE` payload.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.colors.len() * 3);
        for color in &self.colors {
            data.extend_from_slice(&[color.red, color.green, color.blue]);
        }
        data
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Palette")
            .field("len", &self.colors.len())
            .finish()
    }
}

/// One displayable image of a (possibly animated) picture.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub left: u16,
    pub top: u16,
    /// Hundredths of a second, 0 means as fast as possible.
    pub delay: u16,
    pub transparent: Option<u8>,
    pub palette: Option<Palette>,
    pixels: Vec<u8>,
}

impl Frame {
    /// Returns `None` unless `pixels` holds exactly `width * height` indices
    /// and both dimensions are non-zero.
    pub fn new(width: u16, height: u16, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            left: 0,
            top: 0,
            delay: 0,
            transparent: None,
            palette: None,
            pixels,
        })
    }

    /// Row-major palette indices.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(self.width as usize)
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("left", &self.left)
            .field("top", &self.top)
            .field("delay", &self.delay)
            .field("transparent", &self.transparent)
            .field("palette", &self.palette)
            .finish()
    }
}

/// A decoded picture: one frame is a still image, more are an animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u16,
    pub height: u16,
    pub global_palette: Option<Palette>,
    pub transparent: Option<u8>,
    /// Loop count from a NETSCAPE2.0 application extension, 0 is forever.
    pub loop_count: Option<u16>,
    pub frames: Vec<Frame>,
}

impl Image {
    /// Still image made of a single frame covering the whole canvas.
    pub fn still(palette: Palette, frame: Frame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            global_palette: Some(palette),
            transparent: frame.transparent,
            loop_count: None,
            frames: vec![frame],
        }
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// The local palette of `frame` if it has one, otherwise the global one.
    pub fn palette_for<'a>(&'a self, frame: &'a Frame) -> Option<&'a Palette> {
        frame.palette.as_ref().or_else(|| self.global_palette.as_ref())
    }
}
