use std::io;
use thiserror::Error;

pub type DecodingResult<T> = Result<T, DecodingError>;
pub type EncodingResult<T> = Result<T, EncodingError>;

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("malformed GIF stream: {0}")]
    Format(#[from] FormatError),
    #[error("unsupported GIF: {0}")]
    Unsupported(#[from] Unsupported),
    #[error("GIF stream truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DecodingError {
    /// `true` when the input is valid GIF but outside the accepted subset.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("invalid signature, expected b\"GIF\", got {0:?}")]
    InvalidSignature([u8; 3]),
    #[error("unknown block introducer 0x{byte:02x} at offset {offset}")]
    UnknownBlock { byte: u8, offset: usize },
    #[error("unknown extension label 0x{label:02x} at offset {offset}")]
    UnknownExtension { label: u8, offset: usize },
    #[error("invalid block size at offset {offset}: expected {expected}, got {actual}")]
    InvalidBlockSize {
        offset: usize,
        expected: u8,
        actual: u8,
    },
    #[error("invalid block terminator 0x{byte:02x} at offset {offset}")]
    InvalidBlockTerminator { byte: u8, offset: usize },
    #[error("invalid LZW minimum code size {size} at offset {offset}")]
    InvalidCodeSize { size: u8, offset: usize },
    #[error("invalid LZW data at offset {offset}: {reason}")]
    InvalidLzwData { offset: usize, reason: String },
    #[error("image data ended early: expected {expected} pixels, got {actual}")]
    MissingPixels { expected: usize, actual: usize },
    #[error("empty image descriptor ({width}x{height}) at offset {offset}")]
    EmptyFrame {
        width: u16,
        height: u16,
        offset: usize,
    },
    #[error("GIF stream contains no image")]
    NoFrames,
}

#[derive(Debug, Error, PartialEq)]
pub enum Unsupported {
    #[error("version {0:?}, only b\"87a\" and b\"89a\" are accepted")]
    Version([u8; 3]),
    #[error("color resolution of {0} bits, only 8 bits are accepted")]
    ColorResolution(u8),
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("image has no frames")]
    NoFrames,
    #[error("no palette available for frame {0}")]
    NoPalette(usize),
    #[error("frame {index} has {actual} pixels, expected {expected}")]
    PixelCountMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("frame {0} does not fit inside the canvas")]
    FrameOutOfBounds(usize),
    #[error(
        "first frame of the animation is smaller than the canvas and there is no \
         transparent index to pad it with"
    )]
    InvalidDefaultImageRectangle,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
