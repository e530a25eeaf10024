use crate::error::{DecodingError, DecodingResult, FormatError, Unsupported};
use crate::gif::{
    ApplicationExtension, ExtensionLabel, GraphicControlExtension, ImageDescriptor,
    LogicalScreenDescriptor, Version, BLOCK_TERMINATOR, EXTENSION_INTRODUCER, SIGNATURE, TRAILER,
};
use crate::reader::BlockReader;
use crate::{Frame, Image, Palette};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::{debug, info, warn};
use std::io::{self, Read};
use weezl::{decode::Decoder as LzwDecoder, BitOrder, LzwStatus};

/// Decodes a whole GIF stream into an [`Image`].
pub fn decode<R: Read>(reader: R) -> DecodingResult<Image> {
    Decoder::new(reader).decode()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectBlockIntroducer,
    Terminal,
}

/// Working state of a single decode call.
#[derive(Debug, Default)]
pub(crate) struct Context {
    pub(crate) offset: usize,
    /// Last graphic control extension, waiting for its image descriptor.
    pub(crate) graphic_control_extension: Option<GraphicControlExtension>,
    /// Delay of the most recent graphic control extension.
    pub(crate) delay: u16,
}

struct Decoder<R> {
    reader: R,
    cx: Context,
    state: State,
}

impl<R: Read> Decoder<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            cx: Context::default(),
            state: State::ExpectBlockIntroducer,
        }
    }

    fn decode(mut self) -> DecodingResult<Image> {
        let version = self.read_header()?;
        info!("GIF version: {:?}", version);

        let logical_screen_descriptor = self.read_logical_screen_descriptor()?;
        info!("Found logical screen descriptor");
        debug!(
            "[{:?}] Logical screen descriptor: {:?}",
            self.cx, logical_screen_descriptor
        );

        let global_palette = if logical_screen_descriptor.global_color_table_flag() {
            let len = logical_screen_descriptor.global_color_table_len();
            info!("Global color table found: {} colors", len);
            Some(self.read_color_table(len)?)
        } else {
            None
        };

        let mut frames = Vec::new();
        let mut loop_count = None;
        while self.state != State::Terminal {
            let introducer = self.read_u8()?;
            match introducer {
                ImageDescriptor::SEPARATOR => {
                    let frame = self.read_image()?;
                    frames.push(frame);
                }
                EXTENSION_INTRODUCER => {
                    if let Some(count) = self.read_extension()? {
                        loop_count = Some(count);
                    }
                }
                TRAILER => {
                    info!("End of GIF data stream");
                    self.state = State::Terminal;
                }
                byte => {
                    return Err(FormatError::UnknownBlock {
                        byte,
                        offset: self.cx.offset - 1,
                    }
                    .into())
                }
            }
        }

        if frames.is_empty() {
            return Err(FormatError::NoFrames.into());
        }

        let (width, height) = if frames.len() == 1 {
            (frames[0].width, frames[0].height)
        } else {
            (
                logical_screen_descriptor.logical_screen_width,
                logical_screen_descriptor.logical_screen_height,
            )
        };
        let transparent = frames.iter().find_map(|frame| frame.transparent);

        Ok(Image {
            width,
            height,
            global_palette,
            transparent,
            loop_count,
            frames,
        })
    }

    fn read_header(&mut self) -> DecodingResult<Version> {
        let mut signature = [0u8; 3];
        self.read_exact(&mut signature)?;
        if &signature != SIGNATURE {
            return Err(FormatError::InvalidSignature(signature).into());
        }

        let mut version = [0u8; 3];
        self.read_exact(&mut version)?;
        Version::from_bytes(&version).ok_or_else(|| Unsupported::Version(version).into())
    }

    fn read_logical_screen_descriptor(&mut self) -> DecodingResult<LogicalScreenDescriptor> {
        let mut bytes = [0u8; LogicalScreenDescriptor::SIZE];
        self.read_exact(&mut bytes)?;
        let mut fields = &bytes[..];
        let descriptor = LogicalScreenDescriptor {
            logical_screen_width: fields.read_u16::<LittleEndian>()?,
            logical_screen_height: fields.read_u16::<LittleEndian>()?,
            packed_fields: fields.read_u8()?,
            background_color_index: fields.read_u8()?,
            pixel_aspect_ratio: fields.read_u8()?,
        };

        let color_resolution = descriptor.color_resolution();
        if color_resolution != 8 {
            return Err(Unsupported::ColorResolution(color_resolution).into());
        }
        Ok(descriptor)
    }

    fn read_color_table(&mut self, len: usize) -> DecodingResult<Palette> {
        let mut table = vec![0u8; len * 3];
        self.read_exact(&mut table)?;
        Ok(Palette::from_color_table(&table))
    }

    fn read_image(&mut self) -> DecodingResult<Frame> {
        let start = self.cx.offset - 1;
        let mut bytes = [0u8; ImageDescriptor::SIZE];
        self.read_exact(&mut bytes)?;
        let mut fields = &bytes[..];
        let descriptor = ImageDescriptor {
            image_left_position: fields.read_u16::<LittleEndian>()?,
            image_top_position: fields.read_u16::<LittleEndian>()?,
            image_width: fields.read_u16::<LittleEndian>()?,
            image_height: fields.read_u16::<LittleEndian>()?,
            packed_fields: fields.read_u8()?,
        };
        info!("Found image descriptor");
        debug!("[{:?}] Image descriptor: {:?}", self.cx, descriptor);

        if descriptor.pixel_count() == 0 {
            return Err(FormatError::EmptyFrame {
                width: descriptor.image_width,
                height: descriptor.image_height,
                offset: start,
            }
            .into());
        }

        let local_palette = if descriptor.local_color_table_flag() {
            let len = descriptor.local_color_table_len();
            info!("Local color table found: {} colors", len);
            Some(self.read_color_table(len)?)
        } else {
            None
        };

        let mut pixels = self.read_image_data(descriptor.pixel_count())?;
        if descriptor.interlace_flag() {
            debug!("Deinterlacing {} rows", descriptor.image_height);
            pixels = deinterlace(&pixels, descriptor.image_width as usize);
        }

        let graphic_control_extension = self.cx.graphic_control_extension.take();
        let actual = pixels.len();
        let mut frame = Frame::new(descriptor.image_width, descriptor.image_height, pixels)
            .ok_or(FormatError::MissingPixels {
                expected: descriptor.pixel_count(),
                actual,
            })?;
        frame.left = descriptor.image_left_position;
        frame.top = descriptor.image_top_position;
        frame.delay = self.cx.delay;
        frame.transparent = graphic_control_extension.and_then(|ext| ext.transparent());
        frame.palette = local_palette;
        Ok(frame)
    }

    /// Decompresses exactly `len` indices, then skips whatever is left of the
    /// sub-blocks, terminator included.
    fn read_image_data(&mut self, len: usize) -> DecodingResult<Vec<u8>> {
        let min_code_size = self.read_u8()?;
        if !(1..=11).contains(&min_code_size) {
            return Err(FormatError::InvalidCodeSize {
                size: min_code_size,
                offset: self.cx.offset - 1,
            }
            .into());
        }

        let start = self.cx.offset;
        let mut pixels = vec![0u8; len];
        let mut lzw = LzwDecoder::new(BitOrder::Lsb, min_code_size);
        let mut blocks = BlockReader::new(&mut self.reader);
        let result = fill_pixels(&mut lzw, &mut blocks, &mut pixels).and_then(|filled| {
            let trailing = blocks.drain()?;
            if trailing > 0 {
                debug!("Skipped {} bytes of image data after the last pixel", trailing);
            }
            Ok(filled)
        });
        let consumed = blocks.consumed();
        self.cx.offset += consumed;

        match result {
            Ok(filled) if filled == len => Ok(pixels),
            Ok(filled) => Err(FormatError::MissingPixels {
                expected: len,
                actual: filled,
            }
            .into()),
            Err(LzwFailure::Io(err)) => Err(self.io_error(err)),
            Err(LzwFailure::Invalid(reason)) => Err(FormatError::InvalidLzwData {
                offset: start,
                reason,
            }
            .into()),
        }
    }

    fn read_extension(&mut self) -> DecodingResult<Option<u16>> {
        let label = self.read_u8()?;
        let extension = ExtensionLabel::from_u8(label).ok_or(FormatError::UnknownExtension {
            label,
            offset: self.cx.offset - 1,
        })?;
        let name: &'static str = extension.into();
        info!("Found {} extension block", name);

        match extension {
            ExtensionLabel::GraphicControl => {
                let ext = self.read_graphic_control_extension()?;
                debug!("[{:?}] Graphic control extension: {:?}", self.cx, ext);
                self.cx.delay = ext.delay_time;
                if self.cx.graphic_control_extension.replace(ext).is_some() {
                    warn!("Graphic control extension without an image, replacing it");
                }
                Ok(None)
            }
            ExtensionLabel::Application => self.read_application_extension(),
            ExtensionLabel::Comment | ExtensionLabel::PlainText => {
                let skipped = self.skip_sub_blocks()?;
                debug!("Discarded {} bytes of {} extension", skipped, name);
                Ok(None)
            }
        }
    }

    fn read_graphic_control_extension(&mut self) -> DecodingResult<GraphicControlExtension> {
        self.expect_block_size(GraphicControlExtension::BLOCK_SIZE)?;
        let packed_fields = self.read_u8()?;
        let delay_time = self.read_u16()?;
        let transparent_color_index = self.read_u8()?;

        let terminator = self.read_u8()?;
        if terminator != BLOCK_TERMINATOR {
            return Err(FormatError::InvalidBlockTerminator {
                byte: terminator,
                offset: self.cx.offset - 1,
            }
            .into());
        }

        Ok(GraphicControlExtension {
            packed_fields,
            delay_time,
            transparent_color_index,
        })
    }

    fn read_application_extension(&mut self) -> DecodingResult<Option<u16>> {
        self.expect_block_size(ApplicationExtension::BLOCK_SIZE)?;
        let mut ext = ApplicationExtension {
            identifier: [0; 8],
            authentication_code: [0; 3],
        };
        self.read_exact(&mut ext.identifier)?;
        self.read_exact(&mut ext.authentication_code)?;
        debug!("[{:?}] Application extension: {:?}", self.cx, ext);

        let mut data = Vec::new();
        let mut blocks = BlockReader::new(&mut self.reader);
        let result = blocks.read_to_end(&mut data);
        self.cx.offset += blocks.consumed();
        result.map_err(|err| self.io_error(err))?;

        if !ext.is_looping() {
            return Ok(None);
        }
        let loop_count = ApplicationExtension::loop_count(&data);
        match loop_count {
            Some(count) => info!("Loop count: {}", count),
            None => warn!("Malformed looping application extension, ignoring it"),
        }
        Ok(loop_count)
    }

    fn skip_sub_blocks(&mut self) -> DecodingResult<usize> {
        let mut blocks = BlockReader::new(&mut self.reader);
        let result = blocks.drain();
        self.cx.offset += blocks.consumed();
        result.map_err(|err| self.io_error(err))
    }

    fn expect_block_size(&mut self, expected: u8) -> DecodingResult<()> {
        let actual = self.read_u8()?;
        if actual != expected {
            return Err(FormatError::InvalidBlockSize {
                offset: self.cx.offset - 1,
                expected,
                actual,
            }
            .into());
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> DecodingResult<()> {
        self.reader
            .read_exact(buf)
            .map_err(|err| self.io_error(err))?;
        self.cx.offset += buf.len();
        Ok(())
    }

    fn read_u8(&mut self) -> DecodingResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> DecodingResult<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    fn io_error(&self, err: io::Error) -> DecodingError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DecodingError::Truncated {
                offset: self.cx.offset,
            }
        } else {
            DecodingError::Io(err)
        }
    }
}

enum LzwFailure {
    Io(io::Error),
    Invalid(String),
}

impl From<io::Error> for LzwFailure {
    fn from(err: io::Error) -> Self {
        LzwFailure::Io(err)
    }
}

/// Feeds sub-block data to the LZW decoder until `pixels` is full, the end
/// code shows up, or the blocks run out. Returns the number of pixels written.
fn fill_pixels<R: Read>(
    lzw: &mut LzwDecoder,
    blocks: &mut BlockReader<'_, R>,
    pixels: &mut [u8],
) -> Result<usize, LzwFailure> {
    let mut buf = [0u8; 255];
    let mut filled = 0;
    while filled < pixels.len() {
        let len = blocks.read(&mut buf)?;

        // The decoder may hold back output until it is called again, so keep
        // going with empty input once the block is used up.
        let mut input = &buf[..len];
        while filled < pixels.len() {
            let result = lzw.decode_bytes(input, &mut pixels[filled..]);
            input = &input[result.consumed_in..];
            filled += result.consumed_out;
            match result.status {
                Ok(LzwStatus::Ok) => (),
                Ok(LzwStatus::NoProgress) => break,
                Ok(LzwStatus::Done) => return Ok(filled),
                Err(err) => return Err(LzwFailure::Invalid(err.to_string())),
            }
            if result.consumed_in == 0 && result.consumed_out == 0 {
                break;
            }
        }

        if len == 0 {
            break;
        }
    }
    Ok(filled)
}

/// Reorders the rows of an interlaced image into top-to-bottom order.
///
/// Rows arrive as every 8th row from 0, every 8th from 4, every 4th from 2,
/// and finally every 2nd from 1.
pub fn deinterlace(pixels: &[u8], width: usize) -> Vec<u8> {
    let height = pixels.len() / width;
    let mut out = vec![0u8; pixels.len()];
    let mut rows = pixels.chunks_exact(width);
    for &(start, step) in &[(0, 8), (4, 8), (2, 4), (1, 2)] {
        for y in (start..height).step_by(step) {
            if let Some(row) = rows.next() {
                out[y * width..(y + 1) * width].copy_from_slice(row);
            }
        }
    }
    out
}
