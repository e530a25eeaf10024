use crate::chunk::{self, ChunkType, ACTL, FCTL, FDAT, IDAT, IEND, IHDR, PLTE, SIGNATURE, TRNS};
use crate::error::{EncodingError, EncodingResult};
use crate::filter::{self, Filter};
use crate::{Frame, Image, Palette};
use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use std::borrow::Cow;
use std::io::Write;

const BIT_DEPTH: u8 = 8;
// Palette used | color used
const COLOR_TYPE_INDEXED: u8 = 0b011;
const COMPRESSION_METHOD_DEFLATE: u8 = 0;
const FILTER_METHOD_ADAPTIVE: u8 = 0;
const INTERLACE_METHOD_NONE: u8 = 0;

const DELAY_DENOMINATOR: u16 = 100;
const DISPOSE_OP_NONE: u8 = 0;
const BLEND_OP_SOURCE: u8 = 0;
const BLEND_OP_OVER: u8 = 1;

#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub filter: Filter,
    pub compression: Compression,
    /// Number of plays of an animation, 0 loops forever.
    pub plays: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            filter: Filter::None,
            compression: Compression::best(),
            plays: 0,
        }
    }
}

/// Encodes `image` as PNG, or APNG when it has several frames, with the
/// default options.
pub fn encode<W: Write>(image: &Image, writer: &mut W) -> EncodingResult<()> {
    Encoder::new(writer, EncodeOptions::default()).encode(image)
}

pub struct Encoder<'a, W: Write> {
    writer: &'a mut W,
    options: EncodeOptions,
    sequence_number: u32,
}

impl<'a, W: Write> Encoder<'a, W> {
    pub fn new(writer: &'a mut W, options: EncodeOptions) -> Self {
        Self {
            writer,
            options,
            sequence_number: 0,
        }
    }

    pub fn encode(mut self, image: &Image) -> EncodingResult<()> {
        let palette = validate(image)?;
        let first = &image.frames[0];

        self.writer.write_all(&SIGNATURE)?;
        info!("Wrote the PNG signature");

        let (width, height) = if image.is_animated() {
            (image.width, image.height)
        } else {
            (first.width, first.height)
        };
        self.write_image_header(width, height)?;
        self.write_palette(palette)?;
        if let Some(index) = image.transparent {
            self.write_transparency(palette, index)?;
        }

        if image.is_animated() {
            self.write_animation(image)?;
        } else {
            let data = self.compress(first)?;
            self.write_chunk(&IDAT, &data)?;
        }

        self.write_chunk(&IEND, &[])?;
        info!("Wrote the PNG trailer");
        Ok(())
    }

    fn write_image_header(&mut self, width: u16, height: u16) -> EncodingResult<()> {
        let mut buffer = Vec::with_capacity(13);
        buffer.write_u32::<BigEndian>(width as u32)?;
        buffer.write_u32::<BigEndian>(height as u32)?;
        buffer.extend_from_slice(&[
            BIT_DEPTH,
            COLOR_TYPE_INDEXED,
            COMPRESSION_METHOD_DEFLATE,
            FILTER_METHOD_ADAPTIVE,
            INTERLACE_METHOD_NONE,
        ]);
        self.write_chunk(&IHDR, &buffer)
    }

    fn write_palette(&mut self, palette: &Palette) -> EncodingResult<()> {
        self.write_chunk(&PLTE, &palette.to_rgb())
    }

    fn write_transparency(&mut self, palette: &Palette, index: u8) -> EncodingResult<()> {
        if index as usize >= palette.len() {
            warn!(
                "Transparency index {} is outside the palette of {} colors",
                index,
                palette.len()
            );
        }
        let mut alpha = [0xffu8; 256];
        alpha[index as usize] = 0;
        self.write_chunk(&TRNS, &alpha[..palette.len()])
    }

    fn write_animation(&mut self, image: &Image) -> EncodingResult<()> {
        let mut buffer = Vec::with_capacity(8);
        buffer.write_u32::<BigEndian>(image.frames.len() as u32)?;
        buffer.write_u32::<BigEndian>(self.options.plays)?;
        self.write_chunk(&ACTL, &buffer)?;

        for (index, frame) in image.frames.iter().enumerate() {
            let frame = if index == 0 && !covers_canvas(image, frame) {
                Cow::Owned(pad_to_canvas(image, frame)?)
            } else {
                Cow::Borrowed(frame)
            };
            self.write_frame_control(&frame)?;
            let data = self.compress(&frame)?;
            if index == 0 {
                self.write_chunk(&IDAT, &data)?;
            } else {
                self.write_frame_data(&data)?;
            }
        }
        Ok(())
    }

    fn write_frame_control(&mut self, frame: &Frame) -> EncodingResult<()> {
        let blend_op = if frame.transparent.is_some() {
            BLEND_OP_OVER
        } else {
            BLEND_OP_SOURCE
        };

        let mut buffer = Vec::with_capacity(26);
        buffer.write_u32::<BigEndian>(self.next_sequence_number())?;
        buffer.write_u32::<BigEndian>(frame.width as u32)?;
        buffer.write_u32::<BigEndian>(frame.height as u32)?;
        buffer.write_u32::<BigEndian>(frame.left as u32)?;
        buffer.write_u32::<BigEndian>(frame.top as u32)?;
        buffer.write_u16::<BigEndian>(frame.delay)?;
        buffer.write_u16::<BigEndian>(DELAY_DENOMINATOR)?;
        buffer.extend_from_slice(&[DISPOSE_OP_NONE, blend_op]);
        self.write_chunk(&FCTL, &buffer)
    }

    fn write_frame_data(&mut self, data: &[u8]) -> EncodingResult<()> {
        let mut buffer = Vec::with_capacity(data.len() + 4);
        buffer.write_u32::<BigEndian>(self.next_sequence_number())?;
        buffer.extend_from_slice(data);
        self.write_chunk(&FDAT, &buffer)
    }

    fn compress(&self, frame: &Frame) -> EncodingResult<Vec<u8>> {
        let scanlines = filter::serialize(frame.rows(), frame.width as usize, self.options.filter);
        let mut e = ZlibEncoder::new(Vec::new(), self.options.compression);
        e.write_all(&scanlines)?;
        let compressed = e.finish()?;
        debug!(
            "Compressed {} bytes of scanlines into {}",
            scanlines.len(),
            compressed.len()
        );
        Ok(compressed)
    }

    fn write_chunk(&mut self, chunk_type: &ChunkType, data: &[u8]) -> EncodingResult<()> {
        chunk::write_chunk(&mut *self.writer, chunk_type, data)?;
        info!(
            "Wrote a {} chunk of {} bytes",
            String::from_utf8_lossy(chunk_type),
            data.len()
        );
        Ok(())
    }

    fn next_sequence_number(&mut self) -> u32 {
        let number = self.sequence_number;
        self.sequence_number += 1;
        number
    }
}

/// Checks the image can be written and returns the palette shared by all
/// frames.
fn validate(image: &Image) -> EncodingResult<&Palette> {
    let first = image.frames.first().ok_or(EncodingError::NoFrames)?;
    let palette = image
        .palette_for(first)
        .filter(|palette| !palette.is_empty())
        .ok_or(EncodingError::NoPalette(0))?;

    for (index, frame) in image.frames.iter().enumerate() {
        let expected = frame.width as usize * frame.height as usize;
        if frame.pixels().len() != expected {
            return Err(EncodingError::PixelCountMismatch {
                index,
                expected,
                actual: frame.pixels().len(),
            });
        }

        let frame_palette = image
            .palette_for(frame)
            .filter(|palette| !palette.is_empty())
            .ok_or(EncodingError::NoPalette(index))?;
        if frame_palette != palette {
            warn!(
                "Frame {} has its own palette, it is written with the palette of the first frame",
                index
            );
        }
    }

    if image.is_animated() {
        // A smaller first frame can only be padded with a transparent index.
        if !covers_canvas(image, first) && image.transparent.is_none() {
            return Err(EncodingError::InvalidDefaultImageRectangle);
        }
        for (index, frame) in image.frames.iter().enumerate() {
            if frame.left as u32 + frame.width as u32 > image.width as u32
                || frame.top as u32 + frame.height as u32 > image.height as u32
            {
                return Err(EncodingError::FrameOutOfBounds(index));
            }
        }
    }

    Ok(palette)
}

fn covers_canvas(image: &Image, frame: &Frame) -> bool {
    frame.left == 0
        && frame.top == 0
        && frame.width == image.width
        && frame.height == image.height
}

/// Places `frame` on a canvas-sized frame filled with the image's transparent
/// index. APNG requires the first frame to cover the whole canvas.
fn pad_to_canvas(image: &Image, frame: &Frame) -> EncodingResult<Frame> {
    let fill = image
        .transparent
        .ok_or(EncodingError::InvalidDefaultImageRectangle)?;
    info!(
        "Padding the {}x{} first frame to the {}x{} canvas with index {}",
        frame.width, frame.height, image.width, image.height, fill
    );

    let width = image.width as usize;
    let mut pixels = vec![fill; width * image.height as usize];
    for (y, row) in frame.rows().enumerate() {
        let start = (frame.top as usize + y) * width + frame.left as usize;
        pixels[start..start + row.len()].copy_from_slice(row);
    }

    let mut padded = Frame::new(image.width, image.height, pixels)
        .ok_or(EncodingError::InvalidDefaultImageRectangle)?;
    padded.delay = frame.delay;
    padded.transparent = Some(fill);
    padded.palette = frame.palette.clone();
    Ok(padded)
}
