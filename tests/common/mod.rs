#![allow(dead_code)]

use flate2::read::ZlibDecoder;
use flate2::Crc;
use std::io::Read;
use weezl::{encode::Encoder as LzwEncoder, BitOrder};

/// Assembles GIF streams block by block.
pub struct GifBuilder {
    data: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16, global_palette: Option<&[[u8; 3]]>) -> Self {
        Self::with_header(b"GIF89a", width, height, global_palette, 8)
    }

    pub fn with_header(
        header: &[u8; 6],
        width: u16,
        height: u16,
        global_palette: Option<&[[u8; 3]]>,
        color_resolution: u8,
    ) -> Self {
        let mut data = header.to_vec();
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        let mut packed = ((color_resolution - 1) & 0b111) << 4;
        if let Some(palette) = global_palette {
            packed |= 0x80 | table_size_bits(palette.len());
        }
        data.extend_from_slice(&[packed, 0, 0]);
        if let Some(palette) = global_palette {
            push_table(&mut data, palette);
        }
        Self { data }
    }

    pub fn graphic_control(mut self, delay: u16, transparent: Option<u8>) -> Self {
        let flags = if transparent.is_some() { 1 } else { 0 };
        self.data.extend_from_slice(&[0x21, 0xf9, 4, flags]);
        self.data.extend_from_slice(&delay.to_le_bytes());
        self.data.extend_from_slice(&[transparent.unwrap_or(0), 0]);
        self
    }

    pub fn comment(mut self, text: &[u8]) -> Self {
        self.data.extend_from_slice(&[0x21, 0xfe]);
        push_sub_blocks(&mut self.data, text);
        self
    }

    pub fn netscape_loop(mut self, count: u16) -> Self {
        self.data.extend_from_slice(&[0x21, 0xff, 11]);
        self.data.extend_from_slice(b"NETSCAPE2.0");
        self.data.extend_from_slice(&[3, 1]);
        self.data.extend_from_slice(&count.to_le_bytes());
        self.data.push(0);
        self
    }

    pub fn image(self, width: u16, height: u16, pixels: &[u8]) -> Self {
        self.image_at(0, 0, width, height, None, false, pixels)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn image_at(
        mut self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        local_palette: Option<&[[u8; 3]]>,
        interlaced: bool,
        pixels: &[u8],
    ) -> Self {
        self.data.push(0x2c);
        for value in &[left, top, width, height] {
            self.data.extend_from_slice(&value.to_le_bytes());
        }
        let mut packed = if interlaced { 0x40 } else { 0 };
        if let Some(palette) = local_palette {
            packed |= 0x80 | table_size_bits(palette.len());
        }
        self.data.push(packed);
        if let Some(palette) = local_palette {
            push_table(&mut self.data, palette);
        }
        self.image_data(pixels)
    }

    /// Raw LZW data, for streams whose pixel count is deliberately wrong.
    pub fn image_data(mut self, pixels: &[u8]) -> Self {
        let min_code_size = 8;
        self.data.push(min_code_size);
        let lzw = LzwEncoder::new(BitOrder::Lsb, min_code_size)
            .encode(pixels)
            .unwrap();
        push_sub_blocks(&mut self.data, &lzw);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.data.push(0x3b);
        self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn table_size_bits(len: usize) -> u8 {
    let mut bits = 0;
    while (2usize << bits) < len {
        bits += 1;
    }
    bits
}

fn push_table(data: &mut Vec<u8>, palette: &[[u8; 3]]) {
    let len = 2usize << table_size_bits(palette.len());
    for idx in 0..len {
        data.extend_from_slice(palette.get(idx).unwrap_or(&[0, 0, 0]));
    }
}

fn push_sub_blocks(data: &mut Vec<u8>, bytes: &[u8]) {
    for block in bytes.chunks(255) {
        data.push(block.len() as u8);
        data.extend_from_slice(block);
    }
    data.push(0);
}

/// Rows in GIF interlaced order.
pub fn interlace(pixels: &[u8], width: usize) -> Vec<u8> {
    let height = pixels.len() / width;
    let mut out = Vec::with_capacity(pixels.len());
    for &(start, step) in &[(0, 8), (4, 8), (2, 4), (1, 2)] {
        for y in (start..height).step_by(step) {
            out.extend_from_slice(&pixels[y * width..(y + 1) * width]);
        }
    }
    out
}

#[derive(Debug)]
pub struct Chunk {
    pub kind: String,
    pub data: Vec<u8>,
}

/// Splits a PNG stream into chunks, checking the signature and every CRC.
pub fn chunks(png: &[u8]) -> Vec<Chunk> {
    assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    let mut rest = &png[8..];
    let mut result = Vec::new();
    while !rest.is_empty() {
        let len = be_u32(&rest[..4]) as usize;
        let kind = &rest[4..8];
        let data = &rest[8..8 + len];
        let stored = be_u32(&rest[8 + len..12 + len]);

        let mut crc = Crc::new();
        crc.update(kind);
        crc.update(data);
        assert_eq!(
            crc.sum(),
            stored,
            "bad CRC in {}",
            String::from_utf8_lossy(kind)
        );

        result.push(Chunk {
            kind: String::from_utf8(kind.to_vec()).unwrap(),
            data: data.to_vec(),
        });
        rest = &rest[12 + len..];
    }
    result
}

pub fn kinds(chunks: &[Chunk]) -> Vec<&str> {
    chunks.iter().map(|chunk| chunk.kind.as_str()).collect()
}

pub fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// Scanlines with a filter type byte of 0 in front of every row.
pub fn unfiltered(pixels: &[u8], width: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for row in pixels.chunks(width) {
        out.push(0);
        out.extend_from_slice(row);
    }
    out
}
