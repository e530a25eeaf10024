use std::convert::TryFrom;
use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};
use flate2::Crc;

pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

pub type ChunkType = [u8; 4];

pub const IHDR: ChunkType = *b"IHDR";
pub const PLTE: ChunkType = *b"PLTE";
pub const TRNS: ChunkType = *b"tRNS";
pub const IDAT: ChunkType = *b"IDAT";
pub const IEND: ChunkType = *b"IEND";
pub const ACTL: ChunkType = *b"acTL";
pub const FCTL: ChunkType = *b"fcTL";
pub const FDAT: ChunkType = *b"fdAT";

/// Writes `length | type | data | crc`, the CRC covering type and data.
pub fn write_chunk<W: Write>(
    writer: &mut W,
    chunk_type: &ChunkType,
    data: &[u8],
) -> io::Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("chunk payload of {} bytes is too large", data.len()),
        )
    })?;

    writer.write_u32::<BigEndian>(len)?;
    writer.write_all(chunk_type)?;
    writer.write_all(data)?;
    writer.write_u32::<BigEndian>(crc(chunk_type, data))?;
    Ok(())
}

pub fn crc(chunk_type: &ChunkType, data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(chunk_type);
    crc.update(data);
    crc.sum()
}
