use std::cmp;
use std::io::{self, Read};

/// Presents a run of GIF data sub-blocks as one continuous stream.
///
/// Each sub-block is a length byte followed by that many bytes; a length of
/// zero terminates the run. Once the terminator is read every further call to
/// `read` returns `Ok(0)`.
pub struct BlockReader<'a, R> {
    reader: &'a mut R,
    block: [u8; 255],
    block_len: usize,
    position: usize,
    consumed: usize,
    finished: bool,
}

impl<'a, R: Read> BlockReader<'a, R> {
    /// The reader must be positioned on the length byte of the first block.
    pub fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            block: [0; 255],
            block_len: 0,
            position: 0,
            consumed: 0,
            finished: false,
        }
    }

    /// Raw bytes taken from the underlying reader, length bytes included.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Discards the remaining blocks up to and including the terminator.
    pub fn drain(&mut self) -> io::Result<usize> {
        let mut discarded = 0;
        while !self.finished {
            discarded += self.block_len - self.position;
            self.position = self.block_len;
            self.fill_block()?;
        }
        Ok(discarded)
    }

    fn fill_block(&mut self) -> io::Result<()> {
        let mut size = [0u8; 1];
        self.reader.read_exact(&mut size)?;
        self.consumed += 1;

        let len = size[0] as usize;
        if len == 0 {
            self.finished = true;
            return Ok(());
        }

        self.reader.read_exact(&mut self.block[..len])?;
        self.consumed += len;
        self.block_len = len;
        self.position = 0;
        Ok(())
    }
}

impl<'a, R: Read> Read for BlockReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.position == self.block_len {
            if self.finished {
                return Ok(0);
            }
            self.fill_block()?;
        }

        let len = cmp::min(buf.len(), self.block_len - self.position);
        buf[..len].copy_from_slice(&self.block[self.position..self.position + len]);
        self.position += len;
        Ok(len)
    }
}
