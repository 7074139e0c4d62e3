//! Whole-block I/O.
//!
//! The codec never reads or writes anything smaller than one [`Block`]. These
//! traits are the only contact it has with the underlying stream, and they are
//! implemented for every [`Read`] and [`Write`] so that files, sockets and
//! in-memory buffers work directly.

use std::io::{Error, ErrorKind, Read, Result, Write};

use crate::Block;

/// Source of whole blocks.
pub trait BlockReader {
    /// Fill `block` from the stream.
    ///
    /// Returns `Ok(true)` when a full block was read and `Ok(false)` on a
    /// clean end of stream (no bytes at all). A stream that ends partway
    /// through a block is an [`ErrorKind::UnexpectedEof`] error.
    fn read_block(&mut self, block: &mut Block) -> Result<bool>;
}

/// Sink of whole blocks.
pub trait BlockWriter {
    /// Write all of `block`. Anything short of the full block is an error.
    fn write_block(&mut self, block: &Block) -> Result<()>;
}

impl<R: Read + ?Sized> BlockReader for R {
    fn read_block(&mut self, block: &mut Block) -> Result<bool> {
        let buflen = block.len();
        let mut todo: &mut [u8] = block;

        while !todo.is_empty() {
            match self.read(todo) {
                Ok(0) => {
                    return match todo.len() {
                        s if s == buflen => Ok(false), // clean EOF
                        _ => Err(Error::from(ErrorKind::UnexpectedEof)),
                    };
                }
                Ok(n) => todo = &mut todo[n..],
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(true)
    }
}

impl<W: Write + ?Sized> BlockWriter for W {
    fn write_block(&mut self, block: &Block) -> Result<()> {
        self.write_all(block)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::BLOCK_SIZE;

    /// Hands out at most `chunk` bytes per read, interrupting every other call.
    struct Dribble {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        interrupt: bool,
    }

    impl Read for Dribble {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(ErrorKind::Interrupted.into());
            }
            let n = buf.len().min(self.chunk).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_read_full_then_clean_eof() {
        let mut reader = Cursor::new(vec![7u8; BLOCK_SIZE]);
        let mut block = [0u8; BLOCK_SIZE];
        assert!(reader.read_block(&mut block).unwrap());
        assert!(block.iter().all(|&b| b == 7));
        assert!(!reader.read_block(&mut block).unwrap());
    }

    #[test]
    fn test_read_partial_block() {
        let mut reader = Cursor::new(vec![1u8; 100]);
        let mut block = [0u8; BLOCK_SIZE];
        let err = reader.read_block(&mut block).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_read_retries_short_and_interrupted() {
        let data: Vec<u8> = (0..BLOCK_SIZE).map(|i| i as u8).collect();
        let mut reader = Dribble {
            data: data.clone(),
            pos: 0,
            chunk: 37,
            interrupt: false,
        };
        let mut block = [0u8; BLOCK_SIZE];
        assert!(reader.read_block(&mut block).unwrap());
        assert_eq!(&block[..], &data[..]);
    }

    #[test]
    fn test_write_block() {
        let mut out = Vec::new();
        out.write_block(&[3u8; BLOCK_SIZE]).unwrap();
        assert_eq!(out.len(), BLOCK_SIZE);

        let mut full = [0u8; 10];
        let mut short = &mut full[..];
        let err = short.write_block(&[0u8; BLOCK_SIZE]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
    }
}
