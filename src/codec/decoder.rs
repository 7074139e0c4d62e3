//! Header decoder with GNU long name/link and security label resolution.

use log::{debug, trace, warn};

use crate::{
    truncate_null, Block, EntryType, Header, BLOCK_SIZE, MAGIC_CHECK_LEN, USTAR_MAGIC,
    USTAR_VERSION,
};

use super::error::{CodecError, Result};
use super::label;
use super::options::Options;
use super::record::HeaderRecord;
use super::transport::BlockReader;

/// Outcome of a successful [`HeaderDecoder::read_header`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A primary header was decoded into the record.
    Header,
    /// The end-of-archive marker (two zero blocks) was reached.
    EndOfArchive,
}

/// Extension payloads collected ahead of the real header.
///
/// Nothing moves into the caller's record until the real header arrives, so
/// a failure partway through a chain leaves no partial payload behind.
#[derive(Debug, Default)]
struct PendingExtensions {
    long_link_name: Option<String>,
    long_name: Option<String>,
    security_label: Option<String>,
    /// Number of extension headers consumed so far.
    count: usize,
}

/// Reads header blocks and resolves them into [`HeaderRecord`]s.
///
/// Extension entries (GNU long link `'K'`, GNU long name `'L'`, and the
/// security label extended header `'x'`) are consumed transparently and
/// attached to the record of the entry they precede.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use tar_codec::codec::{HeaderDecoder, HeaderEncoder, HeaderRecord};
///
/// let mut record = HeaderRecord::new_gnu();
/// record.set_name("hello.txt");
///
/// let mut encoder = HeaderEncoder::with_defaults(Vec::new());
/// encoder.write_header(&record).unwrap();
/// encoder.finish().unwrap();
///
/// let mut decoder = HeaderDecoder::with_defaults(Cursor::new(encoder.into_inner()));
/// let decoded = decoder.next_header().unwrap().unwrap();
/// assert_eq!(decoded.name, "hello.txt");
/// assert!(decoder.next_header().unwrap().is_none());
/// ```
///
/// # Payload
///
/// After a header is returned, the entry's payload (if any) has NOT been
/// read. Call [`skip_payload`] or [`read_payload`] with the record's `size`
/// before decoding the next header.
///
/// [`skip_payload`]: HeaderDecoder::skip_payload
/// [`read_payload`]: HeaderDecoder::read_payload
#[derive(Debug)]
pub struct HeaderDecoder<R> {
    reader: R,
    options: Options,
    /// Last primary header block accepted by the scanner.
    block: Block,
    /// Byte offset of the next block in the stream.
    pos: u64,
}

impl<R: BlockReader> HeaderDecoder<R> {
    /// Create a decoder over `reader`.
    pub fn new(reader: R, options: Options) -> Self {
        Self {
            reader,
            options,
            block: [0u8; BLOCK_SIZE],
            pos: 0,
        }
    }

    /// Create a decoder with default [`Options`].
    pub fn with_defaults(reader: R) -> Self {
        Self::new(reader, Options::default())
    }

    /// Byte offset of the next block to be read.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// The options this decoder was built with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The raw block of the most recently accepted header.
    #[must_use]
    pub fn header_block(&self) -> &Block {
        &self.block
    }

    /// Get a mutable reference to the underlying reader.
    pub fn reader(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume the decoder and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode the next entry header into `record`.
    ///
    /// Extension payloads left in `record` by a previous call are released
    /// first. Extension headers are resolved until a header of any other
    /// kind is reached; that header's fields replace the record's primary
    /// fields and the collected payloads are attached.
    ///
    /// # Errors
    ///
    /// - [`CodecError::UnexpectedEof`] if the stream ends cleanly where a header is due
    /// - [`CodecError::Truncated`] on a failed or short block read
    /// - [`CodecError::BadMagic`] / [`CodecError::BadVersion`] when those checks are on
    /// - [`CodecError::Header`] on a checksum mismatch or malformed numeric field
    /// - [`CodecError::OrphanedExtension`] if extensions run into the end-of-archive marker
    pub fn read_header(&mut self, record: &mut HeaderRecord) -> Result<Decoded> {
        record.clear_extensions();
        let mut pending = PendingExtensions::default();

        loop {
            if self.scan()? == Decoded::EndOfArchive {
                if pending.count > 0 {
                    return Err(CodecError::OrphanedExtension);
                }
                return Ok(Decoded::EndOfArchive);
            }

            let header = Header::from_block_ref(&self.block);
            let entry_type = header.entry_type();
            let resolve = match entry_type {
                EntryType::GnuLongLink | EntryType::GnuLongName => self.options.gnu_extensions,
                EntryType::XHeader => self.options.security_label,
                _ => false,
            };
            if !resolve {
                break;
            }
            let size = header.entry_size()?;

            pending.count += 1;
            if pending.count > self.options.max_pending_extensions {
                return Err(CodecError::TooManyExtensions {
                    count: pending.count,
                    limit: self.options.max_pending_extensions,
                });
            }

            match entry_type {
                EntryType::GnuLongLink => {
                    let link = self.read_long_string(size)?;
                    debug!("GNU long link of {} bytes", link.len());
                    pending.long_link_name = Some(link);
                }
                EntryType::GnuLongName => {
                    let name = self.read_long_string(size)?;
                    debug!("GNU long name of {} bytes", name.len());
                    pending.long_name = Some(name);
                }
                _ => {
                    if let Some(label) = self.read_extended_header(size)? {
                        debug!("security label {label:?}");
                        pending.security_label = Some(label);
                    }
                }
            }
        }

        *record = HeaderRecord::from_block(&self.block)?;
        record.long_link_name = pending.long_link_name;
        record.long_name = pending.long_name;
        record.security_label = pending.security_label;
        Ok(Decoded::Header)
    }

    /// Decode the next entry header into a fresh record.
    ///
    /// Returns `Ok(None)` at the end-of-archive marker.
    pub fn next_header(&mut self) -> Result<Option<HeaderRecord>> {
        let mut record = HeaderRecord::default();
        match self.read_header(&mut record)? {
            Decoded::Header => Ok(Some(record)),
            Decoded::EndOfArchive => Ok(None),
        }
    }

    /// Skip an entry payload of `size` bytes plus its block padding.
    pub fn skip_payload(&mut self, size: u64) -> Result<()> {
        let mut buf = [0u8; BLOCK_SIZE];
        for _ in 0..block_count(size)? {
            self.read_data_block(&mut buf)?;
        }
        Ok(())
    }

    /// Read an entry payload of `size` bytes and skip its block padding.
    pub fn read_payload(&mut self, size: u64) -> Result<Vec<u8>> {
        let len = usize::try_from(size).map_err(|_| CodecError::InvalidSize(size))?;
        let mut data = Vec::new();
        let mut buf = [0u8; BLOCK_SIZE];
        for _ in 0..block_count(size)? {
            self.read_data_block(&mut buf)?;
            let take = (len - data.len()).min(BLOCK_SIZE);
            data.extend_from_slice(&buf[..take]);
        }
        Ok(data)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Read blocks until a primary header is accepted or the archive ends.
    fn scan(&mut self) -> Result<Decoded> {
        let mut zero_blocks = 0;
        loop {
            let offset = self.pos;
            match self.reader.read_block(&mut self.block) {
                Ok(true) => self.pos += BLOCK_SIZE as u64,
                Ok(false) => return Err(CodecError::UnexpectedEof { offset }),
                Err(source) => return Err(CodecError::Truncated { offset, source }),
            }

            let header = Header::from_block_ref(&self.block);
            if header.is_terminator() {
                zero_blocks += 1;
                trace!("zero block at offset {offset}");
                if !self.options.ignore_end_marker && zero_blocks >= 2 {
                    debug!("end of archive at offset {}", self.pos);
                    return Ok(Decoded::EndOfArchive);
                }
                continue;
            }

            trace!(
                "header {:?} type {:?} at offset {offset}",
                String::from_utf8_lossy(header.path_bytes()),
                header.entry_type()
            );

            if self.options.check_magic
                && header.magic()[..MAGIC_CHECK_LEN] != USTAR_MAGIC[..MAGIC_CHECK_LEN]
            {
                return Err(CodecError::BadMagic(header.magic().to_vec()));
            }
            if self.options.check_version && header.version() != USTAR_VERSION {
                return Err(CodecError::BadVersion(header.version().to_vec()));
            }
            if !self.options.ignore_checksum {
                header.verify_checksum()?;
            }
            return Ok(Decoded::Header);
        }
    }

    /// Read one payload block. Any end of stream here is a truncation.
    fn read_data_block(&mut self, buf: &mut Block) -> Result<()> {
        let offset = self.pos;
        match self.reader.read_block(buf) {
            Ok(true) => {
                self.pos += BLOCK_SIZE as u64;
                Ok(())
            }
            Ok(false) => Err(CodecError::Truncated {
                offset,
                source: std::io::ErrorKind::UnexpectedEof.into(),
            }),
            Err(source) => Err(CodecError::Truncated { offset, source }),
        }
    }

    /// Read a GNU long name/link payload, cut at the first NUL.
    fn read_long_string(&mut self, size: u64) -> Result<String> {
        if size > self.options.max_extension_size {
            return Err(CodecError::ExtensionTooLarge {
                size,
                limit: self.options.max_extension_size,
            });
        }
        let data = self.read_payload(size)?;
        Ok(String::from_utf8_lossy(truncate_null(&data)).into_owned())
    }

    /// Read an extended header payload and look for the security label.
    ///
    /// Payloads of a block or more are not scanned; their blocks are skipped
    /// and no label is produced.
    fn read_extended_header(&mut self, size: u64) -> Result<Option<String>> {
        if size == 0 {
            return Ok(None);
        }
        if size >= BLOCK_SIZE as u64 {
            warn!(
                "ignoring {size}-byte extended header at offset {}",
                self.pos - BLOCK_SIZE as u64
            );
            self.skip_payload(size)?;
            return Ok(None);
        }

        let mut buf = [0u8; BLOCK_SIZE];
        self.read_data_block(&mut buf)?;
        let label = label::extract_label(&buf);
        if label.is_none() {
            debug!("extended header without a security label");
        }
        Ok(label)
    }
}

/// Number of whole blocks a payload of `size` bytes occupies.
fn block_count(size: u64) -> Result<u64> {
    size.checked_next_multiple_of(BLOCK_SIZE as u64)
        .map(|padded| padded / BLOCK_SIZE as u64)
        .ok_or(CodecError::InvalidSize(size))
}
