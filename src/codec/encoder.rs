//! Header encoder emitting GNU long name/link and security label blocks.

use log::{debug, trace};

use crate::{Block, EntryType, Header, BLOCK_SIZE};

use super::error::{CodecError, Result};
use super::label;
use super::options::Options;
use super::record::HeaderRecord;
use super::transport::BlockWriter;

/// Writes [`HeaderRecord`]s as header blocks.
///
/// For each record the encoder emits, in order: a GNU long link entry, a GNU
/// long name entry, a security label extended header, and finally the
/// primary header. Each extension is written only when the record carries a
/// non-empty value and the matching [`Options`] flag is on.
///
/// Extension headers are copies of the primary header with the typeflag and
/// size replaced, so the record itself is never modified.
///
/// A failed write aborts the current call. Blocks already written stay in
/// the stream.
#[derive(Debug)]
pub struct HeaderEncoder<W> {
    writer: W,
    options: Options,
    /// Byte offset of the next block in the stream.
    pos: u64,
}

impl<W: BlockWriter> HeaderEncoder<W> {
    /// Create an encoder over `writer`.
    pub fn new(writer: W, options: Options) -> Self {
        Self {
            writer,
            options,
            pos: 0,
        }
    }

    /// Create an encoder with default [`Options`].
    pub fn with_defaults(writer: W) -> Self {
        Self::new(writer, Options::default())
    }

    /// Byte offset of the next block to be written.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// The options this encoder was built with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get a mutable reference to the underlying writer.
    pub fn writer(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Consume the encoder and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write the extension blocks and primary header for `record`.
    ///
    /// The primary block and the label record are both built, and the long
    /// values checked, before anything is written, so field and label errors
    /// never leave a partial entry.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Header`] if a field does not fit its encoding
    /// - [`CodecError::InvalidLabel`] / [`CodecError::LabelTooLong`] for an unencodable label
    /// - [`CodecError::InvalidLongName`] if a long name or link contains NUL
    /// - [`CodecError::Write`] if the transport fails
    pub fn write_header(&mut self, record: &HeaderRecord) -> Result<()> {
        let primary = record.to_block()?;

        let label = match record.security_label.as_deref() {
            Some(text) if self.options.security_label && !text.is_empty() => {
                Some(label::format_label(text)?)
            }
            _ => None,
        };

        let long_link = non_empty(&record.long_link_name);
        let long_name = non_empty(&record.long_name);
        if self.options.gnu_extensions
            && long_link
                .into_iter()
                .chain(long_name)
                .any(|value| value.contains('\0'))
        {
            return Err(CodecError::InvalidLongName);
        }

        if self.options.gnu_extensions {
            if let Some(link) = long_link {
                debug!("writing GNU long link of {} bytes", link.len());
                self.write_long_string(&primary, EntryType::GnuLongLink, link)?;
            }
            if let Some(name) = long_name {
                debug!("writing GNU long name of {} bytes", name.len());
                self.write_long_string(&primary, EntryType::GnuLongName, name)?;
            }
        }

        if let Some((len, data)) = label {
            debug!("writing {len}-byte security label record");
            let header = extension_header(&primary, EntryType::XHeader, len as u64)?;
            self.write_block(&header)?;
            self.write_block(&data)?;
        }

        self.write_block(&primary)
    }

    /// Write an entry payload, zero-padding the final block.
    pub fn write_payload(&mut self, data: &[u8]) -> Result<()> {
        for chunk in data.chunks(BLOCK_SIZE) {
            let mut block = [0u8; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            self.write_block(&block)?;
        }
        Ok(())
    }

    /// Write the end-of-archive marker (two zero blocks).
    pub fn finish(&mut self) -> Result<()> {
        let zero = [0u8; BLOCK_SIZE];
        self.write_block(&zero)?;
        self.write_block(&zero)
    }

    fn write_long_string(&mut self, primary: &Block, kind: EntryType, value: &str) -> Result<()> {
        let header = extension_header(primary, kind, value.len() as u64)?;
        self.write_block(&header)?;
        self.write_payload(value.as_bytes())
    }

    fn write_block(&mut self, block: &Block) -> Result<()> {
        let offset = self.pos;
        self.writer
            .write_block(block)
            .map_err(|source| CodecError::Write { offset, source })?;
        trace!("wrote block at offset {offset}");
        self.pos += BLOCK_SIZE as u64;
        Ok(())
    }
}

/// Derive an extension header from the primary block.
fn extension_header(primary: &Block, kind: EntryType, size: u64) -> Result<Block> {
    let mut header = Header::from_block(*primary);
    header.set_entry_type(kind);
    header.set_size(size)?;
    header.finalize_checksum();
    Ok(header.into_block())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
