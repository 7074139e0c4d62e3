//! Owned, decoded form of one archive entry header.

use std::borrow::Cow;

use crate::{
    Block, EntryType, Header, HeaderError, Result, GNU_MAGIC, GNU_VERSION, NAME_SIZE, USTAR_MAGIC,
    USTAR_VERSION,
};

/// One fully resolved entry header.
///
/// The fixed-width fields mirror the primary header block. The three
/// extension payloads are attached by the decoder when the entry was preceded
/// by GNU long name/link or security label blocks, and are emitted ahead of
/// the primary block by the encoder.
///
/// # Example
///
/// ```
/// use tar_codec::codec::HeaderRecord;
///
/// let mut record = HeaderRecord::new_gnu();
/// record.set_name("a/".repeat(80));
/// assert_eq!(record.name.len(), 100);
/// assert_eq!(record.effective_name().len(), 160);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    /// Contents of the 100-byte name field.
    pub name: String,
    /// File mode bits.
    pub mode: u32,
    /// Owner user ID.
    pub uid: u64,
    /// Owner group ID.
    pub gid: u64,
    /// Payload size in bytes.
    pub size: u64,
    /// Modification time in seconds since the epoch.
    pub mtime: u64,
    /// Checksum as read from the wire. Encoding always recomputes it.
    pub checksum: u64,
    /// Raw typeflag byte, see [`HeaderRecord::entry_type`].
    pub typeflag: u8,
    /// Contents of the 100-byte linkname field.
    pub link_name: String,
    /// Magic tag.
    pub magic: [u8; 6],
    /// Version tag.
    pub version: [u8; 2],
    /// Owner user name.
    pub uname: String,
    /// Owner group name.
    pub gname: String,
    /// Device major number, if the field is set.
    pub dev_major: Option<u32>,
    /// Device minor number, if the field is set.
    pub dev_minor: Option<u32>,
    /// GNU access time.
    pub atime: Option<u64>,
    /// GNU change time.
    pub ctime: Option<u64>,
    /// UStar path prefix. Always empty for GNU headers, which use those
    /// bytes for `atime` and `ctime`.
    pub prefix: String,
    /// Full link target from a GNU long link entry.
    pub long_link_name: Option<String>,
    /// Full path from a GNU long name entry.
    pub long_name: Option<String>,
    /// Security label from an extended header.
    pub security_label: Option<String>,
}

impl HeaderRecord {
    /// An empty regular-file record with GNU magic and version.
    #[must_use]
    pub fn new_gnu() -> Self {
        Self::with_magic(*GNU_MAGIC, *GNU_VERSION)
    }

    /// An empty regular-file record with UStar magic and version.
    #[must_use]
    pub fn new_ustar() -> Self {
        Self::with_magic(*USTAR_MAGIC, *USTAR_VERSION)
    }

    fn with_magic(magic: [u8; 6], version: [u8; 2]) -> Self {
        Self {
            name: String::new(),
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            mtime: 0,
            checksum: 0,
            typeflag: EntryType::Regular.to_byte(),
            link_name: String::new(),
            magic,
            version,
            uname: String::new(),
            gname: String::new(),
            dev_major: None,
            dev_minor: None,
            atime: None,
            ctime: None,
            prefix: String::new(),
            long_link_name: None,
            long_name: None,
            security_label: None,
        }
    }

    /// Decode the primary fields of `block`.
    ///
    /// Strings are decoded lossily and extension payloads are left unset.
    /// A checksum field that is not valid octal decodes as 0, and the
    /// optional device and time fields decode as `None` when malformed.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the mode, owner, size or
    /// mtime field is malformed.
    pub fn from_block(block: &Block) -> Result<Self> {
        let header = Header::from_block_ref(block);
        Ok(Self {
            name: lossy(header.path_bytes()),
            mode: header.mode()?,
            uid: header.uid()?,
            gid: header.gid()?,
            size: header.entry_size()?,
            mtime: header.mtime()?,
            checksum: header.stored_checksum().unwrap_or(0),
            typeflag: header.typeflag(),
            link_name: lossy(header.link_name_bytes()),
            magic: *header.magic(),
            version: *header.version(),
            uname: header.username().map(lossy).unwrap_or_default(),
            gname: header.groupname().map(lossy).unwrap_or_default(),
            dev_major: header.device_major().ok().flatten(),
            dev_minor: header.device_minor().ok().flatten(),
            atime: header.atime().ok().flatten(),
            ctime: header.ctime().ok().flatten(),
            prefix: header.prefix().map(lossy).unwrap_or_default(),
            long_link_name: None,
            long_name: None,
            security_label: None,
        })
    }

    /// Encode the primary fields into one block with a finalized checksum.
    ///
    /// A non-empty [`prefix`](Self::prefix) occupies the bytes of the GNU
    /// time fields, so `atime` and `ctime` are not written alongside it.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldTooLong`] if a string does not fit its
    /// field (use [`HeaderRecord::set_name`] for long paths), or
    /// [`HeaderError::NumericOverflow`] for out-of-range numbers.
    pub fn to_block(&self) -> Result<Block> {
        let mut header = Header::from_block([0u8; crate::BLOCK_SIZE]);
        header.set_magic(&self.magic, &self.version);
        header.set_path(self.name.as_bytes())?;
        header.set_mode(self.mode)?;
        header.set_uid(self.uid)?;
        header.set_gid(self.gid)?;
        header.set_size(self.size)?;
        header.set_mtime(self.mtime)?;
        header.set_typeflag(self.typeflag);
        header.set_link_name(self.link_name.as_bytes())?;
        header.set_username(self.uname.as_bytes())?;
        header.set_groupname(self.gname.as_bytes())?;
        header.set_device_major(self.dev_major)?;
        header.set_device_minor(self.dev_minor)?;
        if self.prefix.is_empty() {
            header.set_atime(self.atime)?;
            header.set_ctime(self.ctime)?;
        } else {
            header.set_prefix(self.prefix.as_bytes())?;
        }
        header.finalize_checksum();
        Ok(header.into_block())
    }

    /// The entry type encoded in [`typeflag`](Self::typeflag).
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_byte(self.typeflag)
    }

    /// Set the typeflag from an [`EntryType`].
    pub fn set_entry_type(&mut self, entry_type: EntryType) {
        self.typeflag = entry_type.to_byte();
    }

    /// Set the entry path.
    ///
    /// Paths wider than the name field go into
    /// [`long_name`](Self::long_name) and the field keeps as much of the
    /// path as fits. Any UStar prefix is cleared.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let (short, long) = split_long(name.into());
        self.name = short;
        self.long_name = long;
        self.prefix.clear();
    }

    /// Set the link target, spilling into
    /// [`long_link_name`](Self::long_link_name) like [`set_name`](Self::set_name).
    pub fn set_link_name(&mut self, target: impl Into<String>) {
        let (short, long) = split_long(target.into());
        self.link_name = short;
        self.long_link_name = long;
    }

    /// The full path: the long name if present, else the name field joined
    /// to the UStar prefix.
    #[must_use]
    pub fn effective_name(&self) -> Cow<'_, str> {
        match &self.long_name {
            Some(long) => Cow::Borrowed(long.as_str()),
            None if self.prefix.is_empty() => Cow::Borrowed(self.name.as_str()),
            None => Cow::Owned(format!("{}/{}", self.prefix, self.name)),
        }
    }

    /// The full link target: the long link if present, else the linkname field.
    #[must_use]
    pub fn effective_link_name(&self) -> &str {
        self.long_link_name.as_deref().unwrap_or(&self.link_name)
    }

    /// Release every attached extension payload.
    pub fn clear_extensions(&mut self) {
        drop(self.long_link_name.take());
        drop(self.long_name.take());
        drop(self.security_label.take());
    }

    /// Returns true if any extension payload is attached.
    #[must_use]
    pub fn has_extensions(&self) -> bool {
        self.long_link_name.is_some() || self.long_name.is_some() || self.security_label.is_some()
    }
}

impl Default for HeaderRecord {
    fn default() -> Self {
        Self::new_gnu()
    }
}

impl TryFrom<&Block> for HeaderRecord {
    type Error = HeaderError;

    fn try_from(block: &Block) -> Result<Self> {
        Self::from_block(block)
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Split a value into the fixed-field part and the optional full value.
fn split_long(value: String) -> (String, Option<String>) {
    if value.len() <= NAME_SIZE {
        return (value, None);
    }
    let mut end = NAME_SIZE;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    (value[..end].to_owned(), Some(value))
}
