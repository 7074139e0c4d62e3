//! Block codec for GNU and UStar tar headers.
//!
//! This crate decodes and encodes the per-entry header blocks of a tar
//! stream, including the vendor extensions that carry over-long names and
//! link targets (GNU `'L'`/`'K'` entries) and a single security label stored
//! in an extended header (`'x'`) ahead of the real entry.
//!
//! The crate is split into two layers:
//!
//! - this module: the byte layout of one 512-byte header block, the checksum
//!   rule, and the octal/base-256 field encodings
//! - [`codec`]: the decoder and encoder state machines that move whole
//!   entries (extension blocks included) through a block transport
//!
//! # Header Field Layout
//!
//! All tar headers are 512 bytes. The common fields (offsets 0-156) are shared:
//!
//! | Offset | Size | Field     | Description                              |
//! |--------|------|-----------|------------------------------------------|
//! | 0      | 100  | name      | File path (null-terminated if < 100)     |
//! | 100    | 8    | mode      | File mode in octal ASCII                 |
//! | 108    | 8    | uid       | Owner user ID in octal ASCII             |
//! | 116    | 8    | gid       | Owner group ID in octal ASCII            |
//! | 124    | 12   | size      | File size in octal ASCII                 |
//! | 136    | 12   | mtime     | Modification time (Unix epoch, octal)    |
//! | 148    | 8    | checksum  | Header checksum in octal ASCII           |
//! | 156    | 1    | typeflag  | Entry type (see [`EntryType`])           |
//! | 157    | 100  | linkname  | Link target for hard/symbolic links      |
//!
//! **UStar extension** (offsets 257-500):
//!
//! | Offset | Size | Field     | Description                              |
//! |--------|------|-----------|------------------------------------------|
//! | 257    | 6    | magic     | "ustar\0"                                |
//! | 263    | 2    | version   | "00"                                     |
//! | 265    | 32   | uname     | Owner user name                          |
//! | 297    | 32   | gname     | Owner group name                         |
//! | 329    | 8    | devmajor  | Device major number                      |
//! | 337    | 8    | devminor  | Device minor number                      |
//! | 345    | 155  | prefix    | Path prefix for long names               |
//!
//! **GNU extension** (offsets 345-500, replaces prefix):
//!
//! | Offset | Size | Field       | Description                              |
//! |--------|------|-------------|------------------------------------------|
//! | 345    | 12   | atime       | Access time                              |
//! | 357    | 12   | ctime       | Change time                              |
//! | 369    | 12   | offset      | Multivolume offset                       |
//! | 381    | 4    | longnames   | (deprecated)                             |
//! | 386    | 96   | sparse      | 4 × 24-byte sparse descriptors           |
//! | 482    | 1    | isextended  | More sparse headers follow               |
//! | 483    | 12   | realsize    | Real size of sparse file                 |
//!
//! # Checksum
//!
//! The checksum is the sum of all 512 bytes taken as unsigned values, with
//! the eight checksum bytes counted as ASCII spaces whatever they contain.
//! It is stored as six octal digits, a NUL and a space.
//!
//! # Example
//!
//! ```
//! use tar_codec::{Header, EntryType};
//!
//! let mut header = Header::new_gnu();
//! header.set_path(b"data.txt").unwrap();
//! header.set_size(13).unwrap();
//! header.set_entry_type(EntryType::Regular);
//! header.finalize_checksum();
//!
//! assert!(header.validate());
//! assert_eq!(header.entry_size().unwrap(), 13);
//! ```

pub mod codec;

use std::fmt;
use std::ops::Range;

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size of a tar block in bytes.
pub const BLOCK_SIZE: usize = 512;

/// One raw tar block.
pub type Block = [u8; BLOCK_SIZE];

/// Width of the `name` and `linkname` fields.
pub const NAME_SIZE: usize = 100;

/// Magic string for UStar format headers ("ustar\0").
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";

/// Version field for UStar format headers ("00").
pub const USTAR_VERSION: &[u8; 2] = b"00";

/// Magic string for GNU tar format headers ("ustar ").
pub const GNU_MAGIC: &[u8; 6] = b"ustar ";

/// Version field for GNU tar format headers (" \0").
pub const GNU_VERSION: &[u8; 2] = b" \0";

/// Number of leading magic bytes compared by the magic check.
///
/// Only `"ustar"` is compared, so both UStar and GNU headers pass.
pub const MAGIC_CHECK_LEN: usize = 5;

const CHECKSUM_RANGE: Range<usize> = 148..156;

/// Errors that can occur when parsing or building tar headers.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The provided data is too short to contain a header.
    #[error("insufficient data: expected {BLOCK_SIZE} bytes, got {0}")]
    InsufficientData(usize),

    /// An octal field contains invalid characters.
    #[error("invalid octal field: {0:?}")]
    InvalidOctal(Vec<u8>),

    /// The header checksum does not match the computed value.
    #[error("checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        /// The checksum value stored in the header.
        expected: u64,
        /// The checksum computed from the header bytes.
        computed: u64,
    },

    /// A string does not fit into its fixed-width field.
    #[error("{field} is {len} bytes, field holds {max}")]
    FieldTooLong {
        /// Name of the header field.
        field: &'static str,
        /// Length of the rejected value.
        len: usize,
        /// Width of the field.
        max: usize,
    },

    /// A number does not fit into its field, even base-256 encoded.
    #[error("value {value} does not fit in a {width}-byte numeric field")]
    NumericOverflow {
        /// The rejected value.
        value: u64,
        /// Width of the field.
        width: usize,
    },
}

/// Result type for header operations.
pub type Result<T> = std::result::Result<T, HeaderError>;

// ============================================================================
// Raw Header Structs
// ============================================================================

/// UStar (POSIX.1-2001) tar header format.
///
/// See module-level documentation for the field layout table.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct UstarHeader {
    /// File path name (null-terminated if shorter than 100 bytes).
    pub name: [u8; 100],
    /// File mode in octal ASCII.
    pub mode: [u8; 8],
    /// Owner user ID in octal ASCII.
    pub uid: [u8; 8],
    /// Owner group ID in octal ASCII.
    pub gid: [u8; 8],
    /// File size in octal ASCII.
    pub size: [u8; 12],
    /// Modification time as Unix timestamp in octal ASCII.
    pub mtime: [u8; 12],
    /// Header checksum in octal ASCII.
    pub checksum: [u8; 8],
    /// Entry type flag.
    pub typeflag: u8,
    /// Link target name for hard/symbolic links.
    pub linkname: [u8; 100],
    /// Magic string identifying the format ("ustar\0" for UStar).
    pub magic: [u8; 6],
    /// Format version ("00" for UStar).
    pub version: [u8; 2],
    /// Owner user name (null-terminated).
    pub uname: [u8; 32],
    /// Owner group name (null-terminated).
    pub gname: [u8; 32],
    /// Device major number in octal ASCII (for special files).
    pub devmajor: [u8; 8],
    /// Device minor number in octal ASCII (for special files).
    pub devminor: [u8; 8],
    /// Path prefix for names longer than 100 bytes.
    pub prefix: [u8; 155],
    /// Padding to fill the 512-byte block.
    pub pad: [u8; 12],
}

impl fmt::Debug for UstarHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UstarHeader")
            .field("name", &String::from_utf8_lossy(truncate_null(&self.name)))
            .field("mode", &String::from_utf8_lossy(truncate_null(&self.mode)))
            .field("typeflag", &self.typeflag)
            .field("magic", &self.magic)
            .finish_non_exhaustive()
    }
}

/// GNU tar sparse file chunk descriptor.
///
/// Only present so that [`GnuHeader`] spans the whole block; the codec does
/// not interpret sparse maps.
#[derive(Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct GnuSparseHeader {
    /// Byte offset of this chunk within the file.
    pub offset: [u8; 12],
    /// Number of bytes in this chunk.
    pub numbytes: [u8; 12],
}

/// GNU tar header format.
///
/// Extends UStar with access/change times and sparse metadata in place of
/// the path prefix. See module-level documentation for the field layout table.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct GnuHeader {
    /// File path name (null-terminated if shorter than 100 bytes).
    pub name: [u8; 100],
    /// File mode in octal ASCII.
    pub mode: [u8; 8],
    /// Owner user ID in octal ASCII.
    pub uid: [u8; 8],
    /// Owner group ID in octal ASCII.
    pub gid: [u8; 8],
    /// File size in octal ASCII.
    pub size: [u8; 12],
    /// Modification time as Unix timestamp in octal ASCII.
    pub mtime: [u8; 12],
    /// Header checksum in octal ASCII.
    pub checksum: [u8; 8],
    /// Entry type flag.
    pub typeflag: u8,
    /// Link target name for hard/symbolic links.
    pub linkname: [u8; 100],
    /// Magic string identifying the format ("ustar " for GNU).
    pub magic: [u8; 6],
    /// Format version (" \0" for GNU).
    pub version: [u8; 2],
    /// Owner user name (null-terminated).
    pub uname: [u8; 32],
    /// Owner group name (null-terminated).
    pub gname: [u8; 32],
    /// Device major number in octal ASCII (for special files).
    pub devmajor: [u8; 8],
    /// Device minor number in octal ASCII (for special files).
    pub devminor: [u8; 8],
    /// Access time in octal ASCII.
    pub atime: [u8; 12],
    /// Change time in octal ASCII.
    pub ctime: [u8; 12],
    /// Offset for multivolume archives.
    pub offset: [u8; 12],
    /// Long names support (deprecated).
    pub longnames: [u8; 4],
    /// Unused padding byte.
    pub unused: u8,
    /// Sparse file chunk descriptors (4 entries).
    pub sparse: [GnuSparseHeader; 4],
    /// Flag indicating more sparse headers follow.
    pub isextended: u8,
    /// Real size of sparse file.
    pub realsize: [u8; 12],
    /// Padding to fill the 512-byte block.
    pub pad: [u8; 17],
}

impl fmt::Debug for GnuHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GnuHeader")
            .field("name", &String::from_utf8_lossy(truncate_null(&self.name)))
            .field("mode", &String::from_utf8_lossy(truncate_null(&self.mode)))
            .field("typeflag", &self.typeflag)
            .field("magic", &self.magic)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Entry Type
// ============================================================================

/// Tar entry type stored in the `typeflag` byte.
///
/// Besides the POSIX kinds, three private discriminants mark blocks that
/// describe the *next* entry rather than being entries themselves:
/// [`GnuLongLink`](EntryType::GnuLongLink), [`GnuLongName`](EntryType::GnuLongName)
/// and [`XHeader`](EntryType::XHeader).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file (type '0' or '\0' for old tar compatibility).
    Regular,
    /// Hard link to another file in the archive (type '1').
    Link,
    /// Symbolic link (type '2').
    Symlink,
    /// Character device (type '3').
    Char,
    /// Block device (type '4').
    Block,
    /// Directory (type '5').
    Directory,
    /// FIFO/named pipe (type '6').
    Fifo,
    /// Contiguous file (type '7', rarely used).
    Continuous,
    /// GNU tar long name extension (type 'L').
    GnuLongName,
    /// GNU tar long link extension (type 'K').
    GnuLongLink,
    /// Extended header for the next entry (type 'x').
    XHeader,
    /// Global extended header (type 'g').
    XGlobalHeader,
    /// Unknown or unsupported entry type.
    Other(u8),
}

impl EntryType {
    /// Parse an entry type from a raw byte value.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' | b'\0' => EntryType::Regular,
            b'1' => EntryType::Link,
            b'2' => EntryType::Symlink,
            b'3' => EntryType::Char,
            b'4' => EntryType::Block,
            b'5' => EntryType::Directory,
            b'6' => EntryType::Fifo,
            b'7' => EntryType::Continuous,
            b'L' => EntryType::GnuLongName,
            b'K' => EntryType::GnuLongLink,
            b'x' => EntryType::XHeader,
            b'g' => EntryType::XGlobalHeader,
            other => EntryType::Other(other),
        }
    }

    /// Convert an entry type to its raw byte representation.
    ///
    /// Note that `Regular` is encoded as '0', not '\0'.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            EntryType::Regular => b'0',
            EntryType::Link => b'1',
            EntryType::Symlink => b'2',
            EntryType::Char => b'3',
            EntryType::Block => b'4',
            EntryType::Directory => b'5',
            EntryType::Fifo => b'6',
            EntryType::Continuous => b'7',
            EntryType::GnuLongName => b'L',
            EntryType::GnuLongLink => b'K',
            EntryType::XHeader => b'x',
            EntryType::XGlobalHeader => b'g',
            EntryType::Other(b) => b,
        }
    }

    /// Returns true for the discriminants that describe the following entry.
    #[must_use]
    pub fn is_extension(self) -> bool {
        matches!(
            self,
            EntryType::GnuLongName | EntryType::GnuLongLink | EntryType::XHeader
        )
    }

    /// Returns true if this is a regular file entry.
    #[must_use]
    pub fn is_file(self) -> bool {
        matches!(self, EntryType::Regular | EntryType::Continuous)
    }

    /// Returns true if this is a directory entry.
    #[must_use]
    pub fn is_dir(self) -> bool {
        self == EntryType::Directory
    }

    /// Returns true if this is a symbolic link entry.
    #[must_use]
    pub fn is_symlink(self) -> bool {
        self == EntryType::Symlink
    }

    /// Returns true if this is a hard link entry.
    #[must_use]
    pub fn is_hard_link(self) -> bool {
        self == EntryType::Link
    }
}

impl From<u8> for EntryType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<EntryType> for u8 {
    fn from(entry_type: EntryType) -> Self {
        entry_type.to_byte()
    }
}

// ============================================================================
// Header Wrapper
// ============================================================================

/// One header block with typed accessors.
///
/// Reads go through the [`GnuHeader`] view. The fields up to `devminor` are
/// laid out identically in UStar and GNU headers, so that view works for both.
///
/// # Example
///
/// ```
/// use tar_codec::Header;
///
/// let header = Header::new_ustar();
/// assert!(header.is_ustar());
/// assert!(!header.is_gnu());
/// ```
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct Header {
    bytes: Block,
}

impl Header {
    /// Create a new header with UStar format magic and version.
    #[must_use]
    pub fn new_ustar() -> Self {
        let mut header = Self::from_block([0u8; BLOCK_SIZE]);
        header.set_magic(USTAR_MAGIC, USTAR_VERSION);
        header
    }

    /// Create a new header with GNU tar format magic and version.
    #[must_use]
    pub fn new_gnu() -> Self {
        let mut header = Self::from_block([0u8; BLOCK_SIZE]);
        header.set_magic(GNU_MAGIC, GNU_VERSION);
        header
    }

    /// Wrap an owned block.
    #[must_use]
    pub fn from_block(bytes: Block) -> Self {
        Self { bytes }
    }

    /// View a borrowed block as a header.
    #[must_use]
    pub fn from_block_ref(bytes: &Block) -> &Header {
        zerocopy::transmute_ref!(bytes)
    }

    /// Parse a header from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InsufficientData`] if the slice is shorter than a block.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Header> {
        let block: &Block = bytes
            .get(..BLOCK_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(HeaderError::InsufficientData(bytes.len()))?;
        Ok(Self::from_block_ref(block))
    }

    /// Get a reference to the underlying bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &Block {
        &self.bytes
    }

    /// Get a mutable reference to the underlying bytes.
    pub fn as_mut_bytes(&mut self) -> &mut Block {
        &mut self.bytes
    }

    /// Consume the header and return its block.
    #[must_use]
    pub fn into_block(self) -> Block {
        self.bytes
    }

    /// View this header as a UStar header.
    #[must_use]
    pub fn as_ustar(&self) -> &UstarHeader {
        zerocopy::transmute_ref!(&self.bytes)
    }

    /// View this header as a GNU header.
    #[must_use]
    pub fn as_gnu(&self) -> &GnuHeader {
        zerocopy::transmute_ref!(&self.bytes)
    }

    /// Mutable GNU view, used by the setters.
    pub fn as_gnu_mut(&mut self) -> &mut GnuHeader {
        zerocopy::transmute_mut!(&mut self.bytes)
    }

    /// Mutable UStar view.
    pub fn as_ustar_mut(&mut self) -> &mut UstarHeader {
        zerocopy::transmute_mut!(&mut self.bytes)
    }

    /// Check if this header uses UStar format.
    #[must_use]
    pub fn is_ustar(&self) -> bool {
        self.magic() == USTAR_MAGIC && self.version() == USTAR_VERSION
    }

    /// Check if this header uses GNU tar format.
    #[must_use]
    pub fn is_gnu(&self) -> bool {
        self.magic() == GNU_MAGIC && self.version() == GNU_VERSION
    }

    /// The raw magic field.
    #[must_use]
    pub fn magic(&self) -> &[u8; 6] {
        &self.as_gnu().magic
    }

    /// The raw version field.
    #[must_use]
    pub fn version(&self) -> &[u8; 2] {
        &self.as_gnu().version
    }

    /// Overwrite the magic and version fields.
    pub fn set_magic(&mut self, magic: &[u8; 6], version: &[u8; 2]) {
        let gnu = self.as_gnu_mut();
        gnu.magic = *magic;
        gnu.version = *version;
    }

    /// The raw typeflag byte.
    #[must_use]
    pub fn typeflag(&self) -> u8 {
        self.as_gnu().typeflag
    }

    /// Get the entry type.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_byte(self.typeflag())
    }

    /// Set the typeflag byte.
    pub fn set_typeflag(&mut self, typeflag: u8) {
        self.as_gnu_mut().typeflag = typeflag;
    }

    /// Set the entry type.
    pub fn set_entry_type(&mut self, entry_type: EntryType) {
        self.set_typeflag(entry_type.to_byte());
    }

    /// Get the entry size (payload length) in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the size field is not valid.
    pub fn entry_size(&self) -> Result<u64> {
        parse_numeric(&self.as_gnu().size)
    }

    /// Set the entry size.
    pub fn set_size(&mut self, size: u64) -> Result<()> {
        format_numeric(&mut self.as_gnu_mut().size, size)
    }

    /// Get the file mode (permissions).
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the mode field is not valid
    /// or holds a value wider than 32 bits.
    pub fn mode(&self) -> Result<u32> {
        parse_u32(&self.as_gnu().mode)
    }

    /// Set the file mode.
    pub fn set_mode(&mut self, mode: u32) -> Result<()> {
        format_numeric(&mut self.as_gnu_mut().mode, u64::from(mode))
    }

    /// Get the owner user ID.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the uid field is not valid.
    pub fn uid(&self) -> Result<u64> {
        parse_numeric(&self.as_gnu().uid)
    }

    /// Set the owner user ID.
    pub fn set_uid(&mut self, uid: u64) -> Result<()> {
        format_numeric(&mut self.as_gnu_mut().uid, uid)
    }

    /// Get the owner group ID.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the gid field is not valid.
    pub fn gid(&self) -> Result<u64> {
        parse_numeric(&self.as_gnu().gid)
    }

    /// Set the owner group ID.
    pub fn set_gid(&mut self, gid: u64) -> Result<()> {
        format_numeric(&mut self.as_gnu_mut().gid, gid)
    }

    /// Get the modification time as a Unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the mtime field is not valid.
    pub fn mtime(&self) -> Result<u64> {
        parse_numeric(&self.as_gnu().mtime)
    }

    /// Set the modification time.
    pub fn set_mtime(&mut self, mtime: u64) -> Result<()> {
        format_numeric(&mut self.as_gnu_mut().mtime, mtime)
    }

    /// Get the raw path bytes from the name field.
    #[must_use]
    pub fn path_bytes(&self) -> &[u8] {
        truncate_null(&self.as_gnu().name)
    }

    /// Store `path` in the name field.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldTooLong`] for paths over 100 bytes.
    pub fn set_path(&mut self, path: &[u8]) -> Result<()> {
        write_str_field(&mut self.as_gnu_mut().name, path, "name")
    }

    /// Get the UStar path prefix.
    ///
    /// Returns `None` unless this is a UStar header; GNU headers keep their
    /// access and change times in the same bytes.
    #[must_use]
    pub fn prefix(&self) -> Option<&[u8]> {
        if !self.is_ustar() {
            return None;
        }
        Some(truncate_null(&self.as_ustar().prefix))
    }

    /// Store `prefix` in the UStar prefix field.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldTooLong`] for prefixes over 155 bytes.
    pub fn set_prefix(&mut self, prefix: &[u8]) -> Result<()> {
        write_str_field(&mut self.as_ustar_mut().prefix, prefix, "prefix")
    }

    /// Get the raw link name bytes.
    #[must_use]
    pub fn link_name_bytes(&self) -> &[u8] {
        truncate_null(&self.as_gnu().linkname)
    }

    /// Store `target` in the linkname field.
    pub fn set_link_name(&mut self, target: &[u8]) -> Result<()> {
        write_str_field(&mut self.as_gnu_mut().linkname, target, "linkname")
    }

    /// Get the owner user name.
    ///
    /// Returns `None` for old-style headers without user/group name fields.
    #[must_use]
    pub fn username(&self) -> Option<&[u8]> {
        if !self.is_ustar() && !self.is_gnu() {
            return None;
        }
        Some(truncate_null(&self.as_gnu().uname))
    }

    /// Set the owner user name.
    pub fn set_username(&mut self, name: &[u8]) -> Result<()> {
        write_str_field(&mut self.as_gnu_mut().uname, name, "uname")
    }

    /// Get the owner group name.
    ///
    /// Returns `None` for old-style headers without user/group name fields.
    #[must_use]
    pub fn groupname(&self) -> Option<&[u8]> {
        if !self.is_ustar() && !self.is_gnu() {
            return None;
        }
        Some(truncate_null(&self.as_gnu().gname))
    }

    /// Set the owner group name.
    pub fn set_groupname(&mut self, name: &[u8]) -> Result<()> {
        write_str_field(&mut self.as_gnu_mut().gname, name, "gname")
    }

    /// Get the device major number (for character/block devices).
    ///
    /// Returns `None` for old-style headers and for an all-NUL field.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the field is not valid octal
    /// or does not fit in 32 bits.
    pub fn device_major(&self) -> Result<Option<u32>> {
        if !self.is_ustar() && !self.is_gnu() {
            return Ok(None);
        }
        parse_optional_u32(&self.as_gnu().devmajor)
    }

    /// Set or clear the device major number.
    pub fn set_device_major(&mut self, major: Option<u32>) -> Result<()> {
        format_optional(&mut self.as_gnu_mut().devmajor, major.map(u64::from))
    }

    /// Get the device minor number (for character/block devices).
    ///
    /// Returns `None` for old-style headers and for an all-NUL field.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the field is not valid octal
    /// or does not fit in 32 bits.
    pub fn device_minor(&self) -> Result<Option<u32>> {
        if !self.is_ustar() && !self.is_gnu() {
            return Ok(None);
        }
        parse_optional_u32(&self.as_gnu().devminor)
    }

    /// Set or clear the device minor number.
    pub fn set_device_minor(&mut self, minor: Option<u32>) -> Result<()> {
        format_optional(&mut self.as_gnu_mut().devminor, minor.map(u64::from))
    }

    /// Get the GNU access time. `None` for non-GNU headers.
    pub fn atime(&self) -> Result<Option<u64>> {
        if !self.is_gnu() {
            return Ok(None);
        }
        parse_optional(&self.as_gnu().atime)
    }

    /// Set or clear the GNU access time.
    pub fn set_atime(&mut self, atime: Option<u64>) -> Result<()> {
        format_optional(&mut self.as_gnu_mut().atime, atime)
    }

    /// Get the GNU change time. `None` for non-GNU headers.
    pub fn ctime(&self) -> Result<Option<u64>> {
        if !self.is_gnu() {
            return Ok(None);
        }
        parse_optional(&self.as_gnu().ctime)
    }

    /// Set or clear the GNU change time.
    pub fn set_ctime(&mut self, ctime: Option<u64>) -> Result<()> {
        format_optional(&mut self.as_gnu_mut().ctime, ctime)
    }

    /// The checksum value stored in the header.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the field cannot be parsed.
    pub fn stored_checksum(&self) -> Result<u64> {
        parse_octal(&self.as_gnu().checksum)
    }

    /// Verify the header checksum.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::ChecksumMismatch`] if the checksum is invalid,
    /// or [`HeaderError::InvalidOctal`] if the stored checksum cannot be parsed.
    pub fn verify_checksum(&self) -> Result<()> {
        verify_checksum(&self.bytes)
    }

    /// Returns true if the stored checksum matches the computed one.
    #[must_use]
    pub fn validate(&self) -> bool {
        validate(&self.bytes)
    }

    /// Compute the header checksum. See [`compute_checksum`].
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        compute_checksum(&self.bytes)
    }

    /// Compute the checksum and store it as six octal digits, NUL, space.
    pub fn finalize_checksum(&mut self) {
        let sum = self.compute_checksum();
        let field = &mut self.as_gnu_mut().checksum;
        // 512 * 255 fits in six octal digits
        let digits = format!("{sum:06o}");
        field[..6].copy_from_slice(digits.as_bytes());
        field[6] = b'\0';
        field[7] = b' ';
    }

    /// Check if this header represents an empty block (all zeros).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Fast end-of-archive check: the name field starts with NUL.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.bytes[0] == 0
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new_gnu()
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("path", &String::from_utf8_lossy(self.path_bytes()))
            .field("entry_type", &self.entry_type())
            .field("size", &self.entry_size().ok())
            .field("mode", &self.mode().ok().map(|m| format!("{m:04o}")))
            .field("is_ustar", &self.is_ustar())
            .field("is_gnu", &self.is_gnu())
            .finish()
    }
}

// ============================================================================
// Checksum
// ============================================================================

/// Sum all bytes of `block` as unsigned values, counting the eight checksum
/// bytes as ASCII spaces regardless of their content.
#[must_use]
pub fn compute_checksum(block: &Block) -> u64 {
    block
        .iter()
        .enumerate()
        .map(|(i, &byte)| {
            if CHECKSUM_RANGE.contains(&i) {
                u64::from(b' ')
            } else {
                u64::from(byte)
            }
        })
        .sum()
}

/// Compare the stored checksum against [`compute_checksum`].
///
/// # Errors
///
/// Returns [`HeaderError::ChecksumMismatch`] on mismatch and
/// [`HeaderError::InvalidOctal`] if the stored field is not octal.
pub fn verify_checksum(block: &Block) -> Result<()> {
    let expected = parse_octal(&block[CHECKSUM_RANGE])?;
    let computed = compute_checksum(block);
    if expected == computed {
        Ok(())
    } else {
        Err(HeaderError::ChecksumMismatch { expected, computed })
    }
}

/// Boolean form of [`verify_checksum`]; an unparseable field is invalid.
#[must_use]
pub fn validate(block: &Block) -> bool {
    verify_checksum(block).is_ok()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse an octal ASCII field into a u64.
///
/// Octal fields in tar headers are ASCII strings with optional leading
/// spaces and trailing spaces or null bytes. For example:
/// - `"0000644\0"` -> 420 (file mode 0644)
/// - `"     123 "` -> 83
///
/// # Errors
///
/// Returns [`HeaderError::InvalidOctal`] if the field contains invalid
/// characters (anything other than spaces, digits 0-7, or null bytes).
pub fn parse_octal(bytes: &[u8]) -> Result<u64> {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == b'\0')
        .map_or(bytes.len(), |i| start + i);

    let trimmed = &bytes[start..end];

    if trimmed.is_empty() {
        return Ok(0);
    }

    let mut value: u64 = 0;
    for &byte in trimmed {
        if !byte.is_ascii_digit() || byte > b'7' {
            return Err(HeaderError::InvalidOctal(bytes.to_vec()));
        }
        value = value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or_else(|| HeaderError::InvalidOctal(bytes.to_vec()))?;
    }

    Ok(value)
}

/// Parse a numeric field that may be octal ASCII or GNU base-256 encoded.
///
/// When the high bit of the first byte is set (0x80), the value is stored
/// as big-endian binary in the remaining bytes. Otherwise, it's parsed as
/// octal ASCII.
///
/// # Errors
///
/// Returns [`HeaderError::InvalidOctal`] if octal parsing fails or the
/// binary value does not fit in a u64.
pub fn parse_numeric(bytes: &[u8]) -> Result<u64> {
    if bytes.is_empty() {
        return Ok(0);
    }

    if bytes[0] & 0x80 != 0 {
        let mut value: u64 = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            let b = if i == 0 { byte & 0x7f } else { byte };
            if value >> 56 != 0 {
                return Err(HeaderError::InvalidOctal(bytes.to_vec()));
            }
            value = (value << 8) | u64::from(b);
        }
        Ok(value)
    } else {
        parse_octal(bytes)
    }
}

/// Write `value` into a numeric field.
///
/// Values that fit are written as zero-padded octal filling all but the last
/// byte, which is NUL. Larger values fall back to GNU base-256.
///
/// # Errors
///
/// Returns [`HeaderError::NumericOverflow`] if even base-256 cannot hold it.
pub fn format_numeric(field: &mut [u8], value: u64) -> Result<()> {
    let width = field.len();
    let digits = width.saturating_sub(1);
    let octal = format!("{value:0digits$o}");
    if octal.len() <= digits {
        field[..digits].copy_from_slice(octal.as_bytes());
        field[digits] = b'\0';
        return Ok(());
    }

    let payload = width.saturating_sub(1);
    if payload < 8 && value >> (8 * payload) != 0 {
        return Err(HeaderError::NumericOverflow { value, width });
    }
    field.fill(0);
    for (slot, byte) in field.iter_mut().rev().zip(value.to_be_bytes().iter().rev()) {
        *slot = *byte;
    }
    field[0] |= 0x80;
    Ok(())
}

/// Parse a numeric field where an all-NUL field means "not set".
fn parse_optional(bytes: &[u8]) -> Result<Option<u64>> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(None);
    }
    parse_numeric(bytes).map(Some)
}

/// Parse a numeric field that must fit in 32 bits.
fn parse_u32(bytes: &[u8]) -> Result<u32> {
    let value = parse_numeric(bytes)?;
    u32::try_from(value).map_err(|_| HeaderError::InvalidOctal(bytes.to_vec()))
}

fn parse_optional_u32(bytes: &[u8]) -> Result<Option<u32>> {
    parse_optional(bytes)?
        .map(|value| u32::try_from(value).map_err(|_| HeaderError::InvalidOctal(bytes.to_vec())))
        .transpose()
}

fn format_optional(field: &mut [u8], value: Option<u64>) -> Result<()> {
    match value {
        Some(value) => format_numeric(field, value),
        None => {
            field.fill(0);
            Ok(())
        }
    }
}

/// Copy `value` into a fixed-width string field, NUL-padding the rest.
fn write_str_field(field: &mut [u8], value: &[u8], name: &'static str) -> Result<()> {
    if value.len() > field.len() {
        return Err(HeaderError::FieldTooLong {
            field: name,
            len: value.len(),
            max: field.len(),
        });
    }
    field.fill(0);
    field[..value.len()].copy_from_slice(value);
    Ok(())
}

/// Truncate a byte slice at the first null byte.
///
/// This is used to extract null-terminated strings from fixed-size fields.
/// If no null byte is found, returns the entire slice.
///
/// # Example
///
/// ```
/// use tar_codec::truncate_null;
///
/// assert_eq!(truncate_null(b"hello\0world"), b"hello");
/// assert_eq!(truncate_null(b"no null here"), b"no null here");
/// assert_eq!(truncate_null(b"\0empty"), b"");
/// ```
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(size_of::<UstarHeader>(), BLOCK_SIZE);
        assert_eq!(size_of::<GnuHeader>(), BLOCK_SIZE);
        assert_eq!(size_of::<Header>(), BLOCK_SIZE);
        assert_eq!(size_of::<GnuSparseHeader>(), 24);
    }

    #[test]
    fn test_new_ustar() {
        let header = Header::new_ustar();
        assert!(header.is_ustar());
        assert!(!header.is_gnu());
    }

    #[test]
    fn test_new_gnu() {
        let header = Header::new_gnu();
        assert!(header.is_gnu());
        assert!(!header.is_ustar());
        assert_eq!(&header.as_gnu().magic, GNU_MAGIC);
        assert_eq!(&header.as_ustar().version, GNU_VERSION);
    }

    #[test]
    fn test_from_bytes_insufficient() {
        let short = [0u8; 100];
        let result = Header::from_bytes(&short);
        assert!(matches!(result, Err(HeaderError::InsufficientData(100))));
    }

    #[test]
    fn test_from_bytes_success() {
        let mut data = [0u8; 600];
        data[257..263].copy_from_slice(USTAR_MAGIC);
        data[263..265].copy_from_slice(USTAR_VERSION);

        let header = Header::from_bytes(&data).unwrap();
        assert!(header.is_ustar());
    }

    #[test]
    fn test_parse_octal() {
        assert_eq!(parse_octal(b"0000644\0").unwrap(), 0o644);
        assert_eq!(parse_octal(b"0000755\0").unwrap(), 0o755);
        assert_eq!(parse_octal(b"     123 ").unwrap(), 0o123);
        assert_eq!(parse_octal(b"0").unwrap(), 0);
        assert_eq!(parse_octal(b"").unwrap(), 0);
        assert_eq!(parse_octal(b"   \0\0\0").unwrap(), 0);
        assert_eq!(parse_octal(b"012345\0 ").unwrap(), 0o12345);
        assert_eq!(parse_octal(b"0012345 ").unwrap(), 0o12345);
    }

    #[test]
    fn test_parse_octal_invalid() {
        assert!(parse_octal(b"abc").is_err());
        assert!(parse_octal(b"128").is_err());
    }

    #[test]
    fn test_format_numeric_octal() {
        let mut mode = [0xffu8; 8];
        format_numeric(&mut mode, 0o644).unwrap();
        assert_eq!(&mode, b"0000644\0");

        let mut size = [0u8; 12];
        format_numeric(&mut size, 13).unwrap();
        assert_eq!(&size, b"00000000015\0");
    }

    #[test]
    fn test_format_numeric_base256() {
        // 8 GiB does not fit in 11 octal digits
        let big = 8 * 1024 * 1024 * 1024u64;
        let mut size = [0u8; 12];
        format_numeric(&mut size, big).unwrap();
        assert_eq!(size[0], 0x80);
        assert_eq!(parse_numeric(&size).unwrap(), big);
    }

    #[test]
    fn test_format_numeric_overflow() {
        let mut uid = [0u8; 8];
        let err = format_numeric(&mut uid, u64::MAX).unwrap_err();
        assert!(matches!(err, HeaderError::NumericOverflow { width: 8, .. }));
    }

    #[test]
    fn test_truncate_null() {
        assert_eq!(truncate_null(b"hello\0world"), b"hello");
        assert_eq!(truncate_null(b"no null"), b"no null");
        assert_eq!(truncate_null(b"\0start"), b"");
        assert_eq!(truncate_null(b""), b"");
    }

    #[test]
    fn test_entry_type_roundtrip() {
        let types = [
            EntryType::Regular,
            EntryType::Link,
            EntryType::Symlink,
            EntryType::Char,
            EntryType::Block,
            EntryType::Directory,
            EntryType::Fifo,
            EntryType::Continuous,
            EntryType::GnuLongName,
            EntryType::GnuLongLink,
            EntryType::XHeader,
            EntryType::XGlobalHeader,
        ];

        for t in types {
            assert_eq!(EntryType::from_byte(t.to_byte()), t);
        }
    }

    #[test]
    fn test_entry_type_extensions() {
        assert!(EntryType::from_byte(b'K').is_extension());
        assert!(EntryType::from_byte(b'L').is_extension());
        assert!(EntryType::from_byte(b'x').is_extension());
        assert!(!EntryType::from_byte(b'g').is_extension());
        assert!(!EntryType::Regular.is_extension());
        assert_eq!(EntryType::from_byte(b'\0'), EntryType::Regular);
    }

    #[test]
    fn test_checksum_blanks_field() {
        let mut header = Header::new_gnu();
        header.set_path(b"data.txt").unwrap();
        let before = header.compute_checksum();

        // the stored checksum never contributes to the sum
        header.as_gnu_mut().checksum = *b"77777777";
        assert_eq!(header.compute_checksum(), before);

        let zero = [0u8; BLOCK_SIZE];
        assert_eq!(compute_checksum(&zero), 8 * 32);
    }

    #[test]
    fn test_finalize_checksum_format() {
        let mut header = Header::new_ustar();
        header.set_path(b"a").unwrap();
        header.finalize_checksum();

        let field = &header.as_gnu().checksum;
        assert!(field[..6].iter().all(u8::is_ascii_digit));
        assert_eq!(&field[6..], b"\0 ");
        assert_eq!(header.stored_checksum().unwrap(), header.compute_checksum());
        assert!(header.validate());
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut header = Header::new_gnu();
        header.set_path(b"file").unwrap();
        header.finalize_checksum();
        header.as_mut_bytes()[0] = b'g';

        assert!(!header.validate());
        assert!(matches!(
            header.verify_checksum(),
            Err(HeaderError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_is_empty_and_terminator() {
        let mut header = Header::new_ustar();
        assert!(!header.is_empty());
        assert!(header.is_terminator());

        header.set_path(b"x").unwrap();
        assert!(!header.is_terminator());

        header.as_mut_bytes().fill(0);
        assert!(header.is_empty());
    }

    #[test]
    fn test_path_and_link_name() {
        let mut header = Header::new_ustar();
        header.set_path(b"hello").unwrap();
        header.set_link_name(b"target").unwrap();
        assert_eq!(header.path_bytes(), b"hello");
        assert_eq!(header.link_name_bytes(), b"target");
    }

    #[test]
    fn test_path_exactly_100_bytes() {
        let path = [b'p'; 100];
        let mut header = Header::new_gnu();
        header.set_path(&path).unwrap();
        assert_eq!(header.path_bytes(), &path[..]);

        let err = header.set_path(&[b'p'; 101]).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::FieldTooLong {
                field: "name",
                len: 101,
                max: 100
            }
        ));
    }

    #[test]
    fn test_optional_fields() {
        let mut header = Header::new_gnu();
        assert_eq!(header.device_major().unwrap(), None);
        assert_eq!(header.atime().unwrap(), None);

        header.set_device_major(Some(8)).unwrap();
        header.set_atime(Some(1_700_000_000)).unwrap();
        assert_eq!(header.device_major().unwrap(), Some(8));
        assert_eq!(header.atime().unwrap(), Some(1_700_000_000));

        header.set_device_major(None).unwrap();
        assert_eq!(header.device_major().unwrap(), None);

        // atime/ctime overlap the UStar prefix and are GNU-only
        let ustar = Header::new_ustar();
        assert_eq!(ustar.ctime().unwrap(), None);
    }

    #[test]
    fn test_numeric_wider_than_u32() {
        let mut header = Header::new_gnu();
        format_numeric(&mut header.as_gnu_mut().mode, 1 << 32).unwrap();
        assert_eq!(header.as_gnu().mode[0], 0x80);
        assert!(matches!(header.mode(), Err(HeaderError::InvalidOctal(_))));

        format_numeric(&mut header.as_gnu_mut().devmajor, u64::from(u32::MAX) + 7).unwrap();
        assert!(matches!(
            header.device_major(),
            Err(HeaderError::InvalidOctal(_))
        ));

        // the widest value that does fit still parses
        format_numeric(&mut header.as_gnu_mut().devminor, u64::from(u32::MAX)).unwrap();
        assert_eq!(header.device_minor().unwrap(), Some(u32::MAX));
    }

    #[test]
    fn test_ustar_prefix() {
        let mut header = Header::new_ustar();
        assert_eq!(header.prefix(), Some(&b""[..]));
        header.set_prefix(b"usr/share").unwrap();
        assert_eq!(header.prefix(), Some(&b"usr/share"[..]));
        assert_eq!(&header.as_bytes()[345..354], b"usr/share");

        let err = header.set_prefix(&[b'p'; 156]).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::FieldTooLong {
                field: "prefix",
                len: 156,
                max: 155
            }
        ));

        // GNU headers have no prefix
        assert_eq!(Header::new_gnu().prefix(), None);
    }

    #[test]
    fn test_username_groupname() {
        let mut header = Header::new_ustar();
        header.set_username(b"root").unwrap();
        assert_eq!(header.username(), Some(&b"root"[..]));
        assert_eq!(header.groupname(), Some(&b""[..]));

        let mut old_header = Header::new_ustar();
        old_header.as_mut_bytes()[257..265].fill(0);
        assert!(old_header.username().is_none());
        assert!(old_header.groupname().is_none());
    }

    #[test]
    fn test_debug_impls() {
        let header = Header::new_gnu();
        let _ = format!("{header:?}");
        let _ = format!("{:?}", header.as_gnu());
        let _ = format!("{:?}", header.as_ustar());
    }
}
