//! Decoder and encoder configuration.

/// Capability flags and resource limits for one archive session.
///
/// An `Options` value is handed to [`HeaderDecoder`] or [`HeaderEncoder`]
/// when it is constructed and stays fixed for the life of that instance.
///
/// # Example
///
/// ```
/// use tar_codec::codec::Options;
///
/// // Accept archives whose headers carry stale checksums
/// let options = Options {
///     ignore_checksum: true,
///     ..Default::default()
/// };
/// assert!(options.check_magic);
/// ```
///
/// [`HeaderDecoder`]: super::HeaderDecoder
/// [`HeaderEncoder`]: super::HeaderEncoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Skip zero blocks instead of stopping at two in a row.
    ///
    /// Default: false.
    pub ignore_end_marker: bool,

    /// Require the magic field to start with `"ustar"`.
    ///
    /// Default: true.
    pub check_magic: bool,

    /// Require the version field to be `"00"`.
    ///
    /// GNU headers store `" \0"` here, so enabling this rejects them.
    ///
    /// Default: false.
    pub check_version: bool,

    /// Accept headers whose stored checksum does not match.
    ///
    /// Default: false.
    pub ignore_checksum: bool,

    /// Resolve and emit GNU long name (`'L'`) and long link (`'K'`) entries.
    ///
    /// Default: true.
    pub gnu_extensions: bool,

    /// Resolve and emit the security label extended header (`'x'`).
    ///
    /// Default: true.
    pub security_label: bool,

    /// Maximum size of one GNU long name/link payload in bytes.
    ///
    /// Larger payloads cause a [`CodecError::ExtensionTooLarge`] error.
    ///
    /// Default: 1 MiB.
    ///
    /// [`CodecError::ExtensionTooLarge`]: super::CodecError::ExtensionTooLarge
    pub max_extension_size: u64,

    /// Maximum number of extension headers in front of one entry.
    ///
    /// Exceeding this causes a [`CodecError::TooManyExtensions`] error.
    ///
    /// Default: 16.
    ///
    /// [`CodecError::TooManyExtensions`]: super::CodecError::TooManyExtensions
    pub max_pending_extensions: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignore_end_marker: false,
            check_magic: true,
            check_version: false,
            ignore_checksum: false,
            gnu_extensions: true,
            security_label: true,
            max_extension_size: 1024 * 1024, // 1 MiB
            max_pending_extensions: 16,
        }
    }
}

impl Options {
    /// Create `Options` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus the version check, so only POSIX UStar headers pass.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            check_version: true,
            ..Self::default()
        }
    }

    /// Accept damaged or non-standard archives.
    ///
    /// Magic and checksum are not checked and zero blocks are skipped, so
    /// decoding only stops at the end of the stream.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            ignore_end_marker: true,
            check_magic: false,
            ignore_checksum: true,
            ..Self::default()
        }
    }
}
