//! Entry-level header codec.
//!
//! This module moves whole entry headers through a block stream. On top of
//! the single-block layout in the crate root it handles:
//!
//! - **GNU long link (type 'K')**: link targets longer than 100 bytes
//! - **GNU long name (type 'L')**: paths longer than 100 bytes
//! - **Extended header (type 'x')**: a single `RHT.security.selinux=` record
//! - **End of archive**: two consecutive zero blocks
//!
//! [`HeaderDecoder`] reads extension entries and attaches their payloads to
//! the [`HeaderRecord`] of the entry that follows. [`HeaderEncoder`] does the
//! reverse. Both take their [`Options`] once, at construction.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use tar_codec::codec::{HeaderDecoder, HeaderEncoder, HeaderRecord, Options};
//!
//! let mut record = HeaderRecord::new_gnu();
//! record.set_name("deep/".repeat(40));
//! record.security_label = Some("system_u:object_r:usr_t:s0".into());
//! record.size = 5;
//!
//! let mut encoder = HeaderEncoder::new(Vec::new(), Options::default());
//! encoder.write_header(&record).unwrap();
//! encoder.write_payload(b"hello").unwrap();
//! encoder.finish().unwrap();
//!
//! let archive = encoder.into_inner();
//! let mut decoder = HeaderDecoder::new(Cursor::new(archive), Options::default());
//! while let Some(entry) = decoder.next_header().unwrap() {
//!     assert_eq!(entry.effective_name(), record.effective_name());
//!     assert_eq!(entry.security_label, record.security_label);
//!     decoder.skip_payload(entry.size).unwrap();
//! }
//! ```

mod decoder;
mod encoder;
mod error;
mod label;
mod options;
mod record;
mod transport;

pub use decoder::{Decoded, HeaderDecoder};
pub use encoder::HeaderEncoder;
pub use error::{CodecError, Result};
pub use label::{extract_label, format_label, record_len, SECURITY_LABEL_TAG};
pub use options::Options;
pub use record::HeaderRecord;
pub use transport::{BlockReader, BlockWriter};
