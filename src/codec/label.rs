//! Security label records carried in an extended header block.
//!
//! The label travels as a single PAX-style record,
//! `"<len> RHT.security.selinux=<label>\n"`, where `<len>` is the length of
//! the whole line in decimal, its own digits included. Only this one key is
//! recognized; anything else in the block is ignored.

use crate::{truncate_null, Block, BLOCK_SIZE};

use super::error::{CodecError, Result};

/// Record key for the security label.
pub const SECURITY_LABEL_TAG: &str = "RHT.security.selinux=";

/// Find the security label in one extended header block.
///
/// The last byte of the block is treated as NUL, so the scan never runs past
/// the block. The label runs from the end of the tag to the next newline.
/// A record with no newline after the tag, or a tag with nothing after it,
/// yields `None`.
#[must_use]
pub fn extract_label(block: &Block) -> Option<String> {
    let text = truncate_null(&block[..BLOCK_SIZE - 1]);
    let tag = SECURITY_LABEL_TAG.as_bytes();
    let pos = text.windows(tag.len()).position(|w| w == tag)?;
    let rest = &text[pos + tag.len()..];
    let end = rest.iter().position(|&b| b == b'\n')?;
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&rest[..end]).into_owned())
}

/// Length of the formatted record for a label of `label_len` bytes.
///
/// The length prefix counts its own digits, so the total is a fixed point:
/// estimate with the digit count of the rest of the line, then correct once
/// if the estimate crossed into one more digit.
#[must_use]
pub fn record_len(label_len: usize) -> usize {
    // space, tag, label, newline
    let base = 1 + SECURITY_LABEL_TAG.len() + label_len + 1;
    let estimate = base + decimal_digits(base);
    base + decimal_digits(estimate)
}

/// Format `label` as one zero-padded extended header data block.
///
/// Returns the record length (the `size` of the extended header) and the block.
///
/// # Errors
///
/// Returns [`CodecError::InvalidLabel`] if the label contains a newline or
/// NUL, and [`CodecError::LabelTooLong`] if the record would not fit in one
/// block.
pub fn format_label(label: &str) -> Result<(usize, Block)> {
    if label.bytes().any(|b| b == b'\n' || b == 0) {
        return Err(CodecError::InvalidLabel);
    }
    let len = record_len(label.len());
    if len >= BLOCK_SIZE {
        return Err(CodecError::LabelTooLong { len });
    }

    let line = format!("{len} {SECURITY_LABEL_TAG}{label}\n");
    debug_assert_eq!(line.len(), len);

    let mut block = [0u8; BLOCK_SIZE];
    block[..line.len()].copy_from_slice(line.as_bytes());
    Ok((len, block))
}

fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
