//! Encode/decode round trips and cross-checks against the `tar` crate.

use std::io::Cursor;

use proptest::prelude::*;
use similar_asserts::assert_eq;

use tar_codec::codec::{HeaderDecoder, HeaderEncoder, HeaderRecord, Options};
use tar_codec::{compute_checksum, validate, EntryType, Header, BLOCK_SIZE};

fn encode(options: &Options, record: &HeaderRecord) -> Vec<u8> {
    let mut encoder = HeaderEncoder::new(Vec::new(), options.clone());
    encoder.write_header(record).unwrap();
    encoder.finish().unwrap();
    encoder.into_inner()
}

fn decode(options: &Options, data: Vec<u8>) -> HeaderRecord {
    let mut decoder = HeaderDecoder::new(Cursor::new(data), options.clone());
    let record = decoder.next_header().unwrap().expect("one entry");
    assert!(decoder.next_header().unwrap().is_none());
    record
}

#[test]
fn test_plain_record_roundtrip() {
    let mut record = HeaderRecord::new_gnu();
    record.set_name("usr/share/doc/README");
    record.mode = 0o100644;
    record.uid = 0;
    record.gid = 0;
    record.size = 2048;
    record.mtime = 1_650_000_000;
    record.uname = "root".into();
    record.gname = "root".into();
    record.atime = Some(1_650_000_100);

    let options = Options::default();
    let data = encode(&options, &record);
    assert_eq!(data.len(), 3 * BLOCK_SIZE);

    let block: &[u8; BLOCK_SIZE] = data[..BLOCK_SIZE].try_into().unwrap();
    assert!(validate(block));

    let decoded = decode(&options, data.clone());
    assert_eq!(
        HeaderRecord {
            checksum: 0,
            ..decoded.clone()
        },
        record
    );
    assert_eq!(decoded.checksum, compute_checksum(block));
}

#[test]
fn test_ustar_record_roundtrip() {
    let mut record = HeaderRecord::new_ustar();
    record.set_name("dev/null");
    record.set_entry_type(EntryType::Char);
    record.mode = 0o666;
    record.dev_major = Some(1);
    record.dev_minor = Some(3);

    let options = Options::strict();
    let decoded = decode(&options, encode(&options, &record));
    assert_eq!(decoded.entry_type(), EntryType::Char);
    assert_eq!((decoded.dev_major, decoded.dev_minor), (Some(1), Some(3)));
    assert_eq!(decoded.atime, None);
}

#[test]
fn test_large_size_uses_base256() {
    let mut record = HeaderRecord::new_gnu();
    record.set_name("huge.img");
    record.size = 100 * 1024 * 1024 * 1024;

    let block = record.to_block().unwrap();
    assert_eq!(block[124], 0x80);

    // the tar crate understands the same encoding
    let tar_header = tar::Header::from_byte_slice(&block);
    assert_eq!(tar_header.size().unwrap(), record.size);

    let decoded = HeaderRecord::from_block(&block).unwrap();
    assert_eq!(decoded.size, record.size);
}

/// Strategy for path segments made of portable characters.
fn path_strategy(min: usize, max: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-zA-Z0-9_][a-zA-Z0-9_.+-]*(/[a-zA-Z0-9_][a-zA-Z0-9_.+-]*)*")
        .expect("valid regex")
        .prop_filter("length in range", move |s| s.len() >= min && s.len() <= max)
}

/// Strategy for labels shaped like `user:role:type:level`.
fn label_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z_]{1,40}:[a-z_]{1,40}:[a-z_]{1,80}:s[0-9](-s[0-9])?")
        .expect("valid regex")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_checksum_invariant(
        name in path_strategy(1, 100),
        mode in 0u32..0o7777,
        uid in 0u64..0o7777777,
        size in 0u64..0o77777777777,
        mtime in 0u64..0o77777777777,
        typeflag in prop::sample::select(vec![b'0', b'1', b'2', b'5', b'7']),
    ) {
        let mut record = HeaderRecord::new_gnu();
        record.set_name(name);
        record.mode = mode;
        record.uid = uid;
        record.size = size;
        record.mtime = mtime;
        record.typeflag = typeflag;

        let block = record.to_block().unwrap();
        let header = Header::from_block_ref(&block);
        prop_assert_eq!(header.stored_checksum().unwrap(), compute_checksum(&block));
        prop_assert!(header.verify_checksum().is_ok());

        // the tar crate agrees on the checksum and the fields
        let tar_header = tar::Header::from_byte_slice(&block);
        prop_assert_eq!(tar_header.cksum().unwrap() as u64, compute_checksum(&block));
        prop_assert_eq!(tar_header.size().unwrap(), size);
        prop_assert_eq!(tar_header.mode().unwrap(), mode);
        let tar_path = tar_header.path_bytes();
        prop_assert_eq!(tar_path.as_ref(), record.name.as_bytes());
    }

    #[test]
    fn test_long_name_roundtrip(name in path_strategy(101, 400)) {
        let mut record = HeaderRecord::new_gnu();
        record.set_name(name.clone());
        prop_assert!(record.long_name.is_some());

        let options = Options::default();
        let data = encode(&options, &record);
        let decoded = decode(&options, data.clone());
        prop_assert_eq!(decoded.effective_name(), name.as_str());

        // and so does the tar crate
        let mut archive = tar::Archive::new(Cursor::new(data));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        let entry_path = entry.path_bytes();
        prop_assert_eq!(entry_path.as_ref(), name.as_bytes());
    }

    #[test]
    fn test_long_link_roundtrip(target in path_strategy(101, 300)) {
        let mut record = HeaderRecord::new_gnu();
        record.set_name("link");
        record.set_entry_type(EntryType::Symlink);
        record.set_link_name(target.clone());

        let options = Options::default();
        let decoded = decode(&options, encode(&options, &record));
        prop_assert_eq!(decoded.effective_link_name(), target.as_str());
        prop_assert_eq!(decoded.entry_type(), EntryType::Symlink);
    }

    #[test]
    fn test_label_roundtrip(label in label_strategy(), name in path_strategy(1, 250)) {
        let mut record = HeaderRecord::new_gnu();
        record.set_name(name.clone());
        record.security_label = Some(label.clone());

        let options = Options::default();
        let decoded = decode(&options, encode(&options, &record));
        prop_assert_eq!(decoded.security_label.as_deref(), Some(label.as_str()));
        prop_assert_eq!(decoded.effective_name(), name.as_str());
    }
}
