//! Metadata-insensitive bytecode comparison.
//!
//! Solc appends a CBOR encoded metadata block (content hash of the
//! metadata file and the compiler version) followed by its 2-byte length
//! to the runtime code. Two compilations of the same logic may differ only
//! there, so the block is removed before comparing.

mod metadata;

pub use metadata::trailing_metadata_size;

fn split_prefix(code: &str) -> (&str, &str) {
    let trimmed = code.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(body) => (&trimmed[..2], body),
        None => ("", trimmed),
    }
}

/// Removes every trailing metadata block from a hex encoded bytecode.
///
/// Returns the input unchanged if it is not valid hex or does not end with
/// a metadata block. The kept part preserves the spelling of the input
/// (`0x` prefix and letter case), so `strip(strip(code)) == strip(code)`.
pub fn strip(code: &str) -> &str {
    let trimmed = code.trim();
    let (prefix, body) = split_prefix(trimmed);
    let bytes = match hex::decode(body) {
        Ok(bytes) => bytes,
        Err(_) => return code,
    };

    let mut end = bytes.len();
    while let Some(size) = trailing_metadata_size(&bytes[..end]) {
        end -= size;
    }
    if end == bytes.len() {
        return code;
    }
    &trimmed[..prefix.len() + end * 2]
}

/// Compares two hex encoded bytecodes ignoring the `0x` prefix, letter
/// case and surrounding whitespace.
pub fn same_code(left: &str, right: &str) -> bool {
    split_prefix(left).1.eq_ignore_ascii_case(split_prefix(right).1)
}

/// Hex body without the `0x` prefix.
pub fn without_prefix(code: &str) -> &str {
    split_prefix(code).1
}
