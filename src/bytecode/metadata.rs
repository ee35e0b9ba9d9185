use solidity_metadata::MetadataHash;

/// Returns the size of the trailing metadata block including its
/// 2-byte big-endian length suffix, if `code` ends with one.
pub fn trailing_metadata_size(code: &[u8]) -> Option<usize> {
    let len = code.len();
    if len < 2 {
        return None;
    }
    let encoded_length = u16::from_be_bytes([code[len - 2], code[len - 1]]) as usize;
    if encoded_length == 0 || encoded_length + 2 > len {
        return None;
    }
    let start = len - 2 - encoded_length;
    let (_, decoded_length) = MetadataHash::from_cbor(&code[start..len - 2]).ok()?;
    // Solidity does not count the 2 length bytes as part of the metadata
    (decoded_length == encoded_length).then_some(encoded_length + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const IPFS_METADATA: &str = "a26469706673582212202e82fb6222f966f0e56dc49cd1fb8a6b5eac9bdf74f62b8a5e9d8812901095d664736f6c634300080e";

    fn decode(hex: &str) -> Vec<u8> {
        hex::decode(hex).unwrap()
    }

    #[test]
    fn trailing_size_of_ipfs_metadata() {
        let code = decode(&format!("6080604052{IPFS_METADATA}0033"));
        assert_eq!(trailing_metadata_size(&code), Some(0x33 + 2));
    }

    #[test]
    fn trailing_size_of_bzzr0_metadata() {
        // {"bzzr0": h'...'}, used by solc before 0.5.9
        let code = decode(
            "6080604052a165627a7a72305820b3b2f8e4ab1e8a3a3fefc2e9f1a993f3bdb688b6df1e1b8cc0b200ee664d28e50029",
        );
        assert_eq!(trailing_metadata_size(&code), Some(0x29 + 2));
    }

    #[test]
    fn trailing_size_requires_matching_length_suffix() {
        // suffix one byte longer than the map, the extra byte is code
        let wrong_suffix = decode(&format!("60{IPFS_METADATA}0034"));
        assert_eq!(trailing_metadata_size(&wrong_suffix), None);

        // suffix longer than the whole code
        let too_long = decode(&format!("{IPFS_METADATA}00ff"));
        assert_eq!(trailing_metadata_size(&too_long), None);

        assert_eq!(trailing_metadata_size(&decode("6080604052")), None);
        assert_eq!(trailing_metadata_size(&decode("6080604052600080fd0007")), None);
        assert_eq!(trailing_metadata_size(&decode("00")), None);
        assert_eq!(trailing_metadata_size(&[]), None);
    }
}
