//! Base64 codec with an explicit alphabet and padding policy.
//!
//! Encoding follows the padding policy of the chosen [`Alphabet`]. Decoding is
//! strict about content but tolerant about padding presence: `=` may be
//! present or absent, but when present it must complete the final quantum.
//! Token segments always go through [`encode_segment`], which never pads.

use crate::error::{JwtError, JwtResult};
use ::base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use ::base64::engine::GeneralPurpose;
use ::base64::Engine;

const PAD: char = '=';

/// Base64 alphabet and padding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    /// RFC 4648 standard alphabet (`+/`) with `=` padding.
    Base64,
    /// RFC 4648 standard alphabet (`+/`) without padding.
    Base64NoPad,
    /// URL-safe alphabet (`-_`) with `=` padding.
    Base64Url,
    /// URL-safe alphabet (`-_`) without padding. Used for token segments.
    Base64UrlNoPad,
}

impl Alphabet {
    /// Whether [`encode`] emits `=` padding for this alphabet.
    #[must_use]
    pub fn pads(self) -> bool {
        matches!(self, Alphabet::Base64 | Alphabet::Base64Url)
    }

    fn encoder(self) -> &'static GeneralPurpose {
        match self {
            Alphabet::Base64 => &STANDARD,
            Alphabet::Base64NoPad => &STANDARD_NO_PAD,
            Alphabet::Base64Url => &URL_SAFE,
            Alphabet::Base64UrlNoPad => &URL_SAFE_NO_PAD,
        }
    }

    // Padding is stripped before decoding, so decoding always runs unpadded.
    fn decoder(self) -> &'static GeneralPurpose {
        match self {
            Alphabet::Base64 | Alphabet::Base64NoPad => &STANDARD_NO_PAD,
            Alphabet::Base64Url | Alphabet::Base64UrlNoPad => &URL_SAFE_NO_PAD,
        }
    }
}

/// Encode bytes under the given alphabet.
pub fn encode<T: AsRef<[u8]>>(input: T, alphabet: Alphabet) -> String {
    alphabet.encoder().encode(input)
}

/// Decode a string under the given alphabet.
///
/// Accepts padded and unpadded input. Rejects characters outside the
/// alphabet, more than two padding characters, padding that leaves the
/// length off a multiple of four, an unpadded length of `1 (mod 4)` and
/// non-zero trailing bits.
pub fn decode(input: &str, alphabet: Alphabet) -> JwtResult<Vec<u8>> {
    let trimmed = trim_padding(input);
    let padding = input.len() - trimmed.len();

    if padding > 2 {
        return Err(JwtError::base64("too much padding"));
    }
    if padding > 0 && input.len() % 4 != 0 {
        return Err(JwtError::base64(
            "padding does not complete the final quantum",
        ));
    }
    if trimmed.len() % 4 == 1 {
        return Err(JwtError::base64("invalid input length"));
    }

    alphabet
        .decoder()
        .decode(trimmed)
        .map_err(|e| JwtError::Base64Decode(e.to_string()))
}

/// Append `=` until the length is a multiple of four.
#[must_use]
pub fn pad(input: &str) -> String {
    let mut padded = String::with_capacity(input.len() + 3);
    padded.push_str(input);
    match input.len() % 4 {
        0 => {}
        rem => padded.extend(std::iter::repeat(PAD).take(4 - rem)),
    }
    padded
}

/// Strip trailing `=` characters.
#[must_use]
pub fn trim_padding(input: &str) -> &str {
    input.trim_end_matches(PAD)
}

/// Encode one token segment: URL-safe alphabet, never padded.
pub fn encode_segment<T: AsRef<[u8]>>(input: T) -> String {
    encode(input, Alphabet::Base64UrlNoPad)
}

/// Decode one token segment.
pub fn decode_segment(input: &str) -> JwtResult<Vec<u8>> {
    decode(input, Alphabet::Base64UrlNoPad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    const ALL: [Alphabet; 4] = [
        Alphabet::Base64,
        Alphabet::Base64NoPad,
        Alphabet::Base64Url,
        Alphabet::Base64UrlNoPad,
    ];

    #[test]
    fn test_segment_encoding_is_unpadded_and_url_safe() {
        let bytes = [0xfb, 0xff, 0xfe, 0x01];
        let encoded = encode_segment(bytes);
        assert_eq!(encoded, "-__-AQ");
        assert_eq!(encode(bytes, Alphabet::Base64), "+//+AQ==");
    }

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        assert_eq!(decode("YQ", Alphabet::Base64UrlNoPad).unwrap(), b"a");
        assert_eq!(decode("YQ==", Alphabet::Base64UrlNoPad).unwrap(), b"a");
        assert_eq!(decode("YWI=", Alphabet::Base64).unwrap(), b"ab");
        assert_eq!(decode("", Alphabet::Base64Url).unwrap(), b"");
    }

    #[test]
    fn test_decode_rejects_bad_padding() {
        for bad in ["YQ=", "YQ===", "Y===", "YQ=a", "=YQ"] {
            let err = decode(bad, Alphabet::Base64Url).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Base64Decode, "{bad}");
        }
    }

    #[test]
    fn test_decode_rejects_length_one_mod_four() {
        assert!(decode("YWJjZ", Alphabet::Base64UrlNoPad).is_err());
        assert!(decode("A", Alphabet::Base64).is_err());
    }

    #[test]
    fn test_decode_rejects_foreign_alphabet() {
        // `+` and `/` only belong to the standard alphabet.
        assert!(decode("+/8", Alphabet::Base64UrlNoPad).is_err());
        assert_eq!(decode("+/8", Alphabet::Base64NoPad).unwrap(), [0xfb, 0xff]);
        assert!(decode("-_8", Alphabet::Base64).is_err());
        assert!(decode("YW J", Alphabet::Base64).is_err());
    }

    #[test]
    fn test_decode_rejects_non_canonical_trailing_bits() {
        // "YR" carries non-zero bits past the single encoded byte.
        assert!(decode("YR", Alphabet::Base64UrlNoPad).is_err());
    }

    #[test]
    fn test_pad_and_trim() {
        assert_eq!(pad("YQ"), "YQ==");
        assert_eq!(pad("YWI"), "YWI=");
        assert_eq!(pad("YWJj"), "YWJj");
        assert_eq!(pad(""), "");
        assert_eq!(trim_padding("YQ=="), "YQ");
        assert_eq!(trim_padding("YWJj"), "YWJj");
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            for alphabet in ALL {
                let encoded = encode(&bytes, alphabet);
                prop_assert_eq!(decode(&encoded, alphabet).unwrap(), bytes.clone());
                prop_assert_eq!(decode(trim_padding(&encoded), alphabet).unwrap(), bytes.clone());
                prop_assert_eq!(decode(&pad(&encoded), alphabet).unwrap(), bytes.clone());
            }
        }

        #[test]
        fn prop_length_one_mod_four_never_decodes(s in "[A-Za-z0-9_-]{0,16}") {
            let candidate = format!("{}A", s.repeat(4));
            prop_assert!(decode(&candidate, Alphabet::Base64UrlNoPad).is_err());
        }
    }
}
