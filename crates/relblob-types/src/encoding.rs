//! Text encodings for string payloads.

use crate::error::{BlobError, BlobResult};

/// A byte encoding for host strings stored in a blob.
pub trait TextEncoding: Copy + Default + 'static {
    const NAME: &'static str;

    fn encode(text: &str) -> Vec<u8>;

    fn decode(bytes: &[u8]) -> BlobResult<String>;
}

/// UTF-8 bytes, stored unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Utf8;

/// UTF-16 code units, little-endian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Utf16;

/// UTF-32 scalar values, little-endian.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Utf32;

fn invalid<E: TextEncoding>(reason: impl ToString) -> BlobError {
    BlobError::InvalidText {
        encoding: E::NAME,
        reason: reason.to_string(),
    }
}

impl TextEncoding for Utf8 {
    const NAME: &'static str = "UTF-8";

    fn encode(text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> BlobResult<String> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(invalid::<Self>)
    }
}

impl TextEncoding for Utf16 {
    const NAME: &'static str = "UTF-16";

    fn encode(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    fn decode(bytes: &[u8]) -> BlobResult<String> {
        if bytes.len() % 2 != 0 {
            return Err(invalid::<Self>(format!("odd byte length {}", bytes.len())));
        }
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
            .collect();
        String::from_utf16(&units).map_err(invalid::<Self>)
    }
}

impl TextEncoding for Utf32 {
    const NAME: &'static str = "UTF-32";

    fn encode(text: &str) -> Vec<u8> {
        text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect()
    }

    fn decode(bytes: &[u8]) -> BlobResult<String> {
        if bytes.len() % 4 != 0 {
            return Err(invalid::<Self>(format!(
                "byte length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        bytes
            .chunks_exact(4)
            .map(|scalar| {
                let value = u32::from_le_bytes([scalar[0], scalar[1], scalar[2], scalar[3]]);
                char::from_u32(value)
                    .ok_or_else(|| invalid::<Self>(format!("invalid scalar {value:#x}")))
            })
            .collect()
    }
}
