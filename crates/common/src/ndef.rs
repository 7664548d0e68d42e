//! NDEF text-record codec.
//!
//! Decodes the payload of an NDEF well-known text record (RTD-Text) into the
//! carried string. The payload layout is:
//!
//! - byte 0: status byte — high bit selects the encoding (0 = UTF-8,
//!   1 = UTF-16), low 6 bits give the language-code length `L` (0–63)
//! - bytes 1..=L: IANA language code (e.g. "en"), not returned
//! - bytes L+1..: the text, in the selected encoding
//!
//! Decoding is a pure transformation: no allocation beyond the returned
//! string, no logging, no side effects.

use thiserror::Error;

/// Mask for the encoding bit in the status byte.
const ENCODING_UTF16_MASK: u8 = 0x80;

/// Mask for the language-code length in the status byte.
const LANGUAGE_LENGTH_MASK: u8 = 0x3f;

/// Errors produced while decoding a text-record payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload ends before the text section starts (missing status byte
    /// or an incomplete language code).
    #[error("payload truncated before text section")]
    Truncated,

    /// The text section is not valid in the encoding the status byte selects.
    #[error("text is not valid in the declared encoding")]
    InvalidEncoding,
}

/// Decode an NDEF text-record payload into its text.
///
/// Returns exactly the bytes after the language code, decoded per the status
/// byte. An empty text section decodes to an empty string.
///
/// # Errors
///
/// - [`DecodeError::Truncated`] when `payload.len() <= L` (the language code
///   length), including the empty payload.
/// - [`DecodeError::InvalidEncoding`] when the text bytes are not valid
///   UTF-8 or UTF-16 as selected.
pub fn decode_text_record(payload: &[u8]) -> Result<String, DecodeError> {
    let status = *payload.first().ok_or(DecodeError::Truncated)?;
    let language_len = (status & LANGUAGE_LENGTH_MASK) as usize;

    if payload.len() <= language_len {
        return Err(DecodeError::Truncated);
    }

    let text = payload
        .get(language_len + 1..)
        .ok_or(DecodeError::Truncated)?;

    if status & ENCODING_UTF16_MASK == 0 {
        std::str::from_utf8(text)
            .map(ToOwned::to_owned)
            .map_err(|_| DecodeError::InvalidEncoding)
    } else {
        decode_utf16(text)
    }
}

/// Decode UTF-16 text bytes, honouring an optional byte-order mark.
///
/// Big-endian is the default without a BOM, matching how RTD-Text payloads
/// are written in practice.
fn decode_utf16(text: &[u8]) -> Result<String, DecodeError> {
    if text.len() % 2 != 0 {
        return Err(DecodeError::InvalidEncoding);
    }

    let (big_endian, body) = match text {
        [0xfe, 0xff, rest @ ..] => (true, rest),
        [0xff, 0xfe, rest @ ..] => (false, rest),
        _ => (true, text),
    };

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            let bytes = [*pair.first().unwrap_or(&0), *pair.get(1).unwrap_or(&0)];
            if big_endian {
                u16::from_be_bytes(bytes)
            } else {
                u16::from_le_bytes(bytes)
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|_| DecodeError::InvalidEncoding)
}
