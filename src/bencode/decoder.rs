use super::value::Value;
use serde_bencode::de;
use std::ops::Range;
use thiserror::Error;

/// Nesting limit for lists and dictionaries
const MAX_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("Unexpected byte 0x{byte:02x} at position {pos}")]
    UnexpectedByte { byte: u8, pos: usize },

    #[error("Invalid string length at byte {0}")]
    InvalidLength(usize),

    #[error("Nesting too deep at byte {0}")]
    TooDeep(usize),

    #[error("Trailing data after value at byte {0}")]
    TrailingData(usize),

    #[error("{0}")]
    Malformed(String),
}

impl From<serde_bencode::Error> for DecodeError {
    fn from(e: serde_bencode::Error) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

/// Result of decoding a torrent: the value tree plus the raw span of the top-level `info` dict
#[derive(Debug)]
pub struct Decoded {
    pub value: Value,
    pub info_span: Option<Range<usize>>,
}

/// Decode a complete bencode document, remembering where the top-level `info` value lives
///
/// The structure is scanned first to bound nesting, reject trailing bytes and
/// locate `info`; values are then decoded by `serde_bencode`.
pub fn decode_torrent(data: &[u8]) -> Result<Decoded, DecodeError> {
    let info_span = locate_info(data)?;
    let raw: serde_bencode::value::Value = de::from_bytes(data)?;

    Ok(Decoded {
        value: Value::from(raw),
        info_span,
    })
}

/// Span of the root dictionary's `info` value, if the root is a dictionary that has one
fn locate_info(data: &[u8]) -> Result<Option<Range<usize>>, DecodeError> {
    if data.first() != Some(&b'd') {
        let end = skip_value(data, 0)?;
        return finish(data, end).map(|_| None);
    }

    let mut info_span = None;
    let mut pos = 1;

    loop {
        match data.get(pos) {
            None => return Err(DecodeError::UnexpectedEof(pos)),
            Some(b'e') => break,
            Some(_) => {}
        }

        let key_end = skip_value(data, pos)?;
        let value_end = skip_value(data, key_end)?;

        if info_span.is_none() && string_at(&data[pos..key_end]) == Some(b"info".as_slice()) {
            info_span = Some(key_end..value_end);
        }

        pos = value_end;
    }

    finish(data, pos + 1).map(|_| info_span)
}

fn finish(data: &[u8], end: usize) -> Result<(), DecodeError> {
    if end != data.len() {
        return Err(DecodeError::TrailingData(end));
    }
    Ok(())
}

/// Contents of an encoded byte string such as `4:info`
fn string_at(encoded: &[u8]) -> Option<&[u8]> {
    let colon = encoded.iter().position(|&b| b == b':')?;
    encoded[..colon]
        .iter()
        .all(u8::is_ascii_digit)
        .then(|| &encoded[colon + 1..])
}

fn find(data: &[u8], from: usize, needle: u8) -> Result<usize, DecodeError> {
    data[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|offset| from + offset)
        .ok_or(DecodeError::UnexpectedEof(data.len()))
}

/// End offset of the value starting at `start`, without building it
fn skip_value(data: &[u8], start: usize) -> Result<usize, DecodeError> {
    let mut pos = start;
    let mut depth = 0usize;

    loop {
        let byte = *data.get(pos).ok_or(DecodeError::UnexpectedEof(pos))?;

        match byte {
            b'l' | b'd' => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(DecodeError::TooDeep(pos));
                }
                pos += 1;
                continue;
            }
            b'e' if depth > 0 => {
                depth -= 1;
                pos += 1;
            }
            b'i' => pos = find(data, pos + 1, b'e')? + 1,
            b'0'..=b'9' => {
                let colon = find(data, pos, b':')?;
                let len = std::str::from_utf8(&data[pos..colon])
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or(DecodeError::InvalidLength(pos))?;

                pos = (colon + 1)
                    .checked_add(len)
                    .filter(|&end| end <= data.len())
                    .ok_or(DecodeError::UnexpectedEof(data.len()))?;
            }
            byte => return Err(DecodeError::UnexpectedByte { byte, pos }),
        }

        if depth == 0 {
            return Ok(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bencode::encoder::to_bytes;

    fn decode(data: &[u8]) -> Result<Value, DecodeError> {
        decode_torrent(data).map(|decoded| decoded.value)
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode(b"i42e").unwrap(), Value::Int(42));
        assert_eq!(decode(b"i-7e").unwrap(), Value::Int(-7));
        assert_eq!(decode(b"4:spam").unwrap(), Value::from("spam"));
        assert_eq!(decode(b"0:").unwrap(), Value::Bytes(Vec::new()));
    }

    #[test]
    fn test_decode_truncated_input() {
        assert!(matches!(decode(b"5:abc"), Err(DecodeError::UnexpectedEof(_))));
        assert!(matches!(decode(b"li1e"), Err(DecodeError::UnexpectedEof(_))));
        assert!(matches!(decode(b"d4:info"), Err(DecodeError::UnexpectedEof(_))));
        assert_eq!(decode(b""), Err(DecodeError::UnexpectedEof(0)));
    }

    #[test]
    fn test_decode_trailing_data() {
        assert_eq!(decode(b"i1ei2e"), Err(DecodeError::TrailingData(3)));
        assert_eq!(decode(b"de4:junk"), Err(DecodeError::TrailingData(2)));
    }

    #[test]
    fn test_decode_rejects_xml() {
        let xml = b"<?xml version=\"1.0\"?><rss></rss>";
        assert_eq!(
            decode(xml),
            Err(DecodeError::UnexpectedByte { byte: b'<', pos: 0 })
        );
    }

    #[test]
    fn test_decode_depth_limit() {
        let mut deep = vec![b'l'; MAX_DEPTH + 1];
        deep.extend(vec![b'e'; MAX_DEPTH + 1]);
        assert!(matches!(decode(&deep), Err(DecodeError::TooDeep(_))));

        let mut ok = vec![b'l'; MAX_DEPTH];
        ok.extend(vec![b'e'; MAX_DEPTH]);
        assert!(decode(&ok).is_ok());
    }

    #[test]
    fn test_info_span_points_at_raw_info_dict() {
        // Keys inside info are deliberately unsorted
        let data = b"d8:announce3:url4:infod4:name1:x6:lengthi1eee";
        let decoded = decode_torrent(data).unwrap();

        let span = decoded.info_span.expect("info span");
        assert_eq!(&data[span], b"d4:name1:x6:lengthi1ee");
    }

    #[test]
    fn test_info_span_skips_strings_containing_delimiters() {
        let data = b"d7:comment6:e:d4:e4:infod4:name1:xee";
        let decoded = decode_torrent(data).unwrap();

        let span = decoded.info_span.expect("info span");
        assert_eq!(&data[span], b"d4:name1:xe");
    }

    #[test]
    fn test_nested_info_key_is_ignored() {
        let data = b"d5:outerd4:infoi1eee";
        let decoded = decode_torrent(data).unwrap();
        assert!(decoded.info_span.is_none());
    }

    #[test]
    fn test_sorted_document_reencodes_identically() {
        let data = b"d8:announce17:http://t/announce4:infod6:lengthi10e4:name5:a.txtee";
        let value = decode(data).unwrap();
        assert_eq!(to_bytes(&value), data.to_vec());
    }
}
