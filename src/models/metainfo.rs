//! Parsed torrent metadata.
//!
//! Extraction follows the usual metainfo layout: a root dictionary with an
//! `info` dictionary (single-file `length` or multi-file `files`) and optional
//! `announce`/`announce-list` trackers.

use crate::bencode::decoder::decode_torrent;
use crate::bencode::encoder::{to_bytes, BencodeEncode};
use crate::bencode::Value;
use crate::core::error::ParseError;
use crate::models::infohash::InfoHash;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentFile {
    /// Path components relative to the torrent root
    pub path: Vec<String>,
    pub length: u64,
}

#[derive(Debug, Clone)]
pub struct TorrentMetadata {
    pub info_hash: InfoHash,
    pub name: String,
    pub piece_length: u64,
    pub piece_count: usize,
    pub files: Vec<TorrentFile>,
    pub total_length: u64,
    pub trackers: Vec<String>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub creation_date: Option<i64>,
    pub private: bool,
    root: Value,
    /// `info` exactly as received, so re-encoding keeps the info hash stable
    info_raw: Vec<u8>,
}

impl TorrentMetadata {
    /// Parse complete .torrent bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        let decoded = decode_torrent(data)?;

        if decoded.value.as_dict().is_none() {
            return Err(ParseError::NotADictionary);
        }

        let span = decoded.info_span.ok_or(ParseError::MissingField("info"))?;
        let info_raw = data[span].to_vec();

        Self::from_root(decoded.value, info_raw, None)
    }

    /// Build a torrent around a bare info dictionary, as delivered by metadata exchange
    ///
    /// `trackers` become the `announce`/`announce-list` of the synthesized root.
    /// `fallback_name` is used when the info dictionary carries no name.
    pub fn from_info_bytes(
        info: &[u8],
        trackers: &[String],
        fallback_name: Option<&str>,
    ) -> Result<Self, ParseError> {
        let decoded = decode_torrent(info)?;
        if decoded.value.as_dict().is_none() {
            return Err(ParseError::InvalidField {
                field: "info",
                reason: "not a dictionary".to_string(),
            });
        }

        let mut root = BTreeMap::new();
        root.insert(b"info".to_vec(), decoded.value);

        if let Some(first) = trackers.first() {
            root.insert(b"announce".to_vec(), Value::from(first.as_str()));
            let tiers = trackers
                .iter()
                .map(|tr| Value::List(vec![Value::from(tr.as_str())]))
                .collect();
            root.insert(b"announce-list".to_vec(), Value::List(tiers));
        }

        Self::from_root(Value::Dict(root), info.to_vec(), fallback_name)
    }

    /// Parse either a full torrent or a bare info dictionary
    pub fn from_bytes_or_info(
        data: &[u8],
        trackers: &[String],
        fallback_name: Option<&str>,
    ) -> Result<Self, ParseError> {
        match Self::from_bytes(data) {
            Err(ParseError::MissingField("info")) => Self::from_info_bytes(data, trackers, fallback_name),
            other => other,
        }
    }

    fn from_root(root: Value, info_raw: Vec<u8>, fallback_name: Option<&str>) -> Result<Self, ParseError> {
        let info = root.get("info").ok_or(ParseError::MissingField("info"))?;
        if info.as_dict().is_none() {
            return Err(ParseError::InvalidField {
                field: "info",
                reason: "not a dictionary".to_string(),
            });
        }

        let name = info
            .get("name.utf-8")
            .or_else(|| info.get("name"))
            .and_then(Value::as_string)
            .or_else(|| fallback_name.map(str::to_string))
            .ok_or(ParseError::MissingField("name"))?;

        let piece_length = info
            .get("piece length")
            .and_then(Value::as_int)
            .ok_or(ParseError::MissingField("piece length"))?;
        if piece_length <= 0 {
            return Err(ParseError::InvalidField {
                field: "piece length",
                reason: format!("must be positive, got {}", piece_length),
            });
        }

        let pieces = info
            .get("pieces")
            .and_then(Value::as_bytes)
            .ok_or(ParseError::MissingField("pieces"))?;
        if pieces.len() % 20 != 0 {
            return Err(ParseError::InvalidField {
                field: "pieces",
                reason: format!("length {} is not a multiple of 20", pieces.len()),
            });
        }

        let piece_count = pieces.len() / 20;

        let files = extract_files(info, &name)?;
        let total_length = files
            .iter()
            .try_fold(0u64, |acc, f| acc.checked_add(f.length))
            .ok_or_else(|| ParseError::InvalidField {
                field: "length",
                reason: "total length overflows".to_string(),
            })?;

        let trackers = extract_trackers(&root);

        let comment = root.get("comment").and_then(Value::as_string);
        let created_by = root.get("created by").and_then(Value::as_string);
        let creation_date = root.get("creation date").and_then(Value::as_int);
        let private = info.get("private").and_then(Value::as_int) == Some(1);

        Ok(Self {
            info_hash: InfoHash::from_info_bytes(&info_raw),
            name,
            piece_length: piece_length as u64,
            piece_count,
            files,
            total_length,
            trackers,
            comment,
            created_by,
            creation_date,
            private,
            root,
            info_raw,
        })
    }

    /// Bencode of the whole metainfo dictionary
    ///
    /// Keys are written in sorted order; the `info` value is copied verbatim.
    pub fn to_bencode(&self) -> Vec<u8> {
        let Some(root) = self.root.as_dict() else {
            return to_bytes(&self.root);
        };

        let mut buf = Vec::with_capacity(self.info_raw.len() + 256);
        buf.extend_from_slice(b"d");
        for (key, value) in root {
            key.bencode(&mut buf);
            if key.as_slice() == b"info" {
                buf.extend_from_slice(&self.info_raw);
            } else {
                value.bencode(&mut buf);
            }
        }
        buf.extend_from_slice(b"e");
        buf
    }
}

fn extract_files(info: &Value, name: &str) -> Result<Vec<TorrentFile>, ParseError> {
    if let Some(length) = info.get("length") {
        let length = non_negative(length, "length")?;
        return Ok(vec![TorrentFile {
            path: vec![name.to_string()],
            length,
        }]);
    }

    let list = info
        .get("files")
        .ok_or(ParseError::MissingField("files"))?
        .as_list()
        .ok_or_else(|| ParseError::InvalidField {
            field: "files",
            reason: "not a list".to_string(),
        })?;

    let mut files = Vec::with_capacity(list.len());
    for entry in list {
        let length = entry
            .get("length")
            .ok_or(ParseError::MissingField("length"))
            .and_then(|v| non_negative(v, "length"))?;

        let path_value = entry
            .get("path.utf-8")
            .or_else(|| entry.get("path"))
            .and_then(Value::as_list)
            .ok_or(ParseError::MissingField("path"))?;

        let path = path_value
            .iter()
            .map(|p| {
                p.as_string().ok_or_else(|| ParseError::InvalidField {
                    field: "path",
                    reason: "component is not a string".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if path.is_empty() {
            return Err(ParseError::InvalidField {
                field: "path",
                reason: "empty path".to_string(),
            });
        }

        files.push(TorrentFile { path, length });
    }

    Ok(files)
}

fn non_negative(value: &Value, field: &'static str) -> Result<u64, ParseError> {
    match value.as_int() {
        Some(n) if n >= 0 => Ok(n as u64),
        _ => Err(ParseError::InvalidField {
            field,
            reason: "expected a non-negative integer".to_string(),
        }),
    }
}

fn extract_trackers(root: &Value) -> Vec<String> {
    let mut trackers: Vec<String> = Vec::new();

    if let Some(announce) = root.get("announce").and_then(Value::as_string) {
        trackers.push(announce);
    }

    let tiers = root.get("announce-list").and_then(Value::as_list).unwrap_or(&[]);
    for url in tiers
        .iter()
        .filter_map(Value::as_list)
        .flatten()
        .filter_map(Value::as_string)
    {
        if !trackers.contains(&url) {
            trackers.push(url);
        }
    }

    trackers
}
