//! Magnet descriptor parsing.
//!
//! A descriptor is what a user submits to start a transfer. Only the parts
//! this system needs are extracted: the content identifier (`xt`), an
//! optional display name (`dn`), an optional exact length (`xl`) and any
//! tracker hints (`tr`).

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;
use seedbox_core::types::TransferId;

const MAGNET_PREFIX: &str = "magnet:?";
const BTIH_PREFIX: &str = "urn:btih:";
const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// A parsed transfer descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDescriptor {
    /// The original URI, forwarded to the engine untouched.
    pub uri: String,
    /// Content identifier: 40 lowercase hex characters.
    pub info_hash: TransferId,
    /// Display name hint, if any.
    pub display_name: Option<String>,
    /// Exact length hint in bytes, if any.
    pub exact_length: Option<u64>,
    /// Tracker hints embedded in the URI.
    pub trackers: Vec<String>,
}

impl TransferDescriptor {
    /// Parse a `magnet:?` URI.
    pub fn parse(uri: &str) -> AppResult<Self> {
        let trimmed = uri.trim();
        let Some(query) = strip_prefix_ignore_case(trimmed, MAGNET_PREFIX) else {
            return Err(AppError::validation("Descriptor must be a magnet URI"));
        };

        let mut info_hash = None;
        let mut display_name = None;
        let mut exact_length = None;
        let mut trackers = Vec::new();

        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = decode_component(value);
            match key {
                "xt" if info_hash.is_none() => {
                    if let Some(hash) = strip_prefix_ignore_case(&value, BTIH_PREFIX) {
                        info_hash = Some(normalize_info_hash(hash)?);
                    }
                }
                "dn" if !value.is_empty() => display_name = Some(value),
                "xl" => exact_length = value.parse::<u64>().ok(),
                "tr" if !value.is_empty() => trackers.push(value),
                _ => {}
            }
        }

        let info_hash = info_hash
            .ok_or_else(|| AppError::validation("Magnet URI has no urn:btih content identifier"))?;

        Ok(Self {
            uri: trimmed.to_string(),
            info_hash: TransferId::new(info_hash),
            display_name,
            exact_length,
            trackers,
        })
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// ASCII-only prefixes; the byte comparison keeps the slice on a char boundary.
fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.as_bytes().get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix.as_bytes()) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

/// Accept 40-char hex or 32-char base32 and return lowercase hex.
fn normalize_info_hash(hash: &str) -> AppResult<String> {
    let lower = hash.to_ascii_lowercase();
    match lower.len() {
        40 if lower.bytes().all(|b| b.is_ascii_hexdigit()) => Ok(lower),
        32 => base32_to_hex(&lower)
            .ok_or_else(|| AppError::validation("Invalid base32 info-hash in magnet URI")),
        _ => Err(AppError::validation("Invalid info-hash in magnet URI")),
    }
}

fn base32_to_hex(encoded: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(20);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for c in encoded.bytes() {
        let value = BASE32_ALPHABET.iter().position(|&a| a == c)? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            bytes.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    Some(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "C12FE1C06BBA254A9DC9F519B335AA7C1367A88A";

    #[test]
    fn test_parse_hex_magnet() {
        let uri = format!(
            "magnet:?xt=urn:btih:{HASH}&dn=Big+Buck%20Bunny&xl=1048576&tr=udp%3A%2F%2Ftracker.example%3A1337"
        );
        let descriptor = TransferDescriptor::parse(&uri).expect("valid magnet");
        assert_eq!(
            descriptor.info_hash.as_str(),
            "c12fe1c06bba254a9dc9f519b335aa7c1367a88a"
        );
        assert_eq!(descriptor.display_name.as_deref(), Some("Big Buck Bunny"));
        assert_eq!(descriptor.exact_length, Some(1_048_576));
        assert_eq!(descriptor.trackers, vec!["udp://tracker.example:1337"]);
    }

    #[test]
    fn test_parse_base32_magnet() {
        // base32 of twenty 0x00 bytes
        let uri = "magnet:?xt=urn:btih:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        let descriptor = TransferDescriptor::parse(uri).expect("valid magnet");
        assert_eq!(descriptor.info_hash.as_str(), "0".repeat(40));
        assert!(descriptor.display_name.is_none());
    }

    #[test]
    fn test_reject_non_magnet() {
        assert!(TransferDescriptor::parse("http://example.com/file.torrent").is_err());
        assert!(TransferDescriptor::parse("magnet:?dn=nothing").is_err());
        assert!(TransferDescriptor::parse("magnet:?xt=urn:btih:xyz").is_err());
    }

    #[test]
    fn test_reject_multibyte_at_prefix_boundary() {
        let err = TransferDescriptor::parse("magnet:\u{e9}xt=1").unwrap_err();
        assert_eq!(err.kind, seedbox_core::error::ErrorKind::Validation);

        // 'é' straddles the end of "urn:btih:" inside the xt value.
        let err = TransferDescriptor::parse("magnet:?xt=urn:btia%C3%A9aaaa").unwrap_err();
        assert_eq!(err.kind, seedbox_core::error::ErrorKind::Validation);

        let err = TransferDescriptor::parse("mağnet:?xt=urn:btih:00").unwrap_err();
        assert_eq!(err.kind, seedbox_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_non_ascii_hash_is_rejected() {
        let hash = "é".repeat(20);
        let uri = format!("magnet:?xt=urn:btih:{hash}");
        assert!(TransferDescriptor::parse(&uri).is_err());
        let uri = format!("magnet:?xt=urn:btih:{}", "é".repeat(16));
        assert!(TransferDescriptor::parse(&uri).is_err());
    }
}
