//! CRC32-framed store file layout
//!
//! ```text
//! formwright-store v1 crc32=<8 hex digits>\n
//! <JSON payload>
//! ```
//!
//! Every read validates the checksum. A mismatch is reported as corruption
//! and the file is never silently rewritten.

use crc32fast::Hasher;

use super::errors::{StorageError, StorageResult};

const MAGIC: &str = "formwright-store v1 crc32=";

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Prefix the payload with its checksum header
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let header = format!("{}{:08x}\n", MAGIC, compute_checksum(payload));
    let mut out = Vec::with_capacity(header.len() + payload.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Split a framed file into its verified payload
pub fn unframe(data: &[u8]) -> StorageResult<&[u8]> {
    let newline = data
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| StorageError::Corrupted("missing header".into()))?;
    let (header, rest) = data.split_at(newline);
    let payload = &rest[1..];

    let header = std::str::from_utf8(header)
        .map_err(|_| StorageError::Corrupted("header is not UTF-8".into()))?;
    let hex = header
        .strip_prefix(MAGIC)
        .ok_or_else(|| StorageError::Corrupted(format!("unrecognized header '{}'", header)))?;
    let expected = u32::from_str_radix(hex.trim(), 16)
        .map_err(|_| StorageError::Corrupted(format!("bad checksum '{}'", hex)))?;

    let actual = compute_checksum(payload);
    if actual != expected {
        return Err(StorageError::Corrupted(format!(
            "checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_deterministic() {
        let data = b"form store payload";
        assert_eq!(compute_checksum(data), compute_checksum(data));
    }

    #[test]
    fn test_frame_unframe() {
        let framed = frame(b"[]");
        assert!(framed.starts_with(MAGIC.as_bytes()));
        assert_eq!(unframe(&framed).unwrap(), b"[]");
    }

    #[test]
    fn test_unframe_detects_corruption() {
        let mut framed = frame(b"[{\"formId\":1}]");
        let last = framed.len() - 2;
        framed[last] ^= 0x01;
        assert!(matches!(unframe(&framed), Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn test_unframe_rejects_foreign_file() {
        assert!(matches!(unframe(b"hello\nworld"), Err(StorageError::Corrupted(_))));
        assert!(matches!(unframe(b"no newline"), Err(StorageError::Corrupted(_))));
    }
}
