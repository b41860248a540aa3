//! Content-based hashing for image blobs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 hash of an image's bytes.
///
/// Used as the address of image blobs in the library, so identical photos
/// uploaded twice share one file on disk.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Compute one hash over several byte slices, in order
    pub fn from_parts<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Get the hash as a hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the hash as a prefixed hex string (e.g., "sha256:abcdef...")
    pub fn to_prefixed_hex(&self) -> String {
        format!("sha256:{}", self.to_hex())
    }

    /// Parse a bare 64-character hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    /// Parse a prefixed hex string back into a ContentHash
    pub fn from_prefixed_hex(s: &str) -> Option<Self> {
        Self::from_hex(s.strip_prefix("sha256:")?)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_hashing() {
        let h1 = ContentHash::from_bytes(b"shirt");
        let h2 = ContentHash::from_bytes(b"shirt");
        assert_eq!(h1, h2);
        assert_ne!(h1, ContentHash::from_bytes(b"skirt"));
    }

    #[test]
    fn test_parts_are_length_delimited() {
        let a = ContentHash::from_parts([b"ab".as_slice(), b"c".as_slice()]);
        let b = ContentHash::from_parts([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_prefixed_hex_parse() {
        let h = ContentHash::from_bytes(b"person photo");
        let parsed = ContentHash::from_prefixed_hex(&h.to_prefixed_hex()).unwrap();
        assert_eq!(h, parsed);
        assert_eq!(ContentHash::from_hex(&h.to_hex()), Some(h));
    }

    #[test]
    fn test_from_prefixed_hex_invalid() {
        assert!(ContentHash::from_prefixed_hex("md5:abc").is_none());
        assert!(ContentHash::from_prefixed_hex("sha256:tooshort").is_none());
        assert!(ContentHash::from_hex(&"zz".repeat(32)).is_none());
    }
}
