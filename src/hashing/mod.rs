//! BLAKE3 helpers for content fingerprints and cache keys.

use blake3::Hasher;

/// Full 32-byte BLAKE3 hash of `data`.
#[inline]
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Result-cache key: image content hash plus the request flags that change the cascade.
#[inline]
pub fn hash_identification_key(image_hash: &[u8; 32], force_web_search: bool) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(image_hash);
    hasher.update(b"|");
    hasher.update(&[u8::from(force_web_search)]);
    *hasher.finalize().as_bytes()
}

/// Short hex fingerprint for logs.
pub fn short_fingerprint(hash: &[u8; 32]) -> String {
    hash[..6].iter().map(|b| format!("{b:02x}")).collect()
}
