use std::hash::{Hash, Hasher};

use ripple_types::Version;

/// Streaming, domain-separated BLAKE3 hasher for entity versions.
///
/// Values are mixed in one at a time with the typed `mix_*` methods. Integers
/// are mixed as little-endian bytes so the digest is identical on every
/// platform. Finalizing never consumes the hasher: more values may be mixed
/// after reading a digest.
///
/// The domain tag (e.g. `"ripple-version-v1"`) is mixed in first, so two
/// hashers with different domains produce unrelated versions for the same
/// input.
#[derive(Clone)]
pub struct VersionHasher {
    inner: blake3::Hasher,
    domain: &'static str,
}

impl VersionHasher {
    /// Domain tag used by [`VersionHasher::new`].
    pub const DEFAULT_DOMAIN: &'static str = "ripple-version-v1";

    /// Hasher with the default domain.
    pub fn new() -> Self {
        Self::with_domain(Self::DEFAULT_DOMAIN)
    }

    /// Hasher with a custom domain tag.
    pub fn with_domain(domain: &'static str) -> Self {
        let mut inner = blake3::Hasher::new();
        inner.update(domain.as_bytes());
        inner.update(b":");
        Self { inner, domain }
    }

    pub fn mix_u8(&mut self, value: u8) {
        self.inner.update(&[value]);
    }

    pub fn mix_u16(&mut self, value: u16) {
        self.inner.update(&value.to_le_bytes());
    }

    pub fn mix_u32(&mut self, value: u32) {
        self.inner.update(&value.to_le_bytes());
    }

    pub fn mix_u64(&mut self, value: u64) {
        self.inner.update(&value.to_le_bytes());
    }

    pub fn mix_i8(&mut self, value: i8) {
        self.inner.update(&value.to_le_bytes());
    }

    pub fn mix_i16(&mut self, value: i16) {
        self.inner.update(&value.to_le_bytes());
    }

    pub fn mix_i32(&mut self, value: i32) {
        self.inner.update(&value.to_le_bytes());
    }

    pub fn mix_i64(&mut self, value: i64) {
        self.inner.update(&value.to_le_bytes());
    }

    /// Mix a 128-bit value given as two halves, e.g. a child's digest when
    /// composing a parent version from its children.
    pub fn mix_u64_pair(&mut self, hash1: u64, hash2: u64) {
        self.mix_u64(hash1);
        self.mix_u64(hash2);
    }

    pub fn mix_bool(&mut self, value: bool) {
        self.mix_u8(value as u8);
    }

    /// Mix raw bytes with no length prefix.
    pub fn mix_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    /// Mix a string, length-prefixed so `("ab", "c")` and `("a", "bc")`
    /// hash differently.
    pub fn mix_str(&mut self, value: &str) {
        self.mix_u64(value.len() as u64);
        self.inner.update(value.as_bytes());
    }

    /// Mix another version.
    pub fn mix_version(&mut self, version: Version) {
        self.mix_u64(version.get());
    }

    /// The 128-bit digest as two 64-bit halves. Does not modify the hasher.
    pub fn finish128(&self) -> (u64, u64) {
        let digest = self.inner.finalize();
        let bytes = digest.as_bytes();
        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&bytes[..8]);
        hi.copy_from_slice(&bytes[8..16]);
        (u64::from_le_bytes(lo), u64::from_le_bytes(hi))
    }

    /// The digest folded into a [`Version`]. Does not modify the hasher.
    pub fn finish_version(&self) -> Version {
        Version::new(self.finish128().0)
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

impl Default for VersionHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VersionHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionHasher")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl Hasher for VersionHasher {
    fn finish(&self) -> u64 {
        self.finish128().0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }
}

/// Version of any `Hash` value, using the default domain.
///
/// Relies on the value's `Hash` impl covering every rendered field.
pub fn version_of<T: Hash + ?Sized>(value: &T) -> Version {
    let mut hasher = VersionHasher::new();
    value.hash(&mut hasher);
    hasher.finish_version()
}

/// Version of a serializable value, hashed as its JSON encoding.
///
/// `serde_json` maps are key-ordered, so logically equal JSON objects hash
/// the same regardless of input key order.
pub fn version_of_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Version, HashError> {
    let data = serde_json::to_vec(value).map_err(|e| HashError::Serialization(e.to_string()))?;
    let mut hasher = VersionHasher::new();
    hasher.mix_bytes(&data);
    Ok(hasher.finish_version())
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let mut a = VersionHasher::new();
        let mut b = VersionHasher::new();
        for h in [&mut a, &mut b] {
            h.mix_u32(7);
            h.mix_str("title");
            h.mix_i64(-1);
        }
        assert_eq!(a.finish128(), b.finish128());
    }

    #[test]
    fn finish_does_not_consume_state() {
        let mut h = VersionHasher::new();
        h.mix_u8(1);
        let first = h.finish128();
        assert_eq!(h.finish128(), first);

        h.mix_u8(2);
        assert_ne!(h.finish128(), first);
    }

    #[test]
    fn different_domains_produce_different_versions() {
        let mut a = VersionHasher::new();
        let mut b = VersionHasher::with_domain("my-app-rows-v1");
        a.mix_u64(99);
        b.mix_u64(99);
        assert_ne!(a.finish_version(), b.finish_version());
        assert_eq!(b.domain(), "my-app-rows-v1");
    }

    #[test]
    fn width_matters() {
        let mut a = VersionHasher::new();
        let mut b = VersionHasher::new();
        a.mix_u8(1);
        b.mix_u16(1);
        assert_ne!(a.finish128(), b.finish128());
    }

    #[test]
    fn pair_equals_two_u64s() {
        let mut a = VersionHasher::new();
        let mut b = VersionHasher::new();
        a.mix_u64_pair(3, 4);
        b.mix_u64(3);
        b.mix_u64(4);
        assert_eq!(a.finish128(), b.finish128());
    }

    #[test]
    fn strings_are_length_prefixed() {
        let mut a = VersionHasher::new();
        let mut b = VersionHasher::new();
        a.mix_str("ab");
        a.mix_str("c");
        b.mix_str("a");
        b.mix_str("bc");
        assert_ne!(a.finish128(), b.finish128());
    }

    #[test]
    fn version_of_tracks_content() {
        #[derive(Hash)]
        struct Row<'a> {
            title: &'a str,
            done: bool,
        }

        let v1 = version_of(&Row { title: "buy milk", done: false });
        let v2 = version_of(&Row { title: "buy milk", done: false });
        let v3 = version_of(&Row { title: "buy milk", done: true });
        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
    }

    #[test]
    fn version_of_json_ignores_key_order() {
        let a: serde_json::Value = serde_json::from_str(r#"{"id":1,"name":"x"}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"name":"x","id":1}"#).unwrap();
        assert_eq!(version_of_json(&a).unwrap(), version_of_json(&b).unwrap());

        let c = serde_json::json!({"id": 1, "name": "y"});
        assert_ne!(version_of_json(&a).unwrap(), version_of_json(&c).unwrap());
    }
}
