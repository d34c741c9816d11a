/// Fixed-size BLAKE3 digest of a generated module body.
///
/// Kept as raw bytes so equality checks on the resolution hot path
/// do not allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest a string.
    #[must_use]
    pub fn of(contents: &str) -> Self {
        Self(*blake3::hash(contents.as_bytes()).as_bytes())
    }

    /// Hex-encoded digest.
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}
