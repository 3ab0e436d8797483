//! # Cascade Wire Format
//!
//! Self-describing binary encoding a client can decode without the sets the
//! cascade was built from. All integers are little-endian.
//!
//! ```text
//! magic            4 bytes   "MLBF"
//! format_version   u16
//! key_format       u16       caller's key encoding version
//! hash_algorithm   u8        1 = murmur3, 2 = sha256
//! salt_len         u8
//! salt             salt_len bytes
//! layer_count      u8
//! layer table      layer_count × { size_bits u32, hash_count u8 }
//! bit arrays       layer_count × ceil(size_bits / 8) bytes, LSB-first
//! ```
//!
//! The header carries every size, so a reader can stream the bit arrays in
//! order. Trailing bytes after the last layer are rejected.

use super::bloom_filter::BloomFilter;
use super::cascade::FilterCascade;
use super::hash_functions::{HashAlgorithm, KeyHasher};
use crate::error::CascadeError;

/// File magic
pub const MAGIC: &[u8; 4] = b"MLBF";

/// Current encoding version
pub const FORMAT_VERSION: u16 = 1;

// =============================================================================
// ENCODING
// =============================================================================

impl FilterCascade {
    /// Serialize the cascade
    ///
    /// Layers built by [`FilterCascade::build`] always fit the header
    /// fields; the config ceilings guarantee it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload: usize = self
            .layers()
            .iter()
            .map(|layer| layer.as_raw_bytes().len())
            .sum();
        let mut out = Vec::with_capacity(12 + self.salt().len() + self.layer_count() * 5 + payload);

        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&self.key_format_version().to_le_bytes());
        out.push(self.hash_algorithm().as_byte());
        out.push(self.salt().len() as u8);
        out.extend_from_slice(self.salt());
        out.push(self.layer_count() as u8);

        for layer in self.layers() {
            out.extend_from_slice(&(layer.size_bits() as u32).to_le_bytes());
            out.push(layer.hash_count() as u8);
        }
        for layer in self.layers() {
            out.extend_from_slice(layer.as_raw_bytes());
        }
        out
    }

    /// Decode a cascade written by [`FilterCascade::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CascadeError> {
        let mut reader = ByteReader::new(bytes);

        if reader.take(4, "magic")? != MAGIC {
            return Err(CascadeError::Malformed("bad magic".to_string()));
        }
        let version = reader.u16("format version")?;
        if version != FORMAT_VERSION {
            return Err(CascadeError::UnsupportedVersion(version));
        }
        let key_format_version = reader.u16("key format version")?;
        let algorithm = HashAlgorithm::try_from(reader.u8("hash algorithm")?)?;
        let salt_len = reader.u8("salt length")? as usize;
        let salt = reader.take(salt_len, "salt")?.to_vec();

        let layer_count = reader.u8("layer count")? as usize;
        if layer_count == 0 {
            return Err(CascadeError::Malformed("no layers".to_string()));
        }

        let mut table = Vec::with_capacity(layer_count);
        for _ in 0..layer_count {
            let size_bits = reader.u32("layer size")? as usize;
            let hash_count = reader.u8("hash count")? as usize;
            if size_bits == 0 || hash_count == 0 {
                return Err(CascadeError::Malformed(format!(
                    "empty layer parameters: m={}, k={}",
                    size_bits, hash_count
                )));
            }
            table.push((size_bits, hash_count));
        }

        let mut layers = Vec::with_capacity(layer_count);
        for (index, (size_bits, hash_count)) in table.into_iter().enumerate() {
            let raw = reader.take(size_bits.div_ceil(8), "layer bits")?.to_vec();
            layers.push(BloomFilter::from_raw(
                raw,
                size_bits,
                hash_count,
                (index + 1) as u8,
            ));
        }

        if !reader.is_empty() {
            return Err(CascadeError::Malformed(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }

        Ok(FilterCascade::from_parts(
            layers,
            KeyHasher::new(algorithm, salt),
            key_format_version,
        ))
    }
}

// =============================================================================
// DECODING HELPERS
// =============================================================================

struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], CascadeError> {
        if self.remaining() < len {
            return Err(CascadeError::Malformed(format!(
                "truncated at {}: need {} bytes, have {}",
                field,
                len,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> Result<u8, CascadeError> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &str) -> Result<u16, CascadeError> {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(self.take(2, field)?);
        Ok(u16::from_le_bytes(buf))
    }

    fn u32(&mut self, field: &str) -> Result<u32, CascadeError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4, field)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{CascadeConfig, CascadeConfigBuilder};

    fn sample() -> (Vec<String>, Vec<String>) {
        let blocked: Vec<String> = (0..40).map(|i| format!("blocked{:03}@:1.0", i)).collect();
        let not_blocked: Vec<String> = (0..400).map(|i| format!("clean{:03}@:2.1", i)).collect();
        (blocked, not_blocked)
    }

    #[test]
    fn test_decoded_cascade_answers_like_original() {
        let (blocked, not_blocked) = sample();
        let config = CascadeConfigBuilder::new()
            .salt(b"abc".to_vec())
            .hash_algorithm(HashAlgorithm::Murmur3)
            .build()
            .unwrap();
        let (cascade, _) = FilterCascade::build(&blocked, &not_blocked, &config).unwrap();

        let decoded = FilterCascade::from_bytes(&cascade.to_bytes()).unwrap();

        assert_eq!(decoded, cascade);
        assert!(decoded.verify(&blocked, &not_blocked).is_ok());
        assert_eq!(decoded.salt(), b"abc");
        assert_eq!(decoded.hash_algorithm(), HashAlgorithm::Murmur3);
    }

    #[test]
    fn test_header_layout() {
        let (blocked, not_blocked) = sample();
        let config = CascadeConfig::default().with_salt(vec![9u8, 9]);
        let (cascade, _) = FilterCascade::build(&blocked, &not_blocked, &config).unwrap();
        let bytes = cascade.to_bytes();

        assert_eq!(&bytes[0..4], b"MLBF");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), FORMAT_VERSION);
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 1);
        assert_eq!(bytes[8], HashAlgorithm::Sha256.as_byte());
        assert_eq!(bytes[9], 2);
        assert_eq!(&bytes[10..12], &[9, 9]);
        assert_eq!(bytes[12] as usize, cascade.layer_count());

        let expected_len = 13
            + cascade.layer_count() * 5
            + cascade
                .layers()
                .iter()
                .map(|l| l.size_bits().div_ceil(8))
                .sum::<usize>();
        assert_eq!(bytes.len(), expected_len);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let (blocked, not_blocked) = sample();
        let (cascade, _) =
            FilterCascade::build(&blocked, &not_blocked, &CascadeConfig::default()).unwrap();
        let mut bytes = cascade.to_bytes();
        bytes[0] = b'X';

        assert!(matches!(
            FilterCascade::from_bytes(&bytes),
            Err(CascadeError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let (blocked, not_blocked) = sample();
        let (cascade, _) =
            FilterCascade::build(&blocked, &not_blocked, &CascadeConfig::default()).unwrap();
        let mut bytes = cascade.to_bytes();
        bytes[4] = 7;

        assert!(matches!(
            FilterCascade::from_bytes(&bytes),
            Err(CascadeError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_rejects_truncation_and_trailing_bytes() {
        let (blocked, not_blocked) = sample();
        let (cascade, _) =
            FilterCascade::build(&blocked, &not_blocked, &CascadeConfig::default()).unwrap();
        let bytes = cascade.to_bytes();

        let truncated = &bytes[..bytes.len() - 1];
        assert!(matches!(
            FilterCascade::from_bytes(truncated),
            Err(CascadeError::Malformed(_))
        ));

        let mut padded = bytes.clone();
        padded.push(0);
        assert!(matches!(
            FilterCascade::from_bytes(&padded),
            Err(CascadeError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(FilterCascade::from_bytes(&[]).is_err());
    }
}
