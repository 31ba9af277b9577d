// lumen/core/primitives/src/storage.rs

// Contract storage values and the byte-level diffs logged for every change
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque serialized value of one contract storage slot.
///
/// The empty value is the null value: what a slot holds before its first write.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageValue(pub Vec<u8>);

impl StorageValue {
    pub fn null() -> Self {
        Self(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encode a value the way contracts store structured data
    pub fn from_json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self(serde_json::to_vec(value)?))
    }

    pub fn to_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.0)
    }
}

impl From<Vec<u8>> for StorageValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for StorageValue {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => write!(f, "StorageValue({:?})", text),
            Err(_) => write!(f, "StorageValue(0x{})", hex::encode(&self.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("diff does not match value: expected {expected} bytes at offset {offset}")]
    Mismatch { offset: u64, expected: usize },
}

/// Splice turning one storage value into another.
///
/// `removed` bytes at `prefix_len` are replaced by `inserted`; the shared
/// prefix and suffix of both values are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDiff {
    pub prefix_len: u64,
    pub removed: Vec<u8>,
    pub inserted: Vec<u8>,
}

impl StorageDiff {
    pub fn between(before: &StorageValue, after: &StorageValue) -> Self {
        let (a, b) = (before.as_bytes(), after.as_bytes());
        let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
        let max_suffix = a.len().min(b.len()) - prefix;
        let suffix = a[prefix..]
            .iter()
            .rev()
            .zip(b[prefix..].iter().rev())
            .take(max_suffix)
            .take_while(|(x, y)| x == y)
            .count();

        Self {
            prefix_len: prefix as u64,
            removed: a[prefix..a.len() - suffix].to_vec(),
            inserted: b[prefix..b.len() - suffix].to_vec(),
        }
    }

    /// True when the diff changes nothing
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.inserted.is_empty()
    }

    /// Rebuild `after` from `before`
    pub fn apply(&self, before: &StorageValue) -> Result<StorageValue, DiffError> {
        Self::splice(before.as_bytes(), self.prefix_len, &self.removed, &self.inserted)
    }

    /// Rebuild `before` from `after`
    pub fn revert(&self, after: &StorageValue) -> Result<StorageValue, DiffError> {
        Self::splice(after.as_bytes(), self.prefix_len, &self.inserted, &self.removed)
    }

    fn splice(
        value: &[u8],
        prefix_len: u64,
        expected: &[u8],
        replacement: &[u8],
    ) -> Result<StorageValue, DiffError> {
        let mismatch = DiffError::Mismatch {
            offset: prefix_len,
            expected: expected.len(),
        };
        let offset = usize::try_from(prefix_len).map_err(|_| mismatch.clone())?;
        let end = match offset.checked_add(expected.len()) {
            Some(end) if end <= value.len() && &value[offset..end] == expected => end,
            _ => return Err(mismatch),
        };

        let mut out = Vec::with_capacity(value.len() - expected.len() + replacement.len());
        out.extend_from_slice(&value[..offset]);
        out.extend_from_slice(replacement);
        out.extend_from_slice(&value[end..]);
        Ok(StorageValue(out))
    }
}

/// Staged change of one slot within one evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange {
    /// Value seen at the first touch
    pub before: StorageValue,
    pub after: StorageValue,
    /// `before` -> `after`
    pub diff: StorageDiff,
}

impl StorageChange {
    pub fn new(before: StorageValue, after: StorageValue) -> Self {
        let diff = StorageDiff::between(&before, &after);
        Self {
            before,
            after,
            diff,
        }
    }

    /// Replace the final value, keeping the original `before`
    pub fn update(&mut self, after: StorageValue) {
        self.diff = StorageDiff::between(&self.before, &after);
        self.after = after;
    }
}
