//! Flat lookup index over the schema model.
//!
//! Keys are tuples of increasing specificity:
//!
//! ```text
//! (schema)                 -> Schema
//! (schema, table)          -> Table
//! (schema, table, column)  -> Column
//! ```
//!
//! Keys live in a [`BTreeMap`], so every extension of a key sorts directly
//! after it. Deregistering a key therefore removes a contiguous range, which
//! is how dropping a table also drops its columns without the caller
//! enumerating them.

use std::{collections::BTreeMap, fmt};

use compact_str::CompactString;
use serde::Serialize;
use smallvec::SmallVec;

use super::{ModelError, ObjectId};

/// Tuple key into the [`LookupIndex`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct IndexKey(SmallVec<[CompactString; 3]>);

impl IndexKey {
    pub fn schema(schema: &str) -> Self {
        Self(SmallVec::from_iter([CompactString::from(schema)]))
    }

    pub fn table(schema: &str, table: &str) -> Self {
        Self(SmallVec::from_iter([
            CompactString::from(schema),
            CompactString::from(table)
        ]))
    }

    pub fn column(schema: &str, table: &str, column: &str) -> Self {
        Self(SmallVec::from_iter([
            CompactString::from(schema),
            CompactString::from(table),
            CompactString::from(column)
        ]))
    }

    pub fn parts(&self) -> &[CompactString] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` equals `other` or is a proper prefix of it
    pub fn is_prefix_of(&self, other: &IndexKey) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, ")")
    }
}

/// Object an index entry resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IndexedObject {
    Schema(ObjectId),
    Table(ObjectId),
    Column(ObjectId)
}

impl IndexedObject {
    pub fn id(&self) -> ObjectId {
        match self {
            Self::Schema(id) | Self::Table(id) | Self::Column(id) => *id
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    entries: BTreeMap<IndexKey, IndexedObject>
}

impl LookupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index holding a single entry
    pub fn seeded(key: IndexKey, object: IndexedObject) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(key, object);
        Self { entries }
    }

    /// Register an object under `key`.
    ///
    /// Callers check uniqueness before registering, so an occupied key means
    /// the model is already inconsistent.
    pub fn register(&mut self, key: IndexKey, object: IndexedObject) -> Result<(), ModelError> {
        if let Some(existing) = self.entries.get(&key) {
            return Err(ModelError::Integrity(format!(
                "index key {} already maps to {:?}",
                key, existing
            )));
        }
        self.entries.insert(key, object);
        Ok(())
    }

    /// Remove `key` and every key it prefixes. Returns the removed entries.
    pub fn deregister(&mut self, key: &IndexKey) -> Vec<(IndexKey, IndexedObject)> {
        let doomed: Vec<IndexKey> = self
            .entries
            .range(key.clone()..)
            .take_while(|(k, _)| key.is_prefix_of(k))
            .map(|(k, _)| k.clone())
            .collect();
        doomed
            .into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|obj| (k, obj)))
            .collect()
    }

    pub fn get(&self, key: &IndexKey) -> Option<IndexedObject> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &IndexKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries equal to or extending `prefix`, in key order
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a IndexKey
    ) -> impl Iterator<Item = (&'a IndexKey, &'a IndexedObject)> + 'a {
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(k, _)| prefix.is_prefix_of(k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &IndexedObject)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
