use std::ops::Range;

use bytemuck::Pod;
use relblob_types::{natural_alignment_of, BlobError, BlobKey, BlobSortedArray};
use tracing::trace;

use crate::builder::{BuildHandle, Builder};
use crate::builders::array::{build_item_array, ArrayBuilder};
use crate::builders::value::ValueBuilder;
use crate::error::BuildResult;
use crate::stream::BlobStream;

/// Builds a [`BlobSortedArray`] with keys ordered by [`BlobKey::key_hash`].
///
/// Entries whose keys share a hash keep their insertion order.
pub struct SortedArrayBuilder<K: BlobKey, V: Pod> {
    keys: Vec<K>,
    values: Vec<Box<dyn Builder<Target = V>>>,
    handle: BuildHandle<BlobSortedArray<K, V>>,
}

impl<K: BlobKey, V: Pod> SortedArrayBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            handle: BuildHandle::new(),
        }
    }

    /// Collect `(key, value)` pairs, failing on a repeated key.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (K, V)>) -> BuildResult<Self> {
        let mut sorted = Self::new();
        for (key, value) in pairs {
            sorted.insert(key, value)?;
        }
        Ok(sorted)
    }

    pub fn insert(&mut self, key: K, value: V) -> BuildResult<BuildHandle<V>> {
        self.insert_builder(key, ValueBuilder::new(value))
    }

    /// Insert a value built by `builder`. Fails if `key` is already present.
    pub fn insert_builder(
        &mut self,
        key: K,
        builder: impl Builder<Target = V> + 'static,
    ) -> BuildResult<BuildHandle<V>> {
        let run = self.hash_run(key.key_hash());
        if self.keys[run.clone()].contains(&key) {
            return Err(BlobError::InvalidArgument("duplicate key in sorted array".into()).into());
        }
        let handle = builder.handle();
        self.keys.insert(run.end, key);
        self.values.insert(run.end, Box::new(builder));
        Ok(handle)
    }

    /// Handle of the value stored under `key`.
    pub fn value_handle(&self, key: &K) -> Option<BuildHandle<V>> {
        self.hash_run(key.key_hash())
            .find(|&i| self.keys[i] == *key)
            .map(|i| self.values[i].handle())
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn hash_run(&self, hash: u64) -> Range<usize> {
        let start = self.keys.partition_point(|k| k.key_hash() < hash);
        let end = self.keys.partition_point(|k| k.key_hash() <= hash);
        start..end
    }
}

impl<K: BlobKey, V: Pod> Default for SortedArrayBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: BlobKey, V: Pod> Builder for SortedArrayBuilder<K, V> {
    type Target = BlobSortedArray<K, V>;

    fn handle(&self) -> BuildHandle<BlobSortedArray<K, V>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.to_position(data_position + BlobSortedArray::<K, V>::KEYS_FIELD);
        ArrayBuilder::new(self.keys.clone()).build(stream)?;
        build_item_array(
            stream,
            data_position + BlobSortedArray::<K, V>::VALUES_FIELD,
            &mut self.values,
            natural_alignment_of::<V>(),
        )?;
        trace!(entries = self.keys.len(), "built sorted array");
        Ok(())
    }
}
