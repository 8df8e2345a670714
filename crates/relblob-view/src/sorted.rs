//! Lookup in hash-ordered sorted arrays.

use relblob_types::{BlobArray, BlobError, BlobKey, BlobResult, BlobSortedArray};

use crate::view::{ArrayView, BlobView};

/// A validated [`BlobSortedArray`].
#[derive(Clone, Copy, Debug)]
pub struct SortedArrayView<'a, K, V> {
    keys: ArrayView<'a, K>,
    values: ArrayView<'a, V>,
}

impl<'a, K: 'static, V: 'static> BlobView<'a, BlobSortedArray<K, V>> {
    pub fn open(&self) -> BlobResult<SortedArrayView<'a, K, V>> {
        let keys = self
            .at::<BlobArray<K>>(BlobSortedArray::<K, V>::KEYS_FIELD)?
            .open()?;
        let values = self
            .at::<BlobArray<V>>(BlobSortedArray::<K, V>::VALUES_FIELD)?
            .open()?;
        if keys.len() != values.len() {
            return Err(BlobError::InvalidArgument(format!(
                "sorted array has {} keys for {} values",
                keys.len(),
                values.len()
            )));
        }
        Ok(SortedArrayView { keys, values })
    }
}

impl<'a, K: BlobKey, V> SortedArrayView<'a, K, V> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> ArrayView<'a, K> {
        self.keys
    }

    pub fn values(&self) -> ArrayView<'a, V> {
        self.values
    }

    /// Binary search by hash, then confirm by equality across the run of
    /// keys sharing that hash.
    pub fn index_of_key(&self, key: &K) -> Option<usize> {
        let hash = key.key_hash();
        let (mut low, mut high) = (0, self.len());
        while low < high {
            let mid = low + (high - low) / 2;
            match hash.cmp(&self.key_at(mid).key_hash()) {
                std::cmp::Ordering::Equal => return self.scan_equal_hashes(mid, key, hash),
                std::cmp::Ordering::Less => high = mid,
                std::cmp::Ordering::Greater => low = mid + 1,
            }
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index_of_key(key).is_some()
    }

    pub fn get(&self, key: &K) -> BlobResult<BlobView<'a, V>> {
        let index = self.index_of_key(key).ok_or(BlobError::NotFound)?;
        self.values.get(index)
    }

    /// Keys paired with their values, in stored order.
    pub fn entries(&self) -> impl Iterator<Item = (K, BlobView<'a, V>)> + 'a
    where
        V: 'a,
    {
        self.keys
            .iter()
            .zip(self.values.iter())
            .map(|(key, value)| (key.read(), value))
    }

    fn key_at(&self, index: usize) -> K {
        self.keys.element(index).read()
    }

    fn scan_equal_hashes(&self, found: usize, key: &K, hash: u64) -> Option<usize> {
        let forward = (found..self.len()).take_while(|&i| self.key_at(i).key_hash() == hash);
        let backward = (0..found)
            .rev()
            .take_while(|&i| self.key_at(i).key_hash() == hash);
        forward.chain(backward).find(|&i| self.key_at(i) == *key)
    }
}
