//! Owners of finished blobs.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;
use relblob_types::{BlobError, BlobResult};

use crate::any::check_size;
use crate::view::{check_region, BlobView};

fn reject_empty(bytes: &[u8]) -> BlobResult<()> {
    if bytes.is_empty() {
        return Err(BlobError::InvalidArgument("blob is empty".into()));
    }
    Ok(())
}

/// Takes ownership of a finished blob whose root is a `T`.
pub struct ManagedBlobAssetReference<T> {
    bytes: Vec<u8>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ManagedBlobAssetReference<T> {
    /// Fails on an empty buffer or one too short to hold the root.
    pub fn new(bytes: Vec<u8>) -> BlobResult<Self> {
        reject_empty(&bytes)?;
        check_region(&bytes, 0, size_of::<T>())?;
        Ok(Self {
            bytes,
            _marker: PhantomData,
        })
    }

    /// View of the root value at offset zero.
    pub fn root(&self) -> BlobView<'_, T> {
        BlobView::new_unchecked(&self.bytes, 0)
    }

    /// Length of the whole blob in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: empty blobs are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The finished blob.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Give the blob back, for example to write it out.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl<T: Pod> ManagedBlobAssetReference<T> {
    /// Copy of the root value.
    pub fn value(&self) -> T {
        self.root().read()
    }
}

impl<T> Clone for ManagedBlobAssetReference<T> {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ManagedBlobAssetReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedBlobAssetReference")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Takes ownership of a blob whose root has an erased type of `size` bytes.
#[derive(Clone, Debug)]
pub struct AnyBlobReference {
    bytes: Vec<u8>,
    size: usize,
}

impl AnyBlobReference {
    pub fn new(bytes: Vec<u8>, size: usize) -> BlobResult<Self> {
        reject_empty(&bytes)?;
        check_region(&bytes, 0, size)?;
        Ok(Self { bytes, size })
    }

    /// Byte size recorded for the root value.
    pub fn size(&self) -> usize {
        self.size
    }

    /// View the root as a `T`, which must fit in the recorded size.
    pub fn root<T>(&self) -> BlobResult<BlobView<'_, T>> {
        check_size::<T>(self.size)?;
        Ok(BlobView::new_unchecked(&self.bytes, 0))
    }

    /// Copy out the root as a `T`.
    pub fn value<T: Pod>(&self) -> BlobResult<T> {
        Ok(self.root::<T>()?.read())
    }

    /// Length of the whole blob in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: empty blobs are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The finished blob.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Give the blob back, for example to write it out.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
