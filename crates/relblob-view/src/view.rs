//! Bounds-checked typed views into a finished blob.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;
use relblob_types::{
    BlobArray, BlobError, BlobNullTerminatedString, BlobPtr, BlobResult, BlobString, Field,
    TextEncoding,
};

/// Checks that `size` bytes at `position` lie inside `blob` and returns the
/// position as an index.
pub(crate) fn check_region(blob: &[u8], position: i64, size: usize) -> BlobResult<usize> {
    let out_of_bounds = || BlobError::OutOfBounds {
        position,
        size,
        length: blob.len(),
    };
    let start = usize::try_from(position).map_err(|_| out_of_bounds())?;
    match start.checked_add(size) {
        Some(end) if end <= blob.len() => Ok(start),
        _ => Err(out_of_bounds()),
    }
}

/// Resolves the self-relative `offset` stored at `field_position`.
pub(crate) fn relative_target(
    blob: &[u8],
    field_position: usize,
    offset: i32,
    size: usize,
) -> BlobResult<usize> {
    let field = i64::try_from(field_position).map_err(|_| BlobError::OutOfBounds {
        position: i64::MAX,
        size,
        length: blob.len(),
    })?;
    check_region(blob, field + i64::from(offset), size)
}

/// A `T` located at `position` within `blob`.
///
/// Construction verifies the whole value is in bounds. Reads copy bytes out,
/// so the blob needs no particular alignment in memory.
pub struct BlobView<'a, T> {
    blob: &'a [u8],
    position: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> BlobView<'a, T> {
    pub fn new(blob: &'a [u8], position: usize) -> BlobResult<Self> {
        let position = i64::try_from(position).unwrap_or(i64::MAX);
        let position = check_region(blob, position, size_of::<T>())?;
        Ok(Self::new_unchecked(blob, position))
    }

    /// The value at offset zero, where every blob keeps its root.
    pub fn root(blob: &'a [u8]) -> BlobResult<Self> {
        Self::new(blob, 0)
    }

    /// Caller guarantees `position + size_of::<T>() <= blob.len()`.
    pub(crate) fn new_unchecked(blob: &'a [u8], position: usize) -> Self {
        Self {
            blob,
            position,
            _marker: PhantomData,
        }
    }

    /// Absolute position of the value in the blob.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The whole blob this view reads from.
    pub fn blob(&self) -> &'a [u8] {
        self.blob
    }

    /// The `size_of::<T>()` bytes of this value.
    pub fn raw_bytes(&self) -> &'a [u8] {
        &self.blob[self.position..self.position + size_of::<T>()]
    }

    /// View a field of this value.
    pub fn field<F>(&self, field: Field<T, F>) -> BlobResult<BlobView<'a, F>> {
        BlobView::new(self.blob, self.position + field.offset())
    }

    pub(crate) fn at<U>(&self, offset: usize) -> BlobResult<BlobView<'a, U>> {
        BlobView::new(self.blob, self.position + offset)
    }
}

impl<'a, T: Pod> BlobView<'a, T> {
    /// Copy the value out of the blob.
    pub fn read(&self) -> T {
        bytemuck::pod_read_unaligned(self.raw_bytes())
    }

    /// Borrow the value in place. Fails when the bytes are not aligned for `T`.
    pub fn try_ref(&self) -> BlobResult<&'a T> {
        Ok(bytemuck::try_from_bytes(self.raw_bytes())?)
    }
}

impl<T> Clone for BlobView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BlobView<'_, T> {}

impl<T> fmt::Debug for BlobView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobView")
            .field("type", &std::any::type_name::<T>())
            .field("position", &self.position)
            .field("blob_len", &self.blob.len())
            .finish()
    }
}

impl<'a, T: 'static> BlobView<'a, BlobPtr<T>> {
    /// The stored self-relative offset.
    pub fn offset(&self) -> i32 {
        self.read().offset
    }

    /// Follow the pointer.
    pub fn value(&self) -> BlobResult<BlobView<'a, T>> {
        let target = relative_target(self.blob, self.position, self.offset(), size_of::<T>())?;
        Ok(BlobView::new_unchecked(self.blob, target))
    }
}

impl<'a, T: 'static> BlobView<'a, BlobArray<T>> {
    /// Validate the array header and view its elements.
    pub fn open(&self) -> BlobResult<ArrayView<'a, T>> {
        ArrayView::from_header(self.blob, self.position, self.read())
    }
}

impl<'a, E: TextEncoding> BlobView<'a, BlobString<E>> {
    /// The encoded bytes of the string.
    pub fn encoded(&self) -> BlobResult<&'a [u8]> {
        Ok(self.at::<BlobArray<u8>>(0)?.open()?.as_bytes())
    }

    pub fn decode(&self) -> BlobResult<String> {
        E::decode(self.encoded()?)
    }
}

impl<'a, E: TextEncoding> BlobView<'a, BlobNullTerminatedString<E>> {
    /// The encoded bytes without the trailing zero.
    pub fn encoded(&self) -> BlobResult<&'a [u8]> {
        let bytes = self.at::<BlobArray<u8>>(0)?.open()?.as_bytes();
        Ok(bytes.split_last().map_or(bytes, |(_, text)| text))
    }

    pub fn decode(&self) -> BlobResult<String> {
        E::decode(self.encoded()?)
    }
}

/// The validated elements of a [`BlobArray`].
pub struct ArrayView<'a, T> {
    blob: &'a [u8],
    data_position: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> ArrayView<'a, T> {
    /// Check `header`, stored at `field_position`, against the blob.
    pub fn from_header(
        blob: &'a [u8],
        field_position: usize,
        header: BlobArray<T>,
    ) -> BlobResult<Self> {
        let len = usize::try_from(header.length).map_err(|_| {
            BlobError::InvalidArgument(format!("negative array length {}", header.length))
        })?;
        let size = len.checked_mul(size_of::<T>()).ok_or_else(|| {
            BlobError::InvalidArgument(format!("array of {len} elements overflows"))
        })?;
        let data_position = relative_target(blob, field_position, header.offset, size)?;
        Ok(Self {
            blob,
            data_position,
            len,
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute position of the first element.
    pub fn data_position(&self) -> usize {
        self.data_position
    }

    /// View element `index`, or `OutOfRange`.
    pub fn get(&self, index: usize) -> BlobResult<BlobView<'a, T>> {
        if index >= self.len {
            return Err(BlobError::OutOfRange {
                index,
                length: self.len,
            });
        }
        Ok(self.element(index))
    }

    /// Views of every element in order.
    pub fn iter(&self) -> impl Iterator<Item = BlobView<'a, T>> + 'a
    where
        T: 'a,
    {
        let array = *self;
        (0..self.len).map(move |index| array.element(index))
    }

    /// All element bytes as one slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.blob[self.data_position..self.data_position + self.len * size_of::<T>()]
    }

    /// The whole blob the array lives in.
    pub(crate) fn blob(&self) -> &'a [u8] {
        self.blob
    }

    /// Caller guarantees `index < self.len()`.
    pub(crate) fn element(&self, index: usize) -> BlobView<'a, T> {
        BlobView::new_unchecked(self.blob, self.data_position + index * size_of::<T>())
    }
}

impl<T: Pod> ArrayView<'_, T> {
    /// Copy out element `index`.
    pub fn read_at(&self, index: usize) -> BlobResult<T> {
        Ok(self.get(index)?.read())
    }

    /// Copy out every element.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().map(|element| element.read()).collect()
    }
}

impl<T> Clone for ArrayView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArrayView<'_, T> {}

impl<T> fmt::Debug for ArrayView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayView")
            .field("data_position", &self.data_position)
            .field("len", &self.len)
            .finish()
    }
}
