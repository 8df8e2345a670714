//! Readers for type-erased content.
//!
//! Erased elements carry their byte size, and a typed read is allowed only
//! when the requested type fits in it.

use std::any::type_name;
use std::mem::size_of;
use std::ops::Range;

use bytemuck::Pod;
use relblob_types::{
    BlobArray, BlobArrayAny, BlobError, BlobPtrAny, BlobResult, BlobTreeAny,
};

use crate::tree::{delegate_tree_queries, EndIndices};
use crate::view::{ArrayView, BlobView};

/// Fails unless a `T` fits in `size` recorded bytes.
pub fn check_size<T>(size: usize) -> BlobResult<()> {
    if size_of::<T>() > size {
        return Err(BlobError::InvalidArgument(format!(
            "{} needs {} bytes but only {size} are recorded",
            type_name::<T>(),
            size_of::<T>()
        )));
    }
    Ok(())
}

/// A validated [`BlobArrayAny`].
#[derive(Clone, Copy, Debug)]
pub struct AnyArrayView<'a> {
    offsets: ArrayView<'a, i32>,
    data: ArrayView<'a, u8>,
}

impl<'a> BlobView<'a, BlobArrayAny> {
    pub fn open(&self) -> BlobResult<AnyArrayView<'a>> {
        let offsets = self
            .at::<BlobArray<i32>>(BlobArrayAny::OFFSETS_FIELD)?
            .open()?;
        let data = self.at::<BlobArray<u8>>(BlobArrayAny::DATA_FIELD)?.open()?;
        Ok(AnyArrayView { offsets, data })
    }
}

impl<'a> AnyArrayView<'a> {
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset of element `index` from the start of the data region.
    pub fn offset(&self, index: usize) -> BlobResult<usize> {
        Ok(self.span(index)?.start)
    }

    /// Recorded byte size of element `index`.
    pub fn size(&self, index: usize) -> BlobResult<usize> {
        Ok(self.span(index)?.len())
    }

    pub fn bytes(&self, index: usize) -> BlobResult<&'a [u8]> {
        let span = self.span(index)?;
        Ok(&self.data.as_bytes()[span])
    }

    /// View element `index` as a `T`.
    pub fn value<T>(&self, index: usize) -> BlobResult<BlobView<'a, T>> {
        let span = self.span(index)?;
        check_size::<T>(span.len())?;
        Ok(BlobView::new_unchecked(
            self.data.blob(),
            self.data.data_position() + span.start,
        ))
    }

    pub fn read<T: Pod>(&self, index: usize) -> BlobResult<T> {
        Ok(self.value::<T>(index)?.read())
    }

    /// Total size of the data region.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    fn span(&self, index: usize) -> BlobResult<Range<usize>> {
        if index >= self.len() {
            return Err(BlobError::OutOfRange {
                index,
                length: self.len(),
            });
        }
        let start = self.offsets.element(index).read();
        let end = self.offsets.element(index + 1).read();
        match (usize::try_from(start), usize::try_from(end)) {
            (Ok(start), Ok(end)) if start <= end && end <= self.data.len() => Ok(start..end),
            _ => Err(BlobError::InvalidArgument(format!(
                "corrupt offsets {start}..{end} for element {index}"
            ))),
        }
    }
}

/// A validated [`BlobPtrAny`].
#[derive(Clone, Copy, Debug)]
pub struct AnyPtrView<'a> {
    data: ArrayView<'a, u8>,
}

impl<'a> BlobView<'a, BlobPtrAny> {
    pub fn open(&self) -> BlobResult<AnyPtrView<'a>> {
        let data = self.at::<BlobArray<u8>>(0)?.open()?;
        Ok(AnyPtrView { data })
    }
}

impl<'a> AnyPtrView<'a> {
    /// Recorded byte size of the target.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data.as_bytes()
    }

    pub fn value<T>(&self) -> BlobResult<BlobView<'a, T>> {
        check_size::<T>(self.size())?;
        Ok(BlobView::new_unchecked(
            self.data.blob(),
            self.data.data_position(),
        ))
    }

    pub fn read<T: Pod>(&self) -> BlobResult<T> {
        Ok(self.value::<T>()?.read())
    }
}

/// A validated [`BlobTreeAny`].
#[derive(Clone, Copy, Debug)]
pub struct AnyTreeView<'a> {
    structure: EndIndices<'a>,
    data: AnyArrayView<'a>,
}

impl<'a> BlobView<'a, BlobTreeAny> {
    pub fn open(&self) -> BlobResult<AnyTreeView<'a>> {
        let end_indices = self
            .at::<BlobArray<i32>>(BlobTreeAny::END_INDICES_FIELD)?
            .open()?;
        let data = self.at::<BlobArrayAny>(BlobTreeAny::DATA_FIELD)?.open()?;
        if end_indices.len() != data.len() {
            return Err(BlobError::InvalidArgument(format!(
                "tree has {} end indices for {} nodes",
                end_indices.len(),
                data.len()
            )));
        }
        Ok(AnyTreeView {
            structure: EndIndices::new(end_indices),
            data,
        })
    }
}

impl<'a> AnyTreeView<'a> {
    pub fn len(&self) -> usize {
        self.structure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
    }

    /// The node values as an erased array.
    pub fn nodes(&self) -> AnyArrayView<'a> {
        self.data
    }

    pub fn size(&self, index: usize) -> BlobResult<usize> {
        self.data.size(index)
    }

    pub fn value<T>(&self, index: usize) -> BlobResult<BlobView<'a, T>> {
        self.data.value(index)
    }

    pub fn read<T: Pod>(&self, index: usize) -> BlobResult<T> {
        self.data.read(index)
    }

    delegate_tree_queries!('a);
}
