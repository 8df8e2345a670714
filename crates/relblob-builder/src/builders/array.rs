use std::mem::size_of;

use bytemuck::Pod;
use relblob_types::{natural_alignment_of, BlobArray, BlobError};

use crate::builder::{BuildHandle, BuildRecord, Builder};
use crate::error::BuildResult;
use crate::stream::BlobStream;

/// An array whose elements are copied in as raw bytes.
#[derive(Debug)]
pub struct ArrayBuilder<T: Pod> {
    items: Vec<T>,
    alignment: Option<usize>,
    handle: BuildHandle<BlobArray<T>>,
    item_handles: Vec<(usize, BuildHandle<T>)>,
}

impl<T: Pod> ArrayBuilder<T> {
    pub fn new(items: impl Into<Vec<T>>) -> Self {
        Self {
            items: items.into(),
            alignment: None,
            handle: BuildHandle::new(),
            item_handles: Vec::new(),
        }
    }

    /// Store the elements at `alignment` instead of `T`'s natural alignment.
    pub fn with_alignment(mut self, alignment: usize) -> BuildResult<Self> {
        relblob_types::check_alignment(alignment)?;
        self.alignment = Some(alignment);
        Ok(self)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handle of element `index`, for pointers into the array.
    pub fn item_handle(&mut self, index: usize) -> BuildResult<BuildHandle<T>> {
        if index >= self.items.len() {
            return Err(BlobError::OutOfRange {
                index,
                length: self.items.len(),
            }
            .into());
        }
        if let Some((_, handle)) = self.item_handles.iter().find(|(i, _)| *i == index) {
            return Ok(handle.clone());
        }
        let handle = BuildHandle::new();
        self.item_handles.push((index, handle.clone()));
        Ok(handle)
    }

    fn element_alignment(&self) -> usize {
        self.alignment.unwrap_or(natural_alignment_of::<T>())
    }
}

impl<T: Pod> Builder for ArrayBuilder<T> {
    type Target = BlobArray<T>;

    fn handle(&self) -> BuildHandle<BlobArray<T>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        let alignment = self.element_alignment();
        if !self.items.is_empty() {
            stream.align_patch(alignment)?;
        }
        let data = stream.patch_position();
        stream
            .to_position(data_position)
            .write_array_meta(self.items.len())?
            .to_position(data)
            .write_slice(&self.items, alignment)?;
        for (index, handle) in &self.item_handles {
            handle.set(BuildRecord {
                data_position: data + index * size_of::<T>(),
                data_size: size_of::<T>(),
                patch_position: data + (index + 1) * size_of::<T>(),
                patch_size: 0,
                build_id: stream.build_id(),
            });
        }
        Ok(())
    }

    fn patch_alignment(&self) -> usize {
        self.element_alignment()
    }
}

/// Write an array header at `field_position` whose elements are produced by
/// one builder each.
pub(crate) fn build_item_array<T: Pod>(
    stream: &mut BlobStream,
    field_position: usize,
    items: &mut [Box<dyn Builder<Target = T>>],
    alignment: usize,
) -> BuildResult<()> {
    if !items.is_empty() {
        stream.align_patch(alignment)?;
    }
    let data = stream.patch_position();
    stream
        .to_position(field_position)
        .write_array_meta(items.len())?;
    stream.expand_patch(items.len() * size_of::<T>(), alignment)?;
    for (index, item) in items.iter_mut().enumerate() {
        stream.to_position(data + index * size_of::<T>());
        item.build(stream)?;
    }
    Ok(())
}

/// An array whose elements are built by child builders, such as pointers,
/// strings or nested structs.
pub struct ItemArrayBuilder<T: Pod> {
    items: Vec<Box<dyn Builder<Target = T>>>,
    alignment: Option<usize>,
    handle: BuildHandle<BlobArray<T>>,
}

impl<T: Pod> ItemArrayBuilder<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            alignment: None,
            handle: BuildHandle::new(),
        }
    }

    pub fn with_alignment(mut self, alignment: usize) -> BuildResult<Self> {
        relblob_types::check_alignment(alignment)?;
        self.alignment = Some(alignment);
        Ok(self)
    }

    /// Append an element builder and return its handle.
    pub fn push(&mut self, item: impl Builder<Target = T> + 'static) -> BuildHandle<T> {
        let handle = item.handle();
        self.items.push(Box::new(item));
        handle
    }

    pub fn push_boxed(&mut self, item: Box<dyn Builder<Target = T>>) -> BuildHandle<T> {
        let handle = item.handle();
        self.items.push(item);
        handle
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handle of element `index`.
    pub fn item_handle(&self, index: usize) -> BuildResult<BuildHandle<T>> {
        self.items
            .get(index)
            .map(|item| item.handle())
            .ok_or_else(|| {
                BlobError::OutOfRange {
                    index,
                    length: self.items.len(),
                }
                .into()
            })
    }

    fn element_alignment(&self) -> usize {
        self.alignment.unwrap_or(natural_alignment_of::<T>())
    }
}

impl<T: Pod> Default for ItemArrayBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod, B: Builder<Target = T> + 'static> FromIterator<B> for ItemArrayBuilder<T> {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        let mut array = Self::new();
        for item in iter {
            array.push(item);
        }
        array
    }
}

impl<T: Pod> Builder for ItemArrayBuilder<T> {
    type Target = BlobArray<T>;

    fn handle(&self) -> BuildHandle<BlobArray<T>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        let alignment = self.element_alignment();
        build_item_array(stream, data_position, &mut self.items, alignment)
    }

    fn patch_alignment(&self) -> usize {
        self.element_alignment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{PtrBuilder, ValueBuilder};

    #[test]
    fn raw_array_layout() {
        let mut builder = ArrayBuilder::new(vec![1u16, 2, 3]);
        let mut stream = BlobStream::new();
        builder.build(&mut stream).unwrap();
        assert_eq!(
            hex::encode(stream.finish(4).unwrap()),
            "08000000030000000100020003000000"
        );
    }

    #[test]
    fn empty_array_points_at_patch() {
        let mut builder = ArrayBuilder::<u64>::new(Vec::new());
        let mut stream = BlobStream::new();
        builder.build(&mut stream).unwrap();
        assert_eq!(hex::encode(stream.finish(4).unwrap()), "0800000000000000");
    }

    #[test]
    fn alignment_override_pads_data() {
        let mut builder = ArrayBuilder::new(vec![1u8, 2]).with_alignment(16).unwrap();
        let mut stream = BlobStream::new();
        builder.build(&mut stream).unwrap();
        let bytes = stream.finish(1).unwrap();
        assert_eq!(bytes[..4], 16i32.to_ne_bytes());
        assert_eq!(bytes.len(), 32);
        assert!(ArrayBuilder::new(vec![1u8]).with_alignment(3).is_err());
    }

    #[test]
    fn item_handles_record_element_positions() {
        let mut builder = ArrayBuilder::new(vec![10i32, 20, 30]);
        let second = builder.item_handle(1).unwrap();
        assert!(builder.item_handle(3).is_err());
        builder.build(&mut BlobStream::new()).unwrap();
        assert_eq!(second.data_position().unwrap(), 12);
    }

    #[test]
    fn item_builders_fill_reserved_slots() {
        let mut builder: ItemArrayBuilder<_> = [7i32, 8].into_iter().map(PtrBuilder::new).collect();
        let mut stream = BlobStream::new();
        builder.build(&mut stream).unwrap();
        // header, two pointers, then the two pointees
        assert_eq!(
            hex::encode(stream.finish(4).unwrap()),
            "080000000200000008000000080000000700000008000000"
        );
    }

    #[test]
    fn item_array_exposes_child_handles() {
        let mut builder = ItemArrayBuilder::new();
        let first = builder.push(ValueBuilder::new(1u8));
        builder.push(ValueBuilder::new(2u8));
        builder.build(&mut BlobStream::new()).unwrap();
        assert_eq!(first.data_position().unwrap(), 8);
        assert_eq!(builder.item_handle(1).unwrap().data_position().unwrap(), 9);
    }
}
