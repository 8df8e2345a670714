//! Builders for content whose type is only known by size.

use std::mem::size_of;

use bytemuck::Pod;
use relblob_types::{
    check_alignment, natural_alignment_of, BlobArray, BlobArrayAny, BlobError, BlobPtrAny,
    BlobTreeAny,
};
use tracing::trace;

use crate::builder::{AnyBuilder, BuildHandle, BuildRecord, Builder};
use crate::builders::tree::{end_index_array, flatten_preorder};
use crate::builders::value::ValueBuilder;
use crate::error::{to_i32, BuildResult};
use crate::stream::BlobStream;

/// Alignment used for erased content when nothing better is known.
pub const DEFAULT_ERASED_ALIGNMENT: usize = 4;

/// Raw bytes written with an explicit alignment.
#[derive(Debug)]
pub struct AnyValueBuilder {
    bytes: Vec<u8>,
    alignment: usize,
    handle: BuildHandle<()>,
}

impl AnyValueBuilder {
    pub fn new<T: Pod>(value: T) -> Self {
        Self {
            bytes: bytemuck::bytes_of(&value).to_vec(),
            alignment: natural_alignment_of::<T>(),
            handle: BuildHandle::new(),
        }
    }

    pub fn with_alignment<T: Pod>(value: T, alignment: usize) -> BuildResult<Self> {
        let mut builder = Self::new(value);
        builder.set_alignment(alignment)?;
        Ok(builder)
    }

    /// Bytes of unknown type, aligned to [`DEFAULT_ERASED_ALIGNMENT`].
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            alignment: DEFAULT_ERASED_ALIGNMENT,
            handle: BuildHandle::new(),
        }
    }

    pub fn set_alignment(&mut self, alignment: usize) -> BuildResult<()> {
        check_alignment(alignment)?;
        self.alignment = alignment;
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn handle(&self) -> BuildHandle<()> {
        self.handle.clone()
    }
}

impl AnyBuilder for AnyValueBuilder {
    fn build_any(&mut self, stream: &mut BlobStream) -> BuildResult<()> {
        let data_position = stream.position();
        let patch_position = stream.patch_position();
        stream.write(&self.bytes, self.alignment)?;
        self.handle.set(BuildRecord {
            data_position,
            data_size: self.bytes.len(),
            patch_position,
            patch_size: stream.patch_position() - patch_position,
            build_id: stream.build_id(),
        });
        Ok(())
    }

    fn any_handle(&self) -> BuildHandle<()> {
        self.handle.clone()
    }

    fn data_size(&self) -> usize {
        self.bytes.len()
    }

    fn data_alignment(&self) -> usize {
        self.alignment
    }
}

/// Builds a [`BlobArrayAny`] from heterogeneous elements.
///
/// Each element starts at its own alignment inside a data region aligned for
/// the strictest element. `offsets` records every start plus the total size.
pub struct AnyArrayBuilder {
    items: Vec<Box<dyn AnyBuilder>>,
    alignment: Option<usize>,
    handle: BuildHandle<BlobArrayAny>,
    offsets_handle: BuildHandle<BlobArray<i32>>,
    data_handle: BuildHandle<BlobArray<u8>>,
}

impl AnyArrayBuilder {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            alignment: None,
            handle: BuildHandle::new(),
            offsets_handle: BuildHandle::new(),
            data_handle: BuildHandle::new(),
        }
    }

    pub(crate) fn from_boxed(items: Vec<Box<dyn AnyBuilder>>) -> Self {
        Self {
            items,
            ..Self::new()
        }
    }

    /// Alignment for values pushed from now on, instead of their natural one.
    pub fn with_alignment(mut self, alignment: usize) -> BuildResult<Self> {
        check_alignment(alignment)?;
        self.alignment = Some(alignment);
        Ok(self)
    }

    pub fn push<T: Pod>(&mut self, value: T) -> BuildHandle<()> {
        let builder = self.value_builder(value);
        self.push_builder(builder)
    }

    pub fn push_builder(&mut self, builder: impl AnyBuilder + 'static) -> BuildHandle<()> {
        let handle = builder.any_handle();
        self.items.push(Box::new(builder));
        handle
    }

    pub fn insert<T: Pod>(&mut self, index: usize, value: T) -> BuildResult<BuildHandle<()>> {
        let builder = self.value_builder(value);
        self.insert_builder(index, builder)
    }

    pub fn insert_builder(
        &mut self,
        index: usize,
        builder: impl AnyBuilder + 'static,
    ) -> BuildResult<BuildHandle<()>> {
        if index > self.items.len() {
            return Err(BlobError::OutOfRange {
                index,
                length: self.items.len(),
            }
            .into());
        }
        let handle = builder.any_handle();
        self.items.insert(index, Box::new(builder));
        Ok(handle)
    }

    pub fn remove(&mut self, index: usize) -> BuildResult<()> {
        if index >= self.items.len() {
            return Err(BlobError::OutOfRange {
                index,
                length: self.items.len(),
            }
            .into());
        }
        self.items.remove(index);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handle of the `offsets` array; its patch record covers the table.
    pub fn offsets_handle(&self) -> BuildHandle<BlobArray<i32>> {
        self.offsets_handle.clone()
    }

    /// Handle of the `data` array; its patch record covers every element.
    pub fn data_handle(&self) -> BuildHandle<BlobArray<u8>> {
        self.data_handle.clone()
    }

    fn value_builder<T: Pod>(&self, value: T) -> AnyValueBuilder {
        let mut builder = AnyValueBuilder::new(value);
        if let Some(alignment) = self.alignment {
            builder.alignment = alignment;
        }
        builder
    }
}

impl Default for AnyArrayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for AnyArrayBuilder {
    type Target = BlobArrayAny;

    fn handle(&self) -> BuildHandle<BlobArrayAny> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        let offsets_len = self.items.len() + 1;
        let offsets_position = stream
            .align_patch(natural_alignment_of::<i32>())?
            .patch_position();
        stream.expand_patch(offsets_len * size_of::<i32>(), 1)?;

        let data_alignment = self
            .items
            .iter()
            .map(|item| item.data_alignment())
            .max()
            .unwrap_or(1);
        let data_start = stream.align_patch(data_alignment)?.patch_position();
        let mut offsets = Vec::with_capacity(offsets_len);
        for item in &mut self.items {
            let start = stream.align_patch(item.data_alignment())?.patch_position();
            offsets.push(to_i32(start - data_start, "element offset")?);
            stream.to_patch_position();
            item.build_any(stream)?;
        }
        let data_len = stream.patch_position() - data_start;
        offsets.push(to_i32(data_len, "data size")?);

        stream
            .to_position(data_position + BlobArrayAny::OFFSETS_FIELD)
            .write_array_meta_at(offsets_len, offsets_position)?
            .to_position(data_position + BlobArrayAny::DATA_FIELD)
            .write_array_meta_at(data_len, data_start)?
            .to_position(offsets_position)
            .write_slice(&offsets, natural_alignment_of::<i32>())?;

        self.offsets_handle.set(BuildRecord {
            data_position: data_position + BlobArrayAny::OFFSETS_FIELD,
            data_size: size_of::<BlobArray<i32>>(),
            patch_position: offsets_position,
            patch_size: offsets_len * size_of::<i32>(),
            build_id: stream.build_id(),
        });
        self.data_handle.set(BuildRecord {
            data_position: data_position + BlobArrayAny::DATA_FIELD,
            data_size: size_of::<BlobArray<u8>>(),
            patch_position: data_start,
            patch_size: data_len,
            build_id: stream.build_id(),
        });
        trace!(elements = self.items.len(), data_len, "built any array");
        Ok(())
    }
}

/// Builds a [`BlobPtrAny`]: a pointer that records the byte size of its target.
pub struct AnyPtrBuilder {
    target: Box<dyn AnyBuilder>,
    size: Option<usize>,
    alignment: usize,
    handle: BuildHandle<BlobPtrAny>,
}

impl AnyPtrBuilder {
    /// Point at a copy of `value`, recorded at exactly `size_of::<T>()` bytes.
    pub fn new<T: Pod>(value: T) -> Self {
        Self::with_builder(ValueBuilder::new(value))
    }

    /// Point at a typed builder, recorded at the size of its header.
    pub fn with_builder<B: Builder + 'static>(builder: B) -> Self {
        Self {
            target: Box::new(builder),
            size: Some(size_of::<B::Target>()),
            alignment: natural_alignment_of::<B::Target>(),
            handle: BuildHandle::new(),
        }
    }

    /// Point at an erased builder. Its size is measured as the patch space
    /// it consumes.
    pub fn with_any_builder(builder: impl AnyBuilder + 'static) -> Self {
        Self {
            target: Box::new(builder),
            size: None,
            alignment: DEFAULT_ERASED_ALIGNMENT,
            handle: BuildHandle::new(),
        }
    }

    pub fn target_handle(&self) -> BuildHandle<()> {
        self.target.any_handle()
    }
}

impl Builder for AnyPtrBuilder {
    type Target = BlobPtrAny;

    fn handle(&self) -> BuildHandle<BlobPtrAny> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        let target = stream.align_patch(self.alignment)?.patch_position();
        stream.to_position(target);
        self.target.build_any(stream)?;
        let size = self
            .size
            .unwrap_or_else(|| stream.patch_position() - target);
        stream
            .to_position(data_position)
            .write_array_meta_at(size, target)?;
        Ok(())
    }

    fn patch_alignment(&self) -> usize {
        self.alignment
    }
}

/// A node of an erased tree under construction.
pub struct AnyTreeNode {
    value: Box<dyn AnyBuilder>,
    children: Vec<AnyTreeNode>,
}

impl AnyTreeNode {
    pub fn new<T: Pod>(value: T) -> Self {
        Self::with_builder(AnyValueBuilder::new(value))
    }

    pub fn with_builder(value: impl AnyBuilder + 'static) -> Self {
        Self {
            value: Box::new(value),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: AnyTreeNode) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn with_child(mut self, child: AnyTreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(&self) -> &[AnyTreeNode] {
        &self.children
    }

    pub fn handle(&self) -> BuildHandle<()> {
        self.value.any_handle()
    }
}

/// Builds a [`BlobTreeAny`] from a forest of [`AnyTreeNode`]s.
pub struct AnyTreeBuilder {
    end_indices: Vec<usize>,
    data: AnyArrayBuilder,
    handle: BuildHandle<BlobTreeAny>,
}

impl AnyTreeBuilder {
    pub fn new(root: AnyTreeNode) -> Self {
        Self::from_forest(vec![root])
    }

    pub fn from_forest(roots: Vec<AnyTreeNode>) -> Self {
        let (values, end_indices) = flatten_preorder(roots, |node| (node.value, node.children));
        Self {
            end_indices,
            data: AnyArrayBuilder::from_boxed(values),
            handle: BuildHandle::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.end_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.end_indices.is_empty()
    }

    pub fn end_indices(&self) -> &[usize] {
        &self.end_indices
    }
}

impl Default for AnyTreeBuilder {
    fn default() -> Self {
        Self::from_forest(Vec::new())
    }
}

impl Builder for AnyTreeBuilder {
    type Target = BlobTreeAny;

    fn handle(&self) -> BuildHandle<BlobTreeAny> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.to_position(data_position + BlobTreeAny::END_INDICES_FIELD);
        end_index_array(&self.end_indices)?.build(stream)?;
        stream.to_position(data_position + BlobTreeAny::DATA_FIELD);
        self.data.build(stream)?;
        trace!(nodes = self.end_indices.len(), "built any tree");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{ArrayBuilder, PtrBuilder};
    use relblob_types::{BlobPtr, Zeroable};
    use relblob_view::BlobView;

    fn build<B: Builder>(builder: &mut B) -> Vec<u8> {
        let mut stream = BlobStream::new();
        builder.build(&mut stream).unwrap();
        stream.finish(8).unwrap()
    }

    fn mixed() -> AnyArrayBuilder {
        let mut array = AnyArrayBuilder::new();
        array.push(123i64);
        array.push(456i32);
        array.push(1111f32);
        array.push(2333.3f64);
        array.push_builder(PtrBuilder::new(1234i32));
        array.push_builder(ArrayBuilder::new(vec![1i64, 2, 3]));
        array
    }

    #[test]
    fn mixed_sizes() {
        let mut array = mixed();
        let blob = build(&mut array);
        let view = BlobView::<BlobArrayAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.len(), 6);
        assert_eq!(view.size(0).unwrap(), 8);
        assert_eq!(view.size(1).unwrap(), 4);
        assert_eq!(view.size(4).unwrap(), 8);
        assert_eq!(view.size(5).unwrap(), 32);
    }

    #[test]
    fn mixed_values_read_back() {
        let mut array = mixed();
        let blob = build(&mut array);
        let view = BlobView::<BlobArrayAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.read::<i64>(0).unwrap(), 123);
        assert_eq!(view.read::<i32>(1).unwrap(), 456);
        assert_eq!(view.read::<f32>(2).unwrap(), 1111.0);
        assert_eq!(view.read::<f64>(3).unwrap(), 2333.3);
        let ptr = view.value::<BlobPtr<i32>>(4).unwrap();
        assert_eq!(ptr.value().unwrap().read(), 1234);
        let longs = view.value::<BlobArray<i64>>(5).unwrap().open().unwrap();
        assert_eq!(longs.to_vec(), vec![1, 2, 3]);
        assert!(view.read::<i64>(1).is_err());
    }

    #[test]
    fn element_offsets_are_aligned() {
        let mut array = mixed();
        let blob = build(&mut array);
        let view = BlobView::<BlobArrayAny>::root(&blob).unwrap().open().unwrap();
        let data = array.data_handle().record().unwrap().patch_position;
        assert_eq!(data % 8, 0);
        assert_eq!(view.offset(3).unwrap() % 8, 0);
        assert_eq!(view.offset(5).unwrap() % 4, 0);
    }

    #[test]
    fn editing_elements() {
        let mut array = AnyArrayBuilder::new();
        array.push(1u8);
        array.push(3u8);
        array.insert(1, 2u8).unwrap();
        assert!(array.insert(9, 0u8).is_err());
        array.push(4u8);
        array.remove(3).unwrap();
        assert!(array.remove(3).is_err());
        let blob = build(&mut array);
        let view = BlobView::<BlobArrayAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.len(), 3);
        let values: Vec<u8> = (0..3).map(|i| view.read::<u8>(i).unwrap()).collect();
        assert_eq!(values, vec![1, 2, 3]);

        array.clear();
        assert!(array.is_empty());
    }

    #[test]
    fn empty_any_array_has_single_offset() {
        let mut array = AnyArrayBuilder::new();
        let blob = build(&mut array);
        let header = BlobView::<BlobArrayAny>::root(&blob).unwrap().read();
        assert_eq!(header.offsets.length, 1);
        assert_eq!(header.data.length, 0);
        assert!(BlobView::<BlobArrayAny>::root(&blob).unwrap().open().unwrap().is_empty());
    }

    #[test]
    fn alignment_override_applies_to_values() {
        let mut array = AnyArrayBuilder::new().with_alignment(16).unwrap();
        array.push(1u8);
        array.push(2u8);
        let blob = build(&mut array);
        let view = BlobView::<BlobArrayAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.offset(1).unwrap(), 16);
    }

    #[test]
    fn any_pointer_sizes() {
        let mut typed = AnyPtrBuilder::new(7u16);
        let blob = build(&mut typed);
        let view = BlobView::<BlobPtrAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.size(), 2);
        assert_eq!(view.read::<u16>().unwrap(), 7);

        let mut erased = AnyPtrBuilder::with_any_builder(AnyValueBuilder::from_bytes(vec![1, 2, 3]));
        let blob = build(&mut erased);
        let view = BlobView::<BlobPtrAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.size(), 4);
        assert_eq!(&view.bytes()[..3], &[1, 2, 3]);
    }

    #[test]
    fn any_pointer_to_array_measures_header() {
        let mut ptr = AnyPtrBuilder::with_builder(ArrayBuilder::new(vec![5u32, 6]));
        let blob = build(&mut ptr);
        let view = BlobView::<BlobPtrAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.size(), 8);
        let array = view.value::<BlobArray<u32>>().unwrap().open().unwrap();
        assert_eq!(array.to_vec(), vec![5, 6]);
    }

    #[test]
    fn any_tree_reads_back() {
        let root = AnyTreeNode::new(1u8)
            .with_child(AnyTreeNode::new(2u64))
            .with_child(AnyTreeNode::new(3i16).with_child(AnyTreeNode::new(4f32)));
        let mut tree = AnyTreeBuilder::new(root);
        assert_eq!(tree.end_indices(), &[4, 2, 4, 4]);
        let blob = build(&mut tree);

        let view = BlobView::<BlobTreeAny>::root(&blob).unwrap().open().unwrap();
        assert_eq!(view.len(), 4);
        assert_eq!(view.read::<u8>(0).unwrap(), 1);
        assert_eq!(view.read::<u64>(1).unwrap(), 2);
        assert_eq!(view.read::<i16>(2).unwrap(), 3);
        assert_eq!(view.read::<f32>(3).unwrap(), 4.0);
        assert_eq!(view.children(0).unwrap(), vec![1, 2]);
        assert_eq!(view.find_parent_index(3).unwrap(), Some(2));
    }

    #[test]
    fn empty_any_tree() {
        let mut tree = AnyTreeBuilder::default();
        let blob = build(&mut tree);
        let header: BlobTreeAny = BlobView::<BlobTreeAny>::root(&blob).unwrap().read();
        assert_eq!(header.end_indices.length, 0);
        assert_eq!(header.data.offsets.length, 1);
        assert_ne!(header, BlobTreeAny::zeroed());
        assert!(BlobView::<BlobTreeAny>::root(&blob).unwrap().open().unwrap().is_empty());
    }

    #[derive(Clone, Copy, Debug)]
    enum Scalar {
        Byte(u8),
        Short(u16),
        Word(u32),
        Long(u64),
    }

    fn scalar() -> impl proptest::strategy::Strategy<Value = Scalar> {
        use proptest::prelude::*;
        prop_oneof![
            any::<u8>().prop_map(Scalar::Byte),
            any::<u16>().prop_map(Scalar::Short),
            any::<u32>().prop_map(Scalar::Word),
            any::<u64>().prop_map(Scalar::Long),
        ]
    }

    proptest::proptest! {
        #[test]
        fn random_elements_are_aligned_and_read_back(
            values in proptest::collection::vec(scalar(), 0..40)
        ) {
            let mut array = AnyArrayBuilder::new();
            for value in &values {
                match *value {
                    Scalar::Byte(v) => array.push(v),
                    Scalar::Short(v) => array.push(v),
                    Scalar::Word(v) => array.push(v),
                    Scalar::Long(v) => array.push(v),
                };
            }
            let blob = build(&mut array);
            let view = BlobView::<BlobArrayAny>::root(&blob).unwrap().open().unwrap();
            proptest::prop_assert_eq!(view.len(), values.len());

            let data = array.data_handle().record().unwrap().patch_position;
            let mut previous_end = 0;
            for (index, value) in values.iter().enumerate() {
                let offset = view.offset(index).unwrap();
                proptest::prop_assert!(offset >= previous_end);
                let (alignment, size) = match *value {
                    Scalar::Byte(v) => {
                        proptest::prop_assert_eq!(view.read::<u8>(index).unwrap(), v);
                        (1, 1)
                    }
                    Scalar::Short(v) => {
                        proptest::prop_assert_eq!(view.read::<u16>(index).unwrap(), v);
                        (2, 2)
                    }
                    Scalar::Word(v) => {
                        proptest::prop_assert_eq!(view.read::<u32>(index).unwrap(), v);
                        (4, 4)
                    }
                    Scalar::Long(v) => {
                        proptest::prop_assert_eq!(view.read::<u64>(index).unwrap(), v);
                        (8, 8)
                    }
                };
                proptest::prop_assert_eq!((data + offset) % alignment, 0);
                proptest::prop_assert!(view.size(index).unwrap() >= size);
                previous_end = offset + size;
            }
            proptest::prop_assert_eq!(view.data_len(), previous_end);
        }
    }
}
