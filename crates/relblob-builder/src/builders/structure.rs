use std::mem::size_of;

use bytemuck::Pod;
use relblob_types::{BlobArray, BlobPtr, BlobString, BlobTree, Field, TextEncoding};

use crate::builder::{AnyBuilder, BuildHandle, Builder};
use crate::builders::array::{ArrayBuilder, ItemArrayBuilder};
use crate::builders::ptr::{PtrBuilder, RefPtrBuilder};
use crate::builders::string::StringBuilder;
use crate::builders::tree::TreeBuilder;
use crate::builders::value::ValueBuilder;
use crate::error::BuildResult;
use crate::stream::BlobStream;

struct FieldBuilder {
    offset: usize,
    builder: Box<dyn AnyBuilder>,
    handle: BuildHandle<()>,
}

/// Builds a struct `S` from its raw value plus per-field builders.
///
/// Fields without a builder keep the bytes of the raw value. Field builders
/// run in attachment order.
pub struct StructBuilder<S: Pod> {
    value: S,
    fields: Vec<FieldBuilder>,
    handle: BuildHandle<S>,
}

impl<S: Pod> StructBuilder<S> {
    pub fn new(value: S) -> Self {
        Self {
            value,
            fields: Vec::new(),
            handle: BuildHandle::new(),
        }
    }

    pub fn value(&self) -> &S {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut S {
        &mut self.value
    }

    /// Make `builder` responsible for `field`, replacing any earlier builder
    /// for the same field.
    pub fn set_builder<F, B>(&mut self, field: Field<S, F>, builder: B) -> BuildHandle<F>
    where
        F: Pod,
        B: Builder<Target = F> + 'static,
    {
        let handle = builder.handle();
        let entry = FieldBuilder {
            offset: field.offset(),
            builder: Box::new(builder),
            handle: handle.cast(),
        };
        match self.fields.iter_mut().find(|f| f.offset == entry.offset) {
            Some(existing) => *existing = entry,
            None => self.fields.push(entry),
        }
        handle
    }

    /// Handle of the builder attached to `field`.
    pub fn get_builder<F>(&self, field: Field<S, F>) -> Option<BuildHandle<F>> {
        self.fields
            .iter()
            .find(|f| f.offset == field.offset())
            .map(|f| f.handle.cast())
    }

    /// Store a plain value in `field`.
    pub fn set_value<F: Pod>(&mut self, field: Field<S, F>, value: F) -> BuildHandle<F> {
        let offset = field.offset();
        bytemuck::bytes_of_mut(&mut self.value)[offset..offset + size_of::<F>()]
            .copy_from_slice(bytemuck::bytes_of(&value));
        self.set_builder(field, ValueBuilder::new(value))
    }

    pub fn set_array<T: Pod>(
        &mut self,
        field: Field<S, BlobArray<T>>,
        items: impl Into<Vec<T>>,
    ) -> BuildHandle<BlobArray<T>> {
        self.set_builder(field, ArrayBuilder::new(items))
    }

    /// An array with one builder per element.
    pub fn set_item_array<T, B>(
        &mut self,
        field: Field<S, BlobArray<T>>,
        items: impl IntoIterator<Item = B>,
    ) -> BuildHandle<BlobArray<T>>
    where
        T: Pod,
        B: Builder<Target = T> + 'static,
    {
        self.set_builder(field, items.into_iter().collect::<ItemArrayBuilder<T>>())
    }

    /// A pointer to a new copy of `value`.
    pub fn set_pointer<T: Pod>(
        &mut self,
        field: Field<S, BlobPtr<T>>,
        value: T,
    ) -> BuildHandle<BlobPtr<T>> {
        self.set_builder(field, PtrBuilder::new(value))
    }

    /// A pointer to a value built by some other builder.
    pub fn set_pointer_to<T: Pod>(
        &mut self,
        field: Field<S, BlobPtr<T>>,
        target: &BuildHandle<T>,
    ) -> BuildHandle<BlobPtr<T>> {
        self.set_builder(field, RefPtrBuilder::new(target.clone()))
    }

    pub fn set_string<E: TextEncoding>(
        &mut self,
        field: Field<S, BlobString<E>>,
        text: &str,
    ) -> BuildHandle<BlobString<E>> {
        self.set_builder(field, StringBuilder::<E>::new(text))
    }

    pub fn set_tree<T: Pod>(
        &mut self,
        field: Field<S, BlobTree<T>>,
        tree: TreeBuilder<T>,
    ) -> BuildHandle<BlobTree<T>> {
        self.set_builder(field, tree)
    }
}

impl<S: Pod + Default> Default for StructBuilder<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Pod> Builder for StructBuilder<S> {
    type Target = S;

    fn handle(&self) -> BuildHandle<S> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.to_position(data_position).write_value(&self.value)?;
        for field in &mut self.fields {
            stream.to_position(data_position + field.offset);
            field.builder.build_any(stream)?;
        }
        Ok(())
    }
}
