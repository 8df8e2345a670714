use bytemuck::Pod;
use relblob_types::{natural_alignment_of, BlobPtr};

use crate::builder::{BuildHandle, Builder};
use crate::builders::value::ValueBuilder;
use crate::error::BuildResult;
use crate::stream::BlobStream;

/// A pointer to a value built into the patch region.
pub struct PtrBuilder<T: Pod> {
    target: Box<dyn Builder<Target = T>>,
    handle: BuildHandle<BlobPtr<T>>,
}

impl<T: Pod> PtrBuilder<T> {
    pub fn new(value: T) -> Self {
        Self::with_builder(ValueBuilder::new(value))
    }

    /// Point at whatever `target` builds, such as another pointer or an array.
    pub fn with_builder(target: impl Builder<Target = T> + 'static) -> Self {
        Self {
            target: Box::new(target),
            handle: BuildHandle::new(),
        }
    }

    /// Handle of the pointed-to value.
    pub fn target_handle(&self) -> BuildHandle<T> {
        self.target.handle()
    }
}

impl<T: Pod> Builder for PtrBuilder<T> {
    type Target = BlobPtr<T>;

    fn handle(&self) -> BuildHandle<BlobPtr<T>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.align_patch(natural_alignment_of::<T>())?;
        let target = stream.patch_position();
        stream.to_position(data_position).write_offset(target)?;
        stream.to_position(target);
        self.target.build(stream)
    }

    fn patch_alignment(&self) -> usize {
        natural_alignment_of::<T>()
    }
}

/// A pointer to a value some other builder has already written.
///
/// Adds no patch content, so several pointers can share one target. The
/// target must already be built into the same stream.
#[derive(Debug)]
pub struct RefPtrBuilder<T: Pod> {
    target: BuildHandle<T>,
    handle: BuildHandle<BlobPtr<T>>,
}

impl<T: Pod> RefPtrBuilder<T> {
    pub fn new(target: BuildHandle<T>) -> Self {
        Self {
            target,
            handle: BuildHandle::new(),
        }
    }
}

impl<T: Pod> Builder for RefPtrBuilder<T> {
    type Target = BlobPtr<T>;

    fn handle(&self) -> BuildHandle<BlobPtr<T>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        let target = self.target.data_position_in(stream)?;
        stream.to_position(data_position).write_offset(target)?;
        Ok(())
    }
}
