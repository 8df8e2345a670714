//! The contract shared by every format builder.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::rc::Rc;

use bytemuck::Pod;
use relblob_types::natural_alignment_of;

use crate::error::{BuildError, BuildResult};
use crate::stream::BlobStream;

/// Where a builder's bytes ended up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildRecord {
    /// Absolute position of the header.
    pub data_position: usize,
    /// Size of the header.
    pub data_size: usize,
    /// Patch cursor when the builder's own content began.
    pub patch_position: usize,
    /// Bytes of patch content the builder reserved, including nested content.
    pub patch_size: usize,
    /// [`BlobStream::build_id`] of the stream the builder was built into.
    pub build_id: u64,
}

/// A shared slot that receives a builder's [`BuildRecord`] when it is built.
///
/// Clones observe the same slot, so a handle taken before the build can be
/// given to another builder that needs the final position.
///
/// The slot is an `Rc<Cell<_>>`, so handles and every builder holding one are
/// `!Send`. A build runs on one thread; to build disjoint blobs in parallel,
/// construct each builder tree on the thread that builds it.
pub struct BuildHandle<T> {
    slot: Rc<Cell<Option<BuildRecord>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BuildHandle<T> {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(Cell::new(None)),
            _marker: PhantomData,
        }
    }

    /// The last recorded build, if any.
    pub fn record(&self) -> Option<BuildRecord> {
        self.slot.get()
    }

    pub fn is_built(&self) -> bool {
        self.record().is_some()
    }

    /// Position from the last build, whichever stream it went into.
    pub fn data_position(&self) -> BuildResult<usize> {
        self.record()
            .map(|record| record.data_position)
            .ok_or(BuildError::Unresolved)
    }

    /// Position within `stream`. A record left by a build into another
    /// stream is `Unresolved`.
    pub fn data_position_in(&self, stream: &BlobStream) -> BuildResult<usize> {
        match self.record() {
            Some(record) if record.build_id == stream.build_id() => Ok(record.data_position),
            _ => Err(BuildError::Unresolved),
        }
    }

    /// The same slot viewed as a different target type.
    ///
    /// Only positions are shared; nothing checks that the bytes are a `U`.
    pub fn cast<U>(&self) -> BuildHandle<U> {
        BuildHandle {
            slot: Rc::clone(&self.slot),
            _marker: PhantomData,
        }
    }

    pub(crate) fn set(&self, record: BuildRecord) {
        self.slot.set(Some(record));
    }
}

impl<T> Default for BuildHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BuildHandle<T> {
    fn clone(&self) -> Self {
        self.cast()
    }
}

impl<T> fmt::Debug for BuildHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BuildHandle").field(&self.record()).finish()
    }
}

/// Writes one `Target` header at the stream position plus any variable
/// content it owns in the patch region.
pub trait Builder {
    type Target: Pod;

    /// Handle that receives this builder's record.
    fn handle(&self) -> BuildHandle<Self::Target>;

    /// Write the header at `data_position` and build children into the
    /// patch region. Header space is already reserved.
    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize)
        -> BuildResult<()>;

    /// Alignment the patch cursor is rounded to after content was written.
    fn patch_alignment(&self) -> usize {
        natural_alignment_of::<Self::Target>()
    }

    /// Build at the current stream position.
    fn build(&mut self, stream: &mut BlobStream) -> BuildResult<()> {
        let handle = self.handle();
        let data_position = stream.position();
        stream.ensure_data_size::<Self::Target>()?;
        let patch_position = stream.patch_position();
        let mut record = BuildRecord {
            data_position,
            data_size: size_of::<Self::Target>(),
            patch_position,
            patch_size: 0,
            build_id: stream.build_id(),
        };
        handle.set(record);

        self.build_content(stream, data_position)?;

        if stream.patch_position() > patch_position {
            stream.align_patch(self.patch_alignment())?;
        }
        record.patch_size = stream.patch_position() - patch_position;
        handle.set(record);
        Ok(())
    }
}

impl<B: Builder + ?Sized> Builder for Box<B> {
    type Target = B::Target;

    fn handle(&self) -> BuildHandle<Self::Target> {
        (**self).handle()
    }

    fn build_content(
        &mut self,
        stream: &mut BlobStream,
        data_position: usize,
    ) -> BuildResult<()> {
        (**self).build_content(stream, data_position)
    }

    fn patch_alignment(&self) -> usize {
        (**self).patch_alignment()
    }

    fn build(&mut self, stream: &mut BlobStream) -> BuildResult<()> {
        (**self).build(stream)
    }
}

/// A builder driven without knowing its header type.
pub trait AnyBuilder {
    fn build_any(&mut self, stream: &mut BlobStream) -> BuildResult<()>;

    /// Handle with the target type erased.
    fn any_handle(&self) -> BuildHandle<()>;

    /// Bytes written at the data position.
    fn data_size(&self) -> usize;

    /// Alignment the data position needs.
    fn data_alignment(&self) -> usize;
}

impl<B: Builder> AnyBuilder for B {
    fn build_any(&mut self, stream: &mut BlobStream) -> BuildResult<()> {
        self.build(stream)
    }

    fn any_handle(&self) -> BuildHandle<()> {
        self.handle().cast()
    }

    fn data_size(&self) -> usize {
        size_of::<B::Target>()
    }

    fn data_alignment(&self) -> usize {
        natural_alignment_of::<B::Target>()
    }
}
