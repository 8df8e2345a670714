//! Offset, array and value writers over [`BlobStream`].

use std::mem::size_of;

use bytemuck::Pod;
use relblob_types::{align, natural_alignment_of};

use crate::error::{to_i32, BuildError, BuildResult};
use crate::stream::BlobStream;

impl BlobStream {
    /// Reserve room for a `T` at `position`, aligned for `T`.
    pub fn ensure_data_size<T>(&mut self) -> BuildResult<&mut Self> {
        self.ensure_size(size_of::<T>(), natural_alignment_of::<T>())
    }

    /// Reserve `size` bytes at `position`, padded to `alignment`.
    pub fn ensure_size(&mut self, size: usize, alignment: usize) -> BuildResult<&mut Self> {
        let end = align(self.position() + size, alignment)?;
        self.reserve_to(end);
        Ok(self)
    }

    /// Grow the patch region by `size` bytes and round it to `alignment`.
    pub fn expand_patch(&mut self, size: usize, alignment: usize) -> BuildResult<&mut Self> {
        let end = align(self.patch_position() + size, alignment)?;
        self.reserve_to(end);
        Ok(self)
    }

    /// Round the patch cursor up to `alignment`.
    pub fn align_patch(&mut self, alignment: usize) -> BuildResult<&mut Self> {
        let end = align(self.patch_position(), alignment)?;
        self.reserve_to(end);
        Ok(self)
    }

    /// Write the bytes of `value`, reserving patch space to its alignment.
    pub fn write_value<T: Pod>(&mut self, value: &T) -> BuildResult<&mut Self> {
        self.write(bytemuck::bytes_of(value), natural_alignment_of::<T>())
    }

    /// Write `values` back to back, reserving patch space to `alignment`.
    pub fn write_slice<T: Pod>(&mut self, values: &[T], alignment: usize) -> BuildResult<&mut Self> {
        self.write(bytemuck::cast_slice(values), alignment)
    }

    /// Store `target - position` as the self-relative offset at `position`.
    pub fn write_offset(&mut self, target: usize) -> BuildResult<&mut Self> {
        let from = self.position();
        let delta = i64::try_from(target)
            .ok()
            .zip(i64::try_from(from).ok())
            .and_then(|(target, from)| i32::try_from(target - from).ok())
            .ok_or(BuildError::OffsetOverflow { from, to: target })?;
        self.write_value(&delta)
    }

    /// Point at whatever is reserved next.
    pub fn write_patch_offset(&mut self) -> BuildResult<&mut Self> {
        self.write_offset(self.patch_position())
    }

    /// Array header targeting the patch cursor.
    pub fn write_array_meta(&mut self, length: usize) -> BuildResult<&mut Self> {
        let length = to_i32(length, "array length")?;
        self.write_patch_offset()?.write_value(&length)
    }

    /// Array header whose data starts at `target`.
    pub fn write_array_meta_at(&mut self, length: usize, target: usize) -> BuildResult<&mut Self> {
        let length = to_i32(length, "array length")?;
        self.write_offset(target)?.write_value(&length)
    }

    /// Move the data cursor to the patch cursor.
    pub fn to_patch_position(&mut self) -> &mut Self {
        self.to_position(self.patch_position())
    }

    /// Move the data cursor to `position`.
    pub fn to_position(&mut self, position: usize) -> &mut Self {
        self.set_position(position);
        self
    }
}
