//! The two-cursor byte sink every builder writes into.

use std::cmp::max;
use std::sync::atomic::{AtomicU64, Ordering};

use relblob_types::align;

use crate::error::BuildResult;

/// A growable byte buffer with a data cursor and a patch cursor.
///
/// `position` is where the next header goes and may be moved freely.
/// `patch_position` marks the start of unreserved space and never moves
/// backwards.
///
/// Every stream carries a process-unique build id, stamped into the
/// [`BuildRecord`](crate::BuildRecord)s of builders built into it.
#[derive(Clone, Debug)]
pub struct BlobStream {
    buffer: Vec<u8>,
    position: usize,
    patch_position: usize,
    build_id: u64,
}

static NEXT_BUILD_ID: AtomicU64 = AtomicU64::new(1);

impl BlobStream {
    /// An empty stream with a fresh build id.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// An empty stream with `capacity` bytes pre-allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            position: 0,
            patch_position: 0,
            build_id: NEXT_BUILD_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Identifies this stream among all streams of the process.
    pub fn build_id(&self) -> u64 {
        self.build_id
    }

    /// Where the next header is written.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Seek the data cursor. The patch cursor is unaffected.
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Start of the space not yet reserved by any builder.
    pub fn patch_position(&self) -> usize {
        self.patch_position
    }

    /// Bytes written so far. Reserved but unwritten patch space is not counted.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True until the first write.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Write `bytes` at `position` and advance past them.
    ///
    /// The patch cursor moves to at least the end of the write rounded up to
    /// `alignment`.
    pub fn write(&mut self, bytes: &[u8], alignment: usize) -> BuildResult<&mut Self> {
        let end = self.position + bytes.len();
        let reserved = align(end, alignment)?;
        if self.buffer.len() < end {
            self.buffer.resize(end, 0);
        }
        self.buffer[self.position..end].copy_from_slice(bytes);
        self.position = end;
        self.patch_position = max(self.patch_position, reserved);
        Ok(self)
    }

    /// Move the patch cursor forward to `position` if it is not already past it.
    pub(crate) fn reserve_to(&mut self, position: usize) {
        self.patch_position = max(self.patch_position, position);
    }

    /// Pad to cover every reserved byte, then to `alignment`, and hand over
    /// the buffer.
    pub fn finish(mut self, alignment: usize) -> BuildResult<Vec<u8>> {
        let len = align(max(self.buffer.len(), self.patch_position), alignment)?;
        self.buffer.resize(len, 0);
        Ok(self.buffer)
    }
}

impl Default for BlobStream {
    fn default() -> Self {
        Self::new()
    }
}
