use std::marker::PhantomData;

use relblob_types::{BlobNullTerminatedString, BlobString, TextEncoding, Utf8};

use crate::builder::{BuildHandle, Builder};
use crate::builders::array::ArrayBuilder;
use crate::error::BuildResult;
use crate::stream::BlobStream;

/// Encodes a string with `E` and stores it as a byte array.
#[derive(Debug)]
pub struct StringBuilder<E: TextEncoding = Utf8> {
    bytes: ArrayBuilder<u8>,
    handle: BuildHandle<BlobString<E>>,
    _encoding: PhantomData<E>,
}

impl<E: TextEncoding> StringBuilder<E> {
    pub fn new(text: &str) -> Self {
        Self {
            bytes: ArrayBuilder::new(E::encode(text)),
            handle: BuildHandle::new(),
            _encoding: PhantomData,
        }
    }

    /// Encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        self.bytes.len()
    }
}

impl<E: TextEncoding> Builder for StringBuilder<E> {
    type Target = BlobString<E>;

    fn handle(&self) -> BuildHandle<BlobString<E>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.to_position(data_position);
        self.bytes.build(stream)
    }
}

/// Like [`StringBuilder`], with one zero byte appended after the text.
#[derive(Debug)]
pub struct NullTerminatedStringBuilder<E: TextEncoding = Utf8> {
    bytes: ArrayBuilder<u8>,
    handle: BuildHandle<BlobNullTerminatedString<E>>,
    _encoding: PhantomData<E>,
}

impl<E: TextEncoding> NullTerminatedStringBuilder<E> {
    pub fn new(text: &str) -> Self {
        let mut bytes = E::encode(text);
        bytes.push(0);
        Self {
            bytes: ArrayBuilder::new(bytes),
            handle: BuildHandle::new(),
            _encoding: PhantomData,
        }
    }
}

impl<E: TextEncoding> Builder for NullTerminatedStringBuilder<E> {
    type Target = BlobNullTerminatedString<E>;

    fn handle(&self) -> BuildHandle<BlobNullTerminatedString<E>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.to_position(data_position);
        self.bytes.build(stream)
    }
}
