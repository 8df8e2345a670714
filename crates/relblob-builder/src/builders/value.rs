use bytemuck::Pod;

use crate::builder::{BuildHandle, Builder};
use crate::error::BuildResult;
use crate::stream::BlobStream;

/// Writes a plain value as its own header.
#[derive(Debug)]
pub struct ValueBuilder<T: Pod> {
    value: T,
    handle: BuildHandle<T>,
}

impl<T: Pod> ValueBuilder<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            handle: BuildHandle::new(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Pod + Default> Default for ValueBuilder<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Pod> Builder for ValueBuilder<T> {
    type Target = T;

    fn handle(&self) -> BuildHandle<T> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.to_position(data_position).write_value(&self.value)?;
        Ok(())
    }
}
