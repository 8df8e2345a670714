//! Turning a builder into a finished blob.

use relblob_view::{AnyBlobReference, ManagedBlobAssetReference};
use tracing::debug;

use crate::builder::{AnyBuilder, Builder};
use crate::config::BuildConfig;
use crate::error::BuildResult;
use crate::stream::BlobStream;

/// Build `builder` as the root of a new blob.
pub fn build_blob<B: AnyBuilder + ?Sized>(
    builder: &mut B,
    config: &BuildConfig,
) -> BuildResult<Vec<u8>> {
    config.validate()?;
    let mut stream = BlobStream::with_capacity(config.initial_capacity);
    builder.build_any(&mut stream)?;
    let alignment = config.resolve_alignment(builder.data_alignment());
    let bytes = stream.finish(alignment)?;
    debug!(len = bytes.len(), alignment, "built blob");
    Ok(bytes)
}

/// Terminal operations for typed builders.
pub trait BlobBuilderExt: Builder + Sized {
    fn build_into_blob(&mut self) -> BuildResult<Vec<u8>> {
        self.build_into_blob_with(&BuildConfig::default())
    }

    fn build_into_blob_with(&mut self, config: &BuildConfig) -> BuildResult<Vec<u8>> {
        build_blob(self, config)
    }

    fn create_managed_reference(
        &mut self,
    ) -> BuildResult<ManagedBlobAssetReference<Self::Target>> {
        Ok(ManagedBlobAssetReference::new(self.build_into_blob()?)?)
    }
}

impl<B: Builder> BlobBuilderExt for B {}

/// Terminal operations for builders of erased type.
pub trait AnyBlobBuilderExt: AnyBuilder {
    fn build_into_any_blob(&mut self) -> BuildResult<Vec<u8>> {
        build_blob(self, &BuildConfig::default())
    }

    fn create_any_reference(&mut self) -> BuildResult<AnyBlobReference> {
        let bytes = self.build_into_any_blob()?;
        Ok(AnyBlobReference::new(bytes, self.data_size())?)
    }
}

impl<B: AnyBuilder + ?Sized> AnyBlobBuilderExt for B {}
