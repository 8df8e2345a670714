//! Relocatable, pointer-free binary blobs.
//!
//! Describe the data as a tree of builders, build it into one contiguous
//! buffer, then read it back through typed views wherever the bytes end up.
//!
//! ```
//! use relblob::prelude::*;
//!
//! let reference = ArrayBuilder::new(vec![1i32, 2, 3])
//!     .create_managed_reference()
//!     .unwrap();
//! let items = reference.root().open().unwrap();
//! assert_eq!(items.to_vec(), vec![1, 2, 3]);
//! ```

pub use relblob_types::{
    align, check_alignment, digest_hash, field, is_aligned, natural_alignment_of, BlobArray,
    BlobArrayAny, BlobError, BlobKey, BlobNullTerminatedString, BlobPtr, BlobPtrAny, BlobResult,
    BlobSortedArray, BlobString, BlobTree, BlobTreeAny, Field, Pod, TextEncoding, Utf16, Utf32,
    Utf8, Zeroable,
};

pub use relblob_view::{
    check_size, AnyArrayView, AnyBlobReference, AnyPtrView, AnyTreeView, ArrayView, BlobView,
    EndIndices, ManagedBlobAssetReference, SortedArrayView, TreeView,
};

pub use relblob_builder::{
    build_blob, AnyArrayBuilder, AnyBlobBuilderExt, AnyBuilder, AnyPtrBuilder, AnyTreeBuilder,
    AnyTreeNode, AnyValueBuilder, ArrayBuilder, BlobBuilderExt, BlobStream, BuildConfig,
    BuildError, BuildHandle, BuildRecord, BuildResult, Builder, FinalAlignment, ItemArrayBuilder,
    NullTerminatedStringBuilder, PtrBuilder, RefPtrBuilder, SortedArrayBuilder, StringBuilder,
    StructBuilder, TreeBuilder, TreeNode, ValueBuilder, DEFAULT_ERASED_ALIGNMENT,
};

/// Everything needed to build and read blobs.
pub mod prelude {
    pub use crate::{
        field, AnyArrayBuilder, AnyBlobBuilderExt, AnyBuilder, AnyPtrBuilder, AnyTreeBuilder,
        AnyTreeNode, AnyValueBuilder, ArrayBuilder, BlobArray, BlobArrayAny, BlobBuilderExt,
        BlobKey, BlobNullTerminatedString, BlobPtr, BlobPtrAny, BlobSortedArray, BlobString,
        BlobTree, BlobTreeAny, BlobView, BuildConfig, Builder, ItemArrayBuilder,
        NullTerminatedStringBuilder, PtrBuilder, RefPtrBuilder, SortedArrayBuilder,
        StringBuilder, StructBuilder, TreeBuilder, TreeNode, ValueBuilder,
    };
}

#[cfg(test)]
mod scenarios;
