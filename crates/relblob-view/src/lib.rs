//! Read side of relocatable blobs.
//!
//! A [`BlobView`] is a `(blob, position)` pair typed by the header it points
//! at. Header views validate offsets against the buffer when opened, so every
//! reachable element is known to be in bounds.
//!
//! # Architecture
//!
//! - **BlobView / ArrayView**: scalar, pointer, array and string access
//! - **TreeView**: parent, child, ancestor and descendant queries over end indices
//! - **SortedArrayView**: hash-ordered lookup with collision scans
//! - **AnyArrayView / AnyPtrView / AnyTreeView**: size-checked erased reads
//! - **ManagedBlobAssetReference / AnyBlobReference**: owners of finished blobs

pub mod any;
pub mod reference;
pub mod sorted;
pub mod tree;
pub mod view;

pub use any::{check_size, AnyArrayView, AnyPtrView, AnyTreeView};
pub use reference::{AnyBlobReference, ManagedBlobAssetReference};
pub use sorted::SortedArrayView;
pub use tree::{EndIndices, TreeView};
pub use view::{ArrayView, BlobView};
