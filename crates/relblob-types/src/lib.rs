//! Core types for relocatable, pointer-free binary blobs.
//!
//! A blob is one contiguous byte buffer in which every reference is a
//! self-relative `i32` offset, so it can be copied or mapped anywhere and
//! read without fix-ups.
//!
//! # Key Types
//!
//! - **Headers**: [`BlobPtr`], [`BlobArray`], [`BlobString`], [`BlobTree`],
//!   [`BlobSortedArray`] and the type-erased [`BlobArrayAny`], [`BlobPtrAny`],
//!   [`BlobTreeAny`]
//! - **Alignment**: [`align`] and [`natural_alignment_of`]
//! - **Fields**: [`Field`] descriptors built with [`field!`]
//! - **Keys**: [`BlobKey`] hashing for sorted arrays

pub mod align;
pub mod encoding;
pub mod error;
pub mod field;
pub mod header;
pub mod key;

pub use align::{align, check_alignment, is_aligned, natural_alignment_of};
pub use encoding::{TextEncoding, Utf16, Utf32, Utf8};
pub use error::{BlobError, BlobResult};
pub use field::Field;
pub use header::{
    BlobArray, BlobArrayAny, BlobNullTerminatedString, BlobPtr, BlobPtrAny, BlobSortedArray,
    BlobString, BlobTree, BlobTreeAny,
};
pub use key::{digest_hash, BlobKey};

pub use bytemuck::{Pod, Zeroable};
