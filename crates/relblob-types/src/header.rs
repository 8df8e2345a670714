//! Fixed header layouts of the relocatable blob format.
//!
//! Every offset is an `i32` counted in bytes from the address of the offset
//! field itself to its target, so a blob stays valid wherever it is copied.

use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::encoding::{TextEncoding, Utf8};

/// A single self-relative reference to a `T` stored in the same blob.
#[repr(C)]
pub struct BlobPtr<T> {
    pub offset: i32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BlobPtr<T> {
    pub const fn new(offset: i32) -> Self {
        Self {
            offset,
            _marker: PhantomData,
        }
    }
}

/// A self-relative, length-prefixed run of `T` elements.
#[repr(C)]
pub struct BlobArray<T> {
    pub offset: i32,
    pub length: i32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BlobArray<T> {
    pub const OFFSET_FIELD: usize = 0;
    pub const LENGTH_FIELD: usize = size_of::<i32>();

    pub const fn new(offset: i32, length: i32) -> Self {
        Self {
            offset,
            length,
            _marker: PhantomData,
        }
    }
}

/// Encoded text stored as an array of bytes.
#[repr(C)]
pub struct BlobString<E: TextEncoding = Utf8> {
    pub data: BlobArray<u8>,
    _marker: PhantomData<fn() -> E>,
}

/// Encoded text followed by a single zero byte that the logical length excludes.
#[repr(C)]
pub struct BlobNullTerminatedString<E: TextEncoding = Utf8> {
    pub data: BlobArray<u8>,
    _marker: PhantomData<fn() -> E>,
}

/// A forest flattened in preorder.
///
/// `end_indices[i]` is the index of the first node after the subtree rooted
/// at node `i`.
#[repr(C)]
pub struct BlobTree<T> {
    pub end_indices: BlobArray<i32>,
    pub nodes: BlobArray<T>,
}

impl<T> BlobTree<T> {
    pub const END_INDICES_FIELD: usize = 0;
    pub const NODES_FIELD: usize = size_of::<BlobArray<i32>>();
}

/// Parallel key and value arrays ordered by key hash.
#[repr(C)]
pub struct BlobSortedArray<K, V> {
    pub keys: BlobArray<K>,
    pub values: BlobArray<V>,
}

impl<K, V> BlobSortedArray<K, V> {
    pub const KEYS_FIELD: usize = 0;
    pub const VALUES_FIELD: usize = size_of::<BlobArray<K>>();
}

/// A heterogeneous array: `offsets` has one entry per element plus a final
/// total, each relative to the start of `data`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct BlobArrayAny {
    pub offsets: BlobArray<i32>,
    pub data: BlobArray<u8>,
}

impl BlobArrayAny {
    pub const OFFSETS_FIELD: usize = offset_of!(BlobArrayAny, offsets);
    pub const DATA_FIELD: usize = offset_of!(BlobArrayAny, data);
}

/// A pointer to a value of erased type, stored with its byte size.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct BlobPtrAny {
    pub data: BlobArray<u8>,
}

/// A flattened forest whose node values have erased types.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct BlobTreeAny {
    pub end_indices: BlobArray<i32>,
    pub data: BlobArrayAny,
}

impl BlobTreeAny {
    pub const END_INDICES_FIELD: usize = offset_of!(BlobTreeAny, end_indices);
    pub const DATA_FIELD: usize = offset_of!(BlobTreeAny, data);
}

macro_rules! pod_header {
    ($name:ident<$($param:ident $(: $bound:path)?),+> { $($field:ident),+ }) => {
        impl<$($param $(: $bound)?),+> Clone for $name<$($param),+> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<$($param $(: $bound)?),+> Copy for $name<$($param),+> {}

        impl<$($param $(: $bound)?),+> PartialEq for $name<$($param),+> {
            fn eq(&self, other: &Self) -> bool {
                true $(&& self.$field == other.$field)+
            }
        }

        impl<$($param $(: $bound)?),+> Eq for $name<$($param),+> {}

        impl<$($param $(: $bound)?),+> fmt::Debug for $name<$($param),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &self.$field))+
                    .finish()
            }
        }

        // SAFETY: `#[repr(C)]` with only `i32` fields and zero-sized markers,
        // so there is no padding and every bit pattern is a valid value.
        unsafe impl<$($param: 'static $(+ $bound)?),+> Zeroable for $name<$($param),+> {}
        unsafe impl<$($param: 'static $(+ $bound)?),+> Pod for $name<$($param),+> {}
    };
}

pod_header!(BlobPtr<T> { offset });
pod_header!(BlobArray<T> { offset, length });
pod_header!(BlobString<E: TextEncoding> { data });
pod_header!(BlobNullTerminatedString<E: TextEncoding> { data });
pod_header!(BlobTree<T> { end_indices, nodes });
pod_header!(BlobSortedArray<K, V> { keys, values });

const _: () = assert!(size_of::<BlobPtr<u64>>() == 4);
const _: () = assert!(align_of::<BlobPtr<u64>>() == 4);
const _: () = assert!(size_of::<BlobArray<u64>>() == 8);
const _: () = assert!(align_of::<BlobArray<u64>>() == 4);
const _: () = assert!(size_of::<BlobString>() == 8);
const _: () = assert!(size_of::<BlobNullTerminatedString>() == 8);
const _: () = assert!(size_of::<BlobTree<u64>>() == 16);
const _: () = assert!(offset_of!(BlobTree<u64>, nodes) == BlobTree::<u64>::NODES_FIELD);
const _: () = assert!(size_of::<BlobSortedArray<u64, u8>>() == 16);
const _: () =
    assert!(offset_of!(BlobSortedArray<u64, u8>, values) == BlobSortedArray::<u64, u8>::VALUES_FIELD);
const _: () = assert!(size_of::<BlobArrayAny>() == 16);
const _: () = assert!(size_of::<BlobPtrAny>() == 8);
const _: () = assert!(size_of::<BlobTreeAny>() == 24);
