//! Field descriptors for composite headers.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;

use crate::align::natural_alignment_of;
use crate::error::{BlobError, BlobResult};

/// The location of a field of type `F` inside a struct `S`.
///
/// Normally created with [`field!`](crate::field).
pub struct Field<S, F> {
    offset: usize,
    _marker: PhantomData<fn(&S) -> &F>,
}

impl<S, F> Field<S, F> {
    /// Describe a field at `offset` bytes into `S`.
    ///
    /// The field must fit inside `S` and sit at its natural alignment.
    pub fn new(offset: usize) -> BlobResult<Self> {
        let end = offset.checked_add(size_of::<F>());
        if end.map_or(true, |end| end > size_of::<S>()) {
            return Err(BlobError::InvalidArgument(format!(
                "field of {} bytes at offset {offset} does not fit in a {}-byte struct",
                size_of::<F>(),
                size_of::<S>()
            )));
        }
        if offset % natural_alignment_of::<F>() != 0 {
            return Err(BlobError::InvalidArgument(format!(
                "field at offset {offset} is not aligned to {}",
                natural_alignment_of::<F>()
            )));
        }
        Ok(Self {
            offset,
            _marker: PhantomData,
        })
    }

    /// Like [`Field::new`], taking the field type from an accessor.
    pub fn from_accessor(offset: usize, _accessor: fn(&S) -> &F) -> BlobResult<Self> {
        Self::new(offset)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<S, F> Clone for Field<S, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, F> Copy for Field<S, F> {}

impl<S, F> fmt::Debug for Field<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("offset", &self.offset).finish()
    }
}

/// Build a [`Field`] descriptor for `$struct.$field`.
///
/// ```
/// use relblob_types::{field, BlobPtr};
///
/// #[repr(C)]
/// struct Pair {
///     a: i32,
///     b: BlobPtr<i32>,
/// }
///
/// let b = field!(Pair, b).unwrap();
/// assert_eq!(b.offset(), 4);
/// ```
#[macro_export]
macro_rules! field {
    ($struct:ty, $field:ident) => {
        $crate::Field::<$struct, _>::from_accessor(
            ::core::mem::offset_of!($struct, $field),
            |value: &$struct| &value.$field,
        )
    };
}
