//! Concrete format builders.

pub mod any;
pub mod array;
pub mod ptr;
pub mod sorted;
pub mod string;
pub mod structure;
pub mod tree;
pub mod value;

pub use any::{
    AnyArrayBuilder, AnyPtrBuilder, AnyTreeBuilder, AnyTreeNode, AnyValueBuilder,
    DEFAULT_ERASED_ALIGNMENT,
};
pub use array::{ArrayBuilder, ItemArrayBuilder};
pub use ptr::{PtrBuilder, RefPtrBuilder};
pub use sorted::SortedArrayBuilder;
pub use string::{NullTerminatedStringBuilder, StringBuilder};
pub use structure::StructBuilder;
pub use tree::{TreeBuilder, TreeNode};
pub use value::ValueBuilder;
