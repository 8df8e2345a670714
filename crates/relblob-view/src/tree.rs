//! Queries over preorder-flattened trees.
//!
//! Node `i`'s subtree is the contiguous range `i..end_indices[i]`, so every
//! relationship is recovered by scanning the end-index array. No parent links
//! are stored.

use std::ops::Range;

use bytemuck::Pod;
use relblob_types::{BlobArray, BlobError, BlobResult, BlobTree};

use crate::view::{ArrayView, BlobView};

/// The end-index array of a flattened forest.
#[derive(Clone, Copy, Debug)]
pub struct EndIndices<'a> {
    indices: ArrayView<'a, i32>,
}

impl<'a> EndIndices<'a> {
    pub fn new(indices: ArrayView<'a, i32>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The index of the first node after the subtree of `index`.
    pub fn end_index(&self, index: usize) -> BlobResult<usize> {
        let end = self.indices.read_at(index)?;
        match usize::try_from(end) {
            Ok(end) if end > index && end <= self.len() => Ok(end),
            _ => Err(BlobError::InvalidArgument(format!(
                "corrupt end index {end} for node {index} of {}",
                self.len()
            ))),
        }
    }

    /// The nearest node whose subtree contains `index`, or `None` for a root.
    pub fn find_parent_index(&self, index: usize) -> BlobResult<Option<usize>> {
        let end = self.end_index(index)?;
        for candidate in (0..index).rev() {
            if self.end_index(candidate)? >= end {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Direct children of `index`, in order.
    pub fn children(&self, index: usize) -> BlobResult<Vec<usize>> {
        let end = self.end_index(index)?;
        let mut children = Vec::new();
        let mut child = index + 1;
        while child < end {
            children.push(child);
            child = self.end_index(child)?;
        }
        Ok(children)
    }

    /// Ancestors of `index`, nearest first.
    pub fn ancestors(&self, index: usize) -> BlobResult<Vec<usize>> {
        let mut bound = self.end_index(index)?;
        let mut ancestors = Vec::new();
        for candidate in (0..index).rev() {
            let end = self.end_index(candidate)?;
            if end >= bound {
                ancestors.push(candidate);
                bound = end;
            }
        }
        Ok(ancestors)
    }

    /// Every descendant of `index` as one contiguous range.
    pub fn descendants(&self, index: usize) -> BlobResult<Range<usize>> {
        Ok(index + 1..self.end_index(index)?)
    }

    /// The top-level nodes of the forest.
    pub fn roots(&self) -> BlobResult<Vec<usize>> {
        let mut roots = Vec::new();
        let mut root = 0;
        while root < self.len() {
            roots.push(root);
            root = self.end_index(root)?;
        }
        Ok(roots)
    }
}

/// Forwards the structural queries of a tree view to its [`EndIndices`].
macro_rules! delegate_tree_queries {
    ($lt:lifetime) => {
        /// The end-index array behind the structural queries.
        pub fn structure(&self) -> $crate::tree::EndIndices<$lt> {
            self.structure
        }

        pub fn end_index(&self, index: usize) -> relblob_types::BlobResult<usize> {
            self.structure.end_index(index)
        }

        pub fn find_parent_index(
            &self,
            index: usize,
        ) -> relblob_types::BlobResult<Option<usize>> {
            self.structure.find_parent_index(index)
        }

        pub fn children(&self, index: usize) -> relblob_types::BlobResult<Vec<usize>> {
            self.structure.children(index)
        }

        pub fn ancestors(&self, index: usize) -> relblob_types::BlobResult<Vec<usize>> {
            self.structure.ancestors(index)
        }

        pub fn descendants(
            &self,
            index: usize,
        ) -> relblob_types::BlobResult<std::ops::Range<usize>> {
            self.structure.descendants(index)
        }

        pub fn roots(&self) -> relblob_types::BlobResult<Vec<usize>> {
            self.structure.roots()
        }
    };
}

pub(crate) use delegate_tree_queries;

/// A validated [`BlobTree`] with typed node values.
#[derive(Clone, Copy, Debug)]
pub struct TreeView<'a, T> {
    structure: EndIndices<'a>,
    nodes: ArrayView<'a, T>,
}

impl<'a, T: 'static> BlobView<'a, BlobTree<T>> {
    pub fn open(&self) -> BlobResult<TreeView<'a, T>> {
        let end_indices = self
            .at::<BlobArray<i32>>(BlobTree::<T>::END_INDICES_FIELD)?
            .open()?;
        let nodes = self.at::<BlobArray<T>>(BlobTree::<T>::NODES_FIELD)?.open()?;
        if end_indices.len() != nodes.len() {
            return Err(BlobError::InvalidArgument(format!(
                "tree has {} end indices for {} nodes",
                end_indices.len(),
                nodes.len()
            )));
        }
        Ok(TreeView {
            structure: EndIndices::new(end_indices),
            nodes,
        })
    }
}

impl<'a, T> TreeView<'a, T> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> ArrayView<'a, T> {
        self.nodes
    }

    pub fn node(&self, index: usize) -> BlobResult<BlobView<'a, T>> {
        self.nodes.get(index)
    }

    delegate_tree_queries!('a);
}

impl<T: Pod> TreeView<'_, T> {
    pub fn value(&self, index: usize) -> BlobResult<T> {
        self.nodes.read_at(index)
    }
}
