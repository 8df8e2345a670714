//! Preorder flattening of forests.

use bytemuck::Pod;
use relblob_types::{check_alignment, natural_alignment_of, BlobTree};
use tracing::trace;

use crate::builder::{BuildHandle, Builder};
use crate::builders::array::{build_item_array, ArrayBuilder};
use crate::builders::value::ValueBuilder;
use crate::error::{to_i32, BuildResult};
use crate::stream::BlobStream;

/// Flatten `roots` in preorder.
///
/// Returns the node values and, for each node, the index just past its
/// subtree. Uses an explicit stack, so depth is bounded only by memory.
pub(crate) fn flatten_preorder<N, V>(
    roots: Vec<N>,
    mut split: impl FnMut(N) -> (V, Vec<N>),
) -> (Vec<V>, Vec<usize>) {
    let mut values = Vec::new();
    let mut end_indices = Vec::new();
    let mut stack: Vec<(Option<usize>, std::vec::IntoIter<N>)> = vec![(None, roots.into_iter())];
    loop {
        let Some((_, pending)) = stack.last_mut() else {
            break;
        };
        match pending.next() {
            Some(node) => {
                let (value, children) = split(node);
                let index = values.len();
                values.push(value);
                end_indices.push(index + 1);
                stack.push((Some(index), children.into_iter()));
            }
            None => {
                if let Some((Some(index), _)) = stack.pop() {
                    end_indices[index] = values.len();
                }
            }
        }
    }
    (values, end_indices)
}

/// Converts end indices for storage.
pub(crate) fn end_index_array(end_indices: &[usize]) -> BuildResult<ArrayBuilder<i32>> {
    let stored = end_indices
        .iter()
        .map(|&end| to_i32(end, "tree end index"))
        .collect::<BuildResult<Vec<i32>>>()?;
    Ok(ArrayBuilder::new(stored))
}

/// A node of a tree under construction.
pub struct TreeNode<T: Pod> {
    value: Box<dyn Builder<Target = T>>,
    children: Vec<TreeNode<T>>,
}

impl<T: Pod> TreeNode<T> {
    pub fn new(value: T) -> Self {
        Self::with_builder(ValueBuilder::new(value))
    }

    pub fn with_builder(value: impl Builder<Target = T> + 'static) -> Self {
        Self {
            value: Box::new(value),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: TreeNode<T>) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn with_child(mut self, child: TreeNode<T>) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(&self) -> &[TreeNode<T>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<TreeNode<T>> {
        &mut self.children
    }

    /// Handle of this node's value.
    pub fn handle(&self) -> BuildHandle<T> {
        self.value.handle()
    }
}

/// Builds a [`BlobTree`] from a forest of [`TreeNode`]s.
pub struct TreeBuilder<T: Pod> {
    nodes: Vec<Box<dyn Builder<Target = T>>>,
    end_indices: Vec<usize>,
    alignment: Option<usize>,
    handle: BuildHandle<BlobTree<T>>,
}

impl<T: Pod> TreeBuilder<T> {
    pub fn new(root: TreeNode<T>) -> Self {
        Self::from_forest(vec![root])
    }

    pub fn from_forest(roots: Vec<TreeNode<T>>) -> Self {
        let (nodes, end_indices) =
            flatten_preorder(roots, |node| (node.value, node.children));
        Self {
            nodes,
            end_indices,
            alignment: None,
            handle: BuildHandle::new(),
        }
    }

    /// Start the node array at `alignment` instead of `T`'s natural alignment.
    pub fn with_alignment(mut self, alignment: usize) -> BuildResult<Self> {
        check_alignment(alignment)?;
        self.alignment = Some(alignment);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The flattened end indices.
    pub fn end_indices(&self) -> &[usize] {
        &self.end_indices
    }

    /// Handle of the value of node `index` in preorder.
    pub fn node_handle(&self, index: usize) -> Option<BuildHandle<T>> {
        self.nodes.get(index).map(|node| node.handle())
    }
}

impl<T: Pod> Default for TreeBuilder<T> {
    fn default() -> Self {
        Self::from_forest(Vec::new())
    }
}

impl<T: Pod> Builder for TreeBuilder<T> {
    type Target = BlobTree<T>;

    fn handle(&self) -> BuildHandle<BlobTree<T>> {
        self.handle.clone()
    }

    fn build_content(&mut self, stream: &mut BlobStream, data_position: usize) -> BuildResult<()> {
        stream.to_position(data_position + BlobTree::<T>::END_INDICES_FIELD);
        end_index_array(&self.end_indices)?.build(stream)?;
        build_item_array(
            stream,
            data_position + BlobTree::<T>::NODES_FIELD,
            &mut self.nodes,
            self.alignment.unwrap_or(natural_alignment_of::<T>()),
        )?;
        trace!(nodes = self.nodes.len(), "built tree");
        Ok(())
    }
}
