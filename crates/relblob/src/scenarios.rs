//! End-to-end blobs built and read through the public API.

use bytemuck::{Pod, Zeroable};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::prelude::*;
use crate::{BlobError, BuildError, Utf8};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Root {
    a: i32,
    s: BlobString,
    p: BlobPtr<i32>,
    arr: BlobArray<i32>,
}

fn root_builder() -> StructBuilder<Root> {
    let mut builder = StructBuilder::new(Root::zeroed());
    let a = builder.set_value(field!(Root, a).unwrap(), 1);
    builder.set_string(field!(Root, s).unwrap(), "123");
    builder.set_pointer_to(field!(Root, p).unwrap(), &a);
    builder.set_array(field!(Root, arr).unwrap(), vec![1, 2, 3]);
    builder
}

fn check_root(view: BlobView<'_, Root>) {
    assert_eq!(view.field(field!(Root, a).unwrap()).unwrap().read(), 1);
    let text = view.field(field!(Root, s).unwrap()).unwrap();
    assert_eq!(text.decode().unwrap(), "123");
    let target = view.field(field!(Root, p).unwrap()).unwrap().value().unwrap();
    assert_eq!(target.position(), view.position());
    assert_eq!(target.read(), 1);
    let items = view.field(field!(Root, arr).unwrap()).unwrap().open().unwrap();
    assert_eq!(items.to_vec(), vec![1, 2, 3]);
}

#[test]
fn struct_blob_layout() {
    let blob = root_builder().build_into_blob().unwrap();
    assert_eq!(
        hex::encode(&blob),
        concat!(
            "01000000",
            "14000000",
            "03000000",
            "f4ffffff",
            "0c000000",
            "03000000",
            "31323300",
            "01000000",
            "02000000",
            "03000000",
        )
    );
    check_root(BlobView::root(&blob).unwrap());
}

#[test]
fn blobs_survive_relocation() {
    let blob = root_builder().build_into_blob().unwrap();

    let copied = blob.clone();
    drop(blob);
    check_root(BlobView::root(&copied).unwrap());

    let mut shifted = vec![0xAAu8; 3];
    shifted.extend_from_slice(&copied);
    shifted.extend_from_slice(&[0x55; 5]);
    check_root(BlobView::new(&shifted, 3).unwrap());
    check_root(BlobView::root(&shifted[3..3 + copied.len()]).unwrap());
}

#[test]
fn rebuilding_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<i64> = (0..64).map(|_| rng.gen()).collect();

    let mut builder = ArrayBuilder::new(values.clone());
    let first = builder.build_into_blob().unwrap();
    let second = builder.build_into_blob().unwrap();
    assert_eq!(first, second);

    let mut root = root_builder();
    assert_eq!(root.build_into_blob().unwrap(), root.build_into_blob().unwrap());

    let reference = builder.create_managed_reference().unwrap();
    assert_eq!(reference.root().open().unwrap().to_vec(), values);
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Wide {
    count: u32,
    flags: u32,
    values: BlobArray<f64>,
    big: BlobPtr<u64>,
}

#[test]
fn content_is_naturally_aligned() {
    let mut builder = StructBuilder::new(Wide::zeroed());
    builder.set_value(field!(Wide, count).unwrap(), 3);
    builder.set_array(field!(Wide, values).unwrap(), vec![0.5, 1.5, 2.5]);
    builder.set_pointer(field!(Wide, big).unwrap(), u64::MAX);

    let blob = builder.build_into_blob().unwrap();
    assert_eq!(blob.len() % 4, 0);
    let wide = BlobView::<Wide>::root(&blob).unwrap();
    let values = wide.field(field!(Wide, values).unwrap()).unwrap().open().unwrap();
    assert_eq!(values.data_position() % 8, 0);
    assert_eq!(values.to_vec(), vec![0.5, 1.5, 2.5]);
    let big = wide.field(field!(Wide, big).unwrap()).unwrap().value().unwrap();
    assert_eq!(big.position() % 8, 0);
    assert_eq!(big.read(), u64::MAX);

    let padded = builder
        .build_into_blob_with(&BuildConfig::host_compatible())
        .unwrap();
    assert_eq!(padded.len() % 16, 0);
    assert_eq!(&padded[..blob.len()], &blob[..]);
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Catalog {
    names: BlobArray<BlobPtr<BlobString>>,
    deep: BlobPtr<BlobPtr<u64>>,
    favourite: BlobPtr<BlobString>,
    numbers: BlobPtr<BlobArray<u16>>,
    third: BlobPtr<u16>,
}

#[test]
fn nested_pointers_and_arrays() {
    let mut names = ItemArrayBuilder::<BlobPtr<BlobString>>::new();
    let mut favourite = None;
    for name in ["alpha", "beta", "gamma"] {
        let pointer = PtrBuilder::with_builder(StringBuilder::<Utf8>::new(name));
        if name == "beta" {
            favourite = Some(pointer.target_handle());
        }
        names.push(pointer);
    }
    let mut numbers = ArrayBuilder::new(vec![10u16, 20, 30, 40]);
    let third = numbers.item_handle(2).unwrap();

    let mut builder = StructBuilder::new(Catalog::zeroed());
    builder.set_builder(field!(Catalog, names).unwrap(), names);
    builder.set_builder(
        field!(Catalog, deep).unwrap(),
        PtrBuilder::with_builder(PtrBuilder::new(42u64)),
    );
    builder.set_pointer_to(field!(Catalog, favourite).unwrap(), &favourite.unwrap());
    builder.set_builder(field!(Catalog, numbers).unwrap(), PtrBuilder::with_builder(numbers));
    // Resolved because `numbers` is attached first.
    builder.set_pointer_to(field!(Catalog, third).unwrap(), &third);
    let blob = builder.build_into_blob().unwrap();

    let catalog = BlobView::<Catalog>::root(&blob).unwrap();
    let names = catalog.field(field!(Catalog, names).unwrap()).unwrap().open().unwrap();
    let decoded: Vec<String> = names
        .iter()
        .map(|name| name.value().unwrap().decode().unwrap())
        .collect();
    assert_eq!(decoded, ["alpha", "beta", "gamma"]);

    let deep = catalog.field(field!(Catalog, deep).unwrap()).unwrap();
    assert_eq!(deep.value().unwrap().value().unwrap().read(), 42);

    let favourite = catalog
        .field(field!(Catalog, favourite).unwrap())
        .unwrap()
        .value()
        .unwrap();
    assert_eq!(
        favourite.position(),
        names.get(1).unwrap().value().unwrap().position()
    );
    assert_eq!(favourite.decode().unwrap(), "beta");

    let numbers = catalog
        .field(field!(Catalog, numbers).unwrap())
        .unwrap()
        .value()
        .unwrap()
        .open()
        .unwrap();
    assert_eq!(numbers.to_vec(), vec![10, 20, 30, 40]);
    let third = catalog.field(field!(Catalog, third).unwrap()).unwrap().value().unwrap();
    assert_eq!(third.position(), numbers.get(2).unwrap().position());
    assert_eq!(third.read(), 30);
}

#[test]
fn erased_array_sizes() {
    let mut builder = AnyArrayBuilder::new();
    builder.push(1i64);
    builder.push(2i32);
    builder.push(3.0f32);
    builder.push(4.0f64);
    builder.push_builder(PtrBuilder::new(1234i32));
    builder.push_builder(ArrayBuilder::new(vec![1i64, 2, 3]));

    let reference = builder.create_any_reference().unwrap();
    assert_eq!(reference.size(), std::mem::size_of::<BlobArrayAny>());
    let view = reference.root::<BlobArrayAny>().unwrap().open().unwrap();
    assert_eq!(view.len(), 6);
    assert_eq!(view.size(0).unwrap(), 8);
    assert_eq!(view.size(1).unwrap(), 4);
    assert_eq!(view.size(4).unwrap(), 8);
    assert_eq!(view.size(5).unwrap(), 32);
    assert_eq!(view.read::<i64>(0).unwrap(), 1);
    assert_eq!(view.read::<f64>(3).unwrap(), 4.0);
    assert!(matches!(view.read::<i64>(1), Err(BlobError::InvalidArgument(_))));
    let items = view.value::<BlobArray<i64>>(5).unwrap().open().unwrap();
    assert_eq!(items.to_vec(), vec![1, 2, 3]);
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Bucketed(u32);

impl BlobKey for Bucketed {
    fn key_hash(&self) -> u64 {
        u64::from(self.0 % 100)
    }
}

#[test]
fn sorted_lookup_with_collisions() {
    let mut builder = SortedArrayBuilder::<Bucketed, u32>::new();
    for bucket in 0..5u32 {
        for slot in 0..20u32 {
            let key = bucket * 100 + slot;
            builder.insert(Bucketed(key), key * 3).unwrap();
        }
    }
    assert!(matches!(
        builder.insert(Bucketed(7), 0),
        Err(BuildError::Blob(BlobError::InvalidArgument(_)))
    ));

    let blob = builder.build_into_blob().unwrap();
    let sorted = BlobView::<BlobSortedArray<Bucketed, u32>>::root(&blob)
        .unwrap()
        .open()
        .unwrap();
    assert_eq!(sorted.len(), 100);

    let hashes: Vec<u64> = sorted.keys().iter().map(|key| key.read().key_hash()).collect();
    assert!(hashes.windows(2).all(|pair| pair[0] <= pair[1]));

    for bucket in 0..5u32 {
        for slot in 0..20u32 {
            let key = bucket * 100 + slot;
            assert_eq!(sorted.get(&Bucketed(key)).unwrap().read(), key * 3);
        }
    }
    // Shares a hash with five stored keys but is not one of them.
    assert!(!sorted.contains_key(&Bucketed(503)));
    assert!(matches!(sorted.get(&Bucketed(503)), Err(BlobError::NotFound)));
    // No stored key has this hash.
    assert_eq!(sorted.index_of_key(&Bucketed(99)), None);
}

fn random_forest(seed: u64, len: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|i| if i == 0 { 0 } else { rng.gen_range(0..i) })
        .collect()
}

fn tree_from_parents(parents: &[usize]) -> TreeNode<u32> {
    let mut nodes: Vec<Option<TreeNode<u32>>> = (0..parents.len())
        .map(|label| Some(TreeNode::new(label as u32)))
        .collect();
    for label in (1..parents.len()).rev() {
        let node = nodes[label].take().unwrap();
        nodes[parents[label]]
            .as_mut()
            .unwrap()
            .children_mut()
            .insert(0, node);
    }
    nodes[0].take().unwrap()
}

/// Labels from the parent of `label` up to the root.
fn ancestor_chain(parents: &[usize], label: usize) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut current = label;
    while current != 0 {
        current = parents[current];
        chain.push(current);
    }
    chain
}

proptest! {
    #[test]
    fn random_trees_answer_structure_queries(seed in any::<u64>(), len in 1usize..200) {
        let parents = random_forest(seed, len);
        let chains: Vec<Vec<usize>> = (0..len).map(|label| ancestor_chain(&parents, label)).collect();
        let mut subtree = vec![1usize; len];
        let mut child_count = vec![0usize; len];
        for label in (1..len).rev() {
            subtree[parents[label]] += subtree[label];
            child_count[parents[label]] += 1;
        }

        let blob = TreeBuilder::new(tree_from_parents(&parents))
            .build_into_blob()
            .unwrap();
        let tree = BlobView::<BlobTree<u32>>::root(&blob).unwrap().open().unwrap();
        prop_assert_eq!(tree.len(), len);
        prop_assert_eq!(tree.end_index(0).unwrap(), len);
        prop_assert_eq!(tree.roots().unwrap(), vec![0]);

        for index in 0..len {
            let label = tree.value(index).unwrap() as usize;
            let end = tree.end_index(index).unwrap();
            prop_assert_eq!(end - index, subtree[label]);
            prop_assert_eq!(end > index + 1, child_count[label] > 0);
            prop_assert_eq!(tree.descendants(index).unwrap(), index + 1..end);
            prop_assert_eq!(tree.children(index).unwrap().len(), child_count[label]);

            let ancestors: Vec<usize> = tree
                .ancestors(index)
                .unwrap()
                .into_iter()
                .map(|ancestor| tree.value(ancestor).unwrap() as usize)
                .collect();
            prop_assert_eq!(&ancestors, &chains[label]);

            let mut descendants: Vec<usize> = tree
                .descendants(index)
                .unwrap()
                .map(|descendant| tree.value(descendant).unwrap() as usize)
                .collect();
            descendants.sort_unstable();
            let expected: Vec<usize> = (0..len)
                .filter(|&other| chains[other].contains(&label))
                .collect();
            prop_assert_eq!(descendants, expected);

            match tree.find_parent_index(index).unwrap() {
                None => prop_assert_eq!(label, 0),
                Some(parent) => {
                    prop_assert!(parent < index);
                    prop_assert_eq!(tree.value(parent).unwrap() as usize, parents[label]);
                }
            }
        }
    }
}

#[test]
fn pointer_to_value_from_another_blob_is_unresolved() {
    let mut elsewhere = ValueBuilder::new(77i32);
    let stale = elsewhere.handle();
    assert_eq!(elsewhere.build_into_blob().unwrap(), 77i32.to_ne_bytes());

    let mut builder = StructBuilder::new(Root::zeroed());
    builder.set_value(field!(Root, a).unwrap(), 5);
    builder.set_pointer_to(field!(Root, p).unwrap(), &stale);
    assert_eq!(builder.build_into_blob().unwrap_err(), BuildError::Unresolved);
}

#[test]
fn erased_tree_round_trip() {
    let root = AnyTreeNode::new(1u8)
        .with_child(AnyTreeNode::new(2u64))
        .with_child(AnyTreeNode::with_builder(StringBuilder::<Utf8>::new("leaf")));
    let blob = AnyTreeBuilder::new(root).build_into_blob().unwrap();
    let tree = BlobView::<BlobTreeAny>::root(&blob).unwrap().open().unwrap();
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.children(0).unwrap(), vec![1, 2]);
    assert_eq!(tree.read::<u8>(0).unwrap(), 1);
    assert_eq!(tree.read::<u64>(1).unwrap(), 2);
    let leaf = tree.value::<BlobString>(2).unwrap();
    assert_eq!(leaf.decode().unwrap(), "leaf");
}
