//! Depth is bounded by heap, not the call stack: a synthetic linear tree
//! of one million nested arrays survives every core algorithm.

use datalith::{Array, Value, ValueBuilder, value, write_value};

const DEPTH: usize = 1_000_000;

fn deep_tree(leaf: Value) -> Value {
    let mut v = leaf;
    for _ in 0..DEPTH {
        let mut outer = Value::array(Array::new());
        outer.push_back(v);
        v = outer;
    }
    v
}

#[test]
fn million_deep_construct_traverse_stream_compare_destroy() {
    let tree = deep_tree(value!("leaf"));

    let mut nodes = 0usize;
    tree.prefix_traverse(|_, _| {
        nodes += 1;
        true
    });
    assert_eq!(nodes, DEPTH + 1);

    let mut builder = ValueBuilder::new();
    write_value(&tree, &mut builder).unwrap();
    let copy = builder.value().unwrap();

    assert_eq!(copy, tree);

    drop(copy);
    drop(tree);
}

#[test]
fn million_deep_clone_and_mutate() {
    let tree = deep_tree(Value::int(1));
    let mut copy = tree.clone();
    assert_eq!(copy, tree);
    *copy.element(0) = Value::int(2);
    assert_ne!(copy, tree);
}
