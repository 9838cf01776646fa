use datalith::{Array, Value};

fn main() {
    divan::main();
}

fn wide_tree(rows: usize, cols: usize) -> Value {
    let mut table = Value::array(Array::with_capacity(rows));
    for r in 0..rows {
        let mut row = Value::array(Array::with_capacity(cols));
        for c in 0..cols {
            row.push_back(Value::uint((r * cols + c) as u64));
        }
        table.push_back(row);
    }
    table
}

fn deep_tree(depth: usize) -> Value {
    let mut v = Value::int(0);
    for _ in 0..depth {
        let mut outer = Value::array(Array::new());
        outer.push_back(v);
        v = outer;
    }
    v
}

#[divan::bench]
fn traverse_wide(bencher: divan::Bencher) {
    let tree = wide_tree(1_000, 100);
    bencher.bench_local(|| {
        let mut count = 0usize;
        tree.prefix_traverse(|_, _| {
            count += 1;
            true
        });
        count
    });
}

#[divan::bench]
fn traverse_deep(bencher: divan::Bencher) {
    let tree = deep_tree(100_000);
    bencher.bench_local(|| {
        let mut count = 0usize;
        tree.prefix_traverse(|_, _| {
            count += 1;
            true
        });
        count
    });
}

#[divan::bench]
fn compare_deep(bencher: divan::Bencher) {
    let a = deep_tree(100_000);
    let b = deep_tree(100_000);
    bencher.bench_local(|| a == b);
}
