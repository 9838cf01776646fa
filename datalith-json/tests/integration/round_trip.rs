//! Round-trip properties: tree-level, stream-level, and the million-deep
//! stack-safety cycle.

use datalith::{StreamInput, Value, ValueBuilder, value};
use datalith_json::{JsonParser, JsonWriter, from_str, to_string};

/// Canonical trees store non-negative whole numbers as `UInteger`, which
/// is what re-parsing produces; round-trips over them are lossless under
/// strict equality.
fn canonical_samples() -> Vec<Value> {
    vec![
        value!(null),
        value!(true),
        value!((-7i64)),
        value!((7u64)),
        value!(2.25),
        value!("text with \"quotes\" and \\ slashes"),
        value!([]),
        value!({}),
        value!([(1u64), [(2u64), [(3u64)]], {"deep": null}]),
        value!({
            "nulls": null,
            "flags": [true, false],
            "nested": {"a": (1u64), "b": [2.5, "s"]},
            "empty": {}
        }),
    ]
}

#[test]
fn tree_round_trip_is_identity() {
    for tree in canonical_samples() {
        let text = to_string(&tree).unwrap();
        let reparsed = from_str(&text).unwrap();
        assert_eq!(reparsed, tree, "round-trip changed {text}");
    }
}

#[test]
fn stream_round_trip_is_byte_identical() {
    // Parser events -> builder -> writer must equal parser events ->
    // writer directly.
    let text = r#"{"a":1,"b":[2,3.5,"x"],"c":{"d":null}}"#;

    let mut direct = JsonWriter::new(Vec::new());
    JsonParser::new(text.as_bytes())
        .write_all(&mut direct)
        .unwrap();
    let direct = direct.into_inner();

    let tree = from_str(text).unwrap();
    let via_tree = to_string(&tree).unwrap();

    assert_eq!(direct, via_tree.as_bytes());
    assert_eq!(via_tree, text);
}

#[test]
fn parse_emit_parse_is_stable() {
    let messy = "  {\n \"z\" : [ 1 ,  2.0 , \"s\" ] , \"a\" : true }  ";
    let first = from_str(messy).unwrap();
    let emitted = to_string(&first).unwrap();
    let second = from_str(&emitted).unwrap();
    assert_eq!(first, second);
    // Emission is canonical: sorted keys, no whitespace.
    assert_eq!(emitted, r#"{"a":true,"z":[1,2.0,"s"]}"#);
}

#[test]
fn million_deep_json_cycle() {
    // Build one million nested arrays, serialize, re-parse, compare, and
    // drop — all without touching call-stack recursion.
    const DEPTH: usize = 1_000_000;

    let mut tree = Value::uint(7);
    for _ in 0..DEPTH {
        let mut outer = Value::array(datalith::Array::new());
        outer.push_back(tree);
        tree = outer;
    }

    let text = to_string(&tree).unwrap();
    assert_eq!(text.len(), 2 * DEPTH + 1);

    let reparsed = from_str(&text).unwrap();
    assert_eq!(reparsed, tree);

    drop(reparsed);
    drop(tree);
}

#[test]
fn pull_parser_feeds_writer_incrementally() {
    // One event per write_one, straight into a writer: the cooperative
    // fetcher pattern.
    let input = br#"[1,{"k":"v"},null]"#;
    let mut parser = JsonParser::new(input);
    let mut writer = JsonWriter::new(Vec::new());
    let mut polls = 0usize;
    while StreamInput::write_one(&mut parser, &mut writer).unwrap() {
        polls += 1;
    }
    assert!(polls >= 7);
    assert_eq!(writer.into_inner(), input);
}

#[test]
fn builder_value_retrievable_once() {
    let mut parser = JsonParser::new(b"[1]");
    let mut builder = ValueBuilder::new();
    parser.write_all(&mut builder).unwrap();
    assert!(builder.value().is_some());
    assert!(builder.value().is_none());
}
