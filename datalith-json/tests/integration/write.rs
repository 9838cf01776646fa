//! Writer behavior: formatting, escaping, pretty output, error cases.

use datalith::{Array, Value, value};
use datalith_json::{JsonErrorKind, WriteOptions, to_string, to_string_pretty, to_vec_with_options};
use indoc::indoc;

#[test]
fn known_document_byte_for_byte() {
    let mut v = Value::null();
    *v.member("a") = Value::from(1u64);
    let b = v.member("b");
    b.push_back(Value::from(2u64));
    b.push_back(Value::real(3.5));
    b.push_back(Value::from("x"));

    assert_eq!(to_string(&v).unwrap(), r#"{"a":1,"b":[2,3.5,"x"]}"#);
}

#[test]
fn scalars_format() {
    assert_eq!(to_string(&Value::null()).unwrap(), "null");
    assert_eq!(to_string(&Value::boolean(true)).unwrap(), "true");
    assert_eq!(to_string(&Value::int(-42)).unwrap(), "-42");
    assert_eq!(to_string(&Value::uint(42)).unwrap(), "42");
    assert_eq!(to_string(&Value::real(1.5)).unwrap(), "1.5");
    // Integral reals keep an explicit fraction so the kind survives a
    // round trip.
    assert_eq!(to_string(&Value::real(3.0)).unwrap(), "3.0");
    assert_eq!(to_string(&Value::real(-2.0)).unwrap(), "-2.0");
    assert_eq!(to_string(&Value::from("s")).unwrap(), "\"s\"");
}

#[test]
fn empty_containers() {
    assert_eq!(to_string(&value!([])).unwrap(), "[]");
    assert_eq!(to_string(&value!({})).unwrap(), "{}");
    assert_eq!(to_string(&Value::string("")).unwrap(), "\"\"");
}

#[test]
fn strings_escape() {
    let v = Value::string("a\"b\\c\nd\te\u{8}\u{c}\r\u{1}");
    assert_eq!(
        to_string(&v).unwrap(),
        r#""a\"b\\c\nd\te\b\f\r\u0001""#
    );
}

#[test]
fn non_finite_reals_are_errors() {
    let err = to_string(&Value::real(f64::NAN)).unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::Stream(_)));
    assert!(to_string(&Value::real(f64::INFINITY)).is_err());
}

#[test]
fn pretty_output() {
    let v = value!({"a": 1, "b": [true, null]});
    assert_eq!(
        to_string_pretty(&v).unwrap(),
        indoc! {r#"
            {
              "a": 1,
              "b": [
                true,
                null
              ]
            }"#}
    );
}

#[test]
fn pretty_custom_indent() {
    let v = value!([1]);
    let bytes = to_vec_with_options(&v, &WriteOptions::default().indent("\t")).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "[\n\t1\n]");
}

#[test]
fn large_table_emits_every_cell() {
    let mut rows = Value::array(Array::with_capacity(1000));
    for r in 0..1000u64 {
        let mut row = Value::array(Array::with_capacity(3));
        for c in 0..3u64 {
            row.push_back(Value::uint(r * 3 + c));
        }
        rows.push_back(row);
    }
    let text = to_string(&rows).unwrap();
    assert!(text.starts_with("[[0,1,2],[3,4,5],"));
    assert!(text.ends_with("[2997,2998,2999]]"));
}
