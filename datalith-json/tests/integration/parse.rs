//! Parser behavior: kinds, escapes, resumability, malformed input.

use datalith::{Kind, StreamHandler, Value, ValueBuilder};
use datalith_json::{JsonErrorKind, JsonParser, from_str};

#[test]
fn scalar_kind_policy() {
    // Non-negative integers are unsigned, negatives signed, everything
    // fractional or exponential is real.
    let v = from_str(r#"[null,true,-1,1,1.5,"s"]"#).unwrap();
    let kinds: Vec<Kind> = v.get_array_unchecked().iter().map(Value::kind).collect();
    assert_eq!(
        kinds,
        [
            Kind::Null,
            Kind::Boolean,
            Kind::Integer,
            Kind::UInteger,
            Kind::Real,
            Kind::String,
        ]
    );
}

#[test]
fn numbers_out_of_range_become_reals() {
    let v = from_str("[18446744073709551616, -9223372036854775809, 1e5]").unwrap();
    assert!(v[0].is_real());
    assert!(v[1].is_real());
    assert!(v[2].is_real());
    assert_eq!(v[2].get_real_unchecked(), 1e5);

    let v = from_str("[18446744073709551615, -9223372036854775808]").unwrap();
    assert_eq!(v[0].get_uint_unchecked(), u64::MAX);
    assert_eq!(v[1].get_int_unchecked(), i64::MIN);
}

#[test]
fn string_escapes_decode() {
    let v = from_str(r#""a\"b\\c\/d\n\tAé""#).unwrap();
    assert_eq!(v.as_str(), Some("a\"b\\c/d\n\tA\u{e9}"));
}

#[test]
fn surrogate_pairs_decode() {
    let v = from_str(r#""\ud83d\ude00""#).unwrap();
    assert_eq!(v.as_str(), Some("\u{1f600}"));

    // A lone surrogate is malformed.
    let err = from_str(r#""\ud83d""#).unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::InvalidEscape));
}

#[test]
fn duplicate_keys_are_kept() {
    let v = from_str(r#"{"k":1,"k":2}"#).unwrap();
    assert_eq!(v.member_count(&Value::from("k")), 2);
}

#[test]
fn keys_arrive_sorted_or_not() {
    let v = from_str(r#"{"b":2,"a":1,"c":3}"#).unwrap();
    let keys: Vec<_> = v
        .get_object_unchecked()
        .keys()
        .map(|k| k.as_str().unwrap().to_owned())
        .collect();
    assert_eq!(keys, ["a", "b", "c"], "object iteration is key-sorted");
}

#[test]
fn write_one_is_resumable() {
    let input = br#"{"a":[1,2],"b":"x"}"#;
    let mut parser = JsonParser::new(input);
    let mut builder = ValueBuilder::new();

    let mut steps = 0;
    while parser.write_one(&mut builder).unwrap() {
        steps += 1;
        assert!(steps < 64, "parser failed to make progress");
    }
    // One event per step: the parser suspended several times.
    assert!(steps >= 8);
    assert!(parser.is_done());

    let v = builder.value().unwrap();
    assert_eq!(v["a"].array_size(), 2);
    assert_eq!(v["b"].as_str(), Some("x"));
}

#[test]
fn malformed_inputs_error_with_position() {
    let err = from_str("[1, 2").unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::UnexpectedEof { .. }));
    assert_eq!(err.offset, Some(5));

    let err = from_str("[1 2]").unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::UnexpectedChar { .. }));

    let err = from_str("{\"a\" 1}").unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::UnexpectedChar { .. }));

    let err = from_str("1 1").unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::TrailingData));

    let err = from_str("{1: 2}").unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::UnexpectedChar { .. }));
}

#[test]
fn abort_propagates_from_handler() {
    // A handler refusing an event stops the parse with its error.
    struct Refuser;
    impl StreamHandler for Refuser {
        fn begin_array(
            &mut self,
            _: &Value,
            _: Option<usize>,
        ) -> Result<(), datalith::StreamError> {
            Err(datalith::StreamError::unsupported("arrays"))
        }
        fn end_array(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn begin_object(
            &mut self,
            _: &Value,
            _: Option<usize>,
        ) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn end_object(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn begin_string(
            &mut self,
            _: &Value,
            _: Option<usize>,
        ) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn append_to_string(&mut self, _: &[u8]) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn end_string(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn null_value(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn bool_value(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn integer_value(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn uinteger_value(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
        fn real_value(&mut self, _: &Value) -> Result<(), datalith::StreamError> {
            Ok(())
        }
    }

    let mut parser = JsonParser::new(b"[1]");
    let err = parser.write_all(&mut Refuser).unwrap_err();
    assert!(matches!(err.kind, JsonErrorKind::Stream(_)));
}
