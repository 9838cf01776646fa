//! Ordering and equality.
//!
//! A strict total order over values: kind rank first (`Null < Boolean <
//! Integer < UInteger < Real < String < Array < Object < Link`), then the
//! subtype tag, then the payload. Two escape hatches soften the strictness:
//!
//! - [`Subtype::DOMAIN_COMPARABLE`] on either side collapses the numeric
//!   kinds into one numeric domain before comparing, and suppresses the
//!   kind and subtype tiebreaks for that pairing.
//! - [`Subtype::GENERIC_SUBTYPE_COMPARABLE`] on either side suppresses the
//!   subtype tiebreak only.
//!
//! Containers compare element-wise under the same rules, walked with an
//! explicit stack. Attributes never participate.

use core::cmp::Ordering;
use core::slice;

use crate::subtype::Subtype;
use crate::value::{Payload, Value};

/// Total order over reals: NaN sorts greater than every other value and
/// equal to itself.
pub(crate) fn real_total_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).expect("both finite or infinite"),
    }
}

/// A numeric payload lifted out of its kind for domain comparison.
#[derive(Clone, Copy)]
enum Numeric {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

fn numeric_domain(v: &Value) -> Option<Numeric> {
    match v.payload {
        Payload::Integer(i) => Some(Numeric::Signed(i)),
        Payload::UInteger(u) => Some(Numeric::Unsigned(u)),
        Payload::Real(r) => Some(Numeric::Float(r)),
        _ => None,
    }
}

fn numeric_cmp(a: Numeric, b: Numeric) -> Ordering {
    use Numeric::*;
    match (a, b) {
        // Integral pairs compare exactly in the wider domain.
        (Signed(x), Signed(y)) => x.cmp(&y),
        (Unsigned(x), Unsigned(y)) => x.cmp(&y),
        (Signed(x), Unsigned(y)) => i128::from(x).cmp(&i128::from(y)),
        (Unsigned(x), Signed(y)) => i128::from(x).cmp(&i128::from(y)),
        // Anything involving a real collapses to the real domain.
        (Float(x), Float(y)) => real_total_cmp(x, y),
        (Float(x), Signed(y)) => real_total_cmp(x, y as f64),
        (Float(x), Unsigned(y)) => real_total_cmp(x, y as f64),
        (Signed(x), Float(y)) => real_total_cmp(x as f64, y),
        (Unsigned(x), Float(y)) => real_total_cmp(x as f64, y),
    }
}

enum Step {
    Ordered(Ordering),
    Descend,
}

/// One node-pair comparison; containers whose shallow parts agree ask to
/// descend.
fn shallow_cmp(a: &Value, b: &Value) -> Step {
    let domain = a.get_subtype() == Subtype::DOMAIN_COMPARABLE
        || b.get_subtype() == Subtype::DOMAIN_COMPARABLE;
    if domain {
        if let (Some(x), Some(y)) = (numeric_domain(a), numeric_domain(b)) {
            return Step::Ordered(numeric_cmp(x, y));
        }
        if a.is_string() && b.is_string() {
            return Step::Ordered(a.get_string_unchecked().cmp(b.get_string_unchecked()));
        }
        // Not domain-compatible kinds; fall through to the strict rules.
    }

    let (ka, kb) = (a.kind(), b.kind());
    if ka != kb {
        return Step::Ordered(ka.cmp(&kb));
    }

    let ignore_subtype = a.get_subtype() == Subtype::GENERIC_SUBTYPE_COMPARABLE
        || b.get_subtype() == Subtype::GENERIC_SUBTYPE_COMPARABLE;
    if !ignore_subtype && a.get_subtype() != b.get_subtype() {
        return Step::Ordered(a.get_subtype().0.cmp(&b.get_subtype().0));
    }

    match (&a.payload, &b.payload) {
        (Payload::Null, Payload::Null) => Step::Ordered(Ordering::Equal),
        (Payload::Boolean(x), Payload::Boolean(y)) => Step::Ordered(x.cmp(y)),
        (Payload::Integer(x), Payload::Integer(y)) => Step::Ordered(x.cmp(y)),
        (Payload::UInteger(x), Payload::UInteger(y)) => Step::Ordered(x.cmp(y)),
        (Payload::Real(x), Payload::Real(y)) => Step::Ordered(real_total_cmp(*x, *y)),
        (Payload::String(_), Payload::String(_)) => {
            Step::Ordered(a.get_string_unchecked().cmp(b.get_string_unchecked()))
        }
        (Payload::Array(_), Payload::Array(_)) | (Payload::Object(_), Payload::Object(_)) => {
            Step::Descend
        }
        (Payload::Link(x), Payload::Link(y)) => Step::Ordered(x.order_key().cmp(&y.order_key())),
        _ => unreachable!("kinds already matched"),
    }
}

/// Children of one side of a container pairing, flattened: object entries
/// yield their key then their value.
enum ChildSeq<'a> {
    Arr(slice::Iter<'a, Value>),
    Obj {
        entries: slice::Iter<'a, (Value, Value)>,
        pending_value: Option<&'a Value>,
    },
}

impl<'a> ChildSeq<'a> {
    fn for_value(v: &'a Value) -> ChildSeq<'a> {
        match &v.payload {
            Payload::Array(a) => ChildSeq::Arr(a.as_slice().iter()),
            Payload::Object(o) => ChildSeq::Obj {
                entries: o.entries().iter(),
                pending_value: None,
            },
            _ => unreachable!("only containers descend"),
        }
    }

    fn next(&mut self) -> Option<&'a Value> {
        match self {
            ChildSeq::Arr(iter) => iter.next(),
            ChildSeq::Obj {
                entries,
                pending_value,
            } => {
                if let Some(v) = pending_value.take() {
                    return Some(v);
                }
                let (key, value) = entries.next()?;
                *pending_value = Some(value);
                Some(key)
            }
        }
    }
}

/// The strict total order over two values.
///
/// Runs on an explicit stack; depth is bounded by heap, not the call
/// stack.
pub(crate) fn cmp_values(lhs: &Value, rhs: &Value) -> Ordering {
    let mut stack: Vec<(ChildSeq<'_>, ChildSeq<'_>)> = Vec::new();
    let mut current = Some((lhs, rhs));

    loop {
        if let Some((a, b)) = current.take() {
            match shallow_cmp(a, b) {
                Step::Ordered(Ordering::Equal) => {}
                Step::Ordered(ord) => return ord,
                Step::Descend => stack.push((ChildSeq::for_value(a), ChildSeq::for_value(b))),
            }
        } else if let Some((left, right)) = stack.last_mut() {
            match (left.next(), right.next()) {
                (Some(x), Some(y)) => current = Some((x, y)),
                (None, None) => {
                    stack.pop();
                }
                // Shared prefix exhausted: the shorter container sorts
                // first.
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
            }
        } else {
            return Ordering::Equal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn ordered(a: &Value, b: &Value) {
        assert_eq!(cmp_values(a, b), Ordering::Less, "{a:?} < {b:?}");
        assert_eq!(cmp_values(b, a), Ordering::Greater, "{b:?} > {a:?}");
        assert_ne!(a, b);
    }

    #[test]
    fn kind_rank_dominates() {
        let ladder = [
            Value::null(),
            Value::boolean(true),
            Value::int(i64::MAX),
            Value::uint(0),
            Value::real(-1e300),
            Value::string("a"),
            Value::array(crate::Array::new()),
            Value::object(crate::Object::new()),
        ];
        for pair in ladder.windows(2) {
            ordered(&pair[0], &pair[1]);
        }
    }

    #[test]
    fn exactly_one_relation_holds() {
        let samples = [
            Value::null(),
            Value::boolean(false),
            Value::int(-1),
            Value::uint(1),
            Value::real(f64::NAN),
            Value::real(0.5),
            Value::string("s"),
            value!([1, 2]),
            value!({"k": 1}),
        ];
        for a in &samples {
            for b in &samples {
                let relations = [
                    cmp_values(a, b) == Ordering::Less,
                    cmp_values(b, a) == Ordering::Less,
                    cmp_values(a, b) == Ordering::Equal,
                ];
                assert_eq!(
                    relations.iter().filter(|r| **r).count(),
                    1,
                    "totality violated for {a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn nan_sorts_greatest_and_equals_itself() {
        let nan = Value::real(f64::NAN);
        assert_eq!(cmp_values(&nan, &nan), Ordering::Equal);
        ordered(&Value::real(f64::INFINITY), &nan);
        ordered(&Value::real(1.0), &nan);
    }

    #[test]
    fn subtype_breaks_ties() {
        let plain = Value::string("2024-01-01");
        let date = Value::string("2024-01-01").with_subtype(Subtype::DATE);
        ordered(&date, &plain); // DATE(-126) < NORMAL(-1)

        // Either side being subtype-comparable suppresses the tiebreak.
        let lax = Value::string("2024-01-01").with_subtype(Subtype::GENERIC_SUBTYPE_COMPARABLE);
        assert_eq!(cmp_values(&lax, &plain), Ordering::Equal);
        assert_eq!(cmp_values(&date, &lax), Ordering::Equal);
    }

    #[test]
    fn domain_comparable_collapses_numeric_kinds() {
        let int_two = Value::int(2).with_subtype(Subtype::DOMAIN_COMPARABLE);
        assert_eq!(cmp_values(&int_two, &Value::uint(2)), Ordering::Equal);
        assert_eq!(cmp_values(&int_two, &Value::real(2.0)), Ordering::Equal);
        assert_eq!(cmp_values(&int_two, &Value::real(2.5)), Ordering::Less);
        // Without the tag, kind rank separates them.
        ordered(&Value::int(2), &Value::uint(2));
    }

    #[test]
    fn mixed_integral_domain_compares_exactly() {
        let big = Value::uint(u64::MAX).with_subtype(Subtype::DOMAIN_COMPARABLE);
        assert_eq!(cmp_values(&Value::int(-1), &big), Ordering::Less);
        assert_eq!(cmp_values(&big, &Value::int(i64::MAX)), Ordering::Greater);
    }

    #[test]
    fn containers_compare_elementwise() {
        ordered(&value!([1, 2]), &value!([1, 3]));
        ordered(&value!([1]), &value!([1, 0]));
        ordered(&value!({"a": 1}), &value!({"a": 2}));
        ordered(&value!({"a": 1}), &value!({"b": 0}));
        assert_eq!(value!({"x": [1, {"y": 2}]}), value!({"x": [1, {"y": 2}]}));
    }

    #[test]
    fn deep_nesting_compares_without_overflow() {
        let mut a = Value::int(1);
        let mut b = Value::int(1);
        for _ in 0..200_000 {
            let mut wrap = Value::array(crate::Array::new());
            wrap.push_back(a);
            a = wrap;
            let mut wrap = Value::array(crate::Array::new());
            wrap.push_back(b);
            b = wrap;
        }
        assert_eq!(a, b);
        *b.element(0) = Value::int(2); // diverge near the top
        assert_ne!(a, b);
    }
}
