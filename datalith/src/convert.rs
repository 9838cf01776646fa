//! The conversion matrix.
//!
//! Two surfaces over the same kind-to-kind coercion table:
//!
//! - the lossy matrix ([`Value::convert_to`], [`Value::as_int`] and
//!   friends), where every cell produces *something* — clamping,
//!   saturating, truncating, or falling back to a supplied default;
//! - the strict API ([`Value::try_convert_to`], [`Value::cast`]), where
//!   any step that would discard information fails with
//!   [`ConversionError`] instead.
//!
//! Host-type bridging goes through two extensible traits,
//! [`IntoDatalith`] and [`FromDatalith`], each with a `_with` variant
//! that threads caller context (a codec dictionary, an interner, ...)
//! through nested conversions.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::array::Array;
use crate::error::{ConversionError, ConversionErrorKind};
use crate::object::Object;
use crate::value::{Kind, Payload, Value};

/// Render a real the way the matrix's string cell specifies: shortest text
/// that round-trips.
fn real_to_text(r: f64) -> String {
    format!("{r}")
}

fn parse_int(bytes: &[u8]) -> Option<i64> {
    core::str::from_utf8(bytes).ok()?.trim_ascii().parse().ok()
}

fn parse_uint(bytes: &[u8]) -> Option<u64> {
    core::str::from_utf8(bytes).ok()?.trim_ascii().parse().ok()
}

fn parse_real(bytes: &[u8]) -> Option<f64> {
    core::str::from_utf8(bytes).ok()?.trim_ascii().parse().ok()
}

/// One cell of the lossy matrix. `None` marks the container/scalar cells,
/// which fall back to the caller's default.
fn coerce_lossy(payload: &Payload, to: Kind) -> Option<Payload> {
    match (payload, to) {
        (Payload::Boolean(b), Kind::Integer) => Some(Payload::Integer(i64::from(*b))),
        (Payload::Boolean(b), Kind::UInteger) => Some(Payload::UInteger(u64::from(*b))),
        (Payload::Boolean(b), Kind::Real) => Some(Payload::Real(if *b { 1.0 } else { 0.0 })),
        (Payload::Boolean(b), Kind::String) => {
            Some(string_payload(if *b { "true" } else { "false" }))
        }

        (Payload::Integer(i), Kind::Boolean) => Some(Payload::Boolean(*i != 0)),
        // Negative values clamp to zero.
        (Payload::Integer(i), Kind::UInteger) => Some(Payload::UInteger((*i).max(0) as u64)),
        (Payload::Integer(i), Kind::Real) => Some(Payload::Real(*i as f64)),
        (Payload::Integer(i), Kind::String) => Some(string_payload(i.to_string())),

        (Payload::UInteger(u), Kind::Boolean) => Some(Payload::Boolean(*u != 0)),
        // Values past the signed range saturate.
        (Payload::UInteger(u), Kind::Integer) => {
            Some(Payload::Integer((*u).min(i64::MAX as u64) as i64))
        }
        (Payload::UInteger(u), Kind::Real) => Some(Payload::Real(*u as f64)),
        (Payload::UInteger(u), Kind::String) => Some(string_payload(u.to_string())),

        (Payload::Real(r), Kind::Boolean) => Some(Payload::Boolean(*r != 0.0)),
        // `as` truncates toward zero, saturates, and maps NaN to 0.
        (Payload::Real(r), Kind::Integer) => Some(Payload::Integer(*r as i64)),
        (Payload::Real(r), Kind::UInteger) => Some(Payload::UInteger(*r as u64)),
        (Payload::Real(r), Kind::String) => Some(string_payload(real_to_text(*r))),

        (Payload::String(_), _) => {
            let bytes = match payload {
                Payload::String(s) => s.as_deref().map_or(&[][..], Vec::as_slice),
                _ => unreachable!(),
            };
            match to {
                Kind::Boolean => Some(Payload::Boolean(bytes == b"true")),
                Kind::Integer => Some(Payload::Integer(parse_int(bytes).unwrap_or(0))),
                Kind::UInteger => Some(Payload::UInteger(parse_uint(bytes).unwrap_or(0))),
                Kind::Real => Some(Payload::Real(parse_real(bytes).unwrap_or(0.0))),
                _ => None,
            }
        }

        _ => None,
    }
}

fn string_payload(s: impl Into<Vec<u8>>) -> Payload {
    let bytes = s.into();
    if bytes.is_empty() {
        Payload::String(None)
    } else {
        Payload::String(Some(Box::new(bytes)))
    }
}

impl Value {
    /// Coerce this value to `to` in place, using the lossy matrix.
    ///
    /// Converting a kind to itself is a no-op. Converting from null seeds
    /// with `default`, as do the cells the matrix has no path for
    /// (container to scalar and scalar to container). The result carries
    /// the [`NORMAL`](crate::Subtype::NORMAL) subtype.
    pub fn convert_to(&mut self, to: Kind, default: Value) -> &mut Value {
        if self.kind() == to {
            return self;
        }
        if self.is_null() {
            *self = default;
            return self;
        }
        match coerce_lossy(&self.payload, to) {
            Some(payload) => *self = Value::from_payload(payload),
            None => *self = default,
        }
        self
    }

    /// Coerce this value to `to` in place, failing instead of losing
    /// information.
    ///
    /// Where the lossy matrix clamps, saturates, truncates, or parses
    /// partially, this errors with [`ConversionErrorKind::Loss`]; the
    /// container/scalar cells error with
    /// [`ConversionErrorKind::Unsupported`]. Converting from null
    /// installs the target kind's default payload (null carries no
    /// information to lose).
    pub fn try_convert_to(&mut self, to: Kind) -> Result<&mut Value, ConversionError> {
        let from = self.kind();
        if from == to {
            return Ok(self);
        }
        let loss = || ConversionError::new(ConversionErrorKind::Loss { from, to });
        let unsupported = || ConversionError::new(ConversionErrorKind::Unsupported { from, to });

        let payload = match (&self.payload, to) {
            (Payload::Null, Kind::Boolean | Kind::Integer | Kind::UInteger | Kind::Real
                | Kind::String | Kind::Array | Kind::Object) => Payload::default_for(to),

            (Payload::Boolean(_), Kind::Integer | Kind::UInteger | Kind::Real | Kind::String) => {
                coerce_lossy(&self.payload, to).expect("boolean coercions are total")
            }

            (Payload::Integer(i), Kind::Boolean) if *i == 0 || *i == 1 => {
                Payload::Boolean(*i != 0)
            }
            (Payload::Integer(i), Kind::UInteger) if *i >= 0 => Payload::UInteger(*i as u64),
            (Payload::Integer(i), Kind::Real) if (*i as f64) as i64 == *i => {
                Payload::Real(*i as f64)
            }
            (Payload::Integer(i), Kind::String) => string_payload(i.to_string()),

            (Payload::UInteger(u), Kind::Boolean) if *u <= 1 => Payload::Boolean(*u != 0),
            (Payload::UInteger(u), Kind::Integer) if *u <= i64::MAX as u64 => {
                Payload::Integer(*u as i64)
            }
            (Payload::UInteger(u), Kind::Real) if (*u as f64) as u64 == *u => {
                Payload::Real(*u as f64)
            }
            (Payload::UInteger(u), Kind::String) => string_payload(u.to_string()),

            (Payload::Real(r), Kind::Boolean) if *r == 0.0 || *r == 1.0 => {
                Payload::Boolean(*r != 0.0)
            }
            (Payload::Real(r), Kind::Integer)
                if r.fract() == 0.0 && (*r as i64) as f64 == *r =>
            {
                Payload::Integer(*r as i64)
            }
            (Payload::Real(r), Kind::UInteger)
                if r.fract() == 0.0 && *r >= 0.0 && (*r as u64) as f64 == *r =>
            {
                Payload::UInteger(*r as u64)
            }
            (Payload::Real(r), Kind::String) => string_payload(real_to_text(*r)),

            (Payload::String(_), Kind::Boolean) => {
                let bytes = self.get_string_unchecked();
                if bytes == b"true" {
                    Payload::Boolean(true)
                } else if bytes == b"false" {
                    Payload::Boolean(false)
                } else {
                    return Err(loss());
                }
            }
            (Payload::String(_), Kind::Integer) => {
                Payload::Integer(parse_int(self.get_string_unchecked()).ok_or_else(loss)?)
            }
            (Payload::String(_), Kind::UInteger) => {
                Payload::UInteger(parse_uint(self.get_string_unchecked()).ok_or_else(loss)?)
            }
            (Payload::String(_), Kind::Real) => {
                Payload::Real(parse_real(self.get_string_unchecked()).ok_or_else(loss)?)
            }

            (
                Payload::Integer(_) | Payload::UInteger(_) | Payload::Real(_),
                Kind::Boolean | Kind::Integer | Kind::UInteger | Kind::Real,
            ) => return Err(loss()),

            _ => return Err(unsupported()),
        };
        *self = Value::from_payload(payload);
        Ok(self)
    }

    /// This value coerced to a boolean; `false` when no path exists.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        self.clone()
            .convert_to(Kind::Boolean, Value::boolean(false))
            .get_bool_unchecked()
    }

    /// This value coerced to a signed integer; 0 when no path exists.
    #[must_use]
    pub fn as_int(&self) -> i64 {
        self.clone()
            .convert_to(Kind::Integer, Value::int(0))
            .get_int_unchecked()
    }

    /// This value coerced to an unsigned integer; 0 when no path exists.
    #[must_use]
    pub fn as_uint(&self) -> u64 {
        self.clone()
            .convert_to(Kind::UInteger, Value::uint(0))
            .get_uint_unchecked()
    }

    /// This value coerced to a real; 0.0 when no path exists.
    #[must_use]
    pub fn as_real(&self) -> f64 {
        self.clone()
            .convert_to(Kind::Real, Value::real(0.0))
            .get_real_unchecked()
    }

    /// This value coerced to string bytes; empty when no path exists.
    #[must_use]
    pub fn as_string(&self) -> Vec<u8> {
        self.clone()
            .convert_to(Kind::String, Value::string(""))
            .get_string_unchecked()
            .to_vec()
    }

    /// The array payload by value; empty for every other kind.
    #[must_use]
    pub fn as_array(&self) -> Array {
        match &self.payload {
            Payload::Array(a) => a.clone(),
            _ => Array::new(),
        }
    }

    /// The object payload by value; empty for every other kind.
    #[must_use]
    pub fn as_object(&self) -> Object {
        match &self.payload {
            Payload::Object(o) => o.clone(),
            _ => Object::new(),
        }
    }

    /// Convert to a host type through [`FromDatalith`].
    pub fn cast<T: FromDatalith>(&self) -> Result<T, ConversionError> {
        T::from_datalith(self)
    }

    /// Convert to a host type, threading caller context through.
    pub fn cast_with<T: FromDatalith, U>(&self, userdata: &mut U) -> Result<T, ConversionError> {
        T::from_datalith_with(self, userdata)
    }
}

// === Host-type bridging ===

/// Conversion from a host type into a [`Value`].
///
/// The extension point for custom types: implement this to make a type
/// constructible as a value. `into_datalith_with` receives caller
/// context; the default ignores it.
pub trait IntoDatalith {
    /// Convert into a value.
    fn into_datalith(self) -> Value;

    /// Convert into a value with caller context.
    fn into_datalith_with<U>(self, userdata: &mut U) -> Value
    where
        Self: Sized,
    {
        let _ = userdata;
        self.into_datalith()
    }
}

/// Fallible conversion from a [`Value`] into a host type.
///
/// Conversions are strict: a wrong kind or an unrepresentable payload is
/// an error, never a silent default.
pub trait FromDatalith: Sized {
    /// Convert from a value.
    fn from_datalith(value: &Value) -> Result<Self, ConversionError>;

    /// Convert from a value with caller context.
    fn from_datalith_with<U>(value: &Value, userdata: &mut U) -> Result<Self, ConversionError> {
        let _ = userdata;
        Self::from_datalith(value)
    }
}

macro_rules! into_via_from {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoDatalith for $ty {
            fn into_datalith(self) -> Value {
                Value::from(self)
            }
        }
    )*};
}

into_via_from!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char, String, &str
);

impl<T: IntoDatalith> IntoDatalith for Option<T> {
    fn into_datalith(self) -> Value {
        match self {
            Some(v) => v.into_datalith(),
            None => Value::null(),
        }
    }
}

impl<T: IntoDatalith> IntoDatalith for Vec<T> {
    fn into_datalith(self) -> Value {
        Value::array(self.into_iter().map(IntoDatalith::into_datalith).collect())
    }
}

impl<T: IntoDatalith> IntoDatalith for VecDeque<T> {
    fn into_datalith(self) -> Value {
        Value::array(self.into_iter().map(IntoDatalith::into_datalith).collect())
    }
}

impl<T: IntoDatalith, const N: usize> IntoDatalith for [T; N] {
    fn into_datalith(self) -> Value {
        Value::array(self.into_iter().map(IntoDatalith::into_datalith).collect())
    }
}

impl<K: IntoDatalith, V: IntoDatalith> IntoDatalith for BTreeMap<K, V> {
    fn into_datalith(self) -> Value {
        Value::object(
            self.into_iter()
                .map(|(k, v)| (k.into_datalith(), v.into_datalith()))
                .collect(),
        )
    }
}

impl<K: IntoDatalith, V: IntoDatalith, S> IntoDatalith for HashMap<K, V, S> {
    fn into_datalith(self) -> Value {
        Value::object(
            self.into_iter()
                .map(|(k, v)| (k.into_datalith(), v.into_datalith()))
                .collect(),
        )
    }
}

macro_rules! into_tuple {
    ($(($($name:ident : $idx:tt),+)),+ $(,)?) => {$(
        impl<$($name: IntoDatalith),+> IntoDatalith for ($($name,)+) {
            fn into_datalith(self) -> Value {
                let mut arr = Array::new();
                $(arr.push(self.$idx.into_datalith());)+
                Value::array(arr)
            }
        }
    )+};
}

into_tuple!(
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
);

fn wrong_kind(expected: &'static str, value: &Value) -> ConversionError {
    ConversionError::new(ConversionErrorKind::WrongKind {
        expected,
        got: value.kind(),
    })
}

fn out_of_range(target: &'static str) -> ConversionError {
    ConversionError::new(ConversionErrorKind::OutOfRange { target })
}

/// Exact signed integer out of any numeric kind.
fn int_exact(value: &Value) -> Result<i64, ConversionError> {
    match value.payload {
        Payload::Integer(i) => Ok(i),
        Payload::UInteger(u) => i64::try_from(u).map_err(|_| out_of_range("i64")),
        Payload::Real(r) if r.fract() == 0.0 && (r as i64) as f64 == r => Ok(r as i64),
        Payload::Real(_) => Err(out_of_range("i64")),
        _ => Err(wrong_kind("a numeric value", value)),
    }
}

/// Exact unsigned integer out of any numeric kind.
fn uint_exact(value: &Value) -> Result<u64, ConversionError> {
    match value.payload {
        Payload::UInteger(u) => Ok(u),
        Payload::Integer(i) => u64::try_from(i).map_err(|_| out_of_range("u64")),
        Payload::Real(r) if r.fract() == 0.0 && (r as u64) as f64 == r && r >= 0.0 => Ok(r as u64),
        Payload::Real(_) => Err(out_of_range("u64")),
        _ => Err(wrong_kind("a numeric value", value)),
    }
}

impl FromDatalith for bool {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        match value.payload {
            Payload::Boolean(b) => Ok(b),
            _ => Err(wrong_kind("a boolean", value)),
        }
    }
}

impl FromDatalith for i64 {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        int_exact(value)
    }
}

impl FromDatalith for u64 {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        uint_exact(value)
    }
}

macro_rules! from_narrow_signed {
    ($($ty:ty),* $(,)?) => {$(
        impl FromDatalith for $ty {
            fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
                <$ty>::try_from(int_exact(value)?).map_err(|_| out_of_range(stringify!($ty)))
            }
        }
    )*};
}

macro_rules! from_narrow_unsigned {
    ($($ty:ty),* $(,)?) => {$(
        impl FromDatalith for $ty {
            fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
                <$ty>::try_from(uint_exact(value)?).map_err(|_| out_of_range(stringify!($ty)))
            }
        }
    )*};
}

from_narrow_signed!(i8, i16, i32, isize);
from_narrow_unsigned!(u8, u16, u32, usize);

impl FromDatalith for f64 {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        match value.payload {
            Payload::Real(r) => Ok(r),
            Payload::Integer(i) => Ok(i as f64),
            Payload::UInteger(u) => Ok(u as f64),
            _ => Err(wrong_kind("a numeric value", value)),
        }
    }
}

impl FromDatalith for f32 {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        let wide = f64::from_datalith(value)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(out_of_range("f32"));
        }
        Ok(narrow)
    }
}

impl FromDatalith for String {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        if !value.is_string() {
            return Err(wrong_kind("a string", value));
        }
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ConversionError::new(ConversionErrorKind::InvalidUtf8))
    }
}

impl FromDatalith for char {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        let text = String::from_datalith(value)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(out_of_range("char")),
        }
    }
}

impl<T: FromDatalith> FromDatalith for Option<T> {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_datalith(value).map(Some)
        }
    }
}

impl<T: FromDatalith> FromDatalith for Vec<T> {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        if !value.is_array() {
            return Err(wrong_kind("an array", value));
        }
        value
            .get_array_unchecked()
            .iter()
            .map(T::from_datalith)
            .collect()
    }
}

impl<T: FromDatalith> FromDatalith for VecDeque<T> {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        Vec::<T>::from_datalith(value).map(VecDeque::from)
    }
}

impl<T: FromDatalith, const N: usize> FromDatalith for [T; N] {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        let items = Vec::<T>::from_datalith(value)?;
        <[T; N]>::try_from(items).map_err(|_| out_of_range("fixed-size array"))
    }
}

impl<K: FromDatalith + Ord, V: FromDatalith> FromDatalith for BTreeMap<K, V> {
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        if !value.is_object() {
            return Err(wrong_kind("an object", value));
        }
        value
            .get_object_unchecked()
            .iter()
            .map(|(k, v)| Ok((K::from_datalith(k)?, V::from_datalith(v)?)))
            .collect()
    }
}

impl<K, V, S> FromDatalith for HashMap<K, V, S>
where
    K: FromDatalith + core::hash::Hash + Eq,
    V: FromDatalith,
    S: core::hash::BuildHasher + Default,
{
    fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
        if !value.is_object() {
            return Err(wrong_kind("an object", value));
        }
        value
            .get_object_unchecked()
            .iter()
            .map(|(k, v)| Ok((K::from_datalith(k)?, V::from_datalith(v)?)))
            .collect()
    }
}

macro_rules! from_tuple {
    ($(($($name:ident : $idx:tt),+ ; $len:expr)),+ $(,)?) => {$(
        impl<$($name: FromDatalith),+> FromDatalith for ($($name,)+) {
            fn from_datalith(value: &Value) -> Result<Self, ConversionError> {
                if !value.is_array() || value.array_size() != $len {
                    return Err(wrong_kind(concat!("an array of ", $len), value));
                }
                let arr = value.get_array_unchecked();
                Ok(($($name::from_datalith(&arr[$idx])?,)+))
            }
        }
    )+};
}

from_tuple!(
    (A: 0, B: 1; 2),
    (A: 0, B: 1, C: 2; 3),
    (A: 0, B: 1, C: 2, D: 3; 4),
);
