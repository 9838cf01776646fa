//! The core `Value` type.
//!
//! A `Value` is a tagged variant over nine kinds (null, boolean, integer,
//! unsigned integer, real, string, array, object, link), decorated with a
//! [`Subtype`] and an optional attribute side-map. Containers own their
//! children; links may own (strong) or borrow (weak) their target.
//!
//! Every algorithm that walks a tree — destruction, cloning, comparison,
//! debug formatting, traversal, serialization — runs on an explicit heap
//! stack. Depth is bounded by available memory, never by the call stack.

use core::fmt;
use core::mem;

use crate::array::Array;
use crate::compare::cmp_values;
use crate::link::Link;
use crate::object::Object;
use crate::subtype::Subtype;

/// The primary type discriminant of a [`Value`].
///
/// The declaration order is the kind ordering used by comparison:
/// `Null < Boolean < Integer < UInteger < Real < String < Array < Object <
/// Link`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// Absence; also used as a sentinel.
    Null,
    /// Two-valued.
    Boolean,
    /// Signed 64-bit integer.
    Integer,
    /// Unsigned 64-bit integer. A distinct kind, not a subset of `Integer`.
    UInteger,
    /// IEEE-754 double.
    Real,
    /// Owned byte sequence. The `normal` subtype implies UTF-8; other
    /// subtypes permit arbitrary bytes.
    String,
    /// Ordered sequence of values.
    Array,
    /// Key-sorted multimap from values to values.
    Object,
    /// Pointer to another value; ownership is carried by the link itself.
    Link,
}

pub(crate) enum Payload {
    Null,
    Boolean(bool),
    Integer(i64),
    UInteger(u64),
    Real(f64),
    /// `None` is the nil representation of an empty string.
    String(Option<Box<Vec<u8>>>),
    Array(Array),
    Object(Object),
    Link(Link),
}

impl Payload {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Payload::Null => Kind::Null,
            Payload::Boolean(_) => Kind::Boolean,
            Payload::Integer(_) => Kind::Integer,
            Payload::UInteger(_) => Kind::UInteger,
            Payload::Real(_) => Kind::Real,
            Payload::String(_) => Kind::String,
            Payload::Array(_) => Kind::Array,
            Payload::Object(_) => Kind::Object,
            Payload::Link(_) => Kind::Link,
        }
    }

    pub(crate) fn default_for(kind: Kind) -> Payload {
        match kind {
            Kind::Null => Payload::Null,
            Kind::Boolean => Payload::Boolean(false),
            Kind::Integer => Payload::Integer(0),
            Kind::UInteger => Payload::UInteger(0),
            Kind::Real => Payload::Real(0.0),
            Kind::String => Payload::String(None),
            Kind::Array => Payload::Array(Array::new()),
            Kind::Object => Payload::Object(Object::new()),
            Kind::Link => Payload::Link(Link::dangling()),
        }
    }
}

/// The universal tagged-union node of the data model.
pub struct Value {
    pub(crate) payload: Payload,
    pub(crate) subtype: Subtype,
    #[cfg(feature = "attributes")]
    pub(crate) attributes: Option<Box<Object>>,
}

impl Value {
    // === Construction ===

    /// The null value.
    #[must_use]
    pub const fn null() -> Self {
        Value {
            payload: Payload::Null,
            subtype: Subtype::NORMAL,
            #[cfg(feature = "attributes")]
            attributes: None,
        }
    }

    pub(crate) fn from_payload(payload: Payload) -> Self {
        Value {
            payload,
            subtype: Subtype::NORMAL,
            #[cfg(feature = "attributes")]
            attributes: None,
        }
    }

    /// A boolean value.
    #[must_use]
    pub fn boolean(v: bool) -> Self {
        Self::from_payload(Payload::Boolean(v))
    }

    /// A signed integer value.
    #[must_use]
    pub fn int(v: i64) -> Self {
        Self::from_payload(Payload::Integer(v))
    }

    /// An unsigned integer value.
    #[must_use]
    pub fn uint(v: u64) -> Self {
        Self::from_payload(Payload::UInteger(v))
    }

    /// A real value.
    #[must_use]
    pub fn real(v: f64) -> Self {
        Self::from_payload(Payload::Real(v))
    }

    /// A string value.
    #[must_use]
    pub fn string(v: impl Into<Vec<u8>>) -> Self {
        let bytes = v.into();
        let payload = if bytes.is_empty() {
            Payload::String(None)
        } else {
            Payload::String(Some(Box::new(bytes)))
        };
        Self::from_payload(payload)
    }

    /// A binary string value, tagged [`Subtype::BLOB`].
    #[must_use]
    pub fn blob(v: impl Into<Vec<u8>>) -> Self {
        Self::string(v).with_subtype(Subtype::BLOB)
    }

    /// An array value.
    #[must_use]
    pub fn array(v: Array) -> Self {
        Self::from_payload(Payload::Array(v))
    }

    /// An object value.
    #[must_use]
    pub fn object(v: Object) -> Self {
        Self::from_payload(Payload::Object(v))
    }

    /// Replace the subtype, builder style.
    #[must_use]
    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = subtype;
        self
    }

    // === Subtype access ===

    /// The subtype tag.
    #[must_use]
    pub fn get_subtype(&self) -> Subtype {
        self.subtype
    }

    /// Replace the subtype tag.
    ///
    /// On a link value this only relabels; it does **not** reclassify
    /// ownership. Use the link API ([`weaken_link`](Self::weaken_link),
    /// [`strengthen_link`](Self::strengthen_link)) to change who owns the
    /// target.
    pub fn set_subtype(&mut self, subtype: Subtype) {
        self.subtype = subtype;
    }

    // === Kind queries ===

    /// The primary kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }

    /// Whether this is the null kind.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.payload, Payload::Null)
    }

    /// Whether this is a boolean.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self.payload, Payload::Boolean(_))
    }

    /// Whether this is a signed integer.
    #[must_use]
    pub fn is_int(&self) -> bool {
        matches!(self.payload, Payload::Integer(_))
    }

    /// Whether this is an unsigned integer.
    #[must_use]
    pub fn is_uint(&self) -> bool {
        matches!(self.payload, Payload::UInteger(_))
    }

    /// Whether this is a real.
    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self.payload, Payload::Real(_))
    }

    /// Whether this is a string.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self.payload, Payload::String(_))
    }

    /// Whether this is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.payload, Payload::Array(_))
    }

    /// Whether this is an object.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self.payload, Payload::Object(_))
    }

    /// Whether this is a link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self.payload, Payload::Link(_))
    }

    /// Whether this is a string with materialized (non-nil) storage.
    #[must_use]
    pub fn is_nonempty_string(&self) -> bool {
        matches!(self.payload, Payload::String(Some(_)))
    }

    /// Whether this is an array with at least one element.
    #[must_use]
    pub fn is_nonempty_array(&self) -> bool {
        matches!(&self.payload, Payload::Array(a) if !a.is_empty())
    }

    /// Whether this is an object with at least one entry.
    #[must_use]
    pub fn is_nonempty_object(&self) -> bool {
        matches!(&self.payload, Payload::Object(o) if !o.is_empty())
    }

    // === Unchecked getters ===
    //
    // Wrong-kind access is a contract violation; these panic.

    /// The boolean payload. Panics if the kind is not `Boolean`.
    #[must_use]
    pub fn get_bool_unchecked(&self) -> bool {
        match self.payload {
            Payload::Boolean(v) => v,
            _ => panic!("get_bool_unchecked() called on {:?} value", self.kind()),
        }
    }

    /// The integer payload. Panics if the kind is not `Integer`.
    #[must_use]
    pub fn get_int_unchecked(&self) -> i64 {
        match self.payload {
            Payload::Integer(v) => v,
            _ => panic!("get_int_unchecked() called on {:?} value", self.kind()),
        }
    }

    /// The unsigned integer payload. Panics if the kind is not `UInteger`.
    #[must_use]
    pub fn get_uint_unchecked(&self) -> u64 {
        match self.payload {
            Payload::UInteger(v) => v,
            _ => panic!("get_uint_unchecked() called on {:?} value", self.kind()),
        }
    }

    /// The real payload. Panics if the kind is not `Real`.
    #[must_use]
    pub fn get_real_unchecked(&self) -> f64 {
        match self.payload {
            Payload::Real(v) => v,
            _ => panic!("get_real_unchecked() called on {:?} value", self.kind()),
        }
    }

    /// The string payload bytes. Panics if the kind is not `String`.
    ///
    /// A nil (empty) payload yields the empty slice.
    #[must_use]
    pub fn get_string_unchecked(&self) -> &[u8] {
        match &self.payload {
            Payload::String(s) => s.as_deref().map_or(&[], Vec::as_slice),
            _ => panic!("get_string_unchecked() called on {:?} value", self.kind()),
        }
    }

    /// The array payload. Panics if the kind is not `Array`.
    #[must_use]
    pub fn get_array_unchecked(&self) -> &Array {
        match &self.payload {
            Payload::Array(a) => a,
            _ => panic!("get_array_unchecked() called on {:?} value", self.kind()),
        }
    }

    /// The object payload. Panics if the kind is not `Object`.
    #[must_use]
    pub fn get_object_unchecked(&self) -> &Object {
        match &self.payload {
            Payload::Object(o) => o,
            _ => panic!("get_object_unchecked() called on {:?} value", self.kind()),
        }
    }

    /// The link payload. Panics if the kind is not `Link`.
    #[must_use]
    pub fn get_link_unchecked(&self) -> &Link {
        match &self.payload {
            Payload::Link(l) => l,
            _ => panic!("get_link_unchecked() called on {:?} value", self.kind()),
        }
    }

    // === Ref getters ===
    //
    // These re-kind the value if it currently holds a different kind,
    // discarding the previous payload.

    /// Mutable boolean payload, re-kinding to `Boolean` first if needed.
    pub fn get_bool_ref(&mut self) -> &mut bool {
        self.clear(Kind::Boolean);
        match &mut self.payload {
            Payload::Boolean(v) => v,
            _ => unreachable!(),
        }
    }

    /// Mutable integer payload, re-kinding to `Integer` first if needed.
    pub fn get_int_ref(&mut self) -> &mut i64 {
        self.clear(Kind::Integer);
        match &mut self.payload {
            Payload::Integer(v) => v,
            _ => unreachable!(),
        }
    }

    /// Mutable unsigned payload, re-kinding to `UInteger` first if needed.
    pub fn get_uint_ref(&mut self) -> &mut u64 {
        self.clear(Kind::UInteger);
        match &mut self.payload {
            Payload::UInteger(v) => v,
            _ => unreachable!(),
        }
    }

    /// Mutable real payload, re-kinding to `Real` first if needed.
    pub fn get_real_ref(&mut self) -> &mut f64 {
        self.clear(Kind::Real);
        match &mut self.payload {
            Payload::Real(v) => v,
            _ => unreachable!(),
        }
    }

    /// Mutable string bytes, re-kinding to `String` first if needed.
    pub fn get_string_ref(&mut self) -> &mut Vec<u8> {
        self.clear(Kind::String);
        match &mut self.payload {
            Payload::String(s) => s.get_or_insert_default(),
            _ => unreachable!(),
        }
    }

    /// Mutable array payload, re-kinding to `Array` first if needed.
    pub fn get_array_ref(&mut self) -> &mut Array {
        self.clear(Kind::Array);
        match &mut self.payload {
            Payload::Array(a) => a,
            _ => unreachable!(),
        }
    }

    /// Mutable object payload, re-kinding to `Object` first if needed.
    pub fn get_object_ref(&mut self) -> &mut Object {
        self.clear(Kind::Object);
        match &mut self.payload {
            Payload::Object(o) => o,
            _ => unreachable!(),
        }
    }

    // === Checked getters with defaults ===

    /// The boolean payload, or `default` on any other kind.
    #[must_use]
    pub fn get_bool_or(&self, default: bool) -> bool {
        match self.payload {
            Payload::Boolean(v) => v,
            _ => default,
        }
    }

    /// The integer payload, or `default` on any other kind.
    #[must_use]
    pub fn get_int_or(&self, default: i64) -> i64 {
        match self.payload {
            Payload::Integer(v) => v,
            _ => default,
        }
    }

    /// The unsigned payload, or `default` on any other kind.
    #[must_use]
    pub fn get_uint_or(&self, default: u64) -> u64 {
        match self.payload {
            Payload::UInteger(v) => v,
            _ => default,
        }
    }

    /// The real payload, or `default` on any other kind.
    #[must_use]
    pub fn get_real_or(&self, default: f64) -> f64 {
        match self.payload {
            Payload::Real(v) => v,
            _ => default,
        }
    }

    /// The string payload as UTF-8 text, if this is a string holding valid
    /// UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::String(s) => {
                core::str::from_utf8(s.as_deref().map_or(&[], Vec::as_slice)).ok()
            }
            _ => None,
        }
    }

    /// The string payload bytes, if this is a string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::String(s) => Some(s.as_deref().map_or(&[], Vec::as_slice)),
            _ => None,
        }
    }

    // === Setters ===

    /// Re-kind to null.
    pub fn set_null(&mut self) {
        self.clear(Kind::Null);
    }

    /// Re-kind to boolean and store `v`.
    pub fn set_bool(&mut self, v: bool) {
        self.clear(Kind::Boolean);
        self.payload = Payload::Boolean(v);
    }

    /// Re-kind to boolean and store `v` with a subtype.
    pub fn set_bool_with(&mut self, v: bool, subtype: Subtype) {
        self.set_bool(v);
        self.subtype = subtype;
    }

    /// Re-kind to integer and store `v`.
    pub fn set_int(&mut self, v: i64) {
        self.clear(Kind::Integer);
        self.payload = Payload::Integer(v);
    }

    /// Re-kind to integer and store `v` with a subtype.
    pub fn set_int_with(&mut self, v: i64, subtype: Subtype) {
        self.set_int(v);
        self.subtype = subtype;
    }

    /// Re-kind to unsigned integer and store `v`.
    pub fn set_uint(&mut self, v: u64) {
        self.clear(Kind::UInteger);
        self.payload = Payload::UInteger(v);
    }

    /// Re-kind to unsigned integer and store `v` with a subtype.
    pub fn set_uint_with(&mut self, v: u64, subtype: Subtype) {
        self.set_uint(v);
        self.subtype = subtype;
    }

    /// Re-kind to real and store `v`.
    pub fn set_real(&mut self, v: f64) {
        self.clear(Kind::Real);
        self.payload = Payload::Real(v);
    }

    /// Re-kind to real and store `v` with a subtype.
    pub fn set_real_with(&mut self, v: f64, subtype: Subtype) {
        self.set_real(v);
        self.subtype = subtype;
    }

    /// Re-kind to string and store `v`.
    pub fn set_string(&mut self, v: impl Into<Vec<u8>>) {
        self.clear(Kind::String);
        let bytes = v.into();
        self.payload = if bytes.is_empty() {
            Payload::String(None)
        } else {
            Payload::String(Some(Box::new(bytes)))
        };
    }

    /// Re-kind to string and store `v` with a subtype.
    pub fn set_string_with(&mut self, v: impl Into<Vec<u8>>, subtype: Subtype) {
        self.set_string(v);
        self.subtype = subtype;
    }

    /// Re-kind to array and store `v`.
    pub fn set_array(&mut self, v: Array) {
        self.clear(Kind::Array);
        self.payload = Payload::Array(v);
    }

    /// Re-kind to array and store `v` with a subtype.
    pub fn set_array_with(&mut self, v: Array, subtype: Subtype) {
        self.set_array(v);
        self.subtype = subtype;
    }

    /// Re-kind to object and store `v`.
    pub fn set_object(&mut self, v: Object) {
        self.clear(Kind::Object);
        self.payload = Payload::Object(v);
    }

    /// Re-kind to object and store `v` with a subtype.
    pub fn set_object_with(&mut self, v: Object, subtype: Subtype) {
        self.set_object(v);
        self.subtype = subtype;
    }

    // === Sizes ===

    /// Element, entry, or byte count for containers and strings; 0 for
    /// every other kind.
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.payload {
            Payload::String(s) => s.as_deref().map_or(0, Vec::len),
            Payload::Array(a) => a.len(),
            Payload::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// Element count if this is an array, else 0.
    #[must_use]
    pub fn array_size(&self) -> usize {
        match &self.payload {
            Payload::Array(a) => a.len(),
            _ => 0,
        }
    }

    /// Entry count if this is an object, else 0.
    #[must_use]
    pub fn object_size(&self) -> usize {
        match &self.payload {
            Payload::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// Byte count if this is a string, else 0.
    #[must_use]
    pub fn string_size(&self) -> usize {
        match &self.payload {
            Payload::String(s) => s.as_deref().map_or(0, Vec::len),
            _ => 0,
        }
    }

    // === Array navigation ===

    /// Mutable element slot at `pos`, re-kinding to array and growing with
    /// nulls as needed.
    pub fn element(&mut self, pos: usize) -> &mut Value {
        let arr = self.get_array_ref();
        if arr.len() <= pos {
            arr.resize_with_nulls(pos + 1);
        }
        &mut arr[pos]
    }

    /// Element at `pos` by value; null if out of range or not an array.
    #[must_use]
    pub fn const_element(&self, pos: usize) -> Value {
        self.element_ptr(pos).cloned().unwrap_or_else(Value::null)
    }

    /// Element at `pos`, if this is an array and `pos` is in range.
    #[must_use]
    pub fn element_ptr(&self, pos: usize) -> Option<&Value> {
        match &self.payload {
            Payload::Array(a) => a.get(pos),
            _ => None,
        }
    }

    /// Remove the element at `pos` if this is an array and `pos` is in
    /// range.
    pub fn erase_element(&mut self, pos: usize) {
        if let Payload::Array(a) = &mut self.payload {
            if pos < a.len() {
                a.remove(pos);
            }
        }
    }

    /// Append an element, re-kinding to array first if needed.
    pub fn push_back(&mut self, v: impl Into<Value>) {
        self.get_array_ref().push(v.into());
    }

    /// Append a sequence of elements, re-kinding to array first if needed.
    pub fn append<I>(&mut self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let arr = self.get_array_ref();
        for v in values {
            arr.push(v.into());
        }
    }

    // === Object navigation ===

    /// Mutable value slot under `key`, re-kinding to object and inserting a
    /// null entry if absent.
    pub fn member(&mut self, key: impl Into<Value>) -> &mut Value {
        self.get_object_ref().entry(key.into())
    }

    /// First value under `key` by value; null if absent or not an object.
    #[must_use]
    pub fn const_member(&self, key: &Value) -> Value {
        self.member_ptr(key).cloned().unwrap_or_else(Value::null)
    }

    /// First value under `key`, if present.
    #[must_use]
    pub fn member_ptr(&self, key: &Value) -> Option<&Value> {
        match &self.payload {
            Payload::Object(o) => o.get(key),
            _ => None,
        }
    }

    /// Whether any entry is stored under `key`.
    #[must_use]
    pub fn is_member(&self, key: &Value) -> bool {
        self.member_ptr(key).is_some()
    }

    /// Number of entries stored under `key` (duplicates counted).
    #[must_use]
    pub fn member_count(&self, key: &Value) -> usize {
        match &self.payload {
            Payload::Object(o) => o.count(key),
            _ => 0,
        }
    }

    /// Remove every entry stored under `key`, returning how many were
    /// removed.
    pub fn erase_member(&mut self, key: &Value) -> usize {
        match &mut self.payload {
            Payload::Object(o) => o.remove_all(key),
            _ => 0,
        }
    }

    /// Insert a null-valued entry under `key` (after any duplicates) and
    /// return the slot. Re-kinds to object first if needed.
    pub fn add_member(&mut self, key: impl Into<Value>) -> &mut Value {
        self.get_object_ref().insert(key, Value::null())
    }

    /// Insert an entry under `key` and return the slot. Re-kinds to object
    /// first if needed.
    pub fn insert_member(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> &mut Value {
        self.get_object_ref().insert(key, value)
    }

    /// Insert a null-valued entry, fast-pathing sorted key arrival.
    pub fn add_member_at_end(&mut self, key: Value) -> &mut Value {
        self.get_object_ref().insert_at_end(key, Value::null())
    }

    /// Insert an entry, fast-pathing sorted key arrival.
    pub fn insert_member_at_end(&mut self, key: Value, value: Value) -> &mut Value {
        self.get_object_ref().insert_at_end(key, value)
    }

    // === Lifecycle ===

    /// Re-kind the value.
    ///
    /// A no-op when the kind already matches. Otherwise the previous
    /// payload and attributes are dropped, the subtype resets to
    /// [`Subtype::NORMAL`], and the new kind's default payload is
    /// installed.
    pub fn clear(&mut self, kind: Kind) {
        if self.kind() == kind {
            return;
        }
        // Route the old payload through `take` so deep trees are drained
        // iteratively.
        let _ = self.take();
        self.payload = Payload::default_for(kind);
    }

    /// Take this value, leaving null in its place.
    pub fn take(&mut self) -> Value {
        mem::replace(self, Value::null())
    }

    /// Swap contents with another value.
    pub fn swap(&mut self, other: &mut Value) {
        mem::swap(self, other);
    }

    // === Attributes ===

    /// The attribute map, if any attributes have been set.
    #[cfg(feature = "attributes")]
    #[must_use]
    pub fn attributes(&self) -> Option<&Object> {
        self.attributes.as_deref()
    }

    /// Mutable attribute map, materializing an empty one if needed.
    #[cfg(feature = "attributes")]
    pub fn attributes_mut(&mut self) -> &mut Object {
        self.attributes.get_or_insert_default()
    }

    /// Replace the whole attribute map.
    #[cfg(feature = "attributes")]
    pub fn set_attributes(&mut self, attributes: Object) {
        self.attributes = if attributes.is_empty() {
            None
        } else {
            Some(Box::new(attributes))
        };
    }

    /// Number of attribute entries.
    #[cfg(feature = "attributes")]
    #[must_use]
    pub fn attributes_size(&self) -> usize {
        self.attributes.as_deref().map_or(0, Object::len)
    }

    /// Mutable attribute slot under `key`, inserting a null entry if
    /// absent.
    #[cfg(feature = "attributes")]
    pub fn attribute(&mut self, key: impl Into<Value>) -> &mut Value {
        self.attributes_mut().entry(key.into())
    }

    /// First attribute under `key` by value; null if absent.
    #[cfg(feature = "attributes")]
    #[must_use]
    pub fn const_attribute(&self, key: &Value) -> Value {
        self.attribute_ptr(key).cloned().unwrap_or_else(Value::null)
    }

    /// First attribute under `key`, if present.
    #[cfg(feature = "attributes")]
    #[must_use]
    pub fn attribute_ptr(&self, key: &Value) -> Option<&Value> {
        self.attributes.as_deref()?.get(key)
    }

    /// Whether an attribute is stored under `key`.
    #[cfg(feature = "attributes")]
    #[must_use]
    pub fn is_attribute(&self, key: &Value) -> bool {
        self.attribute_ptr(key).is_some()
    }

    /// Number of attributes stored under `key`.
    #[cfg(feature = "attributes")]
    #[must_use]
    pub fn attribute_count(&self, key: &Value) -> usize {
        self.attributes.as_deref().map_or(0, |a| a.count(key))
    }

    /// Insert a null-valued attribute under `key` (after duplicates) and
    /// return the slot.
    #[cfg(feature = "attributes")]
    pub fn add_attribute(&mut self, key: impl Into<Value>) -> &mut Value {
        self.attributes_mut().insert(key, Value::null())
    }

    /// Insert an attribute and return the slot.
    #[cfg(feature = "attributes")]
    pub fn insert_attribute(
        &mut self,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> &mut Value {
        self.attributes_mut().insert(key, value)
    }

    /// Remove every attribute stored under `key`.
    #[cfg(feature = "attributes")]
    pub fn erase_attribute(&mut self, key: &Value) -> usize {
        match self.attributes.as_deref_mut() {
            Some(attrs) => attrs.remove_all(key),
            None => 0,
        }
    }

    /// Remove all attributes.
    #[cfg(feature = "attributes")]
    pub fn erase_attributes(&mut self) {
        self.attributes = None;
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

// === Iterative destruction ===
//
// A recursive destructor would overflow the call stack on deep trees; the
// drain below moves children onto an explicit worklist before their parent
// shell is dropped.

impl Drop for Value {
    fn drop(&mut self) {
        if !self.drop_needs_worklist() {
            return;
        }
        let mut worklist: Vec<Value> = Vec::new();
        take_children_into(self, &mut worklist);
        while let Some(mut v) = worklist.pop() {
            take_children_into(&mut v, &mut worklist);
            // `v` is childless here and drops without recursing.
        }
    }
}

impl Value {
    fn drop_needs_worklist(&self) -> bool {
        #[cfg(feature = "attributes")]
        if self.attributes.as_deref().is_some_and(|a| !a.is_empty()) {
            return true;
        }
        match &self.payload {
            Payload::Array(a) => !a.is_empty(),
            Payload::Object(o) => !o.is_empty(),
            Payload::Link(l) => l.holds_unique_target(),
            _ => false,
        }
    }
}

fn take_children_into(v: &mut Value, out: &mut Vec<Value>) {
    match mem::replace(&mut v.payload, Payload::Null) {
        Payload::Array(mut a) => out.extend(a.take_vec()),
        Payload::Object(mut o) => {
            for (key, value) in o.take_vec() {
                out.push(key);
                out.push(value);
            }
        }
        Payload::Link(link) => {
            if let Some(target) = link.take_owned_target() {
                out.push(target);
            }
        }
        _ => {}
    }
    #[cfg(feature = "attributes")]
    if let Some(mut attrs) = v.attributes.take() {
        for (key, value) in attrs.take_vec() {
            out.push(key);
            out.push(value);
        }
    }
}

// === Iterative deep clone ===

/// Number of direct children `v` contributes to tree algorithms, attribute
/// entries included.
fn clone_child_count(v: &Value) -> usize {
    let main = match &v.payload {
        Payload::Array(a) => a.len(),
        Payload::Object(o) => 2 * o.len(),
        _ => 0,
    };
    #[cfg(feature = "attributes")]
    let attrs = 2 * v.attributes.as_deref().map_or(0, Object::len);
    #[cfg(not(feature = "attributes"))]
    let attrs = 0;
    main + attrs
}

fn clone_child(v: &Value, idx: usize) -> &Value {
    let main = match &v.payload {
        Payload::Array(a) => a.len(),
        Payload::Object(o) => 2 * o.len(),
        _ => 0,
    };
    if idx < main {
        match &v.payload {
            Payload::Array(a) => &a[idx],
            Payload::Object(o) => {
                let (key, value) = &o.entries()[idx / 2];
                if idx % 2 == 0 { key } else { value }
            }
            _ => unreachable!(),
        }
    } else {
        attribute_child(v, idx - main)
    }
}

#[cfg(feature = "attributes")]
fn attribute_child(v: &Value, idx: usize) -> &Value {
    let (key, value) = &v.attributes.as_deref().unwrap().entries()[idx / 2];
    if idx % 2 == 0 { key } else { value }
}

#[cfg(not(feature = "attributes"))]
fn attribute_child(_v: &Value, _idx: usize) -> &Value {
    unreachable!("values have no attribute children without the `attributes` feature")
}

/// Clone of `v` without children: scalars copied, containers left empty.
fn clone_shell(v: &Value) -> Value {
    let payload = match &v.payload {
        Payload::Null => Payload::Null,
        Payload::Boolean(b) => Payload::Boolean(*b),
        Payload::Integer(i) => Payload::Integer(*i),
        Payload::UInteger(u) => Payload::UInteger(*u),
        Payload::Real(r) => Payload::Real(*r),
        Payload::String(s) => Payload::String(s.clone()),
        Payload::Array(_) => Payload::Array(Array::new()),
        Payload::Object(_) => Payload::Object(Object::new()),
        Payload::Link(l) => Payload::Link(l.clone()),
    };
    Value {
        payload,
        subtype: v.subtype,
        #[cfg(feature = "attributes")]
        attributes: None,
    }
}

/// Reattach cloned children to a cloned shell. `children` arrives in the
/// same order `clone_child` enumerates.
fn clone_assemble(src: &Value, mut shell: Value, children: Vec<Value>) -> Value {
    let main = match &src.payload {
        Payload::Array(a) => a.len(),
        Payload::Object(o) => 2 * o.len(),
        _ => 0,
    };
    let mut iter = children.into_iter();
    match &mut shell.payload {
        Payload::Array(a) => {
            let elems: Vec<Value> = iter.by_ref().take(main).collect();
            *a = Array::from(elems);
        }
        Payload::Object(o) => {
            let mut pairs = Vec::with_capacity(main / 2);
            while pairs.len() < main / 2 {
                let key = iter.next().expect("key clone missing");
                let value = iter.next().expect("value clone missing");
                pairs.push((key, value));
            }
            // Source entries were sorted; order is preserved by the clone.
            *o = if pairs.is_empty() {
                Object::new()
            } else {
                Object(Some(Box::new(pairs)))
            };
        }
        _ => {}
    }
    #[cfg(feature = "attributes")]
    {
        let mut pairs = Vec::new();
        while let Some(key) = iter.next() {
            let value = iter.next().expect("attribute value clone missing");
            pairs.push((key, value));
        }
        if !pairs.is_empty() {
            shell.attributes = Some(Box::new(Object(Some(Box::new(pairs)))));
        }
    }
    shell
}

impl Clone for Value {
    fn clone(&self) -> Self {
        if clone_child_count(self) == 0 {
            return clone_shell(self);
        }

        struct Frame<'a> {
            src: &'a Value,
            next: usize,
            count: usize,
        }

        let mut frames = vec![Frame {
            src: self,
            next: 0,
            count: clone_child_count(self),
        }];
        let mut built: Vec<Value> = Vec::new();

        while let Some(top) = frames.last_mut() {
            if top.next < top.count {
                let child = clone_child(top.src, top.next);
                top.next += 1;
                let count = clone_child_count(child);
                if count == 0 {
                    built.push(clone_shell(child));
                } else {
                    frames.push(Frame {
                        src: child,
                        next: 0,
                        count,
                    });
                }
            } else {
                let frame = frames.pop().expect("clone frame underflow");
                let children = built.split_off(built.len() - frame.count);
                built.push(clone_assemble(frame.src, clone_shell(frame.src), children));
            }
        }

        built.pop().expect("clone produced no value")
    }
}

// === Comparison surface ===
//
// The ordering rules live in `compare`; these impls expose strict
// comparison. Attributes do not participate.

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        cmp_values(self, other) == core::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(cmp_values(self, other))
    }
}

impl Ord for Value {
    /// Strict total order: kind rank, then subtype, then payload, with the
    /// domain-comparable and subtype-ignored escape hatches described on
    /// the crate root. NaN sorts greater than every other real and equal
    /// to itself.
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        cmp_values(self, other)
    }
}

// === Debug ===
//
// Hand-rolled so that adversarially deep trees can be printed without
// overflowing the call stack.

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Item<'a> {
            Node(&'a Value),
            Text(&'static str),
        }

        let mut work = vec![Item::Node(self)];
        while let Some(item) = work.pop() {
            match item {
                Item::Text(s) => f.write_str(s)?,
                Item::Node(v) => match &v.payload {
                    Payload::Null => f.write_str("null")?,
                    Payload::Boolean(b) => write!(f, "{b}")?,
                    Payload::Integer(i) => write!(f, "{i}")?,
                    Payload::UInteger(u) => write!(f, "{u}")?,
                    Payload::Real(r) => write!(f, "{r:?}")?,
                    Payload::String(s) => {
                        let bytes = s.as_deref().map_or(&[][..], Vec::as_slice);
                        match core::str::from_utf8(bytes) {
                            Ok(text) => write!(f, "{text:?}")?,
                            Err(_) => write!(f, "b\"{}\"", bytes.escape_ascii())?,
                        }
                    }
                    Payload::Link(l) => {
                        if l.is_strong() {
                            f.write_str("<strong link>")?;
                        } else {
                            f.write_str("<link>")?;
                        }
                    }
                    Payload::Array(a) => {
                        f.write_str("[")?;
                        work.push(Item::Text("]"));
                        for (i, elem) in a.iter().enumerate().rev() {
                            work.push(Item::Node(elem));
                            if i > 0 {
                                work.push(Item::Text(", "));
                            }
                        }
                    }
                    Payload::Object(o) => {
                        f.write_str("{")?;
                        work.push(Item::Text("}"));
                        for (i, (key, value)) in o.entries().iter().enumerate().rev() {
                            work.push(Item::Node(value));
                            work.push(Item::Text(": "));
                            work.push(Item::Node(key));
                            if i > 0 {
                                work.push(Item::Text(", "));
                            }
                        }
                    }
                },
            }
        }
        Ok(())
    }
}

// === Indexing ===

impl core::ops::Index<usize> for Value {
    type Output = Value;

    /// Panics when the value is not an array or `pos` is out of range.
    fn index(&self, pos: usize) -> &Value {
        self.element_ptr(pos)
            .unwrap_or_else(|| panic!("no element at index {pos}"))
    }
}

impl core::ops::IndexMut<usize> for Value {
    /// Re-kinds to array and grows with nulls, like
    /// [`element`](Value::element).
    fn index_mut(&mut self, pos: usize) -> &mut Value {
        self.element(pos)
    }
}

impl core::ops::Index<&str> for Value {
    type Output = Value;

    /// Panics when the value is not an object or the key is absent.
    fn index(&self, key: &str) -> &Value {
        let key = Value::from(key);
        self.member_ptr(&key)
            .unwrap_or_else(|| panic!("no member under key {key:?}"))
    }
}

impl core::ops::IndexMut<&str> for Value {
    /// Re-kinds to object and inserts a null entry, like
    /// [`member`](Value::member).
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.member(key)
    }
}

// === From impls ===

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::boolean(v)
    }
}

macro_rules! from_signed {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::int(v as i64)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::uint(v as u64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::string(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::string(v.to_string())
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::array(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::object(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::null(),
        }
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::array(Array::from_iter(iter))
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::object(Object::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_by_default() {
        let v = Value::null();
        assert!(v.is_null());
        assert_eq!(v.kind(), Kind::Null);
        assert_eq!(v.get_subtype(), Subtype::NORMAL);
        assert_eq!(Value::default(), Value::null());
    }

    #[test]
    fn scalar_round_trip() {
        assert_eq!(Value::boolean(true).get_bool_unchecked(), true);
        assert_eq!(Value::int(-3).get_int_unchecked(), -3);
        assert_eq!(Value::uint(3).get_uint_unchecked(), 3);
        assert_eq!(Value::real(1.5).get_real_unchecked(), 1.5);
        assert_eq!(Value::string("abc").get_string_unchecked(), b"abc");
    }

    #[test]
    #[should_panic(expected = "get_int_unchecked")]
    fn unchecked_wrong_kind_panics() {
        let _ = Value::boolean(true).get_int_unchecked();
    }

    #[test]
    fn empty_string_has_nil_payload() {
        let v = Value::string("");
        assert!(v.is_string());
        assert!(!v.is_nonempty_string());
        assert_eq!(v.string_size(), 0);
        assert_eq!(v.get_string_unchecked(), b"");
    }

    #[test]
    fn ref_getters_rekind() {
        let mut v = Value::string("text");
        *v.get_int_ref() = 42;
        assert!(v.is_int());
        assert_eq!(v.get_int_unchecked(), 42);
        // Re-kinding resets the subtype.
        let mut v = Value::string("u").with_subtype(Subtype::UUID);
        v.get_bool_ref();
        assert_eq!(v.get_subtype(), Subtype::NORMAL);
    }

    #[test]
    fn clear_same_kind_is_noop() {
        let mut v = Value::int(7).with_subtype(Subtype::UNIX_TIMESTAMP);
        v.clear(Kind::Integer);
        assert_eq!(v.get_int_unchecked(), 7);
        assert_eq!(v.get_subtype(), Subtype::UNIX_TIMESTAMP);

        v.clear(Kind::String);
        assert!(v.is_string());
        assert_eq!(v.get_subtype(), Subtype::NORMAL);
        // Idempotent: a second clear to the same kind changes nothing.
        v.set_string("abc");
        v.clear(Kind::String);
        assert_eq!(v.get_string_unchecked(), b"abc");
    }

    #[test]
    fn element_grows_with_nulls() {
        let mut v = Value::null();
        *v.element(2) = Value::int(9);
        assert!(v.is_array());
        assert_eq!(v.array_size(), 3);
        assert!(v[0].is_null());
        assert!(v[1].is_null());
        assert_eq!(v[2].as_int(), 9);
        assert!(v.const_element(10).is_null());
    }

    #[test]
    fn member_on_non_object_rekinds() {
        let mut v = Value::int(1);
        *v.member("k") = Value::from(42u64);
        assert!(v.is_object());
        assert_eq!(v.member_count(&Value::from("k")), 1);
        assert_eq!(v["k"].as_int(), 42);
    }

    #[test]
    fn member_multimap_semantics() {
        let mut v = Value::null();
        v.add_member("dup");
        v.add_member("dup");
        assert_eq!(v.member_count(&Value::from("dup")), 2);
        assert_eq!(v.erase_member(&Value::from("dup")), 2);
        assert_eq!(v.object_size(), 0);
    }

    #[test]
    fn take_leaves_null() {
        let mut v = Value::string("contents");
        let taken = v.take();
        assert!(v.is_null());
        assert_eq!(taken.get_string_unchecked(), b"contents");
    }

    #[test]
    fn deep_tree_drops_without_overflow() {
        let mut v = Value::null();
        for _ in 0..200_000 {
            let mut outer = Value::array(Array::new());
            outer.push_back(v);
            v = outer;
        }
        drop(v);
    }

    #[test]
    fn deep_tree_clones_without_overflow() {
        let mut v = Value::int(1);
        for _ in 0..200_000 {
            let mut outer = Value::array(Array::new());
            outer.push_back(v);
            v = outer;
        }
        let copy = v.clone();
        assert_eq!(copy, v);
    }

    #[test]
    fn clone_preserves_subtype_and_attributes() {
        let mut v = Value::string("d0f…").with_subtype(Subtype::UUID);
        #[cfg(feature = "attributes")]
        v.insert_attribute("source", "header");
        let copy = v.clone();
        assert_eq!(copy.get_subtype(), Subtype::UUID);
        #[cfg(feature = "attributes")]
        assert_eq!(
            copy.const_attribute(&Value::from("source")).as_str(),
            Some("header")
        );
    }

    #[test]
    fn debug_formats_compactly() {
        let mut v = Value::null();
        *v.member("a") = Value::int(1);
        v.member("b").push_back(Value::from("x"));
        assert_eq!(format!("{v:?}"), r#"{"a": 1, "b": ["x"]}"#);
    }

    #[cfg(feature = "attributes")]
    #[test]
    fn attribute_api() {
        let mut v = Value::string("body");
        assert!(v.attributes().is_none());
        v.insert_attribute("charset", "utf-8");
        assert_eq!(v.attributes_size(), 1);
        assert!(v.is_attribute(&Value::from("charset")));
        assert_eq!(v.erase_attribute(&Value::from("charset")), 1);
        v.erase_attributes();
        assert!(v.attributes().is_none());
    }
}
