//! Object (key-sorted multimap) storage.
//!
//! Objects are stored as a vector of `(key, value)` pairs kept sorted by the
//! strict value ordering. Duplicate keys are permitted and sit adjacent, so
//! multimap queries are range scans. An empty object stores no heap block;
//! the first insertion materializes one.

use core::cmp::Ordering;
use core::ops::Index;
use core::slice;

use crate::compare::cmp_values;
use crate::value::Value;

/// A key-sorted multimap from values to values.
#[derive(Default, Clone)]
pub struct Object(pub(crate) Option<Box<Vec<(Value, Value)>>>);

impl Object {
    /// Create an empty object.
    #[must_use]
    pub const fn new() -> Self {
        Object(None)
    }

    fn data(&mut self) -> &mut Vec<(Value, Value)> {
        self.0.get_or_insert_default()
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.as_deref().map_or(0, Vec::len)
    }

    /// Whether the object holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first entry whose key is not less than `key`.
    fn lower_bound(&self, key: &Value) -> usize {
        self.entries()
            .partition_point(|(k, _)| cmp_values(k, key) == Ordering::Less)
    }

    /// Index just past the last entry whose key equals `key`.
    fn upper_bound(&self, key: &Value) -> usize {
        self.entries()
            .partition_point(|(k, _)| cmp_values(k, key) != Ordering::Greater)
    }

    /// First value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        let idx = self.lower_bound(key);
        match self.entries().get(idx) {
            Some((k, v)) if cmp_values(k, key) == Ordering::Equal => Some(v),
            _ => None,
        }
    }

    /// Mutable first value stored under `key`, if any.
    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        let idx = self.lower_bound(key);
        match self.data().get_mut(idx) {
            Some((k, v)) if cmp_values(k, key) == Ordering::Equal => Some(v),
            _ => None,
        }
    }

    /// Whether any entry is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries stored under `key`.
    #[must_use]
    pub fn count(&self, key: &Value) -> usize {
        self.upper_bound(key) - self.lower_bound(key)
    }

    /// First value stored under `key`, inserting a null entry if absent.
    pub fn entry(&mut self, key: Value) -> &mut Value {
        let idx = self.lower_bound(&key);
        let found =
            matches!(self.entries().get(idx), Some((k, _)) if cmp_values(k, &key) == Ordering::Equal);
        if !found {
            self.data().insert(idx, (key, Value::null()));
        }
        &mut self.data()[idx].1
    }

    /// Insert an entry after any existing entries with an equal key.
    ///
    /// Duplicates are kept; this is the multimap insert.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> &mut Value {
        let key = key.into();
        let idx = self.upper_bound(&key);
        self.data().insert(idx, (key, value.into()));
        &mut self.data()[idx].1
    }

    /// Insert an entry, fast-pathing keys that arrive in sorted order.
    ///
    /// Streaming builders append keys that are usually already in order;
    /// this skips the binary search when the new key belongs at the end.
    pub fn insert_at_end(&mut self, key: Value, value: Value) -> &mut Value {
        let sorted = match self.entries().last() {
            Some((last, _)) => cmp_values(last, &key) != Ordering::Greater,
            None => true,
        };
        if sorted {
            let data = self.data();
            data.push((key, value));
            let idx = data.len() - 1;
            &mut data[idx].1
        } else {
            self.insert(key, value)
        }
    }

    /// Remove every entry stored under `key`, returning how many were
    /// removed.
    pub fn remove_all(&mut self, key: &Value) -> usize {
        let lo = self.lower_bound(key);
        let hi = self.upper_bound(key);
        if hi > lo {
            self.data().drain(lo..hi);
        }
        hi - lo
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries().iter().map(|(k, v)| (k, v))
    }

    /// Iterate over entries in key order with mutable values.
    ///
    /// Keys stay shared: mutating a key would break the sort invariant.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Value, &mut Value)> {
        let entries = match self.0.as_deref_mut() {
            Some(data) => data.as_mut_slice(),
            None => &mut [],
        };
        entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries().iter().map(|(k, _)| k)
    }

    /// Iterate over values in key order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries().iter().map(|(_, v)| v)
    }

    /// View the entries as a slice of pairs, in key order.
    #[must_use]
    pub fn entries(&self) -> &[(Value, Value)] {
        self.0.as_deref().map_or(&[], Vec::as_slice)
    }

    /// Take the backing storage, leaving the object empty.
    pub(crate) fn take_vec(&mut self) -> Vec<(Value, Value)> {
        self.0.take().map_or_else(Vec::new, |b| *b)
    }
}

impl core::fmt::Debug for Object {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Index<&Value> for Object {
    type Output = Value;

    fn index(&self, key: &Value) -> &Value {
        self.get(key).expect("no entry found for key")
    }
}

impl From<Vec<(Value, Value)>> for Object {
    fn from(mut data: Vec<(Value, Value)>) -> Self {
        if data.is_empty() {
            return Object(None);
        }
        data.sort_by(|(a, _), (b, _)| cmp_values(a, b));
        Object(Some(Box::new(data)))
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let data: Vec<(Value, Value)> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Object::from(data)
    }
}

impl IntoIterator for Object {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.take_vec().into_iter()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = &'a (Value, Value);
    type IntoIter = slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries().iter()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries()
                .iter()
                .zip(other.entries())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl Eq for Object {}
