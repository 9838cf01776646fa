//! The stream event protocol.
//!
//! Codecs talk to the data model through a flat event sequence mirroring
//! tree structure: `begin`/`end` bracket a document, container events
//! bracket arrays and objects, and strings may arrive in chunks so large
//! blobs never need materializing in one piece. Scalar events carry whole
//! [`Value`]s so subtypes travel with payloads.
//!
//! Producers implement [`StreamInput`] (pull-style: `write_one` performs
//! one event's worth of work, enabling cooperative non-blocking drivers);
//! consumers implement [`StreamHandler`]. [`ValueBuilder`] is the
//! reference consumer, assembling events back into a tree, and
//! [`write_value`] is the reference producer, driving an existing tree
//! through any handler iteratively.

use log::trace;

use crate::error::{StreamError, StreamErrorKind};
use crate::subtype::Subtype;
use crate::value::{Kind, Payload, Value};
use crate::{Array, Object};

/// A consumer of stream events.
///
/// All methods return `Result` so consumers can refuse events they cannot
/// represent (e.g. objects in a tabular format). `hint` arguments carry
/// the originating value's subtype and, for producers that have one, its
/// attributes; `size` is `None` when the producer does not know the
/// eventual length.
pub trait StreamHandler {
    /// Start of a document.
    fn begin(&mut self) -> Result<(), StreamError> {
        Ok(())
    }

    /// End of a document.
    fn end(&mut self) -> Result<(), StreamError> {
        Ok(())
    }

    /// Start of an array. `hint` carries the array's subtype.
    fn begin_array(&mut self, hint: &Value, size: Option<usize>) -> Result<(), StreamError>;

    /// End of the innermost open array.
    fn end_array(&mut self, hint: &Value) -> Result<(), StreamError>;

    /// Start of an object. `hint` carries the object's subtype.
    fn begin_object(&mut self, hint: &Value, size: Option<usize>) -> Result<(), StreamError>;

    /// End of the innermost open object.
    fn end_object(&mut self, hint: &Value) -> Result<(), StreamError>;

    /// Start of a (possibly chunked) string. `hint` carries the string's
    /// subtype.
    fn begin_string(&mut self, hint: &Value, size: Option<usize>) -> Result<(), StreamError>;

    /// One chunk of string bytes. Chunks borrow from the producer; a
    /// consumer that needs the bytes past the call must copy them.
    fn append_to_string(&mut self, chunk: &[u8]) -> Result<(), StreamError>;

    /// End of the string begun by the matching
    /// [`begin_string`](Self::begin_string).
    fn end_string(&mut self, hint: &Value) -> Result<(), StreamError>;

    /// A null scalar.
    fn null_value(&mut self, v: &Value) -> Result<(), StreamError>;

    /// A boolean scalar.
    fn bool_value(&mut self, v: &Value) -> Result<(), StreamError>;

    /// A signed integer scalar.
    fn integer_value(&mut self, v: &Value) -> Result<(), StreamError>;

    /// An unsigned integer scalar.
    fn uinteger_value(&mut self, v: &Value) -> Result<(), StreamError>;

    /// A real scalar.
    fn real_value(&mut self, v: &Value) -> Result<(), StreamError>;
}

/// A pull-style producer of stream events.
pub trait StreamInput {
    /// Perform one top-level event's worth of work, pushing the resulting
    /// events into `out`.
    ///
    /// Returns `false` once the input is exhausted. Callers running
    /// cooperative loops interleave `write_one` with other work.
    fn write_one(&mut self, out: &mut dyn StreamHandler) -> Result<bool, StreamError>;

    /// Drive [`write_one`](Self::write_one) to completion.
    fn write_all(&mut self, out: &mut dyn StreamHandler) -> Result<(), StreamError> {
        while self.write_one(out)? {}
        Ok(())
    }
}

/// Container bookkeeping for handlers that need to know whether the next
/// scalar is an object key or a value.
#[derive(Default)]
pub struct NestingTracker {
    stack: Vec<(Kind, usize)>,
}

impl NestingTracker {
    /// An empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many containers are currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the innermost open container is an object.
    #[must_use]
    pub fn in_object(&self) -> bool {
        matches!(self.stack.last(), Some((Kind::Object, _)))
    }

    /// Whether the next item in the innermost object is a key.
    ///
    /// Keys and values alternate; an even item count means a key comes
    /// next.
    #[must_use]
    pub fn next_is_key(&self) -> bool {
        matches!(self.stack.last(), Some((Kind::Object, n)) if n % 2 == 0)
    }

    /// Number of items recorded in the innermost container.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.stack.last().map_or(0, |(_, n)| *n)
    }

    /// Record entering a container.
    pub fn enter(&mut self, kind: Kind) {
        self.stack.push((kind, 0));
    }

    /// Record leaving the innermost container, counting it as an item of
    /// its parent.
    pub fn leave(&mut self) -> Option<Kind> {
        let (kind, _) = self.stack.pop()?;
        self.note_item();
        Some(kind)
    }

    /// Record one completed item (scalar or string) in the innermost
    /// container.
    pub fn note_item(&mut self) {
        if let Some((_, n)) = self.stack.last_mut() {
            *n += 1;
        }
    }
}

/// Drive a whole tree through a handler.
///
/// Events arrive in document order: object entries key first then value,
/// in key order. The walk is iterative, so tree depth is bounded by heap
/// only. Link values are emitted as nulls carrying the link's subtype;
/// callers that want link targets serialized flatten them first with
/// [`Value::resolved`].
pub fn write_value<H: StreamHandler + ?Sized>(value: &Value, out: &mut H) -> Result<(), StreamError> {
    enum Frame<'a> {
        Array { v: &'a Value, idx: usize },
        Object {
            v: &'a Value,
            idx: usize,
            key_done: bool,
        },
    }

    out.begin()?;
    let mut frames: Vec<Frame<'_>> = Vec::new();
    let mut current = Some(value);

    loop {
        if let Some(v) = current.take() {
            match &v.payload {
                Payload::Null => out.null_value(v)?,
                Payload::Boolean(_) => out.bool_value(v)?,
                Payload::Integer(_) => out.integer_value(v)?,
                Payload::UInteger(_) => out.uinteger_value(v)?,
                Payload::Real(_) => out.real_value(v)?,
                Payload::String(_) => {
                    let bytes = v.get_string_unchecked();
                    out.begin_string(v, Some(bytes.len()))?;
                    if !bytes.is_empty() {
                        out.append_to_string(bytes)?;
                    }
                    out.end_string(v)?;
                }
                Payload::Link(_) => {
                    let placeholder = Value::null().with_subtype(v.get_subtype());
                    out.null_value(&placeholder)?;
                }
                Payload::Array(a) => {
                    out.begin_array(v, Some(a.len()))?;
                    frames.push(Frame::Array { v, idx: 0 });
                }
                Payload::Object(o) => {
                    out.begin_object(v, Some(o.len()))?;
                    frames.push(Frame::Object {
                        v,
                        idx: 0,
                        key_done: false,
                    });
                }
            }
        } else if let Some(top) = frames.last_mut() {
            match top {
                Frame::Array { v, idx } => {
                    let node = *v;
                    let arr = node.get_array_unchecked();
                    if *idx < arr.len() {
                        current = Some(&arr[*idx]);
                        *idx += 1;
                    } else {
                        frames.pop();
                        out.end_array(node)?;
                    }
                }
                Frame::Object { v, idx, key_done } => {
                    let node = *v;
                    let entries = node.get_object_unchecked().entries();
                    if *idx < entries.len() {
                        if *key_done {
                            current = Some(&entries[*idx].1);
                            *idx += 1;
                            *key_done = false;
                        } else {
                            current = Some(&entries[*idx].0);
                            *key_done = true;
                        }
                    } else {
                        frames.pop();
                        out.end_object(node)?;
                    }
                }
            }
        } else {
            break;
        }
    }
    out.end()
}

impl Value {
    /// A copy of this tree with every link replaced by a snapshot of its
    /// final target.
    ///
    /// Link chains are followed to their end ([`deref_all_links`]
    /// semantics); dead and cyclic chains become plain nulls, and a
    /// container cell is snapshotted at most once so graph cycles cannot
    /// make the copy grow without bound. Object keys and attributes are
    /// copied as-is. The walk and the copies are iterative.
    ///
    /// [`deref_all_links`]: Value::deref_all_links
    #[must_use]
    pub fn resolved(&self) -> Value {
        use std::collections::HashSet;
        use std::rc::Rc;

        let mut root = self.clone();
        let mut snapshotted: HashSet<usize> = HashSet::new();
        let mut work: Vec<&mut Value> = vec![&mut root];

        while let Some(node) = work.pop() {
            if node.is_link() {
                let replacement = match node.deref_all_links() {
                    Some(cell) => {
                        let target = cell.borrow();
                        let container = target.is_array() || target.is_object();
                        let addr = Rc::as_ptr(&cell.0) as usize;
                        if container && !snapshotted.insert(addr) {
                            Value::null()
                        } else {
                            target.clone()
                        }
                    }
                    None => Value::null(),
                };
                *node = replacement;
                // The snapshot may itself contain links.
                work.push(node);
                continue;
            }
            match &mut node.payload {
                Payload::Array(a) => work.extend(a.iter_mut()),
                Payload::Object(o) => {
                    // Keys stay untouched: resolving a key could reorder
                    // the map.
                    work.extend(o.iter_mut().map(|(_, v)| v));
                }
                _ => {}
            }
        }
        root
    }
}

enum BuilderFrame {
    Array(Value),
    Object { value: Value, key: Option<Value> },
}

/// The reference [`StreamHandler`]: assembles an event sequence back into
/// a [`Value`] tree.
///
/// Scalar events are copied wholesale (subtype and attributes included);
/// container events reproduce the hint's subtype. Object entries pair up
/// by arrival order: key, then value.
#[derive(Default)]
pub struct ValueBuilder {
    result: Option<Value>,
    stack: Vec<BuilderFrame>,
    string: Option<(Vec<u8>, Subtype)>,
}

impl ValueBuilder {
    /// A fresh builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The assembled tree, if a complete document has been consumed.
    pub fn value(&mut self) -> Option<Value> {
        self.result.take()
    }

    fn place(&mut self, v: Value) -> Result<(), StreamError> {
        match self.stack.last_mut() {
            None => {
                self.result = Some(v);
                Ok(())
            }
            Some(BuilderFrame::Array(arr)) => {
                arr.push_back(v);
                Ok(())
            }
            Some(BuilderFrame::Object { value, key }) => {
                match key.take() {
                    None => *key = Some(v),
                    Some(k) => {
                        value.insert_member_at_end(k, v);
                    }
                }
                Ok(())
            }
        }
    }
}

impl StreamHandler for ValueBuilder {
    fn begin(&mut self) -> Result<(), StreamError> {
        trace!("value builder: document start");
        self.result = None;
        self.stack.clear();
        self.string = None;
        Ok(())
    }

    fn end(&mut self) -> Result<(), StreamError> {
        trace!("value builder: document end");
        if !self.stack.is_empty() {
            return Err(StreamError::malformed("document ended inside a container"));
        }
        Ok(())
    }

    fn begin_array(&mut self, hint: &Value, size: Option<usize>) -> Result<(), StreamError> {
        let mut arr = Array::new();
        arr.reserve(size.unwrap_or(0));
        let value = Value::array(arr).with_subtype(hint.get_subtype());
        self.stack.push(BuilderFrame::Array(value));
        Ok(())
    }

    fn end_array(&mut self, _hint: &Value) -> Result<(), StreamError> {
        match self.stack.pop() {
            Some(BuilderFrame::Array(value)) => self.place(value),
            _ => Err(StreamError::malformed("end_array without begin_array")),
        }
    }

    fn begin_object(&mut self, hint: &Value, _size: Option<usize>) -> Result<(), StreamError> {
        let value = Value::object(Object::new()).with_subtype(hint.get_subtype());
        self.stack.push(BuilderFrame::Object { value, key: None });
        Ok(())
    }

    fn end_object(&mut self, _hint: &Value) -> Result<(), StreamError> {
        match self.stack.pop() {
            Some(BuilderFrame::Object { value, key: None }) => self.place(value),
            Some(BuilderFrame::Object { key: Some(_), .. }) => {
                Err(StreamError::malformed("object ended after a dangling key"))
            }
            _ => Err(StreamError::malformed("end_object without begin_object")),
        }
    }

    fn begin_string(&mut self, hint: &Value, size: Option<usize>) -> Result<(), StreamError> {
        if self.string.is_some() {
            return Err(StreamError::malformed("begin_string inside a string"));
        }
        self.string = Some((Vec::with_capacity(size.unwrap_or(0)), hint.get_subtype()));
        Ok(())
    }

    fn append_to_string(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        match &mut self.string {
            Some((buffer, _)) => {
                buffer.extend_from_slice(chunk);
                Ok(())
            }
            None => Err(StreamError::malformed("append_to_string outside a string")),
        }
    }

    fn end_string(&mut self, _hint: &Value) -> Result<(), StreamError> {
        match self.string.take() {
            Some((buffer, subtype)) => {
                let value = Value::string(buffer).with_subtype(subtype);
                self.place(value)
            }
            None => Err(StreamError::malformed("end_string without begin_string")),
        }
    }

    fn null_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.place(v.clone())
    }

    fn bool_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.place(v.clone())
    }

    fn integer_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.place(v.clone())
    }

    fn uinteger_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.place(v.clone())
    }

    fn real_value(&mut self, v: &Value) -> Result<(), StreamError> {
        self.place(v.clone())
    }
}
