//! Iterative tree traversal.
//!
//! All walks run on an explicit stack of [`TraversalFrame`]s rather than
//! call-stack recursion, so adversarially deep trees cannot overflow the
//! stack. Predicates return `true` to continue and `false` to abort the
//! walk immediately.
//!
//! Within an object, each entry is visited key first, then value, in key
//! order. The `value_traverse` variants skip object keys entirely.

use crate::compare::cmp_values;
use crate::value::{Kind, Value};
use core::cmp::Ordering;

/// A stack record for one ancestor during an iterative walk: the node, an
/// optional array cursor, an optional object cursor, whether the current
/// object entry's key has already been visited, and the freeze mark used
/// by diff walks.
#[derive(Clone, Copy)]
pub struct TraversalFrame<'a> {
    value: &'a Value,
    array: Option<usize>,
    object: Option<usize>,
    traversed_key_already: bool,
    frozen: bool,
    /// Stack depth of the partner side at freeze time; unfreezing waits
    /// for the partner to return to this depth.
    freeze_partner_depth: usize,
}

impl<'a> TraversalFrame<'a> {
    fn leaf(value: &'a Value) -> Self {
        TraversalFrame {
            value,
            array: None,
            object: None,
            traversed_key_already: false,
            frozen: false,
            freeze_partner_depth: 0,
        }
    }

    /// The node this frame belongs to.
    #[must_use]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Whether this frame is an array with elements still to visit.
    #[must_use]
    pub fn is_array(&self) -> bool {
        match self.array {
            Some(idx) => self.value.is_array() && idx < self.value.array_size(),
            None => false,
        }
    }

    /// Index of the next array element to visit.
    #[must_use]
    pub fn array_index(&self) -> usize {
        self.array.unwrap_or(0)
    }

    /// The next array element to visit, if any.
    #[must_use]
    pub fn array_element(&self) -> Option<&'a Value> {
        let idx = self.array?;
        self.value.element_ptr(idx)
    }

    /// Whether this frame is an object with entries still to visit.
    #[must_use]
    pub fn is_object(&self) -> bool {
        match self.object {
            Some(idx) => self.value.is_object() && idx < self.value.object_size(),
            None => false,
        }
    }

    /// Whether the walk is positioned on an object key that has not been
    /// visited yet.
    #[must_use]
    pub fn is_object_key(&self) -> bool {
        self.is_object() && !self.traversed_key_already
    }

    /// Key of the current object entry, if any remain.
    #[must_use]
    pub fn object_key(&self) -> Option<&'a Value> {
        if !self.is_object() {
            return None;
        }
        let idx = self.object?;
        self.value
            .get_object_unchecked()
            .entries()
            .get(idx)
            .map(|(k, _)| k)
    }

    /// Value of the current object entry, if any remain.
    #[must_use]
    pub fn object_value(&self) -> Option<&'a Value> {
        if !self.is_object() {
            return None;
        }
        let idx = self.object?;
        self.value
            .get_object_unchecked()
            .entries()
            .get(idx)
            .map(|(_, v)| v)
    }
}

/// A view of the ancestor stack handed to traversal predicates.
///
/// The direct parent is the last frame; the walk root is the first.
#[derive(Clone, Copy)]
pub struct Ancestry<'s, 'a>(&'s [TraversalFrame<'a>]);

impl<'s, 'a> Ancestry<'s, 'a> {
    /// How many ancestors the current node has.
    #[must_use]
    pub fn parent_count(&self) -> usize {
        self.0.len()
    }

    /// The direct parent frame, if the current node is not the root.
    #[must_use]
    pub fn parent(&self) -> Option<&'s TraversalFrame<'a>> {
        self.0.last()
    }

    /// Ancestor frames from direct parent up to the walk root.
    pub fn iter(&self) -> impl Iterator<Item = &'s TraversalFrame<'a>> {
        self.0.iter().rev()
    }

    /// Ancestors collected into a vector, direct parent first.
    #[must_use]
    pub fn ancestry(&self) -> Vec<TraversalFrame<'a>> {
        self.0.iter().rev().copied().collect()
    }
}

/// Whether object keys are delivered to the predicate or skipped.
#[derive(Clone, Copy, PartialEq, Eq)]
enum KeyMode {
    Visit,
    Skip,
}

/// Push a frame for `node` and fetch its first child, if any.
fn push_frame<'a>(
    refs: &mut Vec<TraversalFrame<'a>>,
    node: &'a Value,
    keys: KeyMode,
) -> Option<&'a Value> {
    match node.kind() {
        Kind::Array => {
            let arr = node.get_array_unchecked();
            let mut frame = TraversalFrame::leaf(node);
            frame.array = Some(0);
            let first = if arr.is_empty() {
                None
            } else {
                frame.array = Some(1);
                Some(&arr[0])
            };
            refs.push(frame);
            first
        }
        Kind::Object => {
            let entries = node.get_object_unchecked().entries();
            let mut frame = TraversalFrame::leaf(node);
            frame.object = Some(0);
            let first = if entries.is_empty() {
                None
            } else if keys == KeyMode::Visit {
                frame.traversed_key_already = true;
                Some(&entries[0].0)
            } else {
                frame.object = Some(1);
                Some(&entries[0].1)
            };
            refs.push(frame);
            first
        }
        _ => {
            refs.push(TraversalFrame::leaf(node));
            None
        }
    }
}

/// Push a frame for `node` without fetching a child; the next advancement
/// step delivers the first child. Diff walks use this so freeze
/// arbitration can see every key fetch.
fn push_frame_unfetched<'a>(refs: &mut Vec<TraversalFrame<'a>>, node: &'a Value) {
    let mut frame = TraversalFrame::leaf(node);
    match node.kind() {
        Kind::Array => frame.array = Some(0),
        Kind::Object => frame.object = Some(0),
        _ => {}
    }
    refs.push(frame);
}

/// Fetch the next child from the top frame, advancing its cursor.
/// `None` means the frame is exhausted.
fn advance<'a>(frame: &mut TraversalFrame<'a>, keys: KeyMode) -> Option<&'a Value> {
    let node = frame.value;
    match node.kind() {
        Kind::Array => {
            let arr = node.get_array_unchecked();
            let idx = frame.array?;
            if idx < arr.len() {
                frame.array = Some(idx + 1);
                Some(&arr[idx])
            } else {
                None
            }
        }
        Kind::Object => {
            let entries = node.get_object_unchecked().entries();
            let idx = frame.object?;
            if idx >= entries.len() {
                return None;
            }
            match keys {
                KeyMode::Visit => {
                    if frame.traversed_key_already {
                        frame.traversed_key_already = false;
                        frame.object = Some(idx + 1);
                        Some(&entries[idx].1)
                    } else {
                        frame.traversed_key_already = true;
                        Some(&entries[idx].0)
                    }
                }
                KeyMode::Skip => {
                    frame.object = Some(idx + 1);
                    Some(&entries[idx].1)
                }
            }
        }
        _ => None,
    }
}

/// The single-visitor walk every one-tree traversal variant reduces to.
/// The visitor's third argument is `true` for the pre-order visit.
fn walk<F>(root: &Value, keys: KeyMode, mut visit: F)
where
    F: FnMut(&Value, Ancestry<'_, '_>, bool) -> bool,
{
    let mut refs: Vec<TraversalFrame<'_>> = Vec::new();
    let mut current = Some(root);

    loop {
        if let Some(node) = current.take() {
            if !visit(node, Ancestry(&refs), true) {
                return;
            }
            current = push_frame(&mut refs, node, keys);
        } else if refs.is_empty() {
            break;
        } else {
            current = advance(refs.last_mut().expect("non-empty stack"), keys);
            if current.is_none() {
                let frame = refs.pop().expect("non-empty stack");
                if !visit(frame.value, Ancestry(&refs), false) {
                    return;
                }
            }
        }
    }
}

impl Value {
    /// Visit every node — object keys included — prefix then postfix.
    pub fn traverse<Pre, Post>(&self, mut prefix: Pre, mut postfix: Post)
    where
        Pre: FnMut(&Value, Ancestry<'_, '_>) -> bool,
        Post: FnMut(&Value, Ancestry<'_, '_>) -> bool,
    {
        walk(self, KeyMode::Visit, |v, anc, pre| {
            if pre { prefix(v, anc) } else { postfix(v, anc) }
        });
    }

    /// Like [`traverse`](Self::traverse) with a single predicate called
    /// twice per node; `prefix` is `true` for the pre-order visit.
    pub fn traverse_with<P>(&self, predicate: P)
    where
        P: FnMut(&Value, Ancestry<'_, '_>, bool) -> bool,
    {
        walk(self, KeyMode::Visit, predicate);
    }

    /// Visit every node except object keys, prefix then postfix.
    pub fn value_traverse<Pre, Post>(&self, mut prefix: Pre, mut postfix: Post)
    where
        Pre: FnMut(&Value, Ancestry<'_, '_>) -> bool,
        Post: FnMut(&Value, Ancestry<'_, '_>) -> bool,
    {
        walk(self, KeyMode::Skip, |v, anc, pre| {
            if pre { prefix(v, anc) } else { postfix(v, anc) }
        });
    }

    /// Like [`value_traverse`](Self::value_traverse) with a single
    /// predicate; `prefix` is `true` for the pre-order visit.
    pub fn value_traverse_with<P>(&self, predicate: P)
    where
        P: FnMut(&Value, Ancestry<'_, '_>, bool) -> bool,
    {
        walk(self, KeyMode::Skip, predicate);
    }

    /// Pre-order walk over every node, keys included.
    pub fn prefix_traverse<Pre>(&self, prefix: Pre)
    where
        Pre: FnMut(&Value, Ancestry<'_, '_>) -> bool,
    {
        self.traverse(prefix, |_, _| true);
    }

    /// Post-order walk over every node, keys included.
    pub fn postfix_traverse<Post>(&self, postfix: Post)
    where
        Post: FnMut(&Value, Ancestry<'_, '_>) -> bool,
    {
        self.traverse(|_, _| true, postfix);
    }

    /// Walk two trees in lockstep.
    ///
    /// When the shapes diverge one side of a pair is `None`; both sides are
    /// never `None` in a prefix call.
    pub fn parallel_traverse<Pre, Post>(&self, other: &Value, mut prefix: Pre, mut postfix: Post)
    where
        Pre: FnMut(Option<&Value>, Option<&Value>, Ancestry<'_, '_>, Ancestry<'_, '_>) -> bool,
        Post: FnMut(Option<&Value>, Option<&Value>, Ancestry<'_, '_>, Ancestry<'_, '_>) -> bool,
    {
        let mut refs: Vec<TraversalFrame<'_>> = Vec::new();
        let mut other_refs: Vec<TraversalFrame<'_>> = Vec::new();
        let mut p = Some(self);
        let mut q = Some(other);

        while !refs.is_empty() || !other_refs.is_empty() || p.is_some() || q.is_some() {
            if p.is_some() || q.is_some() {
                if !prefix(p, q, Ancestry(&refs), Ancestry(&other_refs)) {
                    return;
                }
                if let Some(node) = p.take() {
                    p = push_frame(&mut refs, node, KeyMode::Visit);
                }
                if let Some(node) = q.take() {
                    q = push_frame(&mut other_refs, node, KeyMode::Visit);
                }
            } else {
                if let Some(top) = refs.last_mut() {
                    p = advance(top, KeyMode::Visit);
                }
                if let Some(top) = other_refs.last_mut() {
                    q = advance(top, KeyMode::Visit);
                }
                if p.is_none() && q.is_none() {
                    let left = refs.pop();
                    let right = other_refs.pop();
                    if !postfix(
                        left.map(|f| f.value),
                        right.map(|f| f.value),
                        Ancestry(&refs),
                        Ancestry(&other_refs),
                    ) {
                        return;
                    }
                }
            }
        }
    }

    /// Lockstep walk that aligns structurally similar objects.
    ///
    /// When the two walks are both positioned on object keys and the keys
    /// differ, the side with the larger key is *frozen* — it delivers
    /// `None` while the smaller side's whole entry (key, then value
    /// subtree) is walked — then the keys are compared again. Entries
    /// present on only one side therefore pair with `None`, and entries
    /// with equal keys pair up even when earlier keys diverged.
    pub fn parallel_diff_traverse<Pre, Post>(
        &self,
        other: &Value,
        mut prefix: Pre,
        mut postfix: Post,
    ) where
        Pre: FnMut(Option<&Value>, Option<&Value>, Ancestry<'_, '_>, Ancestry<'_, '_>) -> bool,
        Post: FnMut(Option<&Value>, Option<&Value>, Ancestry<'_, '_>, Ancestry<'_, '_>) -> bool,
    {
        let mut refs: Vec<TraversalFrame<'_>> = Vec::new();
        let mut other_refs: Vec<TraversalFrame<'_>> = Vec::new();
        let mut p = Some(self);
        let mut q = Some(other);

        while !refs.is_empty() || !other_refs.is_empty() || p.is_some() || q.is_some() {
            if p.is_some() || q.is_some() {
                if !prefix(p, q, Ancestry(&refs), Ancestry(&other_refs)) {
                    return;
                }
                if let Some(node) = p.take() {
                    push_frame_unfetched(&mut refs, node);
                }
                if let Some(node) = q.take() {
                    push_frame_unfetched(&mut other_refs, node);
                }
            } else {
                arbitrate_freeze(&mut refs, &mut other_refs);

                let left_frozen = refs.last().is_some_and(|f| f.frozen);
                let right_frozen = other_refs.last().is_some_and(|f| f.frozen);

                if !left_frozen {
                    if let Some(top) = refs.last_mut() {
                        p = advance(top, KeyMode::Visit);
                    }
                }
                if !right_frozen {
                    if let Some(top) = other_refs.last_mut() {
                        q = advance(top, KeyMode::Visit);
                    }
                }

                if p.is_none() && q.is_none() {
                    let left = if left_frozen { None } else { refs.pop() };
                    let right = if right_frozen { None } else { other_refs.pop() };
                    if left.is_none() && right.is_none() {
                        // Both sides frozen cannot happen through key
                        // arbitration; thaw defensively rather than
                        // livelock.
                        debug_assert!(false, "both diff sides frozen");
                        if let Some(f) = refs.last_mut() {
                            f.frozen = false;
                        }
                        if let Some(f) = other_refs.last_mut() {
                            f.frozen = false;
                        }
                        continue;
                    }
                    if !postfix(
                        left.map(|f| f.value),
                        right.map(|f| f.value),
                        Ancestry(&refs),
                        Ancestry(&other_refs),
                    ) {
                        return;
                    }
                }
            }
        }
    }
}

/// What the top frame of one side would deliver next.
enum Pending<'a> {
    /// An object key not yet visited.
    Key(&'a Value),
    /// An object value or array element.
    Other,
    /// Frame exhausted (or a scalar frame).
    Exhausted,
    /// No frame at all.
    Nothing,
}

fn pending<'a>(refs: &[TraversalFrame<'a>]) -> Pending<'a> {
    let Some(top) = refs.last() else {
        return Pending::Nothing;
    };
    if top.is_object() {
        if top.traversed_key_already {
            Pending::Other
        } else {
            match top.object_key() {
                Some(key) => Pending::Key(key),
                None => Pending::Exhausted,
            }
        }
    } else if top.is_array() {
        Pending::Other
    } else {
        Pending::Exhausted
    }
}

/// Whether the partner side has returned to the depth where a freeze was
/// decided and finished the entry it was working on (its next fetch is a
/// key, or its container is exhausted).
fn partner_done(partner: &[TraversalFrame<'_>], depth: usize) -> bool {
    if partner.len() < depth {
        return true;
    }
    partner.len() == depth && !matches!(pending(partner), Pending::Other)
}

/// Thaw stale freezes and arbitrate a fresh one when both sides are about
/// to deliver object keys.
fn arbitrate_freeze(refs: &mut Vec<TraversalFrame<'_>>, other_refs: &mut Vec<TraversalFrame<'_>>) {
    if let Some(top) = refs.last() {
        if top.frozen && partner_done(other_refs, top.freeze_partner_depth) {
            refs.last_mut().expect("non-empty").frozen = false;
        }
    }
    if let Some(top) = other_refs.last() {
        if top.frozen && partner_done(refs, top.freeze_partner_depth) {
            other_refs.last_mut().expect("non-empty").frozen = false;
        }
    }

    let left_frozen = refs.last().is_some_and(|f| f.frozen);
    let right_frozen = other_refs.last().is_some_and(|f| f.frozen);
    if left_frozen || right_frozen {
        return;
    }

    if let (Pending::Key(lk), Pending::Key(rk)) = (pending(refs), pending(other_refs)) {
        match cmp_values(lk, rk) {
            Ordering::Less => {
                let depth = refs.len();
                let frame = other_refs.last_mut().expect("non-empty");
                frame.frozen = true;
                frame.freeze_partner_depth = depth;
            }
            Ordering::Greater => {
                let depth = other_refs.len();
                let frame = refs.last_mut().expect("non-empty");
                frame.frozen = true;
                frame.freeze_partner_depth = depth;
            }
            Ordering::Equal => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn label(v: &Value) -> String {
        format!("{v:?}")
    }

    #[test]
    fn prefix_postfix_order() {
        let v = value!({"a": [1, 2], "b": 3});
        let mut pre = Vec::new();
        let mut post = Vec::new();
        v.traverse(
            |n, _| {
                pre.push(label(n));
                true
            },
            |n, _| {
                post.push(label(n));
                true
            },
        );
        // Keys before values, entries in key order.
        assert_eq!(pre, ["{\"a\": [1, 2], \"b\": 3}", "\"a\"", "[1, 2]", "1", "2", "\"b\"", "3"]);
        assert_eq!(post, ["\"a\"", "1", "2", "[1, 2]", "\"b\"", "3", "{\"a\": [1, 2], \"b\": 3}"]);
    }

    #[test]
    fn value_traverse_skips_keys() {
        let v = value!({"a": 1, "b": {"c": 2}});
        let mut seen = Vec::new();
        v.value_traverse(
            |n, _| {
                seen.push(label(n));
                true
            },
            |_, _| true,
        );
        assert_eq!(seen, ["{\"a\": 1, \"b\": {\"c\": 2}}", "1", "{\"c\": 2}", "2"]);
    }

    #[test]
    fn single_predicate_sees_both_phases() {
        let v = value!([1]);
        let mut calls = Vec::new();
        v.traverse_with(|n, _, prefix| {
            calls.push((label(n), prefix));
            true
        });
        assert_eq!(
            calls,
            [
                ("[1]".to_owned(), true),
                ("1".to_owned(), true),
                ("1".to_owned(), false),
                ("[1]".to_owned(), false),
            ]
        );
    }

    #[test]
    fn returning_false_aborts() {
        let v = value!([1, 2, 3]);
        let mut count = 0;
        v.prefix_traverse(|_, _| {
            count += 1;
            count < 3
        });
        assert_eq!(count, 3);
    }

    #[test]
    fn ancestry_reports_parents() {
        let v = value!({"outer": [42]});
        let mut deepest = 0;
        v.prefix_traverse(|n, anc| {
            if n.is_int() || n.is_uint() {
                deepest = anc.parent_count();
                assert!(anc.parent().unwrap().value().is_array());
                let chain: Vec<_> = anc.iter().collect();
                assert_eq!(chain.len(), 2);
            }
            true
        });
        // Array frame + object frame.
        assert_eq!(deepest, 2);
    }

    #[test]
    fn deep_traversal_does_not_overflow() {
        let mut v = Value::int(0);
        for _ in 0..500_000 {
            let mut wrap = Value::array(crate::Array::new());
            wrap.push_back(v);
            v = wrap;
        }
        let mut nodes = 0usize;
        v.prefix_traverse(|_, _| {
            nodes += 1;
            true
        });
        assert_eq!(nodes, 500_001);
    }

    #[test]
    fn parallel_traverse_pairs_by_position() {
        let a = value!([1, 2, 3]);
        let b = value!([1, 2]);
        let mut pairs = Vec::new();
        a.parallel_traverse(
            &b,
            |x, y, _, _| {
                pairs.push((x.map(label), y.map(label)));
                true
            },
            |_, _, _, _| true,
        );
        assert_eq!(
            pairs,
            [
                (Some("[1, 2, 3]".into()), Some("[1, 2]".into())),
                (Some("1".into()), Some("1".into())),
                (Some("2".into()), Some("2".into())),
                (Some("3".into()), None),
            ]
        );
    }

    #[test]
    fn diff_traverse_aligns_object_keys() {
        let a = value!({"a": 1, "c": 3});
        let b = value!({"b": 2, "c": 4});
        let mut pairs = Vec::new();
        a.parallel_diff_traverse(
            &b,
            |x, y, _, _| {
                pairs.push((x.map(label), y.map(label)));
                true
            },
            |_, _, _, _| true,
        );
        assert_eq!(
            pairs,
            [
                (
                    Some("{\"a\": 1, \"c\": 3}".into()),
                    Some("{\"b\": 2, \"c\": 4}".into())
                ),
                (Some("\"a\"".into()), None),
                (Some("1".into()), None),
                (None, Some("\"b\"".into())),
                (None, Some("2".into())),
                (Some("\"c\"".into()), Some("\"c\"".into())),
                (Some("3".into()), Some("4".into())),
            ]
        );
    }

    #[test]
    fn diff_traverse_walks_nested_values_one_sided() {
        let a = value!({"only": {"x": [1, 2]}, "shared": 0});
        let b = value!({"shared": 0});
        let mut one_sided = 0;
        let mut both = 0;
        a.parallel_diff_traverse(
            &b,
            |x, y, _, _| {
                match (x, y) {
                    (Some(_), None) | (None, Some(_)) => one_sided += 1,
                    (Some(_), Some(_)) => both += 1,
                    (None, None) => unreachable!("both sides missing"),
                }
                true
            },
            |_, _, _, _| true,
        );
        // "only" key, its object value, nested key "x", array, 1, 2.
        assert_eq!(one_sided, 6);
        // Root pair, "shared" keys, the 0 values.
        assert_eq!(both, 3);
    }

    #[test]
    fn diff_traverse_trailing_keys_drain() {
        let a = value!({"a": 1});
        let b = value!({"a": 1, "z": 9});
        let mut pairs = Vec::new();
        a.parallel_diff_traverse(
            &b,
            |x, y, _, _| {
                pairs.push((x.map(label), y.map(label)));
                true
            },
            |_, _, _, _| true,
        );
        assert_eq!(
            pairs,
            [
                (Some("{\"a\": 1}".into()), Some("{\"a\": 1, \"z\": 9}".into())),
                (Some("\"a\"".into()), Some("\"a\"".into())),
                (Some("1".into()), Some("1".into())),
                (None, Some("\"z\"".into())),
                (None, Some("9".into())),
            ]
        );
    }

    #[test]
    fn diff_traverse_postfix_never_pairs_two_nones() {
        let a = value!({"m": [1], "n": 2});
        let b = value!({"n": 2, "o": [3, 4]});
        a.parallel_diff_traverse(
            &b,
            |_, _, _, _| true,
            |x, y, _, _| {
                assert!(x.is_some() || y.is_some());
                true
            },
        );
    }
}
