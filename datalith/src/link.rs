//! Link management.
//!
//! Links point at values living in shared cells ([`ValueCell`]). Ownership
//! is carried by the link's hold rather than by a runtime tag check: a
//! strong link holds the cell handle (destroying the link releases the
//! target), a weak link holds only a non-owning reference. The
//! [`Subtype::STRONG_LINK`] tag is kept in sync by this API for
//! introspection; re-tagging a link via `set_subtype` does not move
//! ownership.
//!
//! Strong-owner uniqueness: each cell records the *tether* of the link
//! currently claiming it. Installing a strong link over an already-claimed
//! target empties the previous tether, so at most one link owns a target
//! at a time and a cascade delete runs exactly once.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::mem;
use std::rc::{Rc, Weak};

use crate::subtype::Subtype;
use crate::value::{Kind, Payload, Value};

/// The slot a strong link stores its cell handle in. Shared with the
/// target's owner record so a newer claim can release an older one.
type Tether = RefCell<Option<ValueCell>>;

pub(crate) struct CellInner {
    value: RefCell<Value>,
    /// The tether of the strong link currently claiming this cell, if any.
    owner: RefCell<Weak<Tether>>,
}

/// A shared, linkable cell holding a [`Value`].
///
/// Cells are single-threaded shared handles (`Rc`); cloning a cell clones
/// the handle, not the value.
pub struct ValueCell(pub(crate) Rc<CellInner>);

impl ValueCell {
    /// Put a value into a fresh cell.
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueCell(Rc::new(CellInner {
            value: RefCell::new(value),
            owner: RefCell::new(Weak::new()),
        }))
    }

    /// Borrow the cell's value.
    ///
    /// Panics if the value is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Value> {
        self.0.value.borrow()
    }

    /// Mutably borrow the cell's value.
    ///
    /// Panics if the value is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Value> {
        self.0.value.borrow_mut()
    }

    /// Whether two handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &ValueCell) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether some strong link currently claims this cell.
    #[must_use]
    pub fn is_strongly_owned(&self) -> bool {
        self.0
            .owner
            .borrow()
            .upgrade()
            .is_some_and(|tether| tether.borrow().is_some())
    }

    /// Recover the value if this is the last handle to the cell.
    pub fn try_into_inner(self) -> Result<Value, ValueCell> {
        match Rc::try_unwrap(self.0) {
            Ok(inner) => Ok(inner.value.into_inner()),
            Err(rc) => Err(ValueCell(rc)),
        }
    }

    fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Clone for ValueCell {
    fn clone(&self) -> Self {
        ValueCell(Rc::clone(&self.0))
    }
}

impl core::fmt::Debug for ValueCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0.value.try_borrow() {
            Ok(v) => write!(f, "ValueCell({v:?})"),
            Err(_) => f.write_str("ValueCell(<borrowed>)"),
        }
    }
}

enum Hold {
    Weak,
    Strong(Rc<Tether>),
}

/// The payload of a link value.
pub struct Link {
    hold: Hold,
    target: Weak<CellInner>,
}

impl Link {
    /// A link pointing at nothing; the default payload of the link kind.
    pub(crate) fn dangling() -> Self {
        Link {
            hold: Hold::Weak,
            target: Weak::new(),
        }
    }

    /// Whether this link currently owns its target.
    #[must_use]
    pub fn is_strong(&self) -> bool {
        matches!(&self.hold, Hold::Strong(tether) if tether.borrow().is_some())
    }

    /// The target cell, if it is still alive.
    #[must_use]
    pub fn target(&self) -> Option<ValueCell> {
        if let Hold::Strong(tether) = &self.hold {
            if let Some(cell) = tether.borrow().as_ref() {
                return Some(cell.clone());
            }
        }
        self.target.upgrade().map(ValueCell)
    }

    /// Strong links sort after weak links to the same target; links to
    /// different targets sort by cell identity.
    pub(crate) fn order_key(&self) -> (usize, u8) {
        let addr = self
            .target()
            .map(|cell| cell.address())
            .unwrap_or_default();
        (addr, u8::from(self.is_strong()))
    }

    /// Whether dropping this link would be the final release of its
    /// target.
    pub(crate) fn holds_unique_target(&self) -> bool {
        match &self.hold {
            Hold::Strong(tether) => match tether.borrow().as_ref() {
                Some(cell) => Rc::strong_count(&cell.0) == 1,
                None => false,
            },
            Hold::Weak => false,
        }
    }

    /// Take the owned target value out, if this link is the last holder.
    /// Used by the iterative destructor to drain link chains without
    /// recursion.
    pub(crate) fn take_owned_target(self) -> Option<Value> {
        match self.hold {
            Hold::Strong(tether) => {
                let cell = tether.borrow_mut().take()?;
                cell.try_into_inner().ok()
            }
            Hold::Weak => None,
        }
    }
}

impl Clone for Link {
    /// Cloning a strong link yields a *weak* link to the same target:
    /// strong ownership is never silently duplicated. Use
    /// [`Value::transfer_link_from`] or [`Value::strengthen_link`] to move
    /// or re-take ownership explicitly.
    fn clone(&self) -> Self {
        Link {
            hold: Hold::Weak,
            target: self.target.clone(),
        }
    }
}

impl core::fmt::Debug for Link {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.target().is_some();
        write!(
            f,
            "Link({}, {})",
            if self.is_strong() { "strong" } else { "weak" },
            if alive { "alive" } else { "dead" }
        )
    }
}

/// Register `tether` as the owner of the cell it holds, releasing any
/// previous claim.
fn claim_target(tether: &Rc<Tether>) {
    let guard = tether.borrow();
    let cell = guard.as_ref().expect("claiming an empty tether");
    if let Some(prev) = cell.0.owner.borrow().upgrade() {
        if !Rc::ptr_eq(&prev, tether) {
            // Auto-weaken the previous owner so exactly one strong claim
            // remains.
            prev.borrow_mut().take();
        }
    }
    *cell.0.owner.borrow_mut() = Rc::downgrade(tether);
}

impl Value {
    /// Whether this is a link that currently owns its target.
    #[must_use]
    pub fn is_strong_link(&self) -> bool {
        matches!(&self.payload, Payload::Link(l) if l.is_strong())
    }

    /// Store a non-owning pointer to `target`.
    ///
    /// Destroying this value leaves the target untouched.
    pub fn set_weak_link(&mut self, target: &ValueCell) {
        self.clear(Kind::Link);
        self.payload = Payload::Link(Link {
            hold: Hold::Weak,
            target: Rc::downgrade(&target.0),
        });
        self.subtype = Subtype::NORMAL;
    }

    /// Take ownership of `target`.
    ///
    /// The handle is consumed: once every other handle is gone, destroying
    /// this value destroys the target. If the target already has a strong
    /// owner, that owner's link is weakened first so the target is never
    /// released twice. Linking a cell to itself (installing the link from
    /// inside the cell's own `borrow_mut`) silently decays to a weak link.
    pub fn set_strong_link(&mut self, target: ValueCell) {
        if target.0.value.try_borrow_mut().is_err() {
            // The target is mutably borrowed above us on the call stack,
            // which in single-threaded use means we are linking a value to
            // its own cell. Owning yourself would be self-destruction.
            self.set_weak_link(&target);
            return;
        }
        let weak_target = Rc::downgrade(&target.0);
        let tether: Rc<Tether> = Rc::new(RefCell::new(Some(target)));
        claim_target(&tether);
        self.clear(Kind::Link);
        self.payload = Payload::Link(Link {
            hold: Hold::Strong(tether),
            target: weak_target,
        });
        self.subtype = Subtype::STRONG_LINK;
    }

    /// Release ownership, keeping a weak pointer to the target.
    ///
    /// The caller certifies the transfer: if this link held the last
    /// handle, the target is destroyed and the remaining weak link is
    /// dead. Returns whether anything changed.
    pub fn weaken_link(&mut self) -> bool {
        let Payload::Link(link) = &mut self.payload else {
            return false;
        };
        match mem::replace(&mut link.hold, Hold::Weak) {
            Hold::Strong(tether) => {
                if let Some(cell) = tether.borrow_mut().take() {
                    let registered = cell
                        .0
                        .owner
                        .borrow()
                        .upgrade()
                        .is_some_and(|t| Rc::ptr_eq(&t, &tether));
                    if registered {
                        *cell.0.owner.borrow_mut() = Weak::new();
                    }
                }
                self.subtype = Subtype::NORMAL;
                true
            }
            Hold::Weak => false,
        }
    }

    /// Take ownership of the current weak target.
    ///
    /// The caller certifies the transfer. Any other strong claim on the
    /// target is weakened first. Returns `false` when this is not a link
    /// or the target is gone; a link that is already strong stays strong.
    pub fn strengthen_link(&mut self) -> bool {
        let Payload::Link(link) = &mut self.payload else {
            return false;
        };
        if link.is_strong() {
            return true;
        }
        let Some(inner) = link.target.upgrade() else {
            return false;
        };
        let tether: Rc<Tether> = Rc::new(RefCell::new(Some(ValueCell(inner))));
        claim_target(&tether);
        link.hold = Hold::Strong(tether);
        self.subtype = Subtype::STRONG_LINK;
        true
    }

    /// Move ownership out of `other` if it is a strong link, else copy.
    ///
    /// After a move, `other` is left as a weak link to the same target and
    /// this value owns the target (the owner registration travels with the
    /// tether). A non-link `other` is copied wholesale.
    pub fn transfer_link_from(&mut self, other: &mut Value) {
        if !other.is_link() {
            *self = other.clone();
            return;
        }
        if other.is_strong_link() {
            let Payload::Link(link) = mem::replace(&mut other.payload, Payload::Null) else {
                unreachable!("is_link checked");
            };
            other.payload = Payload::Link(Link {
                hold: Hold::Weak,
                target: link.target.clone(),
            });
            other.subtype = Subtype::NORMAL;
            self.clear(Kind::Link);
            self.payload = Payload::Link(link);
            self.subtype = Subtype::STRONG_LINK;
        } else {
            let copy = other.get_link_unchecked().clone();
            self.clear(Kind::Link);
            self.payload = Payload::Link(copy);
            self.subtype = Subtype::NORMAL;
        }
    }

    /// The link's target cell, one hop. `None` for non-links and dead
    /// targets.
    #[must_use]
    pub fn deref_link(&self) -> Option<ValueCell> {
        match &self.payload {
            Payload::Link(l) => l.target(),
            _ => None,
        }
    }

    /// Follow a chain of *strong* links to the last strongly-held target.
    ///
    /// Stops at the first target that is not itself a strong link. `None`
    /// when this value is not a strong link.
    #[must_use]
    pub fn deref_strong_links(&self) -> Option<ValueCell> {
        if !self.is_strong_link() {
            return None;
        }
        let mut cell = self.deref_link()?;
        let mut seen = HashSet::from([cell.address()]);
        loop {
            let next = {
                let v = cell.borrow();
                if v.is_strong_link() { v.deref_link() } else { None }
            };
            match next {
                Some(n) if seen.insert(n.address()) => cell = n,
                _ => return Some(cell),
            }
        }
    }

    /// Follow at most `depth` link hops.
    ///
    /// `deref_to_depth(1)` is [`deref_link`](Self::deref_link); a depth of
    /// 0 dereferences nothing. Stops early at a non-link target or a
    /// revisited cell.
    #[must_use]
    pub fn deref_to_depth(&self, depth: usize) -> Option<ValueCell> {
        if depth == 0 {
            return None;
        }
        let mut cell = self.deref_link()?;
        let mut seen = HashSet::from([cell.address()]);
        for _ in 1..depth {
            let next = {
                let v = cell.borrow();
                if v.is_link() { v.deref_link() } else { None }
            };
            match next {
                Some(n) if seen.insert(n.address()) => cell = n,
                _ => break,
            }
        }
        Some(cell)
    }

    /// Follow link hops until a non-link value is reached.
    ///
    /// `None` for non-links, dead targets, and cyclic chains; check
    /// [`link_cycle_exists`](Self::link_cycle_exists) first when cycles
    /// are possible.
    #[must_use]
    pub fn deref_all_links(&self) -> Option<ValueCell> {
        let mut cell = self.deref_link()?;
        let mut seen = HashSet::from([cell.address()]);
        loop {
            let next = {
                let v = cell.borrow();
                if v.is_link() { Some(v.deref_link()) } else { None }
            };
            match next {
                // Not a link: chain complete.
                None => return Some(cell),
                // Dead target mid-chain.
                Some(None) => return None,
                Some(Some(n)) => {
                    if !seen.insert(n.address()) {
                        return None;
                    }
                    cell = n;
                }
            }
        }
    }

    /// Number of link hops until a non-link value.
    ///
    /// Counts the acyclic prefix; always terminates, even on cyclic
    /// chains.
    #[must_use]
    pub fn link_depth(&self) -> usize {
        let Some(mut cell) = self.deref_link() else {
            return 0;
        };
        let mut seen = HashSet::from([cell.address()]);
        let mut depth = 1;
        loop {
            let next = {
                let v = cell.borrow();
                if v.is_link() { v.deref_link() } else { None }
            };
            match next {
                Some(n) if seen.insert(n.address()) => {
                    depth += 1;
                    cell = n;
                }
                _ => return depth,
            }
        }
    }

    /// Whether the link chain starting here revisits a cell.
    #[must_use]
    pub fn link_cycle_exists(&self) -> bool {
        let Some(mut cell) = self.deref_link() else {
            return false;
        };
        let mut seen = HashSet::from([cell.address()]);
        loop {
            let next = {
                let v = cell.borrow();
                if v.is_link() { v.deref_link() } else { None }
            };
            match next {
                Some(n) => {
                    if !seen.insert(n.address()) {
                        return true;
                    }
                    cell = n;
                }
                None => return false,
            }
        }
    }
}

#[cfg(feature = "attributes")]
impl Value {
    /// The reserved attribute key links store their names under.
    fn link_name_key() -> Value {
        Value::null()
    }

    /// Name this link locally (stored in the link's own attributes).
    ///
    /// Returns `false` when this value is not a link.
    pub fn set_local_link_name(&mut self, name: Value) -> bool {
        if !self.is_link() {
            return false;
        }
        *self.attribute(Self::link_name_key()) = name;
        true
    }

    /// Name this link globally (stored in the target's attributes).
    ///
    /// Returns `false` when this value is not a link or the target is
    /// gone.
    pub fn set_global_link_name(&mut self, name: Value) -> bool {
        let Some(cell) = self.deref_link() else {
            return false;
        };
        *cell.borrow_mut().attribute(Self::link_name_key()) = name;
        true
    }

    /// The link's name: the target's global name when present, else the
    /// local one.
    #[must_use]
    pub fn link_name(&self) -> Option<Value> {
        if !self.is_link() {
            return None;
        }
        if let Some(cell) = self.deref_link() {
            let global = cell.borrow().attribute_ptr(&Self::link_name_key()).cloned();
            if let Some(name) = global {
                if !name.is_null() {
                    return Some(name);
                }
            }
        }
        self.attribute_ptr(&Self::link_name_key())
            .filter(|name| !name.is_null())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_link_does_not_own() {
        let x = ValueCell::new(Value::int(7));
        let observer = Rc::downgrade(&x.0);
        let mut r = Value::null();
        r.set_weak_link(&x);
        assert!(r.is_link());
        assert!(!r.is_strong_link());
        assert_eq!(r.get_subtype(), Subtype::NORMAL);
        drop(r);
        assert!(observer.upgrade().is_some());
        assert_eq!(x.borrow().get_int_unchecked(), 7);
    }

    #[test]
    fn strong_link_cascades_destruction() {
        let x = ValueCell::new(Value::int(7));
        let observer = Rc::downgrade(&x.0);
        let mut r = Value::null();
        r.set_strong_link(x);
        assert!(r.is_strong_link());
        assert_eq!(r.get_subtype(), Subtype::STRONG_LINK);
        drop(r);
        assert!(observer.upgrade().is_none(), "target should be destroyed");
    }

    #[test]
    fn relinking_releases_previous_target() {
        let x = ValueCell::new(Value::int(1));
        let y = ValueCell::new(Value::int(2));
        let x_obs = Rc::downgrade(&x.0);
        let y_obs = Rc::downgrade(&y.0);

        let mut a = Value::null();
        a.set_strong_link(x);
        a.set_strong_link(y);
        // The first target is released exactly once; the second is owned.
        assert!(x_obs.upgrade().is_none());
        assert!(y_obs.upgrade().is_some());
        drop(a);
        assert!(y_obs.upgrade().is_none());
    }

    #[test]
    fn second_claim_weakens_first_owner() {
        let x = ValueCell::new(Value::int(1));
        let mut a = Value::null();
        let mut b = Value::null();
        a.set_strong_link(x.clone());
        assert!(a.is_strong_link());
        b.set_strong_link(x.clone());
        assert!(b.is_strong_link());
        assert!(!a.is_strong_link(), "previous owner auto-weakened");
        assert!(x.is_strongly_owned());
        // `a` still dereferences the shared target.
        assert_eq!(a.deref_link().unwrap().borrow().get_int_unchecked(), 1);
    }

    #[test]
    fn self_link_decays_to_weak() {
        let cell = ValueCell::new(Value::null());
        {
            let target = cell.clone();
            let mut inner = cell.borrow_mut();
            inner.set_strong_link(target);
            assert!(inner.is_link());
            assert!(!inner.is_strong_link());
        }
        // No ownership cycle: dropping the last handle frees the cell.
        let observer = Rc::downgrade(&cell.0);
        drop(cell);
        assert!(observer.upgrade().is_none());
    }

    #[test]
    fn weaken_and_strengthen_round_trip() {
        let x = ValueCell::new(Value::int(3));
        let keeper = x.clone();
        let mut a = Value::null();
        a.set_strong_link(x);
        assert!(a.weaken_link());
        assert!(!a.is_strong_link());
        assert!(!keeper.is_strongly_owned());
        assert!(a.strengthen_link());
        assert!(a.is_strong_link());
        assert!(keeper.is_strongly_owned());
    }

    #[test]
    fn transfer_moves_ownership() {
        let x = ValueCell::new(Value::int(4));
        let observer = Rc::downgrade(&x.0);
        let mut src = Value::null();
        src.set_strong_link(x);
        let mut dst = Value::null();
        dst.transfer_link_from(&mut src);
        assert!(dst.is_strong_link());
        assert!(src.is_link() && !src.is_strong_link());
        drop(src);
        assert!(observer.upgrade().is_some(), "weak leftover must not free");
        drop(dst);
        assert!(observer.upgrade().is_none());
    }

    #[test]
    fn chains_depth_and_deref() {
        let end = ValueCell::new(Value::string("end"));
        let mut mid_value = Value::null();
        mid_value.set_weak_link(&end);
        let mid = ValueCell::new(mid_value);

        let mut head = Value::null();
        head.set_weak_link(&mid);

        assert_eq!(head.link_depth(), 2);
        assert!(!head.link_cycle_exists());
        assert!(head.deref_link().unwrap().ptr_eq(&mid));
        assert!(head.deref_to_depth(1).unwrap().ptr_eq(&mid));
        assert!(head.deref_to_depth(2).unwrap().ptr_eq(&end));
        assert!(head.deref_all_links().unwrap().ptr_eq(&end));
        assert_eq!(
            head.deref_all_links()
                .unwrap()
                .borrow()
                .get_string_unchecked(),
            b"end"
        );
    }

    #[test]
    fn cycle_detection() {
        let a = ValueCell::new(Value::null());
        let b = ValueCell::new(Value::null());
        a.borrow_mut().set_weak_link(&b);
        b.borrow_mut().set_weak_link(&a);

        let mut probe = Value::null();
        probe.set_weak_link(&a);
        assert!(probe.link_cycle_exists());
        // Guaranteed to terminate; reports the acyclic prefix.
        assert!(probe.link_depth() >= 2);
        assert!(probe.deref_all_links().is_none());
    }

    #[test]
    fn strong_chain_drops_iteratively() {
        // A long chain of strong links must be released without recursion.
        let mut cell = ValueCell::new(Value::int(0));
        for _ in 0..100_000 {
            let mut link = Value::null();
            link.set_strong_link(cell);
            cell = ValueCell::new(link);
        }
        drop(cell);
    }

    #[cfg(feature = "attributes")]
    #[test]
    fn global_name_beats_local() {
        let target = ValueCell::new(Value::int(1));
        let mut link = Value::null();
        link.set_weak_link(&target);
        assert!(link.link_name().is_none());

        link.set_local_link_name(Value::from("local"));
        assert_eq!(link.link_name().unwrap().as_str(), Some("local"));

        link.set_global_link_name(Value::from("global"));
        assert_eq!(link.link_name().unwrap().as_str(), Some("global"));
    }
}
