//! End-to-end flows across the value model, links, and the stream
//! protocol.

use datalith::{Kind, Subtype, Value, ValueBuilder, ValueCell, value, write_value};

#[test]
fn null_becomes_object_on_member_access() {
    let mut a = Value::null();
    *a.member("k") = Value::from(42u64);

    assert!(a.is_object());
    assert_eq!(a.member_count(&Value::from("k")), 1);
    assert_eq!(a["k"].as_int(), 42);
}

#[test]
fn clear_is_idempotent() {
    let mut v = value!({"a": 1});
    v.clear(Kind::Array);
    let after_first = format!("{v:?}");
    let subtype_after_first = v.get_subtype();

    v.clear(Kind::Array);
    assert_eq!(format!("{v:?}"), after_first);
    assert_eq!(v.get_subtype(), subtype_after_first);
}

#[test]
fn ownership_transfers_through_strong_link() {
    // Strong: dropping the holder destroys the target.
    let x = ValueCell::new(Value::int(7));
    let mut watcher = Value::null();
    watcher.set_weak_link(&x);

    let mut r = Value::null();
    r.set_strong_link(x); // consumes the only outside handle
    assert!(watcher.deref_link().is_some());
    drop(r);
    assert!(
        watcher.deref_link().is_none(),
        "dropping the strong holder destroys the target"
    );

    // Weak: the target outlives the holder.
    let x = ValueCell::new(Value::int(7));
    let mut r = Value::null();
    r.set_weak_link(&x);
    drop(r);
    assert_eq!(x.borrow().get_int_unchecked(), 7);
}

#[test]
fn reassigning_strong_links_is_safe() {
    // Repeated reassignment must neither leak nor double-release,
    // whether or not the old target is reachable from the new one.
    let x = ValueCell::new(Value::string("first"));
    let mut y_value = Value::null();
    y_value.set_weak_link(&x);
    let y = ValueCell::new(y_value);

    let mut a = Value::null();
    a.set_strong_link(x);
    a.set_strong_link(y.clone());
    assert!(a.is_strong_link());
    // The first target was released; the weak link inside `y` is dead.
    assert!(y.borrow().deref_link().is_none());
}

#[test]
fn cycle_checks_gate_full_dereference() {
    let a = ValueCell::new(Value::null());
    let b = ValueCell::new(Value::null());
    a.borrow_mut().set_weak_link(&b);
    b.borrow_mut().set_weak_link(&a);

    let mut probe = Value::null();
    probe.set_weak_link(&a);
    assert!(probe.link_cycle_exists());
    assert!(probe.link_depth() >= 2);

    let mut acyclic = Value::null();
    let end = ValueCell::new(Value::boolean(true));
    acyclic.set_weak_link(&end);
    assert!(!acyclic.link_cycle_exists());
    assert!(acyclic.deref_all_links().unwrap().ptr_eq(&end));
}

#[test]
fn subtype_travels_through_the_stream() {
    let mut doc = Value::null();
    *doc.member("id") = Value::string("a1b2").with_subtype(Subtype::UUID);
    *doc.member("when") = Value::int(1_700_000_000).with_subtype(Subtype::UNIX_TIMESTAMP);
    *doc.member("payload") = Value::blob(vec![0x00, 0xff]);

    let mut builder = ValueBuilder::new();
    write_value(&doc, &mut builder).unwrap();
    let copy = builder.value().unwrap();

    assert_eq!(copy, doc);
    assert_eq!(copy["id"].get_subtype(), Subtype::UUID);
    assert_eq!(copy["when"].get_subtype(), Subtype::UNIX_TIMESTAMP);
    assert_eq!(copy["payload"].get_subtype(), Subtype::BLOB);
}

#[test]
fn duplicate_keys_round_trip_the_stream() {
    let mut doc = Value::null();
    doc.add_member_at_end(Value::from("k"));
    doc.insert_member_at_end(Value::from("k"), Value::int(2));
    assert_eq!(doc.member_count(&Value::from("k")), 2);

    let mut builder = ValueBuilder::new();
    write_value(&doc, &mut builder).unwrap();
    assert_eq!(builder.value().unwrap(), doc);
}
