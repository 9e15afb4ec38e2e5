use objcgen_abi::{Constant, FieldType, Global, Linkage, PlaceholderId};

use crate::error::EmitError;
use crate::ledger::{Ledger, PlaceholderKind, UseSite};
use crate::symbols::{GlobalId, Namespace};

fn holder(ns: &mut Namespace, name: &str, init: Constant) -> GlobalId {
    let ty = FieldType::array(FieldType::Ptr, 2);
    ns.define(Global::define(name, Linkage::Internal, ty, init)).unwrap()
}

fn init_of(ns: &Namespace, id: GlobalId) -> &Constant {
    ns.global(id).init.as_ref().unwrap()
}

#[test]
fn resolve_rewrites_every_use_site() {
    let mut ns = Namespace::new();
    let mut ledger = Ledger::new();
    let id = ledger.create(PlaceholderKind::Class, "Foo");

    let a = holder(&mut ns, "a", Constant::Array(vec![Constant::Placeholder(id), Constant::Null]));
    let b = holder(&mut ns, "b", Constant::Array(vec![Constant::Null, Constant::Placeholder(id)]));
    ledger.record_use(id, UseSite { global: a, path: vec![0] }, &mut ns).unwrap();
    ledger.record_use(id, UseSite { global: b, path: vec![1] }, &mut ns).unwrap();

    let patched = ledger
        .resolve(id, Constant::symbol("_OBJC_CLASS_Foo"), &mut ns)
        .unwrap();

    assert_eq!(patched, 2);
    assert!(ledger.is_resolved(id));
    assert_eq!(init_of(&ns, a).to_string(), "[@_OBJC_CLASS_Foo, null]");
    assert_eq!(init_of(&ns, b).to_string(), "[null, @_OBJC_CLASS_Foo]");
}

#[test]
fn late_use_is_patched_immediately() {
    let mut ns = Namespace::new();
    let mut ledger = Ledger::new();
    let id = ledger.create(PlaceholderKind::IvarOffset, "Foo.x");
    ledger.resolve(id, Constant::Int(24), &mut ns).unwrap();

    let g = holder(&mut ns, "g", Constant::Array(vec![Constant::Placeholder(id), Constant::Null]));
    ledger.record_use(id, UseSite { global: g, path: vec![0] }, &mut ns).unwrap();

    assert_eq!(init_of(&ns, g).to_string(), "[24, null]");
}

#[test]
fn resolve_twice_fails() {
    let mut ns = Namespace::new();
    let mut ledger = Ledger::new();
    let id = ledger.create(PlaceholderKind::Selector, "foo");

    ledger.resolve(id, Constant::Int(1), &mut ns).unwrap();
    let err = ledger.resolve(id, Constant::Int(2), &mut ns).unwrap_err();

    assert_eq!(err, EmitError::PlaceholderResolvedTwice(id));
    assert_eq!(err.to_string(), "forward reference ?0 resolved twice");
}

#[test]
fn unknown_placeholder() {
    let mut ns = Namespace::new();
    let mut ledger = Ledger::new();
    let bogus = PlaceholderId(7);

    let err = ledger.resolve(bogus, Constant::Null, &mut ns).unwrap_err();

    assert_eq!(err, EmitError::UnknownPlaceholder(bogus));
    assert_eq!(ledger.kind(bogus), None);
}

#[test]
fn ensure_resolved_names_first_pending() {
    let mut ns = Namespace::new();
    let mut ledger = Ledger::new();
    let sel = ledger.create(PlaceholderKind::Selector, "init");
    ledger.create(PlaceholderKind::IvarOffset, "Foo.x");
    ledger.create(PlaceholderKind::Class, "Bar");
    ledger.resolve(sel, Constant::Null, &mut ns).unwrap();

    let outstanding: Vec<_> = ledger.outstanding().map(|(_, kind, name)| (kind, name)).collect();
    assert_eq!(
        outstanding,
        [(PlaceholderKind::IvarOffset, "Foo.x"), (PlaceholderKind::Class, "Bar")]
    );

    let err = ledger.ensure_resolved().unwrap_err();
    assert_eq!(err.to_string(), "unresolved ivar offset reference: Foo.x");
}

#[test]
fn ensure_resolved_when_empty() {
    let ledger = Ledger::new();

    assert!(ledger.is_empty());
    assert!(ledger.ensure_resolved().is_ok());
}
