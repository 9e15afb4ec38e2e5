use objcgen_abi::{Constant, FieldType, Global, Linkage};
use objcgen_core::Interner;

use crate::aggregator::{ModuleAggregator, constant_string_symbol};
use crate::class_pair::{ClassPair, generate_pair};
use crate::config::{EmitConfig, GcMode};
use crate::descriptor::ClassDescriptor;
use crate::error::EmitError;
use crate::ledger::{Ledger, PlaceholderKind, UseSite};
use crate::symbols::Namespace;

fn init<'a>(ns: &'a Namespace, name: &str) -> &'a Constant {
    let (id, _) = ns.lookup(name).unwrap();
    ns.global(id).init.as_ref().unwrap()
}

#[test]
fn empty_until_something_recorded() {
    let mut agg = ModuleAggregator::new();
    assert!(agg.is_empty());

    agg.note_protocol("NSCopying");

    assert!(!agg.is_empty());
}

#[test]
fn orphan_protocols_go_to_holder_category() {
    let mut ns = Namespace::new();
    let mut agg = ModuleAggregator::new();
    agg.note_protocol("Referenced");
    agg.note_protocol("Adopted");
    agg.note_attached(&["Adopted".to_string()]);

    let holder = agg.emit_protocol_holder(&mut ns).unwrap();

    assert_eq!(holder.as_deref(), Some(".objc_category___ObjC_Protocol_Holder_Ugly_Hack__ObjC_Protocol_Holder_Ugly_Hack"));
    assert_eq!(agg.category_count(), 1);
    assert_eq!(
        init(&ns, ".objc_protocol_list").to_string(),
        "{null, 1, [@.objc_protocol_Referenced]}"
    );
    // Undefined protocols still get a structure to point at.
    assert_eq!(
        init(&ns, ".objc_protocol_Adopted").to_string(),
        r#"{2, c"Adopted", null, null, null}"#
    );
}

#[test]
fn no_holder_when_every_protocol_is_attached() {
    let mut ns = Namespace::new();
    let mut agg = ModuleAggregator::new();
    agg.note_protocol_defined("P");
    agg.note_attached(&["P".to_string()]);

    assert_eq!(agg.emit_protocol_holder(&mut ns).unwrap(), None);
    assert_eq!(agg.category_count(), 0);
    assert!(ns.is_empty());
}

#[test]
fn statics_block() {
    let mut ns = Namespace::new();
    let agg = ModuleAggregator::new();
    let mut strings = Interner::new();
    strings.intern("hello");
    strings.intern("hi");
    strings.intern("hello");

    let statics = agg
        .emit_statics(&mut ns, &strings, &EmitConfig::default())
        .unwrap();

    assert_eq!(statics, Constant::symbol(".objc_statics_ptr"));
    insta::assert_snapshot!(init(&ns, ".objc_str.1").to_string(), @r#"{c"_NSConstantStringClassReference", c"hi", 2}"#);
    insta::assert_snapshot!(init(&ns, ".objc_statics").to_string(), @r#"{c"NSConstantString", [@.objc_str.0, @.objc_str.1, null]}"#);
    assert_eq!(init(&ns, ".objc_statics_ptr").to_string(), "[@.objc_statics, null]");
    assert_eq!(constant_string_symbol(1), ".objc_str.1");
}

#[test]
fn no_statics_without_strings() {
    let mut ns = Namespace::new();
    let agg = ModuleAggregator::new();

    let statics = agg
        .emit_statics(&mut ns, &Interner::new(), &EmitConfig::default())
        .unwrap();

    assert_eq!(statics, Constant::Null);
    assert!(ns.is_empty());
}

#[test]
fn selector_list_backpatches_uses() {
    let mut ns = Namespace::new();
    let mut ledger = Ledger::new();
    let agg = ModuleAggregator::new();
    let mut selectors = Interner::new();
    let mut placeholders = Vec::new();
    for name in ["foo", "bar"] {
        selectors.intern(name);
        placeholders.push(ledger.create(PlaceholderKind::Selector, name));
    }
    let user = ns
        .define(Global::define(
            "refs",
            Linkage::Internal,
            FieldType::array(FieldType::Ptr, 2),
            Constant::Array(vec![
                Constant::Placeholder(placeholders[1]),
                Constant::Placeholder(placeholders[0]),
            ]),
        ))
        .unwrap();
    for (i, &id) in placeholders.iter().enumerate() {
        let site = UseSite { global: user, path: vec![1 - i as u32] };
        ledger.record_use(id, site, &mut ns).unwrap();
    }

    let list = agg
        .emit_selector_list(&mut ns, &mut ledger, &selectors, &placeholders)
        .unwrap();

    assert_eq!(list, ".objc_selector_list");
    assert_eq!(init(&ns, &list).to_string(), r#"[c"foo", c"bar", null]"#);
    assert_eq!(
        init(&ns, "refs").to_string(),
        "[@.objc_selector_list[1], @.objc_selector_list[0]]"
    );
    assert!(ledger.ensure_resolved().is_ok());
}

#[test]
fn module_descriptor_and_symtab() {
    let mut ns = Namespace::new();
    let mut agg = ModuleAggregator::new();
    let config = EmitConfig::default();
    let mut desc = ClassDescriptor::new("Foo");
    desc.instance_size = 8;
    agg.add_class(generate_pair(&mut ns, &config, &desc).unwrap());
    agg.add_category(".objc_category_FooExtras".to_string());

    let module = agg
        .emit_module(&mut ns, &config, "Foo.m", 3, ".objc_selector_list", Constant::Null)
        .unwrap();

    assert_eq!(module, ".objc_module_info");
    insta::assert_snapshot!(
        init(&ns, ".objc_symtab").to_string(),
        @"{3, @.objc_selector_list, 1, 1, [@_OBJC_CLASS_Foo, @.objc_category_FooExtras, null, null]}"
    );
    insta::assert_snapshot!(
        init(&ns, &module).to_string(),
        @r#"{0, 32, c"Foo.m", @.objc_symtab}"#
    );
}

#[test]
fn gc_field_with_newer_runtime() {
    let mut ns = Namespace::new();
    let agg = ModuleAggregator::new();
    let config = EmitConfig {
        runtime_version: 10,
        gc: GcMode::GcOnly,
        ..EmitConfig::default()
    };

    let module = agg
        .emit_module(&mut ns, &config, "a.m", 0, ".objc_selector_list", Constant::Null)
        .unwrap();

    assert_eq!(init(&ns, &module).to_string(), r#"{10, 40, c"a.m", @.objc_symtab, 2}"#);
}

#[test]
fn class_count_must_fit_in_short() {
    let mut ns = Namespace::new();
    let mut agg = ModuleAggregator::new();
    for i in 0..=u16::MAX as usize {
        let name = format!("C{i}");
        agg.add_class(ClassPair {
            class_symbol: format!("_OBJC_CLASS_{name}"),
            metaclass_symbol: format!("_OBJC_METACLASS_{name}"),
            name,
            ivar_offsets: Default::default(),
        });
    }

    let err = agg
        .emit_module(&mut ns, &EmitConfig::default(), "a.m", 0, ".objc_selector_list", Constant::Null)
        .unwrap_err();

    assert_eq!(err, EmitError::TooManyClasses(65536));
    assert!(!ns.contains(".objc_symtab"));
}

#[test]
fn category_count_must_fit_in_short() {
    let mut ns = Namespace::new();
    let mut agg = ModuleAggregator::new();
    for i in 0..=u16::MAX as usize {
        agg.add_category(format!(".objc_category_Foo{i}"));
    }

    let err = agg
        .emit_module(&mut ns, &EmitConfig::default(), "a.m", 0, ".objc_selector_list", Constant::Null)
        .unwrap_err();

    assert_eq!(err, EmitError::TooManyCategories(65536));
    assert_eq!(err.to_string(), "too many categories: 65536 (max 65535)");
}
