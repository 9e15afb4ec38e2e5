use objcgen_abi::{ClassField, ClassSchema, Constant, FieldType, Global, Linkage};

use crate::class_pair::{check_class, generate_pair};
use crate::config::EmitConfig;
use crate::descriptor::{ClassDescriptor, IvarDescriptor, MethodDescriptor, Ownership};
use crate::error::EmitError;
use crate::symbols::{EntryState, Namespace};

fn foo() -> ClassDescriptor {
    let mut desc = ClassDescriptor::new("Foo");
    desc.superclass = Some("NSObject".to_string());
    desc.instance_size = 48;
    desc.super_instance_size = 16;
    desc.ivars = vec![
        IvarDescriptor::new("x", "i", 16),
        IvarDescriptor::new("y", "@", 40),
    ];
    desc.instance_methods = vec![MethodDescriptor::new("bar", "v16@0:8", "_i_Foo__bar")];
    desc.class_methods = vec![MethodDescriptor::new("new", "@16@0:8", "_c_Foo__new")];
    desc
}

fn init<'a>(ns: &'a Namespace, name: &str) -> &'a Constant {
    let (id, _) = ns.lookup(name).unwrap();
    ns.global(id).init.as_ref().unwrap()
}

fn slot(schema: ClassSchema, init: &Constant, field: ClassField) -> Constant {
    let index = schema.index_of(field).unwrap() as u32;
    init.at_path(&[index]).unwrap().clone()
}

#[test]
fn fragile_pair() {
    let mut ns = Namespace::new();
    let config = EmitConfig::default();

    let pair = generate_pair(&mut ns, &config, &foo()).unwrap();

    assert_eq!(pair.class_symbol, "_OBJC_CLASS_Foo");
    assert_eq!(pair.metaclass_symbol, "_OBJC_METACLASS_Foo");
    assert_eq!(pair.ivar_offset("x"), Some(16));
    assert_eq!(pair.ivar_offset("y"), Some(40));
    assert_eq!(pair.ivar_offset("z"), None);

    let class = init(&ns, "_OBJC_CLASS_Foo");
    let schema = ClassSchema::Legacy;
    assert_eq!(slot(schema, class, ClassField::Isa), Constant::symbol("_OBJC_METACLASS_Foo"));
    assert_eq!(slot(schema, class, ClassField::SuperClass), Constant::cstr("NSObject"));
    assert_eq!(slot(schema, class, ClassField::InstanceSize), Constant::Int(48));
    assert_eq!(slot(schema, class, ClassField::Ivars), Constant::symbol(".objc_ivar_list"));
    assert_eq!(slot(schema, class, ClassField::IvarOffsets), Constant::symbol(".objc_ivar_offsets"));

    let meta = init(&ns, "_OBJC_METACLASS_Foo");
    assert_eq!(slot(schema, meta, ClassField::Isa), Constant::Null);
    assert_eq!(slot(schema, meta, ClassField::Methods), Constant::symbol(".objc_method_list"));
    assert_eq!(slot(schema, class, ClassField::Methods), Constant::symbol(".objc_method_list.1"));
}

#[test]
fn published_symbols() {
    let mut ns = Namespace::new();

    generate_pair(&mut ns, &EmitConfig::default(), &foo()).unwrap();

    let linkage = |name: &str| ns.global(ns.lookup(name).unwrap().0).linkage;
    assert_eq!(linkage("_OBJC_CLASS_Foo"), Linkage::External);
    assert_eq!(linkage("_OBJC_METACLASS_Foo"), Linkage::External);
    assert_eq!(linkage("__objc_class_name_Foo"), Linkage::External);
    assert_eq!(linkage("__objc_ivar_offset_value_Foo.y"), Linkage::External);
    assert_eq!(init(&ns, "__objc_ivar_offset_value_Foo.y"), &Constant::Int(40));
    assert_eq!(
        init(&ns, "__objc_ivar_offset_Foo.y").to_string(),
        "@.objc_ivar_list[1][1][2]"
    );
    assert_eq!(init(&ns, "__objc_class_name_Foo"), &Constant::Int(0));
    assert_eq!(
        init(&ns, ".objc_ivar_offsets").to_string(),
        "[@__objc_ivar_offset_value_Foo.x, @__objc_ivar_offset_value_Foo.y]"
    );
}

#[test]
fn non_fragile_pair() {
    let mut ns = Namespace::new();
    let config = EmitConfig::non_fragile();

    let pair = generate_pair(&mut ns, &config, &foo()).unwrap();

    assert_eq!(pair.ivar_offset("x"), Some(0));
    assert_eq!(pair.ivar_offset("y"), Some(24));
    let class = init(&ns, "_OBJC_CLASS_Foo");
    assert_eq!(slot(ClassSchema::Extended, class, ClassField::InstanceSize), Constant::Int(-32));
    assert_eq!(slot(ClassSchema::Extended, class, ClassField::AbiVersion), Constant::Int(1));
    assert_eq!(init(&ns, "__objc_ivar_offset_value_Foo.y"), &Constant::Int(24));
}

#[test]
fn root_class_has_null_superclass() {
    let mut ns = Namespace::new();
    let mut desc = ClassDescriptor::new("Object");
    desc.instance_size = 8;

    generate_pair(&mut ns, &EmitConfig::default(), &desc).unwrap();

    let class = init(&ns, "_OBJC_CLASS_Object");
    assert_eq!(slot(ClassSchema::Legacy, class, ClassField::SuperClass), Constant::Null);
    assert_eq!(slot(ClassSchema::Legacy, class, ClassField::Ivars), Constant::Null);
    assert!(!ns.contains(".objc_ivar_list"));
}

#[test]
fn ownership_bitmaps_on_extended_schema() {
    let mut ns = Namespace::new();
    let mut desc = foo();
    desc.ivars[1].ownership = Ownership::Strong;

    generate_pair(&mut ns, &EmitConfig::non_fragile(), &desc).unwrap();

    let class = init(&ns, "_OBJC_CLASS_Foo");
    assert_eq!(
        slot(ClassSchema::Extended, class, ClassField::StrongIvarBitmap),
        Constant::Int(0b101)
    );
    assert_eq!(slot(ClassSchema::Extended, class, ClassField::WeakIvarBitmap), Constant::Null);
}

#[test]
fn ownership_on_legacy_schema_is_rejected() {
    let mut desc = foo();
    desc.ivars[0].ownership = Ownership::Weak;

    let err = check_class(&desc, &EmitConfig::default()).unwrap_err();

    assert_eq!(
        err.to_string(),
        "class `Foo` uses strong/weak ivar bitmaps, which the configured class schema does not support"
    );
}

#[test]
fn duplicate_class_rejected() {
    let mut ns = Namespace::new();
    let config = EmitConfig::default();
    generate_pair(&mut ns, &config, &foo()).unwrap();

    let err = generate_pair(&mut ns, &config, &foo()).unwrap_err();

    assert_eq!(err, EmitError::DuplicateSymbol("_OBJC_CLASS_Foo".to_string()));
}

#[test]
fn taken_ivar_symbol_rejected_before_any_definition() {
    let mut ns = Namespace::new();
    let config = EmitConfig::default();
    ns.define(Global::define(
        "__objc_ivar_offset_value_Foo.y",
        Linkage::External,
        FieldType::Int,
        Constant::Int(0),
    ))
    .unwrap();

    let err = generate_pair(&mut ns, &config, &foo()).unwrap_err();

    assert_eq!(
        err,
        EmitError::DuplicateSymbol("__objc_ivar_offset_value_Foo.y".to_string())
    );
    assert_eq!(ns.len(), 1);
    assert!(!ns.is_defined("_OBJC_METACLASS_Foo"));

    // Retrying reports the same collision, not the metaclass.
    let again = generate_pair(&mut ns, &config, &foo()).unwrap_err();
    assert_eq!(err, again);
}

#[test]
fn forward_ivar_offset_value_promoted() {
    let mut ns = Namespace::new();
    ns.declare_forward("__objc_ivar_offset_value_Foo.x", FieldType::Int);

    generate_pair(&mut ns, &EmitConfig::default(), &foo()).unwrap();

    let (id, state) = ns.lookup("__objc_ivar_offset_value_Foo.x").unwrap();
    assert_eq!(state, EntryState::Strong);
    assert_eq!(ns.global(id).linkage, Linkage::External);
    assert_eq!(init(&ns, "__objc_ivar_offset_value_Foo.x"), &Constant::Int(16));
    assert_eq!(ns.forward_names().count(), 0);
}

#[test]
fn malformed_descriptors() {
    let config = EmitConfig::non_fragile();

    let mut twice = foo();
    twice.ivars.push(IvarDescriptor::new("x", "i", 44));
    let mut inside = foo();
    inside.ivars[0].offset = 8;
    let mut shrunk = foo();
    shrunk.instance_size = 8;

    let reasons: Vec<_> = [twice, inside, shrunk]
        .iter()
        .map(|d| check_class(d, &config).unwrap_err().to_string())
        .collect();

    assert_eq!(
        reasons,
        [
            "malformed descriptor `Foo`: ivar `x` declared twice",
            "malformed descriptor `Foo`: ivar `x` lies inside the superclass",
            "malformed descriptor `Foo`: instance size 8 is smaller than superclass size 16",
        ]
    );
}

#[test]
fn fragile_allows_any_ivar_placement() {
    let mut desc = foo();
    desc.ivars[0].offset = 8;

    assert!(check_class(&desc, &EmitConfig::default()).is_ok());
}
