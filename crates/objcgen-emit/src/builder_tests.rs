use objcgen_abi::schema::{CLS_CLASS, CLS_META, CLS_NEW_ABI};
use objcgen_abi::{ClassField, ClassSchema, Constant, FieldType, TargetData};

use crate::builder::{self, ClassFields, IvarEntry};
use crate::descriptor::{MethodDescription, MethodDescriptor, PropertyDescriptor};
use crate::symbols::Namespace;

fn field(schema: ClassSchema, init: &Constant, field: ClassField) -> Constant {
    let index = schema.index_of(field).unwrap();
    init.at_path(&[index as u32]).unwrap().clone()
}

fn sample_fields() -> ClassFields {
    let mut fields = ClassFields::empty("Foo");
    fields.isa = Constant::symbol("_OBJC_METACLASS_Foo");
    fields.superclass = Constant::cstr("NSObject");
    fields.instance_size = 40;
    fields.methods = Constant::symbol(".objc_method_list");
    fields.strong_ivar_bitmap = Constant::Int(0b11);
    fields
}

#[test]
fn legacy_class_structure() {
    let (ty, init) = builder::class_structure(ClassSchema::Legacy, &sample_fields(), &TargetData::LP64, false);

    assert_eq!(ty, FieldType::Struct(ClassSchema::Legacy.struct_type()));
    insta::assert_snapshot!(init.to_string(), @r#"{@_OBJC_METACLASS_Foo, c"NSObject", c"Foo", 0, 17, 40, null, @.objc_method_list, null, null, null, 0, null, null}"#);
}

#[test]
fn extended_class_structure() {
    let schema = ClassSchema::Extended;

    let (_, init) = builder::class_structure(schema, &sample_fields(), &TargetData::LP64, false);

    assert_eq!(field(schema, &init, ClassField::Info), Constant::Int(CLS_CLASS | CLS_NEW_ABI));
    assert_eq!(field(schema, &init, ClassField::AbiVersion), Constant::Int(1));
    assert_eq!(field(schema, &init, ClassField::StrongIvarBitmap), Constant::Int(0b11));
    assert_eq!(field(schema, &init, ClassField::WeakIvarBitmap), Constant::Null);
    assert_eq!(field(schema, &init, ClassField::DispatchTable), Constant::Null);
}

#[test]
fn schemas_agree_on_shared_fields() {
    let fields = sample_fields();
    let (_, legacy) = builder::class_structure(ClassSchema::Legacy, &fields, &TargetData::LP64, false);
    let (_, extended) = builder::class_structure(ClassSchema::Extended, &fields, &TargetData::LP64, false);

    for shared in [
        ClassField::Isa,
        ClassField::SuperClass,
        ClassField::Name,
        ClassField::Version,
        ClassField::Info,
        ClassField::InstanceSize,
        ClassField::Ivars,
        ClassField::Methods,
        ClassField::Protocols,
        ClassField::IvarOffsets,
        ClassField::Properties,
    ] {
        assert_eq!(
            field(ClassSchema::Legacy, &legacy, shared),
            field(ClassSchema::Extended, &extended, shared),
            "{}",
            shared.name()
        );
    }
}

#[test]
fn metaclass_publishes_structure_size() {
    let (_, lp64) = builder::class_structure(ClassSchema::Legacy, &sample_fields(), &TargetData::LP64, true);
    let (_, ilp32) = builder::class_structure(ClassSchema::Extended, &sample_fields(), &TargetData::ILP32, true);

    assert_eq!(field(ClassSchema::Legacy, &lp64, ClassField::InstanceSize), Constant::Int(112));
    assert_eq!(field(ClassSchema::Legacy, &lp64, ClassField::Info), Constant::Int(CLS_META | CLS_NEW_ABI));
    assert_eq!(field(ClassSchema::Extended, &ilp32, ClassField::InstanceSize), Constant::Int(72));
}

#[test]
fn info_flags_for_both_schemas() {
    for schema in [ClassSchema::Legacy, ClassSchema::Extended] {
        let (_, class) = builder::class_structure(schema, &sample_fields(), &TargetData::LP64, false);
        let (_, meta) = builder::class_structure(schema, &sample_fields(), &TargetData::LP64, true);

        assert_eq!(field(schema, &class, ClassField::Info), Constant::Int(0x11));
        assert_eq!(field(schema, &meta, ClassField::Info), Constant::Int(0x12));
    }
}

#[test]
fn empty_lists_are_null() {
    let mut ns = Namespace::new();

    assert_eq!(builder::method_list(&mut ns, &[]), Constant::Null);
    assert_eq!(builder::method_description_list(&mut ns, &[]), Constant::Null);
    assert_eq!(builder::ivar_list(&mut ns, &[]), None);
    assert_eq!(builder::ivar_offset_table(&mut ns, &[]), Constant::Null);
    assert_eq!(builder::protocol_list(&mut ns, &[]), Constant::Null);
    assert_eq!(builder::property_list(&mut ns, &[]), Constant::Null);
    assert!(ns.is_empty());
}

#[test]
fn method_lists_get_distinct_names() {
    let mut ns = Namespace::new();
    let methods = [MethodDescriptor::new("bar", "v16@0:8", "_i_Foo__bar")];

    let first = builder::method_list(&mut ns, &methods);
    let second = builder::method_list(&mut ns, &methods);

    assert_eq!(first, Constant::symbol(".objc_method_list"));
    assert_eq!(second, Constant::symbol(".objc_method_list.1"));
    let (id, _) = ns.lookup(".objc_method_list").unwrap();
    insta::assert_snapshot!(
        ns.global(id).init.as_ref().unwrap().to_string(),
        @r#"{null, 1, [{c"bar", c"v16@0:8", @_i_Foo__bar}]}"#
    );
}

#[test]
fn ivar_list_and_offset_slot() {
    let mut ns = Namespace::new();
    let entries = [
        IvarEntry { name: "x", type_encoding: "i", offset: 0 },
        IvarEntry { name: "y", type_encoding: "d", offset: 8 },
    ];

    let list = builder::ivar_list(&mut ns, &entries).unwrap();
    let slot = builder::ivar_offset_slot(&list, 1);

    assert_eq!(list, ".objc_ivar_list");
    assert_eq!(slot.to_string(), "@.objc_ivar_list[1][1][2]");
    let (id, _) = ns.lookup(&list).unwrap();
    assert_eq!(
        ns.global(id).init.as_ref().unwrap().at_path(&[1, 1, 2]),
        Some(&Constant::Int(8))
    );
}

#[test]
fn protocol_and_description_lists() {
    let mut ns = Namespace::new();
    let descriptions = [MethodDescription {
        selector: "count".to_string(),
        types: "Q16@0:8".to_string(),
    }];

    let protocols = builder::protocol_list(&mut ns, &["NSCopying".to_string(), "NSCoding".to_string()]);
    let methods = builder::method_description_list(&mut ns, &descriptions);

    let (id, _) = ns.lookup(".objc_protocol_list").unwrap();
    assert_eq!(protocols, Constant::symbol(".objc_protocol_list"));
    assert_eq!(
        ns.global(id).init.as_ref().unwrap().to_string(),
        "{null, 2, [@.objc_protocol_NSCopying, @.objc_protocol_NSCoding]}"
    );
    assert_eq!(methods, Constant::symbol(".objc_method_description_list"));
}

#[test]
fn property_list_keeps_missing_accessors_null() {
    let mut ns = Namespace::new();
    let property = PropertyDescriptor {
        name: "count".to_string(),
        attributes: 0x41,
        getter: Some("count".to_string()),
        getter_types: Some("i16@0:8".to_string()),
        ..PropertyDescriptor::default()
    };

    builder::property_list(&mut ns, &[property]);

    let (id, _) = ns.lookup(".objc_property_list").unwrap();
    insta::assert_snapshot!(
        ns.global(id).init.as_ref().unwrap().to_string(),
        @r#"{1, null, [{c"count", 65, c"count", c"i16@0:8", null, null}]}"#
    );
}

#[test]
fn short_bitmap_is_inline() {
    let mut ns = Namespace::new();

    let bitmap = builder::bitmap(&mut ns, &[true, false, true], &TargetData::LP64);

    assert_eq!(bitmap, Constant::Int(0b1011));
    assert!(ns.is_empty());
}

#[test]
fn empty_bitmap_is_null() {
    let mut ns = Namespace::new();

    assert_eq!(builder::bitmap(&mut ns, &[false, false], &TargetData::LP64), Constant::Null);
    assert_eq!(builder::bitmap(&mut ns, &[], &TargetData::LP64), Constant::Null);
}

#[test]
fn long_bitmap_goes_out_of_line() {
    let mut ns = Namespace::new();
    let mut bits = vec![false; 33];
    bits[0] = true;
    bits[32] = true;

    // 33 bits do not fit inline next to the tag bit on a 32-bit target.
    let bitmap = builder::bitmap(&mut ns, &bits, &TargetData::ILP32);

    assert_eq!(bitmap, Constant::symbol(".objc_bitfield"));
    let (id, _) = ns.lookup(".objc_bitfield").unwrap();
    assert_eq!(ns.global(id).init.as_ref().unwrap().to_string(), "{2, [1, 1]}");
}

#[test]
fn category_and_protocol_structures() {
    let (_, category) = builder::category_structure(
        "Extras",
        "Foo",
        Constant::symbol(".objc_method_list"),
        Constant::Null,
        Constant::Null,
    );
    let (_, protocol) = builder::protocol_structure("NSCopying", Constant::Null, Constant::Null, Constant::Null);

    assert_eq!(category.to_string(), r#"{c"Extras", c"Foo", @.objc_method_list, null, null}"#);
    assert_eq!(protocol.to_string(), r#"{2, c"NSCopying", null, null, null}"#);
}
