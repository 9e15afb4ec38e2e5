use indoc::indoc;
use objcgen_abi::{ClassSchema, TargetData};

use crate::config::{AbiMode, EmitConfig, GcMode, InstanceSizePolicy};
use crate::descriptor::{ClassDescriptor, Ownership};
use crate::error::EmitError;

#[test]
fn default_is_legacy_runtime() {
    let config = EmitConfig::default();

    assert_eq!(config.abi, AbiMode::Fragile);
    assert_eq!(config.schema, ClassSchema::Legacy);
    assert_eq!(config.instance_size, InstanceSizePolicy::Absolute);
    assert!(!config.has_gc_field());
    assert!(config.validate().is_ok());
}

#[test]
fn non_fragile_preset() {
    let config = EmitConfig::non_fragile();

    assert_eq!(config.abi, AbiMode::NonFragile);
    assert_eq!(config.schema, ClassSchema::Extended);
    assert_eq!(config.instance_size, InstanceSizePolicy::RelativeSentinel);
    assert!(config.has_gc_field());
    assert!(config.validate().is_ok());
}

#[test]
fn gc_encoding() {
    assert_eq!(GcMode::None.encoding(), 0);
    assert_eq!(GcMode::RefCounted.encoding(), 1);
    assert_eq!(GcMode::GcOnly.encoding(), 2);
    assert_eq!(GcMode::Hybrid.encoding(), 1);
}

#[test]
fn relative_sizes_need_non_fragile_abi() {
    let config = EmitConfig {
        instance_size: InstanceSizePolicy::RelativeSentinel,
        ..EmitConfig::default()
    };

    let err = config.validate().unwrap_err();

    assert_eq!(
        err.to_string(),
        "invalid configuration: relative instance sizes require the non-fragile ABI"
    );
}

#[test]
fn unsupported_target_rejected() {
    let config = EmitConfig::default().with_target(TargetData {
        pointer_size: 2,
        long_size: 4,
        big_endian: false,
    });

    assert!(matches!(config.validate(), Err(EmitError::InvalidConfig(_))));
}

#[test]
fn empty_constant_string_class_rejected() {
    let config = EmitConfig {
        constant_string_class: String::new(),
        ..EmitConfig::default()
    };

    assert!(matches!(config.validate(), Err(EmitError::InvalidConfig(_))));
}

#[test]
fn config_from_json() {
    let json = indoc! {r#"
        {
          "abi": "non-fragile",
          "schema": "extended",
          "gc": "gc-only",
          "runtime-version": 10,
          "instance-size": "relative-sentinel",
          "target": { "pointer-size": 4, "long-size": 4 }
        }
    "#};

    let config: EmitConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.abi, AbiMode::NonFragile);
    assert_eq!(config.gc, GcMode::GcOnly);
    assert_eq!(config.target, TargetData::ILP32);
    assert_eq!(config.constant_string_class, "NSConstantString");
    assert!(config.validate().is_ok());
}

#[test]
fn class_descriptor_from_json() {
    let json = indoc! {r#"
        {
          "name": "Foo",
          "superclass": "NSObject",
          "instance-size": 40,
          "super-instance-size": 16,
          "ivars": [
            { "name": "x", "type": "i", "offset": 16 },
            { "name": "delegate", "type": "@", "offset": 24, "ownership": "weak" }
          ],
          "instance-methods": [
            { "selector": "bar", "types": "v16@0:8", "imp": "_i_Foo__bar" }
          ]
        }
    "#};

    let desc: ClassDescriptor = serde_json::from_str(json).unwrap();

    assert_eq!(desc.superclass_name(), Some("NSObject"));
    assert_eq!(desc.ivars[0].ownership, Ownership::None);
    assert_eq!(desc.ivars[1].ownership, Ownership::Weak);
    assert_eq!(desc.ivars[1].type_encoding, "@");
    assert_eq!(desc.instance_methods[0].imp, "_i_Foo__bar");
    assert!(desc.class_methods.is_empty());
}

#[test]
fn empty_superclass_means_root() {
    let mut desc = ClassDescriptor::new("Object");
    desc.superclass = Some(String::new());

    assert_eq!(desc.superclass_name(), None);
}
