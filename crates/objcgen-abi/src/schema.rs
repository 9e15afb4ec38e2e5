//! The two class-structure schemas the runtime loader understands.
//!
//! A schema is an ordered field list. The structure builder walks it once and
//! fills each slot, so both layouts come out of one code path while staying
//! bit-exact per mode.

use serde::{Deserialize, Serialize};

use crate::target::TargetData;
use crate::types::{FieldType, StructType};

/// Class flag: structure describes a class.
pub const CLS_CLASS: i64 = 0x1;
/// Class flag: structure describes a metaclass.
pub const CLS_META: i64 = 0x2;
/// Class flag set on every emitted class and metaclass, whatever the layout.
pub const CLS_NEW_ABI: i64 = 0x10;

/// Protocol structure version understood by the loader.
pub const PROTOCOL_VERSION: i64 = 2;

/// One slot of a class structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassField {
    Isa,
    SuperClass,
    Name,
    Version,
    Info,
    InstanceSize,
    Ivars,
    Methods,
    /// Method cache, filled in by the loader.
    Cache,
    /// Dispatch table, filled in by the loader.
    DispatchTable,
    SubclassList,
    SiblingClass,
    Protocols,
    /// Ivar layout, always null.
    IvarLayout,
    GcObjectType,
    AbiVersion,
    IvarOffsets,
    Properties,
    StrongIvarBitmap,
    WeakIvarBitmap,
}

impl ClassField {
    pub fn field_type(self) -> FieldType {
        match self {
            ClassField::Version
            | ClassField::Info
            | ClassField::InstanceSize
            | ClassField::AbiVersion => FieldType::Long,
            _ => FieldType::Ptr,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassField::Isa => "isa",
            ClassField::SuperClass => "super_class",
            ClassField::Name => "name",
            ClassField::Version => "version",
            ClassField::Info => "info",
            ClassField::InstanceSize => "instance_size",
            ClassField::Ivars => "ivars",
            ClassField::Methods => "methods",
            ClassField::Cache => "cache",
            ClassField::DispatchTable => "dtable",
            ClassField::SubclassList => "subclass_list",
            ClassField::SiblingClass => "sibling_class",
            ClassField::Protocols => "protocols",
            ClassField::IvarLayout => "ivar_layout",
            ClassField::GcObjectType => "gc_object_type",
            ClassField::AbiVersion => "abi_version",
            ClassField::IvarOffsets => "ivar_offsets",
            ClassField::Properties => "properties",
            ClassField::StrongIvarBitmap => "strong_pointers",
            ClassField::WeakIvarBitmap => "weak_pointers",
        }
    }
}

const LEGACY_FIELDS: [ClassField; 14] = [
    ClassField::Isa,
    ClassField::SuperClass,
    ClassField::Name,
    ClassField::Version,
    ClassField::Info,
    ClassField::InstanceSize,
    ClassField::Ivars,
    ClassField::Methods,
    ClassField::Cache,
    ClassField::Protocols,
    ClassField::IvarLayout,
    ClassField::AbiVersion,
    ClassField::IvarOffsets,
    ClassField::Properties,
];

const EXTENDED_FIELDS: [ClassField; 18] = [
    ClassField::Isa,
    ClassField::SuperClass,
    ClassField::Name,
    ClassField::Version,
    ClassField::Info,
    ClassField::InstanceSize,
    ClassField::Ivars,
    ClassField::Methods,
    ClassField::DispatchTable,
    ClassField::SubclassList,
    ClassField::SiblingClass,
    ClassField::Protocols,
    ClassField::GcObjectType,
    ClassField::AbiVersion,
    ClassField::IvarOffsets,
    ClassField::Properties,
    ClassField::StrongIvarBitmap,
    ClassField::WeakIvarBitmap,
];

/// Class structure layout variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassSchema {
    /// 14 fields, abi_version 0.
    #[default]
    Legacy,
    /// 18 fields with strong/weak ivar bitmaps, abi_version 1.
    Extended,
}

impl ClassSchema {
    pub fn fields(self) -> &'static [ClassField] {
        match self {
            ClassSchema::Legacy => &LEGACY_FIELDS,
            ClassSchema::Extended => &EXTENDED_FIELDS,
        }
    }

    pub fn abi_version(self) -> i64 {
        match self {
            ClassSchema::Legacy => 0,
            ClassSchema::Extended => 1,
        }
    }

    pub fn supports_ivar_bitmaps(self) -> bool {
        self == ClassSchema::Extended
    }

    pub fn struct_type(self) -> StructType {
        StructType::new(self.fields().iter().map(|f| f.field_type()).collect())
    }

    /// Byte size of the class structure itself; what a metaclass publishes
    /// as its instance size.
    pub fn struct_size(self, target: &TargetData) -> u64 {
        self.struct_type().size(target)
    }

    pub fn index_of(self, field: ClassField) -> Option<usize> {
        self.fields().iter().position(|&f| f == field)
    }
}

/// `{Ptr next, Int count, [{Ptr name, Ptr types, Ptr imp}; n]}`
pub fn method_list_type(len: usize) -> FieldType {
    let entry = StructType::new(vec![FieldType::Ptr, FieldType::Ptr, FieldType::Ptr]);
    FieldType::Struct(StructType::new(vec![
        FieldType::Ptr,
        FieldType::Int,
        FieldType::array(FieldType::Struct(entry), len),
    ]))
}

/// `{Int count, [{Ptr name, Ptr types}; n]}`
pub fn method_description_list_type(len: usize) -> FieldType {
    let entry = StructType::new(vec![FieldType::Ptr, FieldType::Ptr]);
    FieldType::Struct(StructType::new(vec![
        FieldType::Int,
        FieldType::array(FieldType::Struct(entry), len),
    ]))
}

/// Index of the entry array inside an ivar list.
pub const IVAR_LIST_ENTRIES: u32 = 1;
/// Index of the offset field inside an ivar list entry.
pub const IVAR_ENTRY_OFFSET: u32 = 2;

/// `{Int count, [{Ptr name, Ptr type, Int offset}; n]}`
pub fn ivar_list_type(len: usize) -> FieldType {
    let entry = StructType::new(vec![FieldType::Ptr, FieldType::Ptr, FieldType::Int]);
    FieldType::Struct(StructType::new(vec![
        FieldType::Int,
        FieldType::array(FieldType::Struct(entry), len),
    ]))
}

/// `{Ptr next, Long count, [Ptr; n]}`
pub fn protocol_list_type(len: usize) -> FieldType {
    FieldType::Struct(StructType::new(vec![
        FieldType::Ptr,
        FieldType::Long,
        FieldType::array(FieldType::Ptr, len),
    ]))
}

/// `{Int count, Ptr next, [{Ptr name, Int attributes, Ptr getter, Ptr getter_types, Ptr setter, Ptr setter_types}; n]}`
pub fn property_list_type(len: usize) -> FieldType {
    let entry = StructType::new(vec![
        FieldType::Ptr,
        FieldType::Int,
        FieldType::Ptr,
        FieldType::Ptr,
        FieldType::Ptr,
        FieldType::Ptr,
    ]);
    FieldType::Struct(StructType::new(vec![
        FieldType::Int,
        FieldType::Ptr,
        FieldType::array(FieldType::Struct(entry), len),
    ]))
}

/// `{Ptr category_name, Ptr class_name, Ptr instance_methods, Ptr class_methods, Ptr protocols}`
pub fn category_type() -> FieldType {
    FieldType::Struct(StructType::new(vec![FieldType::Ptr; 5]))
}

/// `{Ptr version, Ptr name, Ptr protocols, Ptr instance_methods, Ptr class_methods}`
pub fn protocol_type() -> FieldType {
    FieldType::Struct(StructType::new(vec![FieldType::Ptr; 5]))
}

/// `{Ptr isa, Ptr bytes, Int length}`
pub fn constant_string_type() -> FieldType {
    FieldType::Struct(StructType::new(vec![
        FieldType::Ptr,
        FieldType::Ptr,
        FieldType::Int,
    ]))
}

/// `{Ptr class_name, [Ptr; n + 1]}`
pub fn statics_type(len: usize) -> FieldType {
    FieldType::Struct(StructType::new(vec![
        FieldType::Ptr,
        FieldType::array(FieldType::Ptr, len + 1),
    ]))
}

/// `{Long selector_count, Ptr selectors, Short class_count, Short category_count, [Ptr; n]}`
pub fn symtab_type(defs: usize) -> FieldType {
    FieldType::Struct(StructType::new(vec![
        FieldType::Long,
        FieldType::Ptr,
        FieldType::Short,
        FieldType::Short,
        FieldType::array(FieldType::Ptr, defs),
    ]))
}

/// `{Long version, Long size, Ptr source_path, Ptr symtab, [Int gc_mode]}`
pub fn module_type(with_gc_field: bool) -> StructType {
    let mut fields = vec![FieldType::Long, FieldType::Long, FieldType::Ptr, FieldType::Ptr];
    if with_gc_field {
        fields.push(FieldType::Int);
    }
    StructType::new(fields)
}
