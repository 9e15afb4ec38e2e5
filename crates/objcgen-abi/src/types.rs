//! Field types of emitted structures and their natural layout.

use std::fmt;

use crate::target::{INT_SIZE, SHORT_SIZE, TargetData};

/// Type of one field (or of a whole global).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Pointer-sized address (`char *`, `id`, list pointers).
    Ptr,
    /// C `long`.
    Long,
    /// C `int` (32-bit).
    Int,
    /// C `short` (16-bit).
    Short,
    Array(Box<FieldType>, u32),
    Struct(StructType),
}

impl FieldType {
    pub fn array(elem: FieldType, len: usize) -> Self {
        FieldType::Array(Box::new(elem), len as u32)
    }

    pub fn size(&self, target: &TargetData) -> u64 {
        match self {
            FieldType::Ptr => target.pointer_size as u64,
            FieldType::Long => target.long_size as u64,
            FieldType::Int => INT_SIZE as u64,
            FieldType::Short => SHORT_SIZE as u64,
            FieldType::Array(elem, len) => elem.size(target) * *len as u64,
            FieldType::Struct(s) => s.size(target),
        }
    }

    pub fn align(&self, target: &TargetData) -> u64 {
        match self {
            FieldType::Array(elem, _) => elem.align(target),
            FieldType::Struct(s) => s.align(target),
            scalar => scalar.size(target),
        }
    }

    /// Width in bytes if this is a scalar.
    pub fn scalar_width(&self, target: &TargetData) -> Option<usize> {
        match self {
            FieldType::Array(..) | FieldType::Struct(_) => None,
            scalar => Some(scalar.size(target) as usize),
        }
    }

    /// Byte offset of the element or field reached by `indices`, plus its type.
    ///
    /// Each index selects a struct field or an array element, descending one
    /// level per index. Returns `None` when an index is out of range or
    /// descends into a scalar.
    pub fn offset_of(&self, indices: &[u32], target: &TargetData) -> Option<(u64, &FieldType)> {
        let mut offset = 0u64;
        let mut ty = self;
        for &index in indices {
            match ty {
                FieldType::Struct(s) => {
                    let field = s.fields.get(index as usize)?;
                    offset += s.offsets(target)[index as usize];
                    ty = field;
                }
                FieldType::Array(elem, len) => {
                    if index >= *len {
                        return None;
                    }
                    offset += elem.size(target) * index as u64;
                    ty = elem;
                }
                _ => return None,
            }
        }
        Some((offset, ty))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Ptr => f.write_str("ptr"),
            FieldType::Long => f.write_str("long"),
            FieldType::Int => f.write_str("int"),
            FieldType::Short => f.write_str("short"),
            FieldType::Array(elem, len) => write!(f, "[{len} x {elem}]"),
            FieldType::Struct(s) => write!(f, "{s}"),
        }
    }
}

/// Ordered field list laid out at natural alignment, no packing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct StructType {
    pub fields: Vec<FieldType>,
}

impl StructType {
    pub fn new(fields: Vec<FieldType>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Offset of every field, in declaration order.
    pub fn offsets(&self, target: &TargetData) -> Vec<u64> {
        let mut offsets = Vec::with_capacity(self.fields.len());
        let mut cursor = 0u64;
        for field in &self.fields {
            cursor = align_up(cursor, field.align(target));
            offsets.push(cursor);
            cursor += field.size(target);
        }
        offsets
    }

    pub fn align(&self, target: &TargetData) -> u64 {
        self.fields
            .iter()
            .map(|f| f.align(target))
            .max()
            .unwrap_or(1)
    }

    /// Total size including tail padding up to the struct's alignment.
    pub fn size(&self, target: &TargetData) -> u64 {
        let end = match (self.fields.last(), self.offsets(target).last()) {
            (Some(last), Some(&offset)) => offset + last.size(target),
            _ => 0,
        };
        align_up(end, self.align(target))
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        f.write_str("}")
    }
}

/// Round up to the next multiple of `align`.
pub fn align_up(value: u64, align: u64) -> u64 {
    if align <= 1 {
        return value;
    }
    value.div_ceil(align) * align
}
