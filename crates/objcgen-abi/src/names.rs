//! Published symbol names. The loader matches these byte for byte.

/// Entry point the load thunk hands the module descriptor to.
pub const REGISTER_ENTRY: &str = "__objc_exec_class";
/// Name of the one-time registration thunk.
pub const LOAD_FUNCTION: &str = ".objc_load_function";
/// Class and category name of the synthesized protocol holder category.
pub const PROTOCOL_HOLDER: &str = "__ObjC_Protocol_Holder_Ugly_Hack";

pub fn class_symbol(class: &str) -> String {
    format!("_OBJC_CLASS_{class}")
}

pub fn metaclass_symbol(class: &str) -> String {
    format!("_OBJC_METACLASS_{class}")
}

/// Pointer to the offset slot inside the class's ivar list.
pub fn ivar_offset_symbol(class: &str, ivar: &str) -> String {
    format!("__objc_ivar_offset_{class}.{ivar}")
}

/// Integer holding the published offset directly.
pub fn ivar_offset_value_symbol(class: &str, ivar: &str) -> String {
    format!("__objc_ivar_offset_value_{class}.{ivar}")
}

/// Sentinel whose absence turns a missing class into a link error.
pub fn class_name_sentinel(class: &str) -> String {
    format!("__objc_class_name_{class}")
}

pub fn protocol_symbol(protocol: &str) -> String {
    format!(".objc_protocol_{protocol}")
}
