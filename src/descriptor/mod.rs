//! # Descriptor Module
//!
//! In-memory model of one discovered input class.
//!
//! A [`ClassDescriptor`] is created by the [`scanner`](crate::scanner) with only
//! its identity filled in, completed by the [`reflect`](crate::reflect) pass and
//! consumed once by the renderer. The batch keeps the whole collection in
//! memory for the duration of a run; nothing is persisted between runs.

mod types;

pub use types::*;

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex should be valid")
});

/// Keywords that cannot be used as a class name in the generated C#
const RESERVED: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Whether `name` is usable as a type or member name in the generated code
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !RESERVED.contains(&name)
}

/// Derive a class name from a file name by dropping everything from the first `.`
///
/// `Campaign.php` → `Campaign`, `Ad.Creative.php` → `Ad`.
pub fn derive_short_name(file_name: &str) -> &str {
    match file_name.find('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    }
}
