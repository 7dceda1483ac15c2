//! Verify-and-report: compares what may hold `self` with what the path has
//! cleared and files one finding per leftover property.

use super::facts::FieldId;
use crate::ast::TypeRef;
use crate::diagnostics::BugType;
use std::collections::BTreeSet;

pub const LEAKING_SELF: BugType = BugType {
    title: "Leaking unsafe reference to self",
    category: "Memory error",
};

/// Unsafe properties that may hold `self` and were not cleared, in name
/// order.
pub fn uncleared_properties<'a>(
    dangerous: &'a BTreeSet<String>,
    cleared: &im::OrdSet<String>,
) -> Vec<&'a str> {
    dangerous
        .iter()
        .filter(|property| !cleared.contains(*property))
        .map(String::as_str)
        .collect()
}

pub fn format_message(
    field: &FieldId,
    property: &str,
    field_type: Option<&TypeRef>,
    decl_name: Option<&str>,
) -> String {
    let location = match decl_name {
        Some(decl) => format!(" (in {decl})"),
        None => String::new(),
    };
    let holder = match field_type.and_then(TypeRef::class_name) {
        Some(class) => format!("instance of {class}"),
        None => "object".to_string(),
    };
    format!(
        "Leaking unsafe reference to self stored in {field}.{property}{location}. \
         The assign property '{property}' of the {holder} stored in '{field}' appears to \
         occasionally point to self. For memory safety, you need to clear this property \
         explicitly before losing reference to this object, typically by adding a line: \
         '{field}.{property} = nil;'. In case of a false warning, consider adding an assert \
         instead: 'assert({field}.{property} != self);' or, if applicable: 'assert(!{field});'."
    )
}

/// Hands one message per uncleared property to `emit` and returns how many
/// were filed. Does not touch any state.
pub fn verify_and_report(
    dangerous: &BTreeSet<String>,
    cleared: &im::OrdSet<String>,
    field: &FieldId,
    field_type: Option<&TypeRef>,
    decl_name: Option<&str>,
    mut emit: impl FnMut(String),
) -> usize {
    let leftover = uncleared_properties(dangerous, cleared);
    for property in &leftover {
        emit(format_message(field, property, field_type, decl_name));
    }
    leftover.len()
}
