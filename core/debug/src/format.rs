//! Paused-state value rendering.
//!
//! [`format_value`] turns a [`RuntimeValue`] snapshot into the display string
//! and type name the host shows in its variables pane. It is pure and has no
//! access to session state; compound values are flattened into a single
//! display string, so the host never needs a second round trip to expand
//! them.

use crate::value::{RuntimeValue, ValueKind};

/// Renders a value snapshot as `(display, type name)`.
///
/// Unreadable values render as `nil` with the type name `invalid`, no matter
/// what type the engine declared for them.
pub fn format_value(value: &RuntimeValue) -> (String, String) {
    if matches!(value.kind, ValueKind::Invalid) {
        return ("nil".to_owned(), "invalid".to_owned());
    }
    (render(&value.kind), value.type_name.clone())
}

fn render(kind: &ValueKind) -> String {
    match kind {
        ValueKind::Invalid => "nil".to_owned(),
        ValueKind::Int(n) => n.to_string(),
        ValueKind::Uint(n) => n.to_string(),
        // Display for f64 is the shortest representation that parses back to
        // the same value.
        ValueKind::Float(x) => x.to_string(),
        ValueKind::Bool(b) => b.to_string(),
        ValueKind::Text(s) => format!("{s:?}"),
        ValueKind::Sequence(items) => {
            let elems: Vec<String> = items.iter().map(|item| render(&item.kind)).collect();
            format!("[{}]", elems.join(", "))
        }
        ValueKind::Mapping(entries) => {
            // Pair order is whatever the engine iterated; it may differ
            // between snapshots of the same mapping.
            let pairs: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", render(&key.kind), render(&value.kind)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
        ValueKind::Record(fields) => {
            let pairs: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{}: {}", name, render(&value.kind)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
        ValueKind::Optional(None) => "nil".to_owned(),
        ValueKind::Optional(Some(inner)) => render(&inner.kind),
        ValueKind::Reference { pointee: None, .. } => "nil".to_owned(),
        ValueKind::Reference {
            address,
            pointee: Some(inner),
        } => format!("{address:#x}: {}", render(&inner.kind)),
        ValueKind::Complex { re, im } => format!("({re}+{im}i)"),
        ValueKind::Handle(None) => "nil".to_owned(),
        ValueKind::Handle(Some(token)) => format!("{token:#x}"),
        ValueKind::Other(text) => text.clone(),
    }
}
