//! Runtime value snapshots.
//!
//! Engines report paused-state variables as [`RuntimeValue`] trees: a closed
//! set of kinds covering every value shape the formatter knows how to render,
//! plus [`ValueKind::Other`] for anything the engine could only stringify.
//! The tree is owned, so a snapshot is always finite and acyclic.

/// A snapshot of one runtime value, tagged with the engine-reported type name.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeValue {
    /// Type name as the engine spells it, e.g. `int` or `map[string]int`.
    pub type_name: String,
    /// The value itself.
    pub kind: ValueKind,
}

/// The closed set of value shapes the formatter dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// A value the engine could not read at all.
    Invalid,
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Text.
    Text(String),
    /// Fixed-size or growable ordered sequence.
    Sequence(Vec<RuntimeValue>),
    /// Key/value mapping in the engine's own iteration order, which is not
    /// guaranteed stable across snapshots.
    Mapping(Vec<(RuntimeValue, RuntimeValue)>),
    /// Product value with named fields in declared order.
    Record(Vec<(String, RuntimeValue)>),
    /// Nullable wrapper; `None` renders as `nil`.
    Optional(Option<Box<RuntimeValue>>),
    /// Indirection carrying an address-like identity tag. A `None` pointee is
    /// a nil reference.
    Reference {
        /// Opaque per-value identity, rendered in hex.
        address: u64,
        /// The pointed-to value, if any.
        pointee: Option<Box<RuntimeValue>>,
    },
    /// Complex number.
    Complex {
        /// Real component.
        re: f64,
        /// Imaginary component.
        im: f64,
    },
    /// Opaque handle such as a function reference or a channel; `None` is an
    /// unset handle.
    Handle(Option<u64>),
    /// Anything else, pre-rendered by the engine's generic conversion.
    Other(String),
}

impl RuntimeValue {
    /// Creates a value with an explicit type name.
    pub fn new(type_name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
        }
    }

    /// An unreadable value.
    pub fn invalid() -> Self {
        Self::new("invalid", ValueKind::Invalid)
    }

    /// A signed integer with the default `int` type name.
    pub fn int(value: i64) -> Self {
        Self::new("int", ValueKind::Int(value))
    }

    /// An unsigned integer with the default `uint` type name.
    pub fn uint(value: u64) -> Self {
        Self::new("uint", ValueKind::Uint(value))
    }

    /// A float with the default `float64` type name.
    pub fn float(value: f64) -> Self {
        Self::new("float64", ValueKind::Float(value))
    }

    /// A boolean with the default `bool` type name.
    pub fn bool(value: bool) -> Self {
        Self::new("bool", ValueKind::Bool(value))
    }

    /// Text with the default `string` type name.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new("string", ValueKind::Text(value.into()))
    }
}
