//! Compile-time descriptions of operation parameters and results.
//!
//! `#[derive(Aggregate)]` and `#[derive(Outcome)]` generate these tables;
//! they can also be written by hand. Each field carries its declared
//! shape, its raw tags, an optional schema generator, and the accessor
//! functions the dispatcher uses to fill or drain it.

use crate::context::WebContext;
use crate::error::Fault;
use crate::tag::Tags;
use crate::validate::MemberRule;
use bytes::Bytes;
use daedalus_extract::{ExtractionContext, ExtractionError};
use serde::Serialize;
use serde_json::Value;

/// Produces the JSON Schema of a field type.
pub type SchemaFn = fn() -> Value;

/// Syntactic class of a field type, after unwrapping `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// The request context.
    Context,
    /// `String` and `&str`-like text.
    Text,
    /// Numbers, booleans and `char`.
    Scalar,
    /// `Vec<u8>` or `Bytes`.
    Bytes,
    /// `Vec<T>`, `VecDeque<T>`, `HashSet<T>`, arrays.
    Sequence,
    /// `HashMap`, `BTreeMap`, `IndexMap`.
    Map,
    /// Any other named type, treated as a structured value.
    Struct,
    /// The error carrier [`Fault`].
    Fault,
    /// Anything the classifier cannot place (tuples, references, functions).
    Unknown,
}

/// How a bindable value is located and described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A single text or scalar value.
    Base,
    /// A structured value.
    Object,
    /// A list.
    Array,
    /// Cannot be bound.
    Unsupported,
}

impl TypeClass {
    /// Maps the class to a bindable value kind.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Text | Self::Scalar => ValueKind::Base,
            Self::Struct | Self::Map => ValueKind::Object,
            Self::Sequence | Self::Bytes => ValueKind::Array,
            Self::Context | Self::Fault | Self::Unknown => ValueKind::Unsupported,
        }
    }
}

/// Role of a parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Receives the request context and carries route attributes.
    ContextCarrier,
    /// Filled from the request.
    Bindable,
}

/// Static description of one struct field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Declaration position.
    pub index: usize,
    /// Field identifier; for tuple fields, the position.
    pub ident: &'static str,
    /// `false` for tuple fields.
    pub named: bool,
    /// `true` when the field is `pub`.
    pub public: bool,
    /// Parameter role. Result fields are always `Bindable`.
    pub role: FieldRole,
    /// Type class after unwrapping `Option`.
    pub class: TypeClass,
    /// Declared as `Option<T>`.
    pub optional: bool,
    /// Declared type, as written.
    pub type_name: &'static str,
    /// Raw tags.
    pub tags: Tags,
    /// Schema generator for the unwrapped type.
    pub schema: Option<SchemaFn>,
}

impl FieldDescriptor {
    /// Describes a public, named, bindable field.
    pub fn new(index: usize, ident: &'static str, class: TypeClass) -> Self {
        Self {
            index,
            ident,
            named: true,
            public: true,
            role: FieldRole::Bindable,
            class,
            optional: false,
            type_name: "",
            tags: Tags::EMPTY,
            schema: None,
        }
    }

    /// Describes a context carrier field.
    pub fn carrier(index: usize, ident: &'static str) -> Self {
        Self {
            role: FieldRole::ContextCarrier,
            type_name: "WebContext",
            ..Self::new(index, ident, TypeClass::Context)
        }
    }

    /// Sets the declared type text.
    #[must_use]
    pub fn type_name(mut self, type_name: &'static str) -> Self {
        self.type_name = type_name;
        self
    }

    /// Sets the raw tags.
    #[must_use]
    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the schema generator.
    #[must_use]
    pub fn schema(mut self, schema: SchemaFn) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Marks the field as `Option<T>`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the field as not `pub`.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Marks the field as a tuple field.
    #[must_use]
    pub fn unnamed(mut self) -> Self {
        self.named = false;
        self
    }

    /// Display name: the identifier, or the type for tuple fields.
    pub fn display_name(&self) -> &'static str {
        if self.named {
            self.ident
        } else {
            self.type_name
        }
    }
}

/// Writes a request value into an aggregate field.
pub enum Binder<A> {
    /// Stores the request context.
    Context(fn(&mut A, WebContext)),
    /// Stores a single looked-up value.
    Value(fn(&mut A, Value) -> Result<(), serde_json::Error>),
    /// Decodes the whole request body (or query, for bodyless verbs).
    Whole(fn(&mut A, &ExtractionContext, Option<&str>) -> Result<(), ExtractionError>),
}

/// A parameter field: description plus accessors.
pub struct InputField<A> {
    /// Static description.
    pub descriptor: FieldDescriptor,
    /// Writes the bound value.
    pub binder: Binder<A>,
    /// Reads the field back for validation.
    pub read: Option<fn(&A) -> Result<Value, serde_json::Error>>,
    /// Rules on members of the value read back.
    pub members: Vec<MemberRule>,
}

impl<A> InputField<A> {
    /// Creates a field without a read accessor.
    pub fn new(descriptor: FieldDescriptor, binder: Binder<A>) -> Self {
        Self {
            descriptor,
            binder,
            read: None,
            members: Vec::new(),
        }
    }

    /// Adds the read accessor used by validation.
    #[must_use]
    pub fn with_read(mut self, read: fn(&A) -> Result<Value, serde_json::Error>) -> Self {
        self.read = Some(read);
        self
    }

    /// Adds rules checked on members of the field's value.
    #[must_use]
    pub fn with_members(mut self, members: Vec<MemberRule>) -> Self {
        self.members = members;
        self
    }
}

/// The parameter of an operation.
///
/// Implemented by `#[derive(Aggregate)]`, and by [`WebContext`] itself for
/// operations that take the bare context.
pub trait Aggregate: Default + Send + 'static {
    /// `true` only for [`WebContext`].
    const BARE_CONTEXT: bool = false;

    /// Type name used in diagnostics.
    fn type_name() -> &'static str;

    /// Field table in declaration order.
    fn fields() -> Vec<InputField<Self>>;
}

impl Aggregate for WebContext {
    const BARE_CONTEXT: bool = true;

    fn type_name() -> &'static str {
        "WebContext"
    }

    fn fields() -> Vec<InputField<Self>> {
        vec![InputField::new(
            FieldDescriptor::carrier(0, "").unnamed(),
            Binder::Context(|slot, ctx| *slot = ctx),
        )]
    }
}

/// A produced result value, ready to be written.
#[derive(Debug)]
pub enum OutputValue {
    /// Text, written as-is.
    Text(String),
    /// Raw bytes, written as-is.
    Bytes(Bytes),
    /// A structured value, encoded by the field's format.
    Data(Value),
    /// An error, written as a [`WebError`](crate::WebError).
    Error(Fault),
}

impl OutputValue {
    /// Serializes `value` into a structured result.
    pub fn data<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Data)
    }

    /// Wraps bytes.
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::Bytes(value.into())
    }
}

/// A result field: description plus a drain accessor.
pub struct OutputField<O> {
    /// Static description.
    pub descriptor: FieldDescriptor,
    /// Moves the value out when present.
    pub take: fn(&mut O) -> Result<Option<OutputValue>, serde_json::Error>,
}

impl<O> OutputField<O> {
    /// Creates a result field.
    pub fn new(
        descriptor: FieldDescriptor,
        take: fn(&mut O) -> Result<Option<OutputValue>, serde_json::Error>,
    ) -> Self {
        Self { descriptor, take }
    }
}

/// The result of an operation.
///
/// Implemented by `#[derive(Outcome)]`; `()` is the result with no fields.
pub trait Outcome: Send + 'static {
    /// Type name used in diagnostics.
    fn type_name() -> &'static str;

    /// Field table in declaration order.
    fn fields() -> Vec<OutputField<Self>>
    where
        Self: Sized;
}

impl Outcome for () {
    fn type_name() -> &'static str {
        "()"
    }

    fn fields() -> Vec<OutputField<Self>> {
        Vec::new()
    }
}

/// Returns `true` if a result field with this shape can be written.
///
/// Optional text, scalars, structs and faults are present when `Some`;
/// sequences, maps and byte buffers are present when non-empty.
pub fn is_writable_output(descriptor: &FieldDescriptor) -> bool {
    match (descriptor.class, descriptor.optional) {
        (TypeClass::Sequence | TypeClass::Map | TypeClass::Bytes, false) => true,
        (TypeClass::Text | TypeClass::Scalar | TypeClass::Struct | TypeClass::Fault | TypeClass::Bytes, true) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(TypeClass::Text.value_kind(), ValueKind::Base);
        assert_eq!(TypeClass::Map.value_kind(), ValueKind::Object);
        assert_eq!(TypeClass::Bytes.value_kind(), ValueKind::Array);
        assert_eq!(TypeClass::Unknown.value_kind(), ValueKind::Unsupported);
    }

    #[test]
    fn test_writable_output_shapes() {
        let opt = |class| FieldDescriptor::new(0, "f", class).optional();
        let bare = |class| FieldDescriptor::new(0, "f", class);

        assert!(is_writable_output(&opt(TypeClass::Struct)));
        assert!(is_writable_output(&opt(TypeClass::Fault)));
        assert!(is_writable_output(&bare(TypeClass::Sequence)));
        assert!(!is_writable_output(&bare(TypeClass::Scalar)));
        assert!(!is_writable_output(&bare(TypeClass::Fault)));
        assert!(!is_writable_output(&opt(TypeClass::Sequence)));
        assert!(!is_writable_output(&opt(TypeClass::Context)));
    }

    #[test]
    fn test_bare_context_aggregate() {
        assert!(<WebContext as Aggregate>::BARE_CONTEXT);
        let fields = <WebContext as Aggregate>::fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].descriptor.role, FieldRole::ContextCarrier);
    }

    #[test]
    fn test_output_value_data() {
        let value = OutputValue::data(&vec![1, 2]).unwrap();
        assert!(matches!(value, OutputValue::Data(Value::Array(ref a)) if a.len() == 2));
    }
}
