//! Syntactic classification of field types.

use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::{GenericArgument, PathArguments, Type, TypePath};

/// Class of a field type, mirrored by the runtime `TypeClass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Context,
    Text,
    Scalar,
    Bytes,
    Sequence,
    Map,
    Struct,
    Fault,
    Unknown,
}

impl Class {
    /// Path of the runtime variant.
    pub fn tokens(self, krate: &TokenStream) -> TokenStream {
        let variant = Ident::new(
            match self {
                Self::Context => "Context",
                Self::Text => "Text",
                Self::Scalar => "Scalar",
                Self::Bytes => "Bytes",
                Self::Sequence => "Sequence",
                Self::Map => "Map",
                Self::Struct => "Struct",
                Self::Fault => "Fault",
                Self::Unknown => "Unknown",
            },
            Span::call_site(),
        );
        quote!(#krate::TypeClass::#variant)
    }

    /// Whether a schema can be generated for the type.
    pub fn has_schema(self) -> bool {
        !matches!(self, Self::Context | Self::Fault | Self::Bytes | Self::Unknown)
    }
}

/// A classified field type.
#[derive(Debug, Clone)]
pub struct Shape {
    pub class: Class,
    pub optional: bool,
    /// The type with `Option` removed.
    pub inner: Type,
}

const TEXT: &[&str] = &["String", "str", "Cow"];
const SCALAR: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32",
    "f64", "bool", "char",
];
const SEQUENCE: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet", "IndexSet", "LinkedList"];
const MAP: &[&str] = &["HashMap", "BTreeMap", "IndexMap", "Map"];
const POINTER: &[&str] = &["Box", "Arc", "Rc"];

/// Classifies `ty`, unwrapping one level of `Option`.
pub fn classify(ty: &Type) -> Shape {
    if let Some(inner) = single_argument(ty, "Option") {
        return Shape {
            class: class_of(inner),
            optional: true,
            inner: inner.clone(),
        };
    }
    Shape {
        class: class_of(ty),
        optional: false,
        inner: ty.clone(),
    }
}

fn class_of(ty: &Type) -> Class {
    match ty {
        Type::Path(path) => class_of_path(path),
        Type::Array(array) => class_of_elements(&array.elem),
        Type::Slice(slice) => class_of_elements(&slice.elem),
        Type::Reference(reference) => match &*reference.elem {
            Type::Path(path) if last_ident(path).as_deref() == Some("str") => Class::Text,
            _ => Class::Unknown,
        },
        Type::Group(group) => class_of(&group.elem),
        Type::Paren(paren) => class_of(&paren.elem),
        _ => Class::Unknown,
    }
}

fn class_of_elements(elem: &Type) -> Class {
    if is_u8(elem) {
        Class::Bytes
    } else {
        Class::Sequence
    }
}

fn class_of_path(path: &TypePath) -> Class {
    let Some(name) = last_ident(path) else {
        return Class::Unknown;
    };
    let ty = Type::Path(path.clone());
    match name.as_str() {
        "WebContext" => Class::Context,
        "Fault" => Class::Fault,
        "Bytes" => Class::Bytes,
        "Value" => Class::Struct,
        "Vec" if single_argument(&ty, "Vec").is_some_and(is_u8) => Class::Bytes,
        n if POINTER.contains(&n) => match single_argument(&ty, n) {
            Some(inner) if n == "Box" && is_str(inner) => Class::Text,
            Some(inner) => class_of(inner),
            None => Class::Unknown,
        },
        n if TEXT.contains(&n) => Class::Text,
        n if SCALAR.contains(&n) => Class::Scalar,
        n if SEQUENCE.contains(&n) => Class::Sequence,
        n if MAP.contains(&n) => Class::Map,
        _ => Class::Struct,
    }
}

fn last_ident(path: &TypePath) -> Option<String> {
    if path.qself.is_some() {
        return None;
    }
    path.path.segments.last().map(|s| s.ident.to_string())
}

fn is_u8(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.path.is_ident("u8"))
}

fn is_str(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.path.is_ident("str"))
}

/// The single generic argument of `ty` when its last segment is `name`.
pub fn single_argument<'a>(ty: &'a Type, name: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != name {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|a| match a {
        GenericArgument::Type(t) => Some(t),
        _ => None,
    });
    let first = types.next()?;
    types.next().is_none().then_some(first)
}

/// The element type whose member rules apply to `ty`.
///
/// Options, pointers and sequences are looked through, so
/// `Option<Vec<Address>>` yields `Address`.
pub fn rule_target(ty: &Type) -> &Type {
    let mut current = ty;
    loop {
        let wrapper = ["Option", "Box", "Arc", "Rc"]
            .iter()
            .chain(SEQUENCE)
            .find_map(|name| single_argument(current, name));
        match wrapper {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

/// Whether the last path segment of `ty` is one of `names`.
pub fn ends_with(ty: &Type, names: &[&str]) -> bool {
    match ty {
        Type::Path(path) => last_ident(path).is_some_and(|n| names.contains(&n.as_str())),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn class(ty: Type) -> Class {
        classify(&ty).class
    }

    #[test]
    fn test_text_and_scalars() {
        assert_eq!(class(parse_quote!(String)), Class::Text);
        assert_eq!(class(parse_quote!(&'static str)), Class::Text);
        assert_eq!(class(parse_quote!(Box<str>)), Class::Text);
        assert_eq!(class(parse_quote!(std::borrow::Cow<'static, str>)), Class::Text);
        assert_eq!(class(parse_quote!(u64)), Class::Scalar);
        assert_eq!(class(parse_quote!(bool)), Class::Scalar);
    }

    #[test]
    fn test_option_is_unwrapped() {
        let shape = classify(&parse_quote!(Option<i32>));
        assert!(shape.optional);
        assert_eq!(shape.class, Class::Scalar);
        assert_eq!(shape.inner, parse_quote!(i32));
    }

    #[test]
    fn test_containers() {
        assert_eq!(class(parse_quote!(Vec<u8>)), Class::Bytes);
        assert_eq!(class(parse_quote!(bytes::Bytes)), Class::Bytes);
        assert_eq!(class(parse_quote!([u8; 4])), Class::Bytes);
        assert_eq!(class(parse_quote!(Vec<String>)), Class::Sequence);
        assert_eq!(class(parse_quote!([i32; 3])), Class::Sequence);
        assert_eq!(class(parse_quote!(HashMap<String, i32>)), Class::Map);
        assert_eq!(class(parse_quote!(Arc<Vec<String>>)), Class::Sequence);
    }

    #[test]
    fn test_special_types() {
        assert_eq!(class(parse_quote!(WebContext)), Class::Context);
        assert_eq!(class(parse_quote!(daedalus::Fault)), Class::Fault);
        assert_eq!(class(parse_quote!(serde_json::Value)), Class::Struct);
        assert_eq!(class(parse_quote!(User)), Class::Struct);
        assert_eq!(class(parse_quote!((i32, i32))), Class::Unknown);
        assert_eq!(class(parse_quote!(&User)), Class::Unknown);
    }

    #[test]
    fn test_schema_availability() {
        assert!(Class::Struct.has_schema());
        assert!(Class::Text.has_schema());
        assert!(!Class::Fault.has_schema());
        assert!(!Class::Bytes.has_schema());
    }

    #[test]
    fn test_rule_target() {
        let expected: Type = parse_quote!(Address);
        let ty: Type = parse_quote!(Option<Vec<Arc<Address>>>);
        assert_eq!(rule_target(&ty), &expected);
        let ty: Type = parse_quote!(geo::Address);
        assert_eq!(rule_target(&ty), &ty);
    }

    #[test]
    fn test_ends_with() {
        let ty: Type = parse_quote!(daedalus::WebServer);
        assert!(ends_with(&ty, &["WebServer", "WebController"]));
        assert!(!ends_with(&ty, &["WebMiddleware"]));
    }
}
