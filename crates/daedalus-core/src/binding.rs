//! Parameter and result binding analysis.
//!
//! Parameter fields get a preferred name when their operation is
//! discovered; their request location and the body codings of the route
//! are resolved at registration time, once the full path and its captures
//! are known. Result fields get a status code and a response format.

use crate::descriptor::{is_writable_output, FieldDescriptor, FieldRole, TypeClass, ValueKind};
use crate::discover::OperationSpec;
use crate::error::SynthesisError;
use crate::media::{self, MediaTypeSupport};
use crate::tag::Tag;
use daedalus_docs::ParameterIn;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Name of the tag holding routing attributes.
pub const HTTP_TAG: &str = "http";

/// Name of the tag holding a human description.
pub const DESCRIPTION_TAG: &str = "description";

/// Where a parameter value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingLocation {
    /// A path capture.
    Path,
    /// The query string.
    Query,
    /// A request header.
    Header,
    /// A cookie.
    Cookie,
    /// The request body (a JSON member or the whole body).
    Body,
    /// A form field of an urlencoded or multipart body.
    Form,
}

impl BindingLocation {
    /// Parses an `in=` attribute. `form` is not accepted there.
    pub fn from_in(value: &str) -> Option<Self> {
        match value {
            "header" => Some(Self::Header),
            "query" => Some(Self::Query),
            "path" => Some(Self::Path),
            "cookie" => Some(Self::Cookie),
            "body" => Some(Self::Body),
            _ => None,
        }
    }

    /// Lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
            Self::Form => "form",
        }
    }

    /// The OpenAPI parameter location, for locations that have one.
    pub fn parameter_in(self) -> Option<ParameterIn> {
        match self {
            Self::Path => Some(ParameterIn::Path),
            Self::Query => Some(ParameterIn::Query),
            Self::Header => Some(ParameterIn::Header),
            Self::Cookie => Some(ParameterIn::Cookie),
            Self::Body | Self::Form => None,
        }
    }
}

impl fmt::Display for BindingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An analyzed parameter field.
#[derive(Debug, Clone)]
pub struct BoundInputField {
    /// Static description.
    pub descriptor: FieldDescriptor,
    /// Whether an `http` tag was present.
    pub has_tag: bool,
    /// Parsed `http` tag.
    pub attrs: Tag,
    /// Name used for lookup and documentation.
    pub preferred_name: String,
    /// Text of the `description` tag.
    pub description: String,
    /// Resolved at registration; `None` for the context carrier.
    pub location: Option<BindingLocation>,
    /// Declared with a bare `required`.
    pub required: bool,
}

impl BoundInputField {
    /// Analyzes one parameter field.
    pub fn analyze(descriptor: FieldDescriptor) -> Self {
        let raw = descriptor.tags.lookup(HTTP_TAG);
        let attrs = raw.map(Tag::parse).unwrap_or_default();
        let preferred_name = match descriptor.role {
            FieldRole::Bindable => attrs
                .preferred("name", true)
                .unwrap_or(descriptor.display_name())
                .to_string(),
            FieldRole::ContextCarrier => String::new(),
        };
        let required = attrs.contains_bare("required");
        Self {
            description: descriptor.tags.lookup(DESCRIPTION_TAG).unwrap_or_default().to_string(),
            has_tag: raw.is_some(),
            attrs,
            preferred_name,
            location: None,
            required,
            descriptor,
        }
    }

    /// `true` for the context carrier.
    pub fn is_carrier(&self) -> bool {
        self.descriptor.role == FieldRole::ContextCarrier
    }

    /// `true` for fields decoded from the whole body.
    pub fn is_whole(&self) -> bool {
        self.descriptor.class == TypeClass::Struct
    }
}

/// An analyzed result field.
#[derive(Debug, Clone)]
pub struct BoundOutputField {
    /// Static description.
    pub descriptor: FieldDescriptor,
    /// Parsed `http` tag.
    pub attrs: Tag,
    /// Three-digit status code.
    pub status: String,
    /// Response format.
    pub format: &'static MediaTypeSupport,
    /// Text of the `description` tag.
    pub description: String,
}

impl BoundOutputField {
    /// Analyzes one result field of an operation answering `method`.
    pub fn analyze(
        descriptor: FieldDescriptor,
        outcome: &'static str,
        method: &str,
    ) -> Result<Self, SynthesisError> {
        if !descriptor.named || !descriptor.public {
            return Err(SynthesisError::HiddenOutput {
                outcome,
                field: descriptor.display_name().to_string(),
            });
        }
        if !is_writable_output(&descriptor) {
            return Err(SynthesisError::UnsupportedOutput {
                outcome,
                field: descriptor.ident.to_string(),
                type_name: descriptor.type_name,
            });
        }

        let raw = descriptor.tags.lookup(HTTP_TAG);
        let attrs = raw.map(Tag::parse).unwrap_or_default();
        let is_error = descriptor.class == TypeClass::Fault;

        let status_text = attrs.preferred("status", true).unwrap_or(descriptor.ident);
        let status = match status_code(status_text) {
            Some(code) if code != "default" => code,
            _ => default_status(method, is_error).to_string(),
        };

        let format = attrs
            .bare_values()
            .find_map(media::response_format)
            .unwrap_or_else(|| infer_format(descriptor.class));

        Ok(Self {
            description: descriptor.tags.lookup(DESCRIPTION_TAG).unwrap_or_default().to_string(),
            attrs,
            status,
            format,
            descriptor,
        })
    }
}

fn status_regex() -> &'static Regex {
    static STATUS: OnceLock<Regex> = OnceLock::new();
    STATUS.get_or_init(|| {
        Regex::new(r"^((\w*[\D+|^][2-5]\d{2})|default|([2-5]\d{2}))$").expect("valid regex")
    })
}

/// Extracts a status code from a status attribute or field name.
///
/// Returns the trailing three digits, `"default"`, or `None` when the
/// text names no code.
///
/// ```rust
/// use daedalus_core::status_code;
///
/// assert_eq!(status_code("404").as_deref(), Some("404"));
/// assert_eq!(status_code("NotFound404").as_deref(), Some("404"));
/// assert_eq!(status_code("not_found_404").as_deref(), Some("404"));
/// assert_eq!(status_code("Default").as_deref(), Some("default"));
/// assert_eq!(status_code("data"), None);
/// assert_eq!(status_code("600"), None);
/// ```
pub fn status_code(text: &str) -> Option<String> {
    let text = text.to_lowercase();
    let found = status_regex().find(&text)?.as_str();
    if found.len() < 3 {
        return None;
    }
    if found == "default" {
        return Some(found.to_string());
    }
    Some(found[found.len() - 3..].to_string())
}

/// The status used when a result field names none.
pub fn default_status(method: &str, is_error: bool) -> &'static str {
    if is_error {
        return "400";
    }
    match method {
        "post" | "put" => "201",
        _ => "200",
    }
}

/// The response format implied by a field's type.
pub fn infer_format(class: TypeClass) -> &'static MediaTypeSupport {
    match class {
        TypeClass::Text | TypeClass::Scalar => &media::PLAIN_TEXT,
        TypeClass::Bytes => &media::OCTET_STREAM,
        _ => &media::JSON,
    }
}

/// `true` for verbs that carry a request body.
pub fn carries_body(method: &str) -> bool {
    matches!(method, "post" | "put" | "patch")
}

/// Resolves parameter locations and body codings of a registered route.
///
/// `captures` are the path capture names of the full route path. Every
/// declaration error here is fatal.
pub fn resolve_request(spec: &mut OperationSpec, captures: &[String]) -> Result<(), SynthesisError> {
    let operation = spec.display_name();
    let body_verb = carries_body(&spec.method);

    let mut consumes: Vec<&'static MediaTypeSupport> = Vec::new();
    let (mut objective, mut form_coding) = (0_usize, 0_usize);
    for value in spec.ctx_attrs.bare_values() {
        if let Some(coding) = media::request_coding(value) {
            if coding.is_objective() {
                objective += 1;
            } else {
                form_coding += 1;
            }
            consumes.push(coding);
        }
    }
    if objective > 0 && form_coding > 0 {
        return Err(SynthesisError::MixedCoding { operation });
    }
    if !consumes.is_empty() && !body_verb {
        return Err(SynthesisError::CodingWithoutBody {
            operation,
            method: spec.method.clone(),
        });
    }

    let (mut form_fields, mut body_fields) = (0_usize, 0_usize);
    for field in spec.in_fields.iter_mut().filter(|f| !f.is_carrier()) {
        let kind = field.descriptor.class.value_kind();
        if kind == ValueKind::Unsupported {
            return Err(SynthesisError::UnsupportedField {
                operation,
                field: field.preferred_name.clone(),
                type_name: field.descriptor.type_name,
            });
        }

        let location = if captures.iter().any(|c| *c == field.preferred_name) {
            BindingLocation::Path
        } else if let Some(value) = field.attrs.get("in") {
            BindingLocation::from_in(value).ok_or_else(|| SynthesisError::UnsupportedLocation {
                operation: operation.clone(),
                field: field.preferred_name.clone(),
                location: value.to_string(),
            })?
        } else if body_verb {
            match kind {
                ValueKind::Array | ValueKind::Object => BindingLocation::Body,
                _ => BindingLocation::Form,
            }
        } else {
            BindingLocation::Query
        };

        match location {
            BindingLocation::Form => form_fields += 1,
            BindingLocation::Body => body_fields += 1,
            _ => {}
        }
        field.location = Some(location);
    }

    if body_verb && consumes.is_empty() {
        consumes.push(if body_fields > 0 { &media::JSON } else { &media::URLENCODED });
    }
    if form_fields > 0 && body_fields > 0 {
        return Err(SynthesisError::FormAndBody { operation });
    }
    if body_fields > 1 {
        return Err(SynthesisError::MultipleBodies { operation });
    }

    spec.consumes = consumes;
    Ok(())
}
