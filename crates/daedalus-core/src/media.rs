//! The media-type registry.
//!
//! Short abbreviations used in tags (`json`, `form`, `png`) map to a full
//! content type, an encoding kind, and whether the type may appear on the
//! request side, the response side, or both.

/// How a media type carries its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Flat text or key/value pairs.
    Plain,
    /// A structured document (JSON, XML).
    Objective,
    /// Raw bytes.
    Stream,
}

/// A registry entry.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaTypeSupport {
    /// Abbreviations accepted in tags, lower case.
    pub aliases: &'static [&'static str],
    /// Full content type.
    pub content_type: &'static str,
    /// Encoding kind.
    pub kind: MediaKind,
    /// May describe a request body.
    pub request: bool,
    /// May describe a response body.
    pub response: bool,
}

impl MediaTypeSupport {
    /// Returns `true` for structured document types.
    pub fn is_objective(&self) -> bool {
        self.kind == MediaKind::Objective
    }
}

/// `application/json`
pub static JSON: MediaTypeSupport = MediaTypeSupport {
    aliases: &["json"],
    content_type: "application/json",
    kind: MediaKind::Objective,
    request: true,
    response: true,
};

/// `application/xml`
pub static XML: MediaTypeSupport = MediaTypeSupport {
    aliases: &["xml"],
    content_type: "application/xml",
    kind: MediaKind::Objective,
    request: true,
    response: true,
};

/// `multipart/form-data`
pub static MULTIPART: MediaTypeSupport = MediaTypeSupport {
    aliases: &["form", "multipart"],
    content_type: "multipart/form-data",
    kind: MediaKind::Plain,
    request: true,
    response: false,
};

/// `application/x-www-form-urlencoded`
pub static URLENCODED: MediaTypeSupport = MediaTypeSupport {
    aliases: &["urlenc", "urlencoded"],
    content_type: "application/x-www-form-urlencoded",
    kind: MediaKind::Plain,
    request: true,
    response: false,
};

/// `text/plain`
pub static PLAIN_TEXT: MediaTypeSupport = MediaTypeSupport {
    aliases: &["plain", "text"],
    content_type: "text/plain",
    kind: MediaKind::Plain,
    request: false,
    response: true,
};

/// `text/html`
pub static HTML: MediaTypeSupport = MediaTypeSupport {
    aliases: &["html"],
    content_type: "text/html",
    kind: MediaKind::Plain,
    request: false,
    response: true,
};

/// `application/octet-stream`
pub static OCTET_STREAM: MediaTypeSupport = MediaTypeSupport {
    aliases: &["octet", "stream", "binary"],
    content_type: "application/octet-stream",
    kind: MediaKind::Stream,
    request: false,
    response: true,
};

/// `image/png`
pub static PNG: MediaTypeSupport = MediaTypeSupport {
    aliases: &["png"],
    content_type: "image/png",
    kind: MediaKind::Stream,
    request: false,
    response: true,
};

/// `image/jpeg`
pub static JPEG: MediaTypeSupport = MediaTypeSupport {
    aliases: &["jpeg", "jpg"],
    content_type: "image/jpeg",
    kind: MediaKind::Stream,
    request: false,
    response: true,
};

static REGISTRY: [&MediaTypeSupport; 9] = [
    &JSON,
    &XML,
    &MULTIPART,
    &URLENCODED,
    &PLAIN_TEXT,
    &HTML,
    &OCTET_STREAM,
    &PNG,
    &JPEG,
];

/// Every registered media type.
pub fn registry() -> &'static [&'static MediaTypeSupport] {
    &REGISTRY
}

/// Looks up an abbreviation, ignoring case.
///
/// ```rust
/// use daedalus_core::media;
///
/// assert_eq!(media::lookup("JSON").unwrap().content_type, "application/json");
/// assert!(media::lookup("yaml").is_none());
/// ```
pub fn lookup(abbr: &str) -> Option<&'static MediaTypeSupport> {
    let abbr = abbr.trim().to_ascii_lowercase();
    REGISTRY
        .iter()
        .copied()
        .find(|m| m.aliases.contains(&abbr.as_str()))
}

/// Looks up a full content type, ignoring parameters such as `charset`.
pub fn by_content_type(content_type: &str) -> Option<&'static MediaTypeSupport> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    REGISTRY.iter().copied().find(|m| m.content_type == essence)
}

/// Looks up an abbreviation usable as a request body coding.
pub fn request_coding(abbr: &str) -> Option<&'static MediaTypeSupport> {
    lookup(abbr).filter(|m| m.request)
}

/// Looks up an abbreviation usable as a response format.
pub fn response_format(abbr: &str) -> Option<&'static MediaTypeSupport> {
    lookup(abbr).filter(|m| m.response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_same_entry() {
        assert_eq!(lookup("form"), lookup("multipart"));
        assert_eq!(lookup("urlenc"), lookup("urlencoded"));
        assert_eq!(lookup("jpg").unwrap().content_type, "image/jpeg");
    }

    #[test]
    fn test_request_and_response_sides() {
        assert!(request_coding("json").is_some());
        assert!(request_coding("png").is_none());
        assert!(response_format("form").is_none());
        assert!(response_format("html").is_some());
    }

    #[test]
    fn test_by_content_type_ignores_parameters() {
        let m = by_content_type("application/json; charset=utf-8").unwrap();
        assert!(m.is_objective());
        assert_eq!(by_content_type("text/plain").unwrap().kind, MediaKind::Plain);
    }

    #[test]
    fn test_aliases_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for m in registry() {
            for alias in m.aliases {
                assert!(seen.insert(*alias), "duplicate alias {alias}");
            }
        }
    }
}
