//! Whole-body structured decoding.
//!
//! A struct-shaped parameter is filled from the complete request rather than
//! from a single key. The decoder is chosen from the request's Content-Type;
//! a fallback type is used when the client sent none.

use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::{MULTIPART, URLENCODED};
use crate::{ExtractionContext, ExtractionError, ExtractionSource};

/// Content type of JSON bodies.
pub const JSON: &str = "application/json";

/// Content type of XML bodies.
pub const XML: &str = "application/xml";

/// Decodes the whole request into `T`.
///
/// `GET`, `HEAD` and `DELETE` requests, and requests with an empty body,
/// are decoded from the query string instead.
///
/// # Example
///
/// ```rust
/// use daedalus_extract::{decode_body, ExtractionContextBuilder};
/// use http::Method;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Item { a: i32, b: String }
///
/// let ctx = ExtractionContextBuilder::new()
///     .method(Method::POST)
///     .header("content-type", "application/json")
///     .body(r#"{"a":123,"b":"x"}"#)
///     .build();
///
/// let item: Item = decode_body(&ctx, None).unwrap();
/// assert_eq!(item.a, 123);
/// ```
pub fn decode_body<T: DeserializeOwned>(
    ctx: &ExtractionContext,
    fallback_content_type: Option<&str>,
) -> Result<T, ExtractionError> {
    let bodyless = matches!(*ctx.method(), Method::GET | Method::HEAD | Method::DELETE);
    if bodyless || (ctx.is_body_empty() && ctx.form().is_empty()) {
        return decode_query(ctx);
    }

    let essence = ctx
        .mime()
        .map(|m| m.essence_str().to_string())
        .or_else(|| fallback_content_type.map(str::to_string));

    match essence.as_deref() {
        Some(JSON) | None => serde_json::from_slice(ctx.body())
            .map_err(|e| ExtractionError::decode(ExtractionSource::Body, e.to_string())),
        Some(XML | "text/xml") => quick_xml::de::from_reader(&ctx.body()[..])
            .map_err(|e| ExtractionError::decode(ExtractionSource::Body, e.to_string())),
        Some(URLENCODED) => serde_urlencoded::from_bytes(ctx.body())
            .map_err(|e| ExtractionError::decode(ExtractionSource::Form, e.to_string())),
        Some(MULTIPART) => {
            let encoded = ctx.form().to_urlencoded()?;
            serde_urlencoded::from_str(&encoded)
                .map_err(|e| ExtractionError::decode(ExtractionSource::Form, e.to_string()))
        }
        Some(other) => Err(ExtractionError::unsupported_media_type(JSON, Some(other))),
    }
}

/// Decodes the query string into `T`.
pub fn decode_query<T: DeserializeOwned>(ctx: &ExtractionContext) -> Result<T, ExtractionError> {
    serde_urlencoded::from_str(ctx.query_string().unwrap_or(""))
        .map_err(|e| ExtractionError::decode(ExtractionSource::Query, e.to_string()))
}

/// Looks up a single member of the body.
///
/// JSON objects yield the member value; form bodies yield the field as a
/// JSON string.
#[must_use]
pub fn body_member(ctx: &ExtractionContext, name: &str) -> Option<Value> {
    if let Some(text) = ctx.form_value(name) {
        return Some(Value::String(text.to_string()));
    }
    if ctx.is_body_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(ctx.body()) {
        Ok(Value::Object(mut map)) => map.remove(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionContextBuilder;
    use http::Uri;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: i32,
        b: String,
    }

    #[test]
    fn test_decode_urlencoded_body() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::PUT)
            .header("content-type", "application/x-www-form-urlencoded")
            .body("a=7&b=seven")
            .build();
        let pair: Pair = decode_body(&ctx, None).unwrap();
        assert_eq!(pair, Pair { a: 7, b: "seven".into() });
    }

    #[test]
    fn test_decode_get_uses_query() {
        let ctx = ExtractionContextBuilder::new()
            .uri(Uri::from_static("/items?a=1&b=q"))
            .build();
        let pair: Pair = decode_body(&ctx, None).unwrap();
        assert_eq!(pair, Pair { a: 1, b: "q".into() });
    }

    #[test]
    fn test_decode_fallback_content_type() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .body("a=2&b=two")
            .build();
        let pair: Pair = decode_body(&ctx, Some(URLENCODED)).unwrap();
        assert_eq!(pair.a, 2);
    }

    #[test]
    fn test_decode_xml_body() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .header("content-type", "application/xml; charset=utf-8")
            .body("<pair><a>5</a><b>five</b></pair>")
            .build();
        let pair: Pair = decode_body(&ctx, None).unwrap();
        assert_eq!(pair, Pair { a: 5, b: "five".into() });
    }

    #[test]
    fn test_decode_xml_fallback_rejects_malformed() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::PUT)
            .body("<pair><a>5</a>")
            .build();
        let err = decode_body::<Pair>(&ctx, Some(XML)).unwrap_err();
        assert_eq!(err.extraction_source(), ExtractionSource::Body);
    }

    #[test]
    fn test_decode_unsupported_type() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .header("content-type", "text/csv")
            .body("a,b")
            .build();
        let err = decode_body::<Pair>(&ctx, None).unwrap_err();
        assert_eq!(err.extraction_source(), ExtractionSource::ContentType);
    }

    #[test]
    fn test_body_member_json() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .header("content-type", "application/json")
            .body(r#"{"tags":["x","y"],"n":3}"#)
            .build();
        assert_eq!(body_member(&ctx, "n"), Some(Value::from(3)));
        assert_eq!(body_member(&ctx, "tags").unwrap().as_array().map(Vec::len), Some(2));
        assert_eq!(body_member(&ctx, "none"), None);
    }
}
