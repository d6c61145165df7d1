//! # Daedalus Extract
//!
//! Request data access for parameter binding, and response builders.
//!
//! | Location | Lookup |
//! |----------|--------|
//! | path capture | [`ExtractionContext::path_param`] |
//! | query string | [`ExtractionContext::query_value`] |
//! | form field | [`ExtractionContext::form_value`] |
//! | header | [`ExtractionContext::header`] |
//! | cookie | [`ExtractionContext::cookie`] |
//! | whole body | [`decode_body`] |
//! | body member | [`body_member`] |
//!
//! ## Example
//!
//! ```rust
//! use daedalus_extract::{decode_body, ExtractionContextBuilder};
//! use http::{Method, Uri};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Filter { limit: u32 }
//!
//! let ctx = ExtractionContextBuilder::new()
//!     .method(Method::GET)
//!     .uri(Uri::from_static("/items?limit=10"))
//!     .build();
//!
//! let filter: Filter = decode_body(&ctx, None).unwrap();
//! assert_eq!(filter.limit, 10);
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod context;
mod cookie;
mod error;
mod form;
pub mod multipart;
pub mod response;

pub use body::{body_member, decode_body, decode_query, JSON};
pub use context::{ExtractionContext, ExtractionContextBuilder, MULTIPART, URLENCODED};
pub use cookie::Cookies;
pub use error::{ExtractionError, ExtractionSource};
pub use form::{FormData, UploadedFile, DEFAULT_MAX_FORM_SIZE};
pub use multipart::MultipartConfig;

pub use daedalus_router::Params;
