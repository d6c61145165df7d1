//! Procedural macros for Daedalus controllers.
//!
//! Controllers, their parameter aggregates and their result structs are
//! described at compile time; the runtime in `daedalus-core` reads those
//! descriptions to discover operations, bind requests and synthesize routes.
//!
//! # Example
//!
//! ```rust,ignore
//! use daedalus::prelude::*;
//!
//! #[derive(Default, Aggregate)]
//! struct GetUser {
//!     #[http("user/:id")]
//!     ctx: WebContext,
//!     #[validate("required")]
//!     pub id: String,
//! }
//!
//! #[derive(Default, Outcome)]
//! struct UserResult {
//!     pub data: Option<User>,
//!     pub not_found_404: Option<Fault>,
//! }
//!
//! #[derive(Controller)]
//! struct Users {
//!     #[http("tag=users")]
//!     controller: WebController,
//! }
//!
//! #[operations]
//! impl Users {
//!     pub async fn get_user(&self, params: GetUser) -> UserResult {
//!         UserResult::default()
//!     }
//! }
//! ```
//!
//! # Field attributes
//!
//! - `#[http("...")]`: route and binding attributes
//! - `#[validate("...")]`: validation rules
//! - `#[description("...")]`: documentation text
//! - `#[tag(name = "...")]`: any other named tag
//! - `#[middleware]` / `#[extender]`: mounted `Arc<T>` controllers
//! - `#[inject]` / `#[inject("name")]`: references resolved at construction
//! - `#[daedalus(no_schema)]`: no schema in the API document
//! - `#[daedalus(nested)]`: the member rules of the field's type apply

mod aggregate;
mod class;
mod controller;
mod field;
mod operations;
mod outcome;
mod parse;
mod rules;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemImpl};

/// Derives `Aggregate`: the field table of an operation parameter.
///
/// A `WebContext` field is the context carrier; its `#[http]` tag holds
/// the route path and overrides. Struct-typed fields are decoded from the
/// whole body (or the query for bodyless verbs). When the struct has a
/// single named carrier, it also dereferences to `WebContext`.
#[proc_macro_derive(Aggregate, attributes(http, validate, description, tag, daedalus))]
pub fn derive_aggregate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    aggregate::expand_aggregate(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `Outcome`: the field table of an operation result.
///
/// Field names carry the status code (`data_201`, `not_found_404`); the
/// first present field is written.
#[proc_macro_derive(Outcome, attributes(http, validate, description, tag, daedalus))]
pub fn derive_outcome(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    outcome::expand_outcome(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `Validate`: the member rules of a body struct.
///
/// Fields with `#[validate("...")]` contribute a rule under their serde
/// name; `#[daedalus(nested)]` fields contribute the rules of their type.
///
/// ```rust,ignore
/// #[derive(Default, Deserialize, Serialize, Validate)]
/// struct NewUser {
///     #[validate("required,alphanum")]
///     pub login: String,
///     #[daedalus(nested)]
///     pub address: Option<Address>,
/// }
/// ```
#[proc_macro_derive(Validate, attributes(validate, description, tag, daedalus))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    rules::expand_validate(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `Controller` and `Construct`.
///
/// Fields of type `WebServer`, `WebController` or `WebMiddleware` declare
/// the role; `#[middleware]` and `#[extender]` fields mount other
/// controllers. Use `#[daedalus(no_construct)]` to write `Construct` by
/// hand, and `#[daedalus(no_operations)]` for a controller without methods.
#[proc_macro_derive(Controller, attributes(http, description, tag, middleware, extender, inject, daedalus))]
pub fn derive_controller(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    controller::expand_controller(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Registers the operation methods of an inherent impl block.
///
/// Methods whose names start with a verb (`get_user`, `handle_log`) are
/// registered. Mark a method `#[operation]` when its verb comes from a
/// `method=` override, or `#[operation(skip)]` to keep it out.
///
/// ```rust,ignore
/// #[operations]
/// impl Users {
///     pub async fn post_user(&self, params: NewUser) -> Created { ... }
///
///     pub fn setup_router(&self, scope: &mut RouteScope<'_>) -> Result<(), SynthesisError> {
///         scope.get("/health", handler(|ctx| async move { ctx.text(StatusCode::OK, "ok") }))
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn operations(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as parse::OperationsArgs);
    let item = parse_macro_input!(item as ItemImpl);
    operations::expand_operations(args, item)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
