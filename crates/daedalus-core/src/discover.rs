//! Operation discovery.
//!
//! Every operation registered by `#[operations]` is matched against a verb
//! vocabulary: request handlers start with an HTTP verb (`get_user_me`
//! becomes `GET userme`), middleware starts with `handle`. The carrier
//! field of the parameter may override path, method and middleware; an
//! `env=` attribute may hide the operation in some runtime modes.

use crate::binding::{BoundInputField, BoundOutputField};
use crate::descriptor::{Aggregate, FieldDescriptor, Outcome};
use crate::dispatch::{self, Handler};
use crate::error::SynthesisError;
use crate::media::{self, MediaTypeSupport};
use crate::synth::split_list;
use crate::tag::Tag;
use crate::validate::Validator;
use daedalus_config::RuntimeMode;
use futures_util::future::BoxFuture;
use http::Method;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// What an operation is discovered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Request handlers, named after HTTP verbs.
    Request,
    /// Middleware, named `handle*`.
    Middleware,
}

impl Purpose {
    fn vocabulary(self) -> &'static Regex {
        static REQUEST: OnceLock<Regex> = OnceLock::new();
        static MIDDLEWARE: OnceLock<Regex> = OnceLock::new();
        match self {
            Self::Request => REQUEST.get_or_init(|| {
                Regex::new(r"^(get|post|put|patch|delete|head|connect|options|trace)")
                    .expect("valid regex")
            }),
            Self::Middleware => {
                MIDDLEWARE.get_or_init(|| Regex::new(r"^(handle)").expect("valid regex"))
            }
        }
    }

    /// Tag key naming the route path (`path`) or middleware name (`name`).
    pub fn base_key(self) -> &'static str {
        match self {
            Self::Request => "path",
            Self::Middleware => "name",
        }
    }

    /// Returns the vocabulary word `text` starts with, or `""`.
    ///
    /// ```rust
    /// use daedalus_core::Purpose;
    ///
    /// assert_eq!(Purpose::Request.match_method("getuserme"), "get");
    /// assert_eq!(Purpose::Middleware.match_method("handlecors"), "handle");
    /// assert_eq!(Purpose::Request.match_method("fetch"), "");
    /// ```
    pub fn match_method(self, text: &str) -> &str {
        self.vocabulary().find(text).map_or("", |m| m.as_str())
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Middleware => f.write_str("middleware"),
        }
    }
}

/// Lower-cases an operation name and drops underscores.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Everything known about one discovered operation.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    /// Discovery purpose.
    pub purpose: Purpose,
    /// Owning controller type.
    pub controller: &'static str,
    /// Operation (method) name.
    pub operation: &'static str,
    /// Parameter type.
    pub aggregate: &'static str,
    /// Result type.
    pub outcome: &'static str,
    /// Lower-case verb, or `handle` for middleware.
    pub method: String,
    /// Relative route path, or the middleware name.
    pub path: String,
    /// Analyzed parameter fields.
    pub in_fields: Vec<BoundInputField>,
    /// Analyzed result fields.
    pub out_fields: Vec<BoundOutputField>,
    /// Middleware applied to this route only.
    pub middleware_names: Vec<String>,
    /// Description from the carrier.
    pub description: String,
    /// The carrier's parsed `http` tag.
    pub ctx_attrs: Tag,
    /// The parameter is the bare context.
    pub bare_context: bool,
    /// Accepted body codings, resolved at registration.
    pub consumes: Vec<&'static MediaTypeSupport>,
}

impl OperationSpec {
    /// Creates an empty spec.
    pub fn new(
        purpose: Purpose,
        controller: &'static str,
        operation: &'static str,
        aggregate: &'static str,
    ) -> Self {
        Self {
            purpose,
            controller,
            operation,
            aggregate,
            outcome: "()",
            method: String::new(),
            path: String::new(),
            in_fields: Vec::new(),
            out_fields: Vec::new(),
            middleware_names: Vec::new(),
            description: String::new(),
            ctx_attrs: Tag::default(),
            bare_context: false,
            consumes: Vec::new(),
        }
    }

    /// `Controller.operation`, for diagnostics.
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.controller, self.operation)
    }

    /// The HTTP method, for request operations.
    pub fn http_method(&self) -> Option<Method> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes()).ok()
    }

    fn analyze_inputs(&mut self, descriptors: Vec<FieldDescriptor>) -> Result<(), SynthesisError> {
        let mut carriers = 0;
        for descriptor in descriptors {
            let field = BoundInputField::analyze(descriptor);
            if !field.is_carrier() {
                if !field.descriptor.ident.starts_with('_') {
                    self.in_fields.push(field);
                }
                continue;
            }

            carriers += 1;
            if carriers > 1 {
                return Err(SynthesisError::MultipleCarriers {
                    aggregate: self.aggregate,
                });
            }
            if field.has_tag {
                let attrs = &field.attrs;
                let path = attrs
                    .bare_values()
                    .find(|v| media::request_coding(v).is_none())
                    .or_else(|| attrs.get(self.purpose.base_key()).filter(|v| !v.is_empty()));
                if let Some(path) = path {
                    self.path = path.to_string();
                }
                if let Some(method) = attrs.get("method").filter(|m| !m.is_empty()) {
                    self.method = self.purpose.match_method(&method.to_lowercase()).to_string();
                }
                self.middleware_names
                    .extend(split_list(attrs.get("middleware")).map(str::to_string));
            }
            self.description = field.description.clone();
            self.ctx_attrs = field.attrs.clone();
            self.in_fields.push(field);
        }
        Ok(())
    }

    fn analyze_outputs(&mut self, descriptors: Vec<FieldDescriptor>) -> Result<(), SynthesisError> {
        for descriptor in descriptors {
            let field = BoundOutputField::analyze(descriptor, self.outcome, &self.method)?;
            self.out_fields.push(field);
        }
        Ok(())
    }
}

/// Calls an operation on its controller.
pub type OperationCall<C, P, O> = fn(Arc<C>, P) -> BoxFuture<'static, O>;

type MakeHandler<C> =
    Box<dyn Fn(Arc<C>, Arc<OperationSpec>, Arc<dyn Validator>) -> Handler + Send + Sync>;

/// A registered operation of controller `C`, with its types erased.
///
/// Built by `#[operations]`; the closure passed to [`OperationDef::new`]
/// forwards to the method.
pub struct OperationDef<C> {
    name: &'static str,
    aggregate: &'static str,
    outcome: &'static str,
    bare_context: bool,
    inputs: Vec<FieldDescriptor>,
    outputs: Vec<FieldDescriptor>,
    make: MakeHandler<C>,
}

impl<C: Send + Sync + 'static> OperationDef<C> {
    /// Registers `call` under `name`.
    pub fn new<P: Aggregate, O: Outcome>(name: &'static str, call: OperationCall<C, P, O>) -> Self {
        Self {
            name,
            aggregate: P::type_name(),
            outcome: O::type_name(),
            bare_context: P::BARE_CONTEXT,
            inputs: P::fields().into_iter().map(|f| f.descriptor).collect(),
            outputs: O::fields().into_iter().map(|f| f.descriptor).collect(),
            make: Box::new(move |instance, spec, validator| {
                dispatch::operation_handler::<C, P, O>(instance, call, spec, validator)
            }),
        }
    }

    /// The operation name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<C> fmt::Debug for OperationDef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDef")
            .field("name", &self.name)
            .field("aggregate", &self.aggregate)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// A discovered operation whose handler is not built yet.
pub struct Discovered {
    /// The analyzed operation.
    pub spec: OperationSpec,
    build: Box<dyn FnOnce(Arc<OperationSpec>) -> Handler + Send>,
}

impl Discovered {
    /// Freezes the operation spec and builds the dispatching handler.
    pub fn into_handler(self) -> (Arc<OperationSpec>, Handler) {
        let spec = Arc::new(self.spec);
        let handler = (self.build)(spec.clone());
        (spec, handler)
    }
}

impl fmt::Debug for Discovered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Discovered").field("spec", &self.spec).finish_non_exhaustive()
    }
}

/// Discovers the operations of `instance` for `purpose`.
///
/// Operations with no recognizable verb, and operations whose `env=`
/// excludes `mode`, are skipped.
pub fn discover<C: Send + Sync + 'static>(
    instance: &Arc<C>,
    controller: &'static str,
    definitions: Vec<OperationDef<C>>,
    purpose: Purpose,
    mode: RuntimeMode,
    validator: &Arc<dyn Validator>,
) -> Result<Vec<Discovered>, SynthesisError> {
    let mut discovered = Vec::new();
    for def in definitions {
        let normalized = normalize_name(def.name);
        let method = purpose.match_method(&normalized).to_string();

        let mut spec = OperationSpec::new(purpose, controller, def.name, def.aggregate);
        spec.outcome = def.outcome;
        spec.bare_context = def.bare_context;
        spec.path = normalized[method.len()..].to_string();
        spec.method = method;

        spec.analyze_inputs(def.inputs)?;
        if !spec.in_fields.iter().any(BoundInputField::is_carrier) {
            tracing::debug!(operation = %spec.display_name(), aggregate = spec.aggregate, "parameter has no context carrier, skipping");
            continue;
        }
        if let Some(env) = spec.ctx_attrs.get("env") {
            if !mode.is_in_only(env) {
                tracing::debug!(operation = %spec.display_name(), env, %mode, "operation disabled in this mode");
                continue;
            }
        }
        if spec.method.is_empty() {
            tracing::debug!(operation = %spec.display_name(), %purpose, "no verb matched, skipping");
            continue;
        }
        if purpose == Purpose::Request {
            spec.analyze_outputs(def.outputs)?;
        }

        tracing::debug!(
            operation = %spec.display_name(),
            method = %spec.method,
            path = %spec.path,
            "discovered operation"
        );

        let make = def.make;
        let instance = instance.clone();
        let validator = validator.clone();
        discovered.push(Discovered {
            spec,
            build: Box::new(move |spec| make(instance, spec, validator)),
        });
    }
    Ok(discovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WebContext;
    use crate::descriptor::{Binder, InputField, TypeClass};
    use crate::tag::Tags;
    use crate::validate::RuleValidator;

    #[derive(Default)]
    struct Ctl;

    #[derive(Default)]
    struct Tagged {
        ctx: WebContext,
    }

    impl Aggregate for Tagged {
        fn type_name() -> &'static str {
            "Tagged"
        }

        fn fields() -> Vec<InputField<Self>> {
            vec![InputField::new(
                FieldDescriptor::carrier(0, "ctx")
                    .tags(Tags::new(&[("http", "me, method=get, middleware=log & cors&"), ("description", "who am I")])),
                Binder::Context(|p: &mut Tagged, ctx| p.ctx = ctx),
            )]
        }
    }

    #[derive(Default)]
    struct DevOnly {
        ctx: WebContext,
    }

    impl Aggregate for DevOnly {
        fn type_name() -> &'static str {
            "DevOnly"
        }

        fn fields() -> Vec<InputField<Self>> {
            vec![InputField::new(
                FieldDescriptor::carrier(0, "ctx").tags(Tags::new(&[("http", "env=dev&test")])),
                Binder::Context(|p: &mut DevOnly, ctx| p.ctx = ctx),
            )]
        }
    }

    #[derive(Default)]
    struct TwoCarriers {
        a: WebContext,
        b: WebContext,
    }

    impl Aggregate for TwoCarriers {
        fn type_name() -> &'static str {
            "TwoCarriers"
        }

        fn fields() -> Vec<InputField<Self>> {
            vec![
                InputField::new(FieldDescriptor::carrier(0, "a"), Binder::Context(|p: &mut TwoCarriers, c| p.a = c)),
                InputField::new(FieldDescriptor::carrier(1, "b"), Binder::Context(|p: &mut TwoCarriers, c| p.b = c)),
            ]
        }
    }

    fn noop<P: Aggregate>(_: Arc<Ctl>, _: P) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }

    fn run(defs: Vec<OperationDef<Ctl>>, purpose: Purpose, mode: RuntimeMode) -> Result<Vec<Discovered>, SynthesisError> {
        let validator: Arc<dyn Validator> = Arc::new(RuleValidator::default());
        discover(&Arc::new(Ctl), "Ctl", defs, purpose, mode, &validator)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Get_User_Me"), "getuserme");
    }

    #[test]
    fn test_method_and_path_from_name() {
        let found = run(
            vec![OperationDef::new::<WebContext, ()>("get_user_me", noop::<WebContext>)],
            Purpose::Request,
            RuntimeMode::Dev,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].spec.method, "get");
        assert_eq!(found[0].spec.path, "userme");
        assert!(found[0].spec.bare_context);
    }

    #[test]
    fn test_bare_context_without_verb_is_skipped() {
        let found = run(
            vec![OperationDef::new::<WebContext, ()>("compute", noop::<WebContext>)],
            Purpose::Request,
            RuntimeMode::Dev,
        )
        .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_carrier_overrides() {
        let found = run(
            vec![OperationDef::new::<Tagged, ()>("fetch_profile", noop::<Tagged>)],
            Purpose::Request,
            RuntimeMode::Dev,
        )
        .unwrap();
        let spec = &found[0].spec;
        assert_eq!(spec.method, "get");
        assert_eq!(spec.path, "me");
        assert_eq!(spec.middleware_names, vec!["log", "cors"]);
        assert_eq!(spec.description, "who am I");
        assert_eq!(spec.http_method(), Some(Method::GET));
    }

    #[test]
    fn test_env_gate() {
        let defs = || vec![OperationDef::new::<DevOnly, ()>("get_debug", noop::<DevOnly>)];
        assert_eq!(run(defs(), Purpose::Request, RuntimeMode::Dev).unwrap().len(), 1);
        assert!(run(defs(), Purpose::Request, RuntimeMode::Prod).unwrap().is_empty());
    }

    #[test]
    fn test_middleware_purpose() {
        let found = run(
            vec![
                OperationDef::new::<WebContext, ()>("handle_cors", noop::<WebContext>),
                OperationDef::new::<WebContext, ()>("get_index", noop::<WebContext>),
            ],
            Purpose::Middleware,
            RuntimeMode::Dev,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].spec.path, "cors");
        assert_eq!(found[0].spec.method, "handle");
    }

    #[test]
    fn test_multiple_carriers_rejected() {
        let err = run(
            vec![OperationDef::new::<TwoCarriers, ()>("get_x", noop::<TwoCarriers>)],
            Purpose::Request,
            RuntimeMode::Dev,
        )
        .unwrap_err();
        assert!(matches!(err, SynthesisError::MultipleCarriers { aggregate: "TwoCarriers" }));
    }

    #[test]
    fn test_underscore_fields_are_ignored() {
        #[derive(Default)]
        struct Hidden {
            ctx: WebContext,
            _cache: String,
        }
        impl Aggregate for Hidden {
            fn type_name() -> &'static str {
                "Hidden"
            }
            fn fields() -> Vec<InputField<Self>> {
                vec![
                    InputField::new(FieldDescriptor::carrier(0, "ctx"), Binder::Context(|p: &mut Hidden, c| p.ctx = c)),
                    InputField::new(
                        FieldDescriptor::new(1, "_cache", TypeClass::Text),
                        Binder::Value(|p: &mut Hidden, v| {
                            p._cache = serde_json::from_value(v)?;
                            Ok(())
                        }),
                    ),
                ]
            }
        }
        let found = run(
            vec![OperationDef::new::<Hidden, ()>("get_x", noop::<Hidden>)],
            Purpose::Request,
            RuntimeMode::Dev,
        )
        .unwrap();
        assert!(found[0].spec.in_fields.iter().all(BoundInputField::is_carrier));
    }

    #[test]
    fn test_aggregate_without_carrier_is_skipped() {
        #[derive(Default)]
        struct NoCarrier {
            id: i64,
        }
        impl Aggregate for NoCarrier {
            fn type_name() -> &'static str {
                "NoCarrier"
            }
            fn fields() -> Vec<InputField<Self>> {
                vec![InputField::new(
                    FieldDescriptor::new(0, "id", TypeClass::Scalar),
                    Binder::Value(|p: &mut NoCarrier, v| {
                        p.id = serde_json::from_value(v)?;
                        Ok(())
                    }),
                )]
            }
        }
        let found = run(
            vec![
                OperationDef::new::<NoCarrier, ()>("get_plain", noop::<NoCarrier>),
                OperationDef::new::<WebContext, ()>("get_index", noop::<WebContext>),
            ],
            Purpose::Request,
            RuntimeMode::Dev,
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].spec.path, "index");
    }
}
