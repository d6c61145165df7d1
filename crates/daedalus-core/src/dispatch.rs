//! Per-request dispatch of a discovered operation.
//!
//! A dispatcher allocates a default parameter aggregate, injects the
//! context, binds every other field from its resolved location, validates,
//! invokes the operation, and writes the first present result field.
//! Missing or unparsable values leave their field at its default and are
//! only logged.

use crate::binding::{BindingLocation, BoundInputField, BoundOutputField};
use crate::context::WebContext;
use crate::descriptor::{Aggregate, Binder, InputField, OutputField, OutputValue, Outcome, TypeClass};
use crate::discover::{OperationCall, OperationSpec};
use crate::error::WebError;
use crate::media;
use crate::validate::{FieldValue, Validator};
use daedalus_extract::decode_body;
use futures_util::future::BoxFuture;
use http::StatusCode;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// A type-erased step of a route's handler chain.
pub type Handler = Arc<dyn Fn(WebContext) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure as a [`Handler`].
///
/// ```rust
/// use daedalus_core::{handler, WebContext};
/// use http::StatusCode;
///
/// let h = handler(|ctx: WebContext| async move {
///     ctx.text(StatusCode::OK, "pong");
/// });
/// # let _ = h;
/// ```
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(WebContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx: WebContext| -> BoxFuture<'static, ()> { Box::pin(f(ctx)) })
}

/// Builds the dispatcher of one operation.
pub(crate) fn operation_handler<C, P, O>(
    instance: Arc<C>,
    call: OperationCall<C, P, O>,
    spec: Arc<OperationSpec>,
    validator: Arc<dyn Validator>,
) -> Handler
where
    C: Send + Sync + 'static,
    P: Aggregate,
    O: Outcome,
{
    let inputs: Arc<Vec<InputField<P>>> = Arc::new(P::fields());
    let outputs: Arc<Vec<OutputField<O>>> = Arc::new(O::fields());
    Arc::new(move |ctx: WebContext| -> BoxFuture<'static, ()> {
        let instance = instance.clone();
        let spec = spec.clone();
        let validator = validator.clone();
        let inputs = inputs.clone();
        let outputs = outputs.clone();
        Box::pin(async move {
            let params = match bind_inputs::<P>(&ctx, &spec, &inputs, validator.as_ref()) {
                Some(params) => params,
                None => return,
            };
            let mut outcome = call(instance, params).await;
            write_outputs(&ctx, &spec, &outputs, &mut outcome);
        })
    })
}

/// Binds and validates the parameter aggregate.
///
/// Returns `None` after writing a 400 response when validation fails.
fn bind_inputs<P: Aggregate>(
    ctx: &WebContext,
    spec: &OperationSpec,
    inputs: &[InputField<P>],
    validator: &dyn Validator,
) -> Option<P> {
    let mut params = P::default();
    let fallback = spec.consumes.first().map(|m| m.content_type);
    let field_of = |index| inputs.iter().find(|f| f.descriptor.index == index);

    for bound in &spec.in_fields {
        let Some(field) = field_of(bound.descriptor.index) else {
            continue;
        };
        match &field.binder {
            Binder::Context(set) => set(&mut params, ctx.clone()),
            Binder::Whole(set) => {
                if let Err(err) = set(&mut params, ctx.request(), fallback) {
                    tracing::debug!(
                        operation = spec.operation,
                        field = %bound.preferred_name,
                        error = %err,
                        "failed to decode request body"
                    );
                }
            }
            Binder::Value(set) => match lookup(ctx, bound, fallback) {
                Some(value) => {
                    if let Err(err) = set(&mut params, coerce(value, bound.descriptor.class)) {
                        tracing::debug!(
                            operation = spec.operation,
                            field = %bound.preferred_name,
                            error = %err,
                            "failed to parse request value"
                        );
                    }
                }
                None => tracing::trace!(
                    operation = spec.operation,
                    field = %bound.preferred_name,
                    location = ?bound.location,
                    "request value not present"
                ),
            },
        }
    }

    let mut values = Vec::new();
    for bound in spec.in_fields.iter().filter(|b| !b.is_carrier()) {
        let Some((read, members)) = field_of(bound.descriptor.index).and_then(|f| Some((f.read?, &f.members))) else {
            continue;
        };
        match read(&params) {
            Ok(value) => values.push(FieldValue {
                name: &bound.preferred_name,
                tags: bound.descriptor.tags,
                value,
                members,
            }),
            Err(err) => tracing::debug!(field = %bound.preferred_name, error = %err, "field not readable for validation"),
        }
    }
    if let Err(errors) = validator.validate(&values) {
        tracing::debug!(operation = spec.operation, %errors, "validation failed");
        ctx.json(
            StatusCode::BAD_REQUEST,
            &WebError::from_status(StatusCode::BAD_REQUEST, errors.to_string()),
        );
        return None;
    }
    Some(params)
}

/// The raw value of a field; a body field receives the whole decoded body.
fn lookup(ctx: &WebContext, bound: &BoundInputField, fallback: Option<&str>) -> Option<Value> {
    if bound.location != Some(BindingLocation::Body) {
        return ctx.request_value(&bound.preferred_name, bound.location);
    }
    if ctx.request().is_body_empty() {
        return None;
    }
    match decode_body::<Value>(ctx.request(), fallback) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(field = %bound.preferred_name, error = %err, "failed to decode request body");
            None
        }
    }
}

/// Non-text fields receive text parsed as JSON; text fields keep it raw.
fn coerce(value: Value, class: TypeClass) -> Value {
    match value {
        Value::String(text) if class != TypeClass::Text => {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        other => other,
    }
}

/// Writes the first present result field.
fn write_outputs<O: Outcome>(
    ctx: &WebContext,
    spec: &OperationSpec,
    outputs: &[OutputField<O>],
    outcome: &mut O,
) {
    for bound in &spec.out_fields {
        let Some(field) = outputs.iter().find(|f| f.descriptor.index == bound.descriptor.index) else {
            continue;
        };
        match (field.take)(outcome) {
            Ok(None) => continue,
            Ok(Some(value)) => {
                write_value(ctx, bound, value);
                return;
            }
            Err(err) => {
                tracing::error!(operation = spec.operation, field = bound.descriptor.ident, error = %err, "failed to encode result");
                ctx.json(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &WebError::from_status(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
                );
                return;
            }
        }
    }
}

fn write_value(ctx: &WebContext, bound: &BoundOutputField, value: OutputValue) {
    let status = StatusCode::from_bytes(bound.status.as_bytes()).unwrap_or(StatusCode::OK);
    let content_type = bound.format.content_type;
    match value {
        OutputValue::Text(text) => ctx.bytes(status, content_type, text),
        OutputValue::Bytes(bytes) => ctx.bytes(status, content_type, bytes),
        OutputValue::Error(fault) => {
            let status = fault.status().unwrap_or(status);
            let payload = WebError::from_status(status, fault.message());
            match serde_json::to_value(&payload) {
                Ok(data) => write_data(ctx, bound, status, &data),
                Err(err) => tracing::error!(error = %err, "failed to encode error result"),
            }
        }
        OutputValue::Data(data) => write_data(ctx, bound, status, &data),
    }
}

fn write_data(ctx: &WebContext, bound: &BoundOutputField, status: StatusCode, data: &Value) {
    let format = bound.format;
    match format.content_type {
        ct if ct == media::JSON.content_type => ctx.json(status, data),
        ct if ct == media::XML.content_type => ctx.xml_named(status, bound.descriptor.ident, data),
        ct if ct == media::PLAIN_TEXT.content_type => ctx.text(status, display(data)),
        ct if ct == media::HTML.content_type => ctx.html(status, display(data)),
        other => tracing::warn!(
            field = bound.descriptor.ident,
            format = other,
            "unsupported response format, response left unwritten"
        ),
    }
}

fn display(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::resolve_request;
    use crate::descriptor::FieldDescriptor;
    use crate::discover::Purpose;
    use crate::error::Fault;
    use crate::tag::Tags;
    use crate::validate::RuleValidator;
    use daedalus_extract::ExtractionContextBuilder;
    use http::Method;

    #[derive(Default)]
    struct Lookup {
        ctx: WebContext,
        id: i64,
        name: String,
    }

    impl Aggregate for Lookup {
        fn type_name() -> &'static str {
            "Lookup"
        }

        fn fields() -> Vec<InputField<Self>> {
            vec![
                InputField::new(FieldDescriptor::carrier(0, "ctx"), Binder::Context(|p: &mut Lookup, c| p.ctx = c)),
                InputField::new(
                    FieldDescriptor::new(1, "id", TypeClass::Scalar)
                        .tags(Tags::new(&[("validate", "gte=100,lte=999")])),
                    Binder::Value(|p: &mut Lookup, v| {
                        p.id = serde_json::from_value(v)?;
                        Ok(())
                    }),
                )
                .with_read(|p| serde_json::to_value(p.id)),
                InputField::new(
                    FieldDescriptor::new(2, "name", TypeClass::Text),
                    Binder::Value(|p: &mut Lookup, v| {
                        p.name = serde_json::from_value(v)?;
                        Ok(())
                    }),
                ),
            ]
        }
    }

    #[derive(Default)]
    struct Found {
        data: Option<String>,
        err: Option<Fault>,
    }

    impl Outcome for Found {
        fn type_name() -> &'static str {
            "Found"
        }

        fn fields() -> Vec<OutputField<Self>> {
            vec![
                OutputField::new(FieldDescriptor::new(0, "data", TypeClass::Text).optional(), |o: &mut Found| {
                    Ok(o.data.take().map(OutputValue::Text))
                }),
                OutputField::new(
                    FieldDescriptor::new(1, "not_found_404", TypeClass::Fault).optional(),
                    |o: &mut Found| Ok(o.err.take().map(OutputValue::Error)),
                ),
            ]
        }
    }

    struct Users;

    fn get_user(_: Arc<Users>, p: Lookup) -> BoxFuture<'static, Found> {
        Box::pin(async move {
            if p.id == 404 {
                Found {
                    err: Some(Fault::new("no such user")),
                    ..Found::default()
                }
            } else {
                Found {
                    data: Some(format!("{}:{}", p.id, p.name)),
                    ..Found::default()
                }
            }
        })
    }

    fn build() -> Handler {
        let mut spec = OperationSpec::new(Purpose::Request, "Users", "get_user", "Lookup");
        spec.method = "get".into();
        spec.in_fields = Lookup::fields()
            .into_iter()
            .map(|f| BoundInputField::analyze(f.descriptor))
            .collect();
        spec.out_fields = Found::fields()
            .into_iter()
            .map(|f| BoundOutputField::analyze(f.descriptor, "Found", "get").unwrap())
            .collect();
        resolve_request(&mut spec, &[]).unwrap();
        operation_handler::<Users, Lookup, Found>(
            Arc::new(Users),
            get_user,
            Arc::new(spec),
            Arc::new(RuleValidator::default()),
        )
    }

    fn ctx(uri: &str) -> WebContext {
        WebContext::new(
            ExtractionContextBuilder::new()
                .method(Method::GET)
                .uri(uri.parse().unwrap())
                .build(),
        )
    }

    #[tokio::test]
    async fn test_binds_and_writes_text() {
        let ctx = ctx("/user?id=123&name=ann");
        build()(ctx.clone()).await;
        let resp = ctx.finish();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), b"123:ann");
    }

    #[tokio::test]
    async fn test_validation_failure_is_400() {
        let ctx = ctx("/user?id=50");
        build()(ctx.clone()).await;
        let resp = ctx.finish();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: WebError = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.code, "400");
        assert!(body.message.contains("gte"));
    }

    #[tokio::test]
    async fn test_unparsable_value_stays_default() {
        let ctx = ctx("/user?id=abc");
        build()(ctx.clone()).await;
        assert_eq!(ctx.finish().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_field_status_from_name() {
        let ctx = ctx("/user?id=404");
        build()(ctx.clone()).await;
        let resp = ctx.finish();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: WebError = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, WebError::new("no such user", "404"));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce(Value::String("12".into()), TypeClass::Scalar), serde_json::json!(12));
        assert_eq!(coerce(Value::String("12".into()), TypeClass::Text), serde_json::json!("12"));
        assert_eq!(coerce(Value::String("x y".into()), TypeClass::Scalar), serde_json::json!("x y"));
    }
}
