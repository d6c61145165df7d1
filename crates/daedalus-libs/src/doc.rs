//! Serves the synthesized OpenAPI document and a Swagger UI page.
//!
//! Mount [`DocController`] as an extender of the server. When
//! `openapi.enabled` is set it registers:
//!
//! - `GET /{doc_path}/swagger.json`: the document as indented JSON
//! - `GET /{doc_path}`: the Swagger UI page
//!
//! Both paths sit under the configured base path.

use daedalus_core::{handler, RouteScope, SynthesisError, WebContext, WebController, WebError};
use daedalus_docs::{join_paths, SwaggerUi};
use daedalus_macros::{operations, Controller};
use http::StatusCode;

/// File name of the served document.
pub const DOCUMENT_FILE: &str = "swagger.json";

/// Controller serving the API document.
#[derive(Debug, Clone, Default, Controller)]
#[daedalus(crate = "::daedalus_core")]
pub struct DocController {
    controller: WebController,
}

impl DocController {
    /// Creates the controller.
    pub fn new() -> Self {
        Self::default()
    }
}

#[operations(crate = "::daedalus_core")]
impl DocController {
    /// Registers the document and UI routes.
    pub fn setup_router(&self, scope: &mut RouteScope<'_>) -> Result<(), SynthesisError> {
        let openapi = scope.config().openapi.clone();
        if !openapi.enabled {
            tracing::debug!("openapi disabled, document routes not registered");
            return Ok(());
        }

        let json_path = join_paths(&openapi.doc_path, DOCUMENT_FILE);
        let page = SwaggerUi::new(join_paths(scope.base_path(), &json_path))
            .title(openapi.title)
            .html();

        let document = scope.document().clone();
        scope.get(
            &json_path,
            handler(move |ctx: WebContext| {
                let document = document.get();
                async move {
                    match document {
                        Some(document) => ctx.json_pretty(StatusCode::OK, &*document),
                        None => ctx.json(
                            StatusCode::SERVICE_UNAVAILABLE,
                            &WebError::from_status(StatusCode::SERVICE_UNAVAILABLE, "document not ready"),
                        ),
                    }
                }
            }),
        )?;
        scope.get(
            &openapi.doc_path,
            handler(move |ctx: WebContext| {
                let page = page.clone();
                async move { ctx.html(StatusCode::OK, page) }
            }),
        )?;
        tracing::info!(path = %join_paths(scope.base_path(), &openapi.doc_path), "serving API document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use daedalus_config::WebConfig;
    use daedalus_core::{synthesize, ControllerNode, Operations, SynthesisEnv, WebServer};
    use http::Request;
    use std::sync::Arc;

    #[derive(Controller)]
    #[daedalus(crate = "::daedalus_core", no_operations)]
    struct Root {
        #[http("/api")]
        server: WebServer,
        #[extender]
        doc: Arc<DocController>,
    }

    fn root() -> Arc<dyn ControllerNode> {
        Arc::new(Root {
            server: WebServer,
            doc: Arc::new(DocController::new()),
        })
    }

    fn get(path: &str) -> Request<Bytes> {
        Request::builder().uri(path).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_no_operations() {
        assert!(DocController::operations().is_empty());
    }

    #[tokio::test]
    async fn test_serves_document_and_page() {
        let env = SynthesisEnv::new(WebConfig::new().with_openapi(|o| o.enable().set_title("Pets")));
        let table = synthesize(&root(), &env).unwrap();
        assert_eq!(table.len(), 2);

        let response = table.handle(get("/api/doc/swagger.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["info"]["title"], "Pets");

        let response = table.handle(get("/api/doc")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(page.contains("/api/doc/swagger.json"));
    }

    #[test]
    fn test_disabled_registers_nothing() {
        let env = SynthesisEnv::new(WebConfig::new());
        let table = synthesize(&root(), &env).unwrap();
        assert!(table.is_empty());
    }
}
