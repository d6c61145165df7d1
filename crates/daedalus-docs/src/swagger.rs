//! The Swagger UI page served next to the document.
//!
//! The page pulls Swagger UI from a CDN and points it at the document URL;
//! the document itself is served by a separate route.

const SWAGGER_UI_VERSION: &str = "5.18.2";

/// A Swagger UI page for one document URL.
///
/// ```rust
/// use daedalus_docs::SwaggerUi;
///
/// let page = SwaggerUi::new("/api/doc/swagger.json").title("Pets").html();
/// assert!(page.contains("url: '/api/doc/swagger.json'"));
/// assert!(page.contains("<title>Pets</title>"));
/// ```
#[derive(Debug, Clone)]
pub struct SwaggerUi {
    document_url: String,
    title: String,
    expansion: DocExpansion,
}

/// How much of each operation Swagger UI shows on load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocExpansion {
    /// Tags collapsed.
    None,
    /// Tags open, operations collapsed.
    #[default]
    List,
    /// Everything open.
    Full,
}

impl DocExpansion {
    fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::List => "list",
            Self::Full => "full",
        }
    }
}

impl SwaggerUi {
    /// A page loading the document from `document_url`.
    #[must_use]
    pub fn new(document_url: impl Into<String>) -> Self {
        Self {
            document_url: document_url.into(),
            title: "Swagger UI".to_string(),
            expansion: DocExpansion::default(),
        }
    }

    /// Page title, `Swagger UI` by default.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial expansion, [`DocExpansion::List`] by default.
    #[must_use]
    pub fn doc_expansion(mut self, expansion: DocExpansion) -> Self {
        self.expansion = expansion;
        self
    }

    /// The URL the page fetches the document from.
    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    /// Renders the complete HTML page.
    pub fn html(&self) -> String {
        let cdn = format!("https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}");
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
  <link rel="stylesheet" href="{cdn}/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="{cdn}/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{
        url: '{url}',
        dom_id: '#swagger-ui',
        docExpansion: '{expansion}',
      }});
    }};
  </script>
</body>
</html>"#,
            title = escape(&self.title),
            url = escape(&self.document_url),
            expansion = self.expansion.as_str(),
        )
    }
}

fn escape(text: &str) -> String {
    text.chars().fold(String::with_capacity(text.len()), |mut out, c| {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_escaped() {
        let html = SwaggerUi::new("/doc/swagger.json").title("<x>").html();
        assert!(html.contains("<title>&lt;x&gt;</title>"));
    }

    #[test]
    fn expansion_reaches_the_page() {
        let html = SwaggerUi::new("/s.json").doc_expansion(DocExpansion::Full).html();
        assert!(html.contains("docExpansion: 'full'"));
        assert!(html.contains(SWAGGER_UI_VERSION));
    }
}
