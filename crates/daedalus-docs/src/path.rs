//! Conversion from router templates to OpenAPI path templates.

/// Joins a group prefix and a relative path the way route groups do.
///
/// The result always starts with `/` and never contains empty segments.
///
/// # Example
///
/// ```rust
/// use daedalus_docs::join_paths;
///
/// assert_eq!(join_paths("/user", "me"), "/user/me");
/// assert_eq!(join_paths("/user/", ""), "/user");
/// assert_eq!(join_paths("", ""), "/");
/// ```
#[must_use]
pub fn join_paths(base: &str, relative: &str) -> String {
    let joined: Vec<&str> = base
        .split('/')
        .chain(relative.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", joined.join("/"))
}

/// Joins `base` and `path` and rewrites `:name` / `*name` captures as
/// `{name}`.
///
/// Returns the OpenAPI path and the capture names in template order.
///
/// # Example
///
/// ```rust
/// use daedalus_docs::concat_openapi_path;
///
/// let (path, names) = concat_openapi_path("/api", "/user/:id/files/*rest");
/// assert_eq!(path, "/api/user/{id}/files/{rest}");
/// assert_eq!(names, vec!["id".to_string(), "rest".to_string()]);
/// ```
#[must_use]
pub fn concat_openapi_path(base: &str, path: &str) -> (String, Vec<String>) {
    let mut names = Vec::new();
    let segments: Vec<String> = join_paths(base, path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| match segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
            Some(name) if !name.is_empty() => {
                names.push(name.to_string());
                format!("{{{name}}}")
            }
            _ => segment.to_string(),
        })
        .collect();
    (format!("/{}", segments.join("/")), names)
}

/// Returns the capture names of a router template, in order.
#[must_use]
pub fn capture_names(path: &str) -> Vec<String> {
    concat_openapi_path("", path).1
}
