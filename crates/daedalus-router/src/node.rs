//! Radix tree node implementation.
//!
//! Every node owns one path segment. Static children are kept sorted so they
//! can be found with a binary search; a node has at most one parameter child
//! and at most one catch-all child.

use http::Method;

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::RouteError;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g. `users`)
    Static,
    /// Named capture (e.g. `:id`)
    Param(String),
    /// Catch-all capture (e.g. `*filepath`)
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The path segment this node represents
    pub segment: String,
    /// The kind of segment
    pub kind: SegmentKind,
    /// Values per method, present when a route ends here
    pub methods: Option<MethodRouter<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: &str, kind: SegmentKind) -> Self {
        Self {
            segment: segment.to_string(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Splits a path template into typed segments.
    pub(crate) fn parse_path(path: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());
        for (i, s) in raw.iter().enumerate() {
            let kind = if let Some(name) = s.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteError::EmptyCapture(path.to_string()));
                }
                SegmentKind::Param(name.to_string())
            } else if let Some(name) = s.strip_prefix('*') {
                if name.is_empty() {
                    return Err(RouteError::EmptyCapture(path.to_string()));
                }
                if i + 1 != raw.len() {
                    return Err(RouteError::WildcardNotLast(path.to_string()));
                }
                SegmentKind::Wildcard(name.to_string())
            } else {
                SegmentKind::Static
            };
            segments.push(((*s).to_string(), kind));
        }
        Ok(segments)
    }

    /// Inserts `value` for `method` at `path`.
    pub fn insert(&mut self, method: &Method, path: &str, value: T) -> Result<(), RouteError> {
        let segments = Self::parse_path(path)?;
        let leaf = self.descend(&segments, path)?;
        leaf.methods
            .get_or_insert_with(MethodRouter::new)
            .try_insert(method, value)
            .map_err(|_| RouteError::Duplicate {
                method: method.clone(),
                path: path.to_string(),
            })
    }

    fn descend(
        &mut self,
        segments: &[(String, SegmentKind)],
        path: &str,
    ) -> Result<&mut Self, RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return Ok(self);
        };

        let child = match kind {
            SegmentKind::Static => {
                let idx = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(idx) => idx,
                    Err(idx) => {
                        self.static_children
                            .insert(idx, Node::new(segment, SegmentKind::Static));
                        idx
                    }
                };
                &mut self.static_children[idx]
            }
            SegmentKind::Param(name) | SegmentKind::Wildcard(name) => {
                let is_param = matches!(kind, SegmentKind::Param(_));
                let slot = if is_param {
                    &mut self.param_child
                } else {
                    &mut self.wildcard_child
                };
                let child = slot.get_or_insert_with(|| Box::new(Node::new(segment, kind.clone())));
                if child.kind != *kind {
                    let existing = match &child.kind {
                        SegmentKind::Param(n) | SegmentKind::Wildcard(n) => n.clone(),
                        SegmentKind::Static => String::new(),
                    };
                    return Err(RouteError::ConflictingCapture {
                        path: path.to_string(),
                        existing,
                        new: name.clone(),
                    });
                }
                child.as_mut()
            }
        };
        child.descend(remaining, path)
    }

    /// Matches a request path against the tree.
    ///
    /// Returns the method table and captured parameters if found.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                params.push(name.clone(), format!("/{}", segments.join("/")));
                return child.methods.as_ref();
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Self> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[(&str, &'static str)]) -> Node<&'static str> {
        let mut root = Node::root();
        for &(path, value) in routes {
            root.insert(&Method::GET, path, value).unwrap();
        }
        root
    }

    #[test]
    fn test_parse_path_kinds() {
        let segments = Node::<()>::parse_path("/users/:id/*rest").unwrap();
        assert_eq!(segments[0].1, SegmentKind::Static);
        assert_eq!(segments[1].1, SegmentKind::Param("id".into()));
        assert_eq!(segments[2].1, SegmentKind::Wildcard("rest".into()));
    }

    #[test]
    fn test_parse_path_rejects_inner_wildcard() {
        let err = Node::<()>::parse_path("/files/*rest/more").unwrap_err();
        assert!(matches!(err, RouteError::WildcardNotLast(_)));
    }

    #[test]
    fn test_parse_path_rejects_empty_capture() {
        assert!(matches!(
            Node::<()>::parse_path("/users/:"),
            Err(RouteError::EmptyCapture(_))
        ));
    }

    #[test]
    fn test_static_priority_over_param() {
        let root = tree(&[("/users/me", "me"), ("/users/:id", "by_id")]);
        let (m, params) = root.match_path("/users/me").unwrap();
        assert_eq!(m.get_value(&Method::GET), Some(&"me"));
        assert!(params.is_empty());

        let (m, params) = root.match_path("/users/42").unwrap();
        assert_eq!(m.get_value(&Method::GET), Some(&"by_id"));
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_param_backtracking_drops_stale_capture() {
        let root = tree(&[("/a/:x/b", "xb"), ("/a/*rest", "rest")]);
        let (m, params) = root.match_path("/a/1/c").unwrap();
        assert_eq!(m.get_value(&Method::GET), Some(&"rest"));
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("rest"), Some("/1/c"));
    }

    #[test]
    fn test_conflicting_capture_names() {
        let mut root = Node::root();
        root.insert(&Method::GET, "/users/:id", 1).unwrap();
        let err = root.insert(&Method::POST, "/users/:uid", 2).unwrap_err();
        assert!(matches!(err, RouteError::ConflictingCapture { .. }));
    }

    #[test]
    fn test_root_route() {
        let root = tree(&[("/", "root")]);
        let (m, _) = root.match_path("/").unwrap();
        assert_eq!(m.get_value(&Method::GET), Some(&"root"));
        assert!(root.match_path("/other").is_none());
    }
}
