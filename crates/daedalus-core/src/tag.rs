//! The field tag grammar.
//!
//! A tag is a comma-separated list of terms. A term is either a bare value
//! (`me`, `required`, `json`) or a `key=value` pair (`method=get`,
//! `middleware=cors&log`). Whitespace around terms, keys and values is
//! trimmed; empty terms and terms with an empty key are dropped.
//!
//! ```rust
//! use daedalus_core::Tag;
//!
//! let tag = Tag::parse("me, method=get, middleware=cors&log");
//! assert_eq!(tag.first_bare(), Some("me"));
//! assert_eq!(tag.get("method"), Some("get"));
//! assert_eq!(tag.get("middleware"), Some("cors&log"));
//! ```

use std::fmt;

/// One term of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagTerm {
    /// A value without a key.
    Bare(String),
    /// A `key=value` pair.
    Pair {
        /// Key, trimmed and non-empty.
        key: String,
        /// Value, trimmed; may be empty.
        value: String,
    },
}

/// A parsed tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    terms: Vec<TagTerm>,
}

impl Tag {
    /// Parses a raw tag string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let terms = raw
            .split(',')
            .filter_map(|term| {
                let term = term.trim();
                if term.is_empty() {
                    return None;
                }
                match term.split_once('=') {
                    Some((key, value)) => {
                        let key = key.trim();
                        if key.is_empty() {
                            return None;
                        }
                        Some(TagTerm::Pair {
                            key: key.to_string(),
                            value: value.trim().to_string(),
                        })
                    }
                    None => Some(TagTerm::Bare(term.to_string())),
                }
            })
            .collect();
        Self { terms }
    }

    /// Returns all terms in declaration order.
    pub fn terms(&self) -> &[TagTerm] {
        &self.terms
    }

    /// Returns `true` when the tag has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the first bare value.
    pub fn first_bare(&self) -> Option<&str> {
        self.bare_values().next()
    }

    /// Iterates over the bare values in order.
    pub fn bare_values(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            TagTerm::Bare(v) => Some(v.as_str()),
            TagTerm::Pair { .. } => None,
        })
    }

    /// Returns `true` if `value` appears as a bare value.
    pub fn contains_bare(&self, value: &str) -> bool {
        self.bare_values().any(|v| v == value)
    }

    /// Returns the value of the first pair with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| match t {
            TagTerm::Pair { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Picks the preferred text for a field.
    ///
    /// Returns the first bare value when `allow_bare` is set, otherwise (or
    /// when there is none) the non-empty value of `key`.
    pub fn preferred(&self, key: &str, allow_bare: bool) -> Option<&str> {
        if allow_bare {
            if let Some(v) = self.first_bare() {
                return Some(v);
            }
        }
        self.get(key).filter(|v| !v.is_empty())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match term {
                TagTerm::Bare(v) => f.write_str(v)?,
                TagTerm::Pair { key, value } => write!(f, "{key}={value}")?,
            }
        }
        Ok(())
    }
}

/// The raw tags attached to a struct field, keyed by tag name.
///
/// Produced by the derive macros; hand-written descriptors build one with
/// [`Tags::new`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags(&'static [(&'static str, &'static str)]);

impl Tags {
    /// No tags.
    pub const EMPTY: Self = Self(&[]);

    /// Wraps a static tag table.
    #[must_use]
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self(entries)
    }

    /// Returns the raw text of the first tag called `name`.
    pub fn lookup(&self, name: &str) -> Option<&'static str> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Returns the parsed tag called `name`, or an empty tag.
    pub fn parsed(&self, name: &str) -> Tag {
        self.lookup(name).map(Tag::parse).unwrap_or_default()
    }

    /// Iterates over `(name, raw)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.0.iter().copied()
    }
}
