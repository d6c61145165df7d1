//! JSON Schema subset used by the document.
//!
//! The fields the synthesizer reads or builds by hand are typed; every other
//! keyword is kept verbatim in [`Schema::extensions`] so that schemas produced
//! by a generator survive a round trip through this model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// String type.
    String,
    /// Number type.
    Number,
    /// Integer type.
    Integer,
    /// Boolean type.
    Boolean,
    /// Array type.
    Array,
    /// Object type.
    Object,
    /// Null type.
    Null,
}

impl SchemaType {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            "null" => Self::Null,
            _ => return None,
        })
    }
}

/// A JSON Schema object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to a component schema.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "$ref")]
    pub reference: Option<String>,
    /// Schema type.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub schema_type: Option<SchemaType>,
    /// Schema format (e.g. "int32", "date-time").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Any other keyword, kept as-is.
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Schema {
    /// Create a schema of the given type.
    #[must_use]
    pub fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Create a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::typed(SchemaType::String)
    }

    /// Create an object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::typed(SchemaType::Object)
    }

    /// Create an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(SchemaType::Array)
        }
    }

    /// Create a reference to `#/components/schemas/{name}`.
    #[must_use]
    pub fn component_ref(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{name}")),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add an object property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Mark a property as required.
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Converts a raw JSON Schema value.
    ///
    /// Typed keywords are lifted when they have the expected shape; anything
    /// else (including a `type` array such as `["integer", "null"]`) stays in
    /// `extensions`. Boolean schemas become an empty schema.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let mut schema = Self::default();
        for (key, value) in map {
            match (key.as_str(), value) {
                ("$ref", Value::String(r)) => schema.reference = Some(r),
                ("type", Value::String(t)) => match SchemaType::parse(&t) {
                    Some(st) => schema.schema_type = Some(st),
                    None => {
                        schema.extensions.insert(key, Value::String(t));
                    }
                },
                ("format", Value::String(f)) => schema.format = Some(f),
                ("description", Value::String(d)) => schema.description = Some(d),
                ("properties", Value::Object(props)) => {
                    schema.properties = props
                        .into_iter()
                        .map(|(name, v)| (name, Self::from_value(v)))
                        .collect();
                }
                ("required", Value::Array(names))
                    if names.iter().all(Value::is_string) =>
                {
                    schema.required = names
                        .into_iter()
                        .filter_map(|n| n.as_str().map(str::to_string))
                        .collect();
                }
                ("items", items @ Value::Object(_)) => {
                    schema.items = Some(Box::new(Self::from_value(items)));
                }
                (_, value) => {
                    schema.extensions.insert(key, value);
                }
            }
        }
        schema
    }

    /// Rewrites every `$ref` (typed or nested in extensions) with `f`.
    pub fn rewrite_refs(&mut self, f: &impl Fn(&str) -> String) {
        if let Some(r) = &self.reference {
            self.reference = Some(f(r));
        }
        for prop in self.properties.values_mut() {
            prop.rewrite_refs(f);
        }
        if let Some(items) = &mut self.items {
            items.rewrite_refs(f);
        }
        for value in self.extensions.values_mut() {
            rewrite_value_refs(value, f);
        }
    }
}

fn rewrite_value_refs(value: &mut Value, f: &impl Fn(&str) -> String) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(r)) = map.get_mut("$ref") {
                *r = f(r);
            }
            for v in map.values_mut() {
                rewrite_value_refs(v, f);
            }
        }
        Value::Array(items) => {
            for v in items {
                rewrite_value_refs(v, f);
            }
        }
        _ => {}
    }
}
