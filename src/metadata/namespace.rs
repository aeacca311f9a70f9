//! Namespace path patterns such as `/rooms/:roomId`.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed controller namespace.
///
/// Segments are either literal or `:name` parameters. A namespace matches
/// when it has the same number of segments and every literal segment is
/// equal; parameter segments capture any non-empty value.
///
/// ## Example
///
/// ```
/// use socket_controllers::NamespacePattern;
///
/// let pattern = NamespacePattern::parse("/rooms/:roomId").unwrap();
/// let params = pattern.captures("/rooms/42").unwrap();
/// assert_eq!(params.get("roomId"), Some("42"));
/// assert!(!pattern.matches("/rooms"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl NamespacePattern {
    /// Parse a pattern. It must start with `/`, contain no empty segments
    /// (other than the root `/` itself), and use each parameter name once.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidNamespace {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('/') {
                if part.is_empty() {
                    return Err(invalid("contains an empty segment"));
                }
                match part.strip_prefix(':') {
                    Some("") => return Err(invalid("parameter segment has no name")),
                    Some(name) => {
                        if segments
                            .iter()
                            .any(|s| matches!(s, Segment::Param(existing) if existing == name))
                        {
                            return Err(invalid(&format!("parameter '{}' is repeated", name)));
                        }
                        segments.push(Segment::Param(name.to_string()));
                    }
                    None => segments.push(Segment::Literal(part.to_string())),
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern has no parameter segments.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Names of the parameter segments, left to right.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Whether both patterns match exactly the same namespaces, i.e. they
    /// differ at most in parameter names.
    pub fn same_shape(&self, other: &NamespacePattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    /// Whether `namespace` matches this pattern.
    pub fn matches(&self, namespace: &str) -> bool {
        self.captures(namespace).is_some()
    }

    /// Match `namespace` and return the captured parameters.
    pub fn captures(&self, namespace: &str) -> Option<PathParams> {
        let rest = namespace.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => params.push(name.clone(), part.to_string()),
            }
        }
        Some(params)
    }
}

impl fmt::Display for NamespacePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Values captured from a namespace, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(String, String)>,
}

impl PathParams {
    fn push(&mut self, name: String, value: String) {
        self.values.push((name, value));
    }

    /// Get a captured value by parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of captured values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The captures as a JSON object of strings.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(n, v)| (n.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}
