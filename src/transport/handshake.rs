//! Handshake data presented by a client when it connects.

use std::collections::HashMap;

use serde_json::Value;

/// Query parameters and auth payload sent with the connection request.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    query: HashMap<String, String>,
    auth: Value,
}

impl Handshake {
    /// Create an empty handshake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handshake from a map of query parameters.
    pub fn from_query(query: HashMap<String, String>) -> Self {
        Self {
            query,
            auth: Value::Null,
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set the auth payload.
    pub fn with_auth(mut self, auth: Value) -> Self {
        self.auth = auth;
        self
    }

    /// Get a query parameter by name.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|v| v.as_str())
    }

    /// All query parameters.
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// The auth payload (`Null` when none was sent).
    pub fn auth(&self) -> &Value {
        &self.auth
    }
}
