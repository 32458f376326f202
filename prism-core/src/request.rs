//! Request descriptors and query-parameter encoding.
//!
//! A [`RequestDescriptor`] is built once by a resource client and never
//! mutated afterwards; the credential manager produces copies carrying the
//! current authorization header.

use std::fmt;

use serde::Serialize;

use crate::error::ApiError;
use crate::store::Secret;

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered query parameters whose values may be absent.
///
/// Absent and empty-string values are kept so the builder API stays
/// uniform, but [`encoded`](QueryParams::encoded) drops them: they never
/// reach the wire, not even as `key=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, Option<String>)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, preserving insertion order.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, Some(value));
        self
    }

    /// Append a parameter that may be absent.
    pub fn with_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a parameter in place.
    pub fn push<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        let value = value.map(|v| v.to_string());
        self.0.push((key.into(), value));
    }

    /// The parameters that will actually be sent, in insertion order.
    pub fn encoded(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().filter_map(|(k, v)| match v.as_deref() {
            Some(v) if !v.is_empty() => Some((k.as_str(), v)),
            _ => None,
        })
    }

    /// `true` when no parameter would be sent.
    pub fn is_empty(&self) -> bool {
        self.encoded().next().is_none()
    }

    /// URL-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.encoded())
            .finish()
    }
}

/// Anything that can be turned into list-endpoint query parameters.
pub trait QueryFilter {
    fn query(&self) -> QueryParams;
}

impl QueryFilter for QueryParams {
    fn query(&self) -> QueryParams {
        self.clone()
    }
}

impl QueryFilter for () {
    fn query(&self) -> QueryParams {
        QueryParams::new()
    }
}

/// A single HTTP exchange to perform against the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: QueryParams,
    body: Option<serde_json::Value>,
    authorization: Option<Secret>,
}

impl RequestDescriptor {
    /// Build a descriptor for `method` on `path`.
    ///
    /// `path` is either relative to the configured base URL or an absolute
    /// URL (as found in pagination cursors).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: None,
            authorization: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Encode {
            message: e.to_string(),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Copy of this descriptor carrying the given `Authorization` value.
    pub(crate) fn authorized(&self, header: Secret) -> Self {
        Self {
            authorization: Some(header),
            ..self.clone()
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// The `Authorization` header value, if a credential was attached.
    pub fn authorization(&self) -> Option<&Secret> {
        self.authorization.as_ref()
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query.to_query_string())?;
        }
        Ok(())
    }
}
