//! Incoming HTTP request type and the per-request path-variable mapping.

use bytes::Bytes;

use crate::method::Method;

// ── Params ───────────────────────────────────────────────────────────────────

/// Path variables captured for one request, in spec order.
///
/// Built fresh by the router when a route with capture groups matches; never
/// mutated afterwards. Insertion order is the left-to-right order of the
/// capture groups in the path spec, so iterating yields variables in the
/// order they were declared.
///
/// Captured values are always raw strings — weft performs no type coercion.
#[derive(Debug, Default)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, name: String, value: String) {
        self.0.push((name, value));
    }

    /// Returns the value captured for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Request ──────────────────────────────────────────────────────────────────

/// An incoming HTTP request.
///
/// The body and headers are opaque to the router — it reads only the method
/// and path. Captured path variables are attached before the handler runs and
/// are reachable through [`Request::param`] / [`Request::params`].
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: Params,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        Self { method, path, headers, body, params: Params::new() }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a captured path variable by name.
    ///
    /// For a route `/users/(id:[0-9]+)`, `req.param("id")` on `/users/42`
    /// returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// All captured path variables, in capture order. Empty when the matched
    /// route declared no named groups.
    pub fn params(&self) -> &Params {
        &self.params
    }
}
