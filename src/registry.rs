//! Resource registry.
//!
//! Maps the first path segment to a [`Resource`]. Built once at startup,
//! handed to [`Server::serve`](crate::Server::serve), and read without locks
//! by every request afterwards. There is no removal.

use std::collections::HashMap;

use hyper::body::Body;
use tracing::info;

use crate::dispatcher;
use crate::error::Error;
use crate::resource::Resource;
use crate::response::Response;

/// The name-to-resource mapping.
///
/// [`Registry::register`] returns the registry again so registrations chain
/// with `?`:
///
/// ```rust
/// # fn main() -> Result<(), resty::Error> {
/// use resty::{Registry, Resource};
///
/// let mut registry = Registry::new();
/// registry
///     .register("snips", Resource::new().index(|| async { "[]" }))?
///     .register("tags", Resource::new())?;
/// assert!(registry.lookup("snips").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    resources: HashMap<String, Resource>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `resource` under `/<name>/`.
    ///
    /// Names are a single non-empty path segment. Registering a name twice is
    /// rejected with [`Error::DuplicateResource`]; the first binding stays.
    pub fn register(&mut self, name: impl Into<String>, resource: Resource) -> Result<&mut Self, Error> {
        let name = name.into();
        if name.is_empty() || name.contains('/') {
            return Err(Error::InvalidResourceName(name));
        }
        if self.resources.contains_key(&name) {
            return Err(Error::DuplicateResource(name));
        }

        let capabilities: Vec<&str> = resource.capabilities().into_iter().map(|c| c.as_str()).collect();
        info!(resource = %name, capabilities = ?capabilities, "resource registered");

        self.resources.insert(name, resource);
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.resources.len() }
    pub fn is_empty(&self) -> bool { self.resources.is_empty() }

    /// Routes `req` to its resource and returns the response.
    ///
    /// This is what the server runs per request; it is public so the whole
    /// routing layer can be driven without a socket. The body is only read
    /// when the selected capability takes the request, and never past
    /// [`MAX_BODY`](crate::MAX_BODY).
    pub async fn handle<B>(&self, req: http::Request<B>) -> Response
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        dispatcher::dispatch(self, req).await
    }
}
