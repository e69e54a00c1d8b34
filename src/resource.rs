//! Resource descriptors.
//!
//! A [`Resource`] is declared once at startup by listing the capabilities it
//! supplies, one async callback each:
//!
//! ```rust
//! use resty::{Resource, Response};
//!
//! let snips = Resource::new()
//!     .index(|| async { "all snips" })
//!     .find(|id: String| async move { format!("snip {id}") })
//!     .delete(|_id: String| async { Response::no_content() });
//! ```
//!
//! Whatever is not declared answers `501 Not Implemented`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::HeaderMap;

use crate::capability::{BoxedCapability, Capability, FnCapability};
use crate::form::Form;
use crate::request::Request;
use crate::response::IntoResponse;

/// A named collection's capability set.
#[derive(Default)]
pub struct Resource {
    pub(crate) index: Option<BoxedCapability<()>>,
    pub(crate) informed_index: Option<BoxedCapability<(Form, HeaderMap)>>,
    pub(crate) create: Option<BoxedCapability<(Request,)>>,
    pub(crate) find: Option<BoxedCapability<(String,)>>,
    pub(crate) informed_find: Option<BoxedCapability<(String, Form, HeaderMap)>>,
    pub(crate) update: Option<BoxedCapability<(String, Request)>>,
    pub(crate) delete: Option<BoxedCapability<(String,)>>,
    pub(crate) act: Option<BoxedCapability<(Vec<String>, Request)>>,
    pub(crate) options: Option<BoxedCapability<(String,)>>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists all the items. `GET /r/`
    pub fn index<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.index = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Lists items given the parsed form and the request headers. `GET /r/`
    ///
    /// Preferred over [`index`](Self::index) when both are declared.
    pub fn informed_index<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(Form, HeaderMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.informed_index = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Creates a new item. `POST /r/`
    pub fn create<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.create = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Views one item. `GET /r/<id>`
    pub fn find<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.find = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Views one item given the parsed form and the request headers.
    /// `GET /r/<id>`
    ///
    /// Preferred over [`find`](Self::find) when both are declared.
    pub fn informed_find<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(String, Form, HeaderMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.informed_find = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Replaces an item. `PUT /r/<id>`
    pub fn update<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(String, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.update = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Removes an item. `DELETE /r/<id>`
    pub fn delete<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.delete = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Acts on an item, or performs a top-level action. `POST /r/<id>/**`
    ///
    /// The callback receives every segment after `/r/`, e.g.
    /// `["42", "publish"]` for `POST /r/42/publish`.
    pub fn act<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(Vec<String>, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.act = Some(Arc::new(FnCapability(f)));
        self
    }

    /// Advertises how to use the resource. The id is empty for the
    /// collection URL. `OPTIONS /r/` and `OPTIONS /r/<id>`
    pub fn options<F, Fut, R>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.options = Some(Arc::new(FnCapability(f)));
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Index         => self.index.is_some(),
            Capability::InformedIndex => self.informed_index.is_some(),
            Capability::Create        => self.create.is_some(),
            Capability::Find          => self.find.is_some(),
            Capability::InformedFind  => self.informed_find.is_some(),
            Capability::Update        => self.update.is_some(),
            Capability::Delete        => self.delete.is_some(),
            Capability::Act           => self.act.is_some(),
            Capability::Options       => self.options.is_some(),
        }
    }

    /// The declared capabilities, in vocabulary order.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL.into_iter().filter(|c| self.supports(*c)).collect()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
