//! # resty
//!
//! A minimal REST routing layer. Register named resources; each one declares
//! which operations of a fixed vocabulary it supports; one dispatcher maps
//! every request onto the right callback.
//!
//! ## Routing
//!
//! A resource registered as `snips` owns every path under `/snips/`:
//!
//! | Request | Capability | Callback receives |
//! |---|---|---|
//! | `GET /snips/` | `informed_index`, else `index` | form + headers, or nothing |
//! | `POST /snips/` | `create` | the request |
//! | `GET /snips/42` | `informed_find`, else `find` | id (+ form + headers) |
//! | `PUT /snips/42` | `update` | id, the request |
//! | `DELETE /snips/42` | `delete` | id |
//! | `POST /snips/42/publish` | `act` | `["42", "publish"]`, the request |
//! | `OPTIONS /snips/` or `/snips/42` | `options` | id (`""` for the collection) |
//!
//! Anything else is `501 Not Implemented`; an unknown resource name is
//! `404 Not Found`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use resty::{Registry, Request, Resource, Response, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), resty::Error> {
//!     let snips = Resource::new()
//!         .index(|| async { Response::json(b"[]".to_vec()) })
//!         .create(|req: Request| async move {
//!             if req.body().is_empty() {
//!                 return Response::bad_request("empty snip");
//!             }
//!             Response::created("/snips/1")
//!         })
//!         .find(|id: String| async move { format!("snip {id}") });
//!
//!     let mut registry = Registry::new();
//!     registry.register("snips", snips)?;
//!
//!     Server::bind("0.0.0.0:3000").await?.serve(registry).await
//! }
//! ```

mod capability;
mod dispatcher;
mod error;
mod form;
mod registry;
mod request;
mod resource;
mod response;
mod server;

pub use capability::Capability;
pub use error::Error;
pub use form::{Form, FormError};
pub use http::HeaderMap;
pub use registry::Registry;
pub use request::{MAX_BODY, PathError, Request};
pub use resource::Resource;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use server::Server;
