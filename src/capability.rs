//! Capability vocabulary and callback type erasure.
//!
//! # How capability callbacks are stored
//!
//! A [`Resource`](crate::Resource) holds up to nine callbacks, each with a
//! different argument list and a different concrete closure type. They are
//! erased behind one trait, [`ErasedCapability`], parameterised by the
//! argument tuple:
//!
//! ```text
//! |id: String| async move { … }             ← user writes this
//!        ↓ Resource::new().find(…)
//! Arc::new(FnCapability(closure))           ← heap-allocated wrapper
//!        ↓  stored as BoxedCapability<(String,)>
//! callback.call((id,))  at request time     ← one vtable dispatch
//!        ↓
//! Box::pin(async { fut.await.into_response() })
//! ```
//!
//! Per request the cost is one virtual call and one boxed future.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface, one instantiation per argument tuple.
pub(crate) trait ErasedCapability<Args> {
    fn call(&self, args: Args) -> BoxFuture;
}

/// A type-erased callback shared by every concurrent request to a resource.
pub(crate) type BoxedCapability<Args> = Arc<dyn ErasedCapability<Args> + Send + Sync + 'static>;

/// Newtype bridging a concrete async function to [`ErasedCapability`].
pub(crate) struct FnCapability<F>(pub(crate) F);

macro_rules! impl_erased_capability {
    ($($arg:ident: $ty:ident),*) => {
        impl<F, Fut, R, $($ty,)*> ErasedCapability<($($ty,)*)> for FnCapability<F>
        where
            F: Fn($($ty),*) -> Fut + Send + Sync,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoResponse + Send + 'static,
        {
            fn call(&self, ($($arg,)*): ($($ty,)*)) -> BoxFuture {
                let fut = (self.0)($($arg),*);
                Box::pin(async move { fut.await.into_response() })
            }
        }
    };
}

impl_erased_capability!();
impl_erased_capability!(a: A);
impl_erased_capability!(a: A, b: B);
impl_erased_capability!(a: A, b: B, c: C);

/// The fixed vocabulary of operations a resource may advertise.
///
/// | Capability | Trigger |
/// |---|---|
/// | `Index` / `InformedIndex` | `GET /r/` |
/// | `Create` | `POST /r/` |
/// | `Find` / `InformedFind` | `GET /r/<id>` |
/// | `Update` | `PUT /r/<id>` |
/// | `Delete` | `DELETE /r/<id>` |
/// | `Act` | `POST /r/<id>/...` |
/// | `Options` | `OPTIONS /r/` or `OPTIONS /r/<id>` |
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Capability {
    Index,
    InformedIndex,
    Create,
    Find,
    InformedFind,
    Update,
    Delete,
    Act,
    Options,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Self::Index,
        Self::InformedIndex,
        Self::Create,
        Self::Find,
        Self::InformedFind,
        Self::Update,
        Self::Delete,
        Self::Act,
        Self::Options,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index         => "index",
            Self::InformedIndex => "informed_index",
            Self::Create        => "create",
            Self::Find          => "find",
            Self::InformedFind  => "informed_find",
            Self::Update        => "update",
            Self::Delete        => "delete",
            Self::Act           => "act",
            Self::Options       => "options",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
