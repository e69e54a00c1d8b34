//! The dispatch core: one request in, one capability call (or fallback) out.
//!
//! A path splits into `/<name>/<id>`. The name selects the resource; the
//! method and whether the id is empty select the capability:
//!
//! | Method | id empty | id present |
//! |---|---|---|
//! | `GET` | informed index, else index | informed find, else find |
//! | `POST` | create | act on the `/`-split id |
//! | `PUT` | | update |
//! | `DELETE` | | delete |
//! | `OPTIONS` | options with `""` | options with the id |
//!
//! Every other combination, and every capability the resource did not
//! declare, answers `501 Not Implemented`.
//!
//! The body is read last, and only for `create`, `update` and `act`. Unknown
//! resources and unroutable requests are answered without touching it.

use bytes::Bytes;
use http::Method;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use tracing::{debug, warn};

use crate::capability::{BoxedCapability, Capability};
use crate::form::Form;
use crate::registry::Registry;
use crate::request::{self, MAX_BODY, Request};
use crate::resource::Resource;
use crate::response::Response;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// `(name, id)` taken from a request path.
#[derive(Debug, Eq, PartialEq)]
pub(crate) struct Target<'a> {
    pub(crate) name: &'a str,
    pub(crate) id: &'a str,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum TargetError {
    /// The path does not start with `/` (e.g. `OPTIONS *`).
    NotAbsolute,
    /// Nothing between the leading `/` and the next one.
    EmptyName,
}

/// Splits `/<name>/<id>`. The id is everything after the second slash,
/// verbatim, and is empty for `/<name>` and `/<name>/`.
pub(crate) fn parse_target(path: &str) -> Result<Target<'_>, TargetError> {
    let rest = path.strip_prefix('/').ok_or(TargetError::NotAbsolute)?;
    let (name, id) = rest.split_once('/').unwrap_or((rest, ""));
    if name.is_empty() {
        return Err(TargetError::EmptyName);
    }
    Ok(Target { name, id })
}

/// The selected outcome for one request against one resource.
pub(crate) enum Plan<'r> {
    Index(&'r BoxedCapability<()>),
    InformedIndex(&'r BoxedCapability<(Form, http::HeaderMap)>),
    Create(&'r BoxedCapability<(Request,)>),
    Find(&'r BoxedCapability<(String,)>),
    InformedFind(&'r BoxedCapability<(String, Form, http::HeaderMap)>),
    Update(&'r BoxedCapability<(String, Request)>),
    Delete(&'r BoxedCapability<(String,)>),
    Act(&'r BoxedCapability<(Vec<String>, Request)>, Vec<String>),
    Options(&'r BoxedCapability<(String,)>),
    InvalidUri,
    NotImplemented,
}

impl Plan<'_> {
    /// The capability this plan invokes, if any.
    pub(crate) fn capability(&self) -> Option<Capability> {
        match self {
            Self::Index(_)         => Some(Capability::Index),
            Self::InformedIndex(_) => Some(Capability::InformedIndex),
            Self::Create(_)        => Some(Capability::Create),
            Self::Find(_)          => Some(Capability::Find),
            Self::InformedFind(_)  => Some(Capability::InformedFind),
            Self::Update(_)        => Some(Capability::Update),
            Self::Delete(_)        => Some(Capability::Delete),
            Self::Act(..)          => Some(Capability::Act),
            Self::Options(_)       => Some(Capability::Options),
            Self::InvalidUri | Self::NotImplemented => None,
        }
    }

    /// Whether the capability is handed the request, and so needs its body.
    pub(crate) fn reads_body(&self) -> bool {
        matches!(self, Self::Create(_) | Self::Update(_) | Self::Act(..))
    }
}

/// Chooses the capability for `(method, id)`. Informed variants win over
/// bare ones; nothing else has a preference.
pub(crate) fn plan<'r>(resource: &'r Resource, method: &Method, id: &str) -> Plan<'r> {
    let plan = if id.is_empty() {
        match *method {
            Method::GET => resource.informed_index.as_ref().map(Plan::InformedIndex)
                .or_else(|| resource.index.as_ref().map(Plan::Index)),
            Method::POST => resource.create.as_ref().map(Plan::Create),
            Method::OPTIONS => resource.options.as_ref().map(Plan::Options),
            _ => None,
        }
    } else {
        match *method {
            Method::GET => resource.informed_find.as_ref().map(Plan::InformedFind)
                .or_else(|| resource.find.as_ref().map(Plan::Find)),
            Method::POST => resource.act.as_ref().map(|act| {
                let tail: Vec<String> = id.split('/').map(str::to_owned).collect();
                if tail.first().is_none_or(String::is_empty) {
                    Plan::InvalidUri
                } else {
                    Plan::Act(act, tail)
                }
            }),
            Method::PUT => resource.update.as_ref().map(Plan::Update),
            Method::DELETE => resource.delete.as_ref().map(Plan::Delete),
            Method::OPTIONS => resource.options.as_ref().map(Plan::Options),
            _ => None,
        }
    };
    plan.unwrap_or(Plan::NotImplemented)
}

/// Routes one request. Never fails: every path ends in a response.
pub(crate) async fn dispatch<B>(registry: &Registry, req: http::Request<B>) -> Response
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();

    let path = match request::decode_path(parts.uri.path()) {
        Ok(path) => path,
        Err(e) => {
            warn!(path = %parts.uri.path(), error = %e, "undecodable request path");
            return Response::bad_request(format!("invalid uri {}", parts.uri.path()));
        }
    };

    let target = match parse_target(&path) {
        Ok(target) => target,
        Err(TargetError::NotAbsolute) => {
            warn!(path = %path, "rejecting non-absolute request path");
            return Response::bad_request(format!("invalid uri {path}"));
        }
        Err(TargetError::EmptyName) => {
            debug!(path = %path, "no resource name in path");
            return Response::not_found();
        }
    };

    let Some(resource) = registry.lookup(target.name) else {
        warn!(resource = target.name, method = %parts.method, "resource not found");
        return Response::not_found_with(format!("resource {} not found", target.name));
    };

    let plan = plan(resource, &parts.method, target.id);
    debug!(
        method = %parts.method,
        resource = target.name,
        id = target.id,
        capability = plan.capability().map(Capability::as_str),
        "dispatching"
    );
    let id = target.id.to_owned();

    let body = if plan.reads_body() {
        match read_body(body).await {
            Ok(bytes) => bytes,
            Err(res) => return res,
        }
    } else {
        Bytes::new()
    };
    let req = Request::new(parts, path, body);

    match plan {
        Plan::Index(cb) => cb.call(()).await,
        Plan::InformedIndex(cb) => match req.form() {
            Ok(form) => cb.call((form, req.into_headers())).await,
            Err(e) => {
                warn!(error = %e, "unparseable form");
                Response::bad_request(e.to_string())
            }
        },
        Plan::Create(cb) => cb.call((req,)).await,
        Plan::Find(cb) => cb.call((id,)).await,
        Plan::InformedFind(cb) => match req.form() {
            Ok(form) => cb.call((id, form, req.into_headers())).await,
            Err(e) => {
                warn!(error = %e, "unparseable form");
                Response::bad_request(e.to_string())
            }
        },
        Plan::Update(cb) => cb.call((id, req)).await,
        Plan::Delete(cb) => cb.call((id,)).await,
        Plan::Act(cb, tail) => cb.call((tail, req)).await,
        Plan::Options(cb) => cb.call((id,)).await,
        Plan::InvalidUri => {
            warn!(id = %id, "empty action segment");
            Response::bad_request(format!("invalid uri {id}"))
        }
        Plan::NotImplemented => Response::not_implemented(),
    }
}

/// Buffers at most [`MAX_BODY`] bytes. Past that the read stops and the
/// client gets `413`; a transport error is a `400`.
async fn read_body<B>(body: B) -> Result<Bytes, Response>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, MAX_BODY).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(limit = MAX_BODY, "request body too large");
            Err(Response::payload_too_large())
        }
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            Err(Response::bad_request(format!("failed to read request body: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderMap;
    use http_body_util::Full;

    use super::*;

    fn request(method: &str, uri: &str, body: &'static [u8]) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body)))
            .unwrap()
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register("snips", everything()).unwrap();
        registry
    }

    fn everything() -> Resource {
        Resource::new()
            .index(|| async { "index" })
            .informed_index(|_f: Form, _h: HeaderMap| async { "informed_index" })
            .create(|_r: Request| async { "create" })
            .find(|_id: String| async { "find" })
            .informed_find(|_id: String, _f: Form, _h: HeaderMap| async { "informed_find" })
            .update(|_id: String, _r: Request| async { "update" })
            .delete(|_id: String| async { "delete" })
            .act(|_t: Vec<String>, _r: Request| async { "act" })
            .options(|_id: String| async { "options" })
    }

    fn chosen(resource: &Resource, method: Method, id: &str) -> Option<Capability> {
        plan(resource, &method, id).capability()
    }

    #[test]
    fn target_splits_name_and_id() {
        assert_eq!(parse_target("/snips/"), Ok(Target { name: "snips", id: "" }));
        assert_eq!(parse_target("/snips"), Ok(Target { name: "snips", id: "" }));
        assert_eq!(parse_target("/snips/42"), Ok(Target { name: "snips", id: "42" }));
        assert_eq!(parse_target("/snips/42/publish/now"), Ok(Target { name: "snips", id: "42/publish/now" }));
        assert_eq!(parse_target("/snips//publish"), Ok(Target { name: "snips", id: "/publish" }));
        assert_eq!(parse_target("/snips/42/"), Ok(Target { name: "snips", id: "42/" }));
    }

    #[test]
    fn malformed_targets_are_rejected() {
        assert_eq!(parse_target("*"), Err(TargetError::NotAbsolute));
        assert_eq!(parse_target(""), Err(TargetError::NotAbsolute));
        assert_eq!(parse_target("/"), Err(TargetError::EmptyName));
        assert_eq!(parse_target("//x"), Err(TargetError::EmptyName));
    }

    #[test]
    fn collection_matrix() {
        let all = everything();
        assert_eq!(chosen(&all, Method::GET, ""), Some(Capability::InformedIndex));
        assert_eq!(chosen(&all, Method::POST, ""), Some(Capability::Create));
        assert_eq!(chosen(&all, Method::OPTIONS, ""), Some(Capability::Options));
        assert_eq!(chosen(&all, Method::PUT, ""), None);
        assert_eq!(chosen(&all, Method::DELETE, ""), None);
        assert_eq!(chosen(&all, Method::PATCH, ""), None);
    }

    #[test]
    fn item_matrix() {
        let all = everything();
        assert_eq!(chosen(&all, Method::GET, "42"), Some(Capability::InformedFind));
        assert_eq!(chosen(&all, Method::POST, "42/x"), Some(Capability::Act));
        assert_eq!(chosen(&all, Method::PUT, "42"), Some(Capability::Update));
        assert_eq!(chosen(&all, Method::DELETE, "42"), Some(Capability::Delete));
        assert_eq!(chosen(&all, Method::OPTIONS, "42"), Some(Capability::Options));
        assert_eq!(chosen(&all, Method::HEAD, "42"), None);
    }

    #[test]
    fn bare_variants_used_without_informed() {
        let bare = Resource::new()
            .index(|| async { "index" })
            .find(|_id: String| async { "find" });
        assert_eq!(chosen(&bare, Method::GET, ""), Some(Capability::Index));
        assert_eq!(chosen(&bare, Method::GET, "1"), Some(Capability::Find));
    }

    #[test]
    fn missing_capabilities_plan_not_implemented() {
        let empty = Resource::new();
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS] {
            assert!(matches!(plan(&empty, &method, ""), Plan::NotImplemented));
            assert!(matches!(plan(&empty, &method, "1"), Plan::NotImplemented));
        }
    }

    #[test]
    fn method_names_are_case_sensitive() {
        let lower = Method::from_bytes(b"get").unwrap();
        assert_eq!(chosen(&everything(), lower, ""), None);
    }

    #[test]
    fn act_receives_split_tail() {
        let all = everything();
        match plan(&all, &Method::POST, "42/publish/now") {
            Plan::Act(_, tail) => assert_eq!(tail, ["42", "publish", "now"]),
            _ => panic!("expected act"),
        }
    }

    #[test]
    fn act_with_empty_first_segment_is_invalid() {
        assert!(matches!(plan(&everything(), &Method::POST, "/publish"), Plan::InvalidUri));
    }

    #[test]
    fn act_absent_wins_over_invalid_uri() {
        assert!(matches!(plan(&Resource::new(), &Method::POST, "/publish"), Plan::NotImplemented));
    }

    #[test]
    fn only_request_taking_plans_read_the_body() {
        let all = everything();
        assert!(plan(&all, &Method::POST, "").reads_body());
        assert!(plan(&all, &Method::PUT, "42").reads_body());
        assert!(plan(&all, &Method::POST, "42/x").reads_body());
        assert!(!plan(&all, &Method::GET, "").reads_body());
        assert!(!plan(&all, &Method::GET, "42").reads_body());
        assert!(!plan(&all, &Method::DELETE, "42").reads_body());
        assert!(!plan(&all, &Method::OPTIONS, "42").reads_body());
        assert!(!plan(&Resource::new(), &Method::POST, "").reads_body());
    }

    #[tokio::test]
    async fn bad_form_stops_informed_index() {
        let res = dispatch(&registry(), request("GET", "/snips/?q=%zz", b"")).await;
        assert_eq!(res.code(), http::StatusCode::BAD_REQUEST);
        assert_eq!(res.body(), br#"invalid URL escape "%zz""#);
    }

    #[tokio::test]
    async fn non_absolute_path_is_bad_request() {
        let res = dispatch(&Registry::new(), request("OPTIONS", "*", b"")).await;
        assert_eq!(res.code(), http::StatusCode::BAD_REQUEST);
        assert_eq!(res.body(), b"invalid uri *");
    }

    #[tokio::test]
    async fn undecodable_path_is_bad_request() {
        let res = dispatch(&registry(), request("GET", "/snips/%zz", b"")).await;
        assert_eq!(res.code(), http::StatusCode::BAD_REQUEST);
        assert_eq!(res.body(), b"invalid uri /snips/%zz");
    }

    #[tokio::test]
    async fn unknown_resource_is_not_found() {
        let res = dispatch(&registry(), request("DELETE", "/unknown/1", b"")).await;
        assert_eq!(res.code(), http::StatusCode::NOT_FOUND);
        assert_eq!(res.body(), b"resource unknown not found");
    }
}
