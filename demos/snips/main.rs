//! Snips: an in-memory collection served as a REST resource.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example snips
//!
//! Try:
//!   curl -X POST http://localhost:3000/snips/ -d 'hello'
//!   curl http://localhost:3000/snips/
//!   curl 'http://localhost:3000/snips/?limit=1'
//!   curl http://localhost:3000/snips/0
//!   curl -X PUT http://localhost:3000/snips/0 -d 'hello again'
//!   curl -X POST http://localhost:3000/snips/0/append -d '!'
//!   curl -X OPTIONS http://localhost:3000/snips/
//!   curl -X DELETE http://localhost:3000/snips/0

mod collection;

use std::sync::Arc;

use http::StatusCode;
use resty::{Form, HeaderMap, Registry, Request, Resource, Response, Server};
use tracing_subscriber::EnvFilter;

use crate::collection::SnipsCollection;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), resty::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("SNIPS_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());

    let mut registry = Registry::new();
    registry.register("snips", snips_resource(Arc::new(SnipsCollection::new())))?;

    Server::bind(&addr).await?.serve(registry).await
}

fn snips_resource(snips: Arc<SnipsCollection>) -> Resource {
    let (list, add, view, put, remove, act) =
        (snips.clone(), snips.clone(), snips.clone(), snips.clone(), snips.clone(), snips);

    Resource::new()
        // GET /snips/?limit=N
        .informed_index(move |form: Form, _headers: HeaderMap| {
            let snips = list.clone();
            async move {
                let mut all = snips.all();
                if let Some(limit) = form.get("limit") {
                    let Ok(limit) = limit.parse::<usize>() else {
                        return Response::bad_request(format!("invalid limit {limit}"));
                    };
                    all.truncate(limit);
                }
                render(&all)
            }
        })
        // POST /snips/
        .create(move |req: Request| {
            let snips = add.clone();
            async move {
                let Ok(body) = std::str::from_utf8(req.body()) else {
                    return Response::bad_request("snip body must be UTF-8");
                };
                let id = snips.add(body);
                Response::created(&format!("/snips/{id}"))
            }
        })
        // GET /snips/<id>
        .find(move |id: String| {
            let snips = view.clone();
            async move {
                match parse_id(&id).and_then(|id| snips.with_id(id)) {
                    Some(snip) => render(&snip),
                    None => Response::not_found(),
                }
            }
        })
        // PUT /snips/<id>
        .update(move |id: String, req: Request| {
            let snips = put.clone();
            async move {
                let Some(n) = parse_id(&id) else { return Response::not_found() };
                let body = String::from_utf8_lossy(req.body());
                if snips.replace(n, body) {
                    Response::updated(&format!("/snips/{n}"))
                } else {
                    Response::not_found()
                }
            }
        })
        // DELETE /snips/<id>
        .delete(move |id: String| {
            let snips = remove.clone();
            async move {
                match parse_id(&id) {
                    Some(n) if snips.remove(n) => Response::no_content(),
                    _ => Response::not_found(),
                }
            }
        })
        // POST /snips/<id>/append
        .act(move |tail: Vec<String>, req: Request| {
            let snips = act.clone();
            async move {
                let [id, verb] = tail.as_slice() else {
                    return Response::bad_request(format!("unknown action {}", tail.join("/")));
                };
                if verb != "append" {
                    return Response::bad_request(format!("unknown action {verb}"));
                }
                let Some(n) = parse_id(id) else { return Response::not_found() };
                match snips.append(n, &String::from_utf8_lossy(req.body())) {
                    Some(snip) => render(&snip),
                    None => Response::not_found(),
                }
            }
        })
        // OPTIONS /snips/ and /snips/<id>
        .options(|id: String| async move {
            let allow = if id.is_empty() { "GET, POST, OPTIONS" } else { "GET, PUT, DELETE, POST, OPTIONS" };
            Response::builder()
                .status(StatusCode::NO_CONTENT)
                .header("allow", allow)
                .no_body()
        })
}

fn parse_id(id: &str) -> Option<u64> {
    id.parse().ok()
}

fn render<T: serde::Serialize + ?Sized>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => Response::json(bytes),
        Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
