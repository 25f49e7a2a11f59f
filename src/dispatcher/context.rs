//! Per-request values attached by the dispatcher.
//!
//! Both live in the request extensions under private key types, so nothing
//! outside this module can collide with or overwrite them.

use crate::handler::Request;
use crate::ids::RequestId;
use crate::middleware::REQUEST_ID_HEADER;
use crate::query::QueryMap;
use crate::router::Params;

#[derive(Clone)]
struct QueryMapKey(QueryMap);

#[derive(Clone)]
struct RouteParamsKey(Params);

pub(crate) fn attach(req: &mut Request, query: QueryMap, params: Params) {
    let ext = req.extensions_mut();
    ext.insert(QueryMapKey(query));
    if !params.is_empty() {
        ext.insert(RouteParamsKey(params));
    }
}

/// Decoded query parameters of a matched request.
#[must_use]
pub fn query_map(req: &Request) -> Option<&QueryMap> {
    req.extensions().get::<QueryMapKey>().map(|k| &k.0)
}

/// Path parameters of a matched request; `None` for exact routes.
#[must_use]
pub fn route_params(req: &Request) -> Option<&Params> {
    req.extensions().get::<RouteParamsKey>().map(|k| &k.0)
}

/// Request id for event data, before any middleware has run.
pub(crate) fn header_request_id(req: &Request) -> Option<RequestId> {
    req.headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}
