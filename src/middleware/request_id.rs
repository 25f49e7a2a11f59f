use crate::handler::{handler_fn, Request, SharedHandler};
use crate::ids::RequestId;
use http::header::HeaderValue;
use http::HeaderName;
use tracing::debug;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Reads `X-Request-ID` (or generates a ULID), stores it in the request
/// extensions and echoes it on the response.
///
/// Client values that are empty, longer than
/// [`crate::ids::MAX_REQUEST_ID_LEN`] or not visible ASCII are replaced.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdMiddleware;

impl super::Middleware for RequestIdMiddleware {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        handler_fn(move |w, mut req| {
            let client = req
                .headers()
                .get(&REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok());
            let id = RequestId::from_header_or_new(client);
            if client.is_some_and(|c| c != id.as_str()) {
                debug!(request_id = %id, "Replaced malformed client request id");
            }
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                w.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            req.extensions_mut().insert(id);
            next.serve(w, req);
        })
    }
}

/// Request id stored by [`RequestIdMiddleware`].
#[must_use]
pub fn request_id(req: &Request) -> Option<&RequestId> {
    req.extensions().get::<RequestId>()
}
