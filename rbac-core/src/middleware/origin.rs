use super::tracing::request_id_of;
use axum::{
    extract::Request,
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

const SEC_FETCH_SITE: &str = "sec-fetch-site";

/// Reject state-changing requests that a browser marks as coming from
/// another site.
///
/// A request passes when it carries no `Origin` header (non-browser
/// clients) or when the `Origin` authority equals `Host`. A literal
/// `Origin: null` and `Sec-Fetch-Site: cross-site` are rejected.
pub async fn same_origin_middleware(req: Request, next: Next) -> Response {
    if is_safe_method(req.method()) || is_same_origin(req.headers()) {
        return next.run(req).await;
    }

    tracing::warn!(
        request_id = %request_id_of(&req),
        method = %req.method(),
        path = %req.uri().path(),
        origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-"),
        "Cross-origin request rejected"
    );
    (StatusCode::FORBIDDEN, "Cross-origin request rejected").into_response()
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

pub fn is_same_origin(headers: &HeaderMap) -> bool {
    let fetch_site = headers.get(SEC_FETCH_SITE).and_then(|v| v.to_str().ok());
    if fetch_site == Some("cross-site") {
        return false;
    }

    let Some(origin) = headers.get(header::ORIGIN) else {
        return true;
    };
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());

    match (origin.to_str().ok().and_then(origin_authority), host) {
        (Some(authority), Some(host)) => authority.eq_ignore_ascii_case(host),
        _ => false,
    }
}

/// `host[:port]` part of a serialized origin such as `http://localhost:5173`.
fn origin_authority(origin: &str) -> Option<&str> {
    let (_, authority) = origin.split_once("://")?;
    let authority = authority.trim_end_matches('/');
    (!authority.is_empty() && !authority.contains('/')).then_some(authority)
}
