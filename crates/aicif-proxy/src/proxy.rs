/// Reverse proxy that mounts the citation API under a path prefix.
///
/// Every method under the prefix is forwarded to the upstream with the prefix removed,
/// the `Host` header rewritten to the upstream authority and hop-by-hop headers dropped
/// in both directions. Response bodies are streamed back unbuffered.
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;
use axum::Router;
use reqwest::Url;
use tracing::{debug, error, warn};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::rate_limit::RateLimiter;

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

#[derive(Clone)]
pub struct ProxyState {
    config: Arc<ProxyConfig>,
    client: reqwest::Client,
    limiter: Option<RateLimiter>,
}

impl ProxyState {
    pub fn new(config: ProxyConfig, limiter: Option<RateLimiter>) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent("aicif-proxy");
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            config: Arc::new(config),
            client: builder.build()?,
            limiter,
        })
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new().fallback(forward).with_state(state)
}

/// Path to request upstream for `path`, or `None` when `path` is outside the mount.
pub fn upstream_path<'a>(prefix: &str, path: &'a str, strip: bool) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    if !strip {
        return Some(path);
    }
    Some(if rest.is_empty() { "/" } else { rest })
}

/// Join `path` and `query` onto the upstream base, keeping any base path.
pub fn upstream_url(target: &Url, path: &str, query: Option<&str>) -> Result<Url, ProxyError> {
    let base = target.as_str().trim_end_matches('/');
    let mut raw = format!("{base}{path}");
    if let Some(query) = query {
        raw.push('?');
        raw.push_str(query);
    }
    Url::parse(&raw).map_err(|e| ProxyError::InvalidRequest(format!("{raw}: {e}")))
}

/// Copy `headers` minus hop-by-hop fields, including any the `Connection` header names.
fn end_to_end_headers(headers: &HeaderMap) -> HeaderMap {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || named.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn authority(url: &Url) -> Option<HeaderValue> {
    let host = url.host_str()?;
    let value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).ok()
}

async fn forward(State(state): State<ProxyState>, request: Request) -> Result<Response, ProxyError> {
    let config = &state.config;
    let (parts, body) = request.into_parts();

    let path = parts.uri.path();
    let Some(forward_path) = upstream_path(&config.prefix, path, config.strip_prefix) else {
        debug!(path, "request outside proxy prefix");
        return Err(ProxyError::NotFound(path.to_string()));
    };

    if let Some(limiter) = &state.limiter {
        limiter.check().await.inspect_err(|e| warn!(error = %e, path, "request throttled"))?;
    }

    let url = upstream_url(&config.target, forward_path, parts.uri.query())?;

    let mut headers = end_to_end_headers(&parts.headers);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::HOST);
    if let Some(host) = authority(&config.target) {
        headers.insert(header::HOST, host);
    }

    let body = to_bytes(body, config.max_body_bytes)
        .await
        .map_err(|e| ProxyError::InvalidRequest(format!("cannot read request body: {e}")))?;

    debug!(method = %parts.method, url = %url, "forwarding request");
    let upstream = state
        .client
        .request(parts.method.clone(), url.clone())
        .headers(headers)
        .body(body)
        .send()
        .await
        .inspect_err(|e| error!(error = %e, url = %url, "upstream request failed"))?;

    let status = upstream.status();
    let response_headers = end_to_end_headers(upstream.headers());
    debug!(status = status.as_u16(), url = %url, "upstream responded");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use axum::http::{Method, StatusCode};
    use axum::routing::any;
    use serde_json::{json, Value};

    use crate::config::parse_target;

    /// Upstream that echoes what it received.
    async fn echo_upstream() -> SocketAddr {
        let app = Router::new().fallback(|request: Request| async move {
            let (parts, body) = request.into_parts();
            let body = to_bytes(body, usize::MAX).await.unwrap();
            let header = |name: &str| {
                parts
                    .headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            axum::Json(json!({
                "method": parts.method.as_str(),
                "path": parts.uri.path(),
                "query": parts.uri.query(),
                "host": header("host"),
                "x_trace": header("x-trace"),
                "proxy_authorization": header("proxy-authorization"),
                "body": String::from_utf8_lossy(&body),
            }))
        });
        spawn(app).await
    }

    async fn spawn(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn spawn_proxy(
        upstream: SocketAddr,
        configure: impl FnOnce(&mut ProxyConfig),
        limiter: Option<RateLimiter>,
    ) -> String {
        let mut config = ProxyConfig::new(parse_target(&format!("http://{upstream}")).unwrap());
        configure(&mut config);
        let state = ProxyState::new(config, limiter).unwrap();
        let addr = spawn(router(state)).await;
        format!("http://{addr}")
    }

    #[test]
    fn paths_outside_prefix_are_rejected() {
        let prefix = "/.netlify/functions/app";
        assert_eq!(
            upstream_path(prefix, "/.netlify/functions/app/api/stats", true),
            Some("/api/stats")
        );
        assert_eq!(upstream_path(prefix, "/.netlify/functions/app", true), Some("/"));
        assert_eq!(
            upstream_path(prefix, "/.netlify/functions/app/api", false),
            Some("/.netlify/functions/app/api")
        );
        assert_eq!(upstream_path(prefix, "/.netlify/functions/application", true), None);
        assert_eq!(upstream_path(prefix, "/api/stats", true), None);
        assert_eq!(upstream_path("", "/api/stats", true), Some("/api/stats"));
    }

    #[test]
    fn upstream_url_keeps_base_path_and_query() {
        let target = Url::parse("http://backend:5000/v1/").unwrap();
        let url = upstream_url(&target, "/api/citations", Some("limit=10")).unwrap();
        assert_eq!(url.as_str(), "http://backend:5000/v1/api/citations?limit=10");
    }

    #[test]
    fn connection_named_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let out = end_to_end_headers(&headers);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key(header::ACCEPT));
    }

    #[tokio::test]
    async fn forwards_under_prefix_with_rewritten_host() {
        let upstream = echo_upstream().await;
        let proxy = spawn_proxy(upstream, |_| {}, None).await;

        let reply: Value = reqwest::Client::new()
            .post(format!("{proxy}/.netlify/functions/app/api/citations?limit=10"))
            .header("x-trace", "t-1")
            .header("proxy-authorization", "Basic c2VjcmV0")
            .body(r#"{"doi":"10.1/x"}"#)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(reply["method"], "POST");
        assert_eq!(reply["path"], "/api/citations");
        assert_eq!(reply["query"], "limit=10");
        assert_eq!(reply["host"], upstream.to_string());
        assert_eq!(reply["x_trace"], "t-1");
        assert!(reply["proxy_authorization"].is_null());
        assert_eq!(reply["body"], r#"{"doi":"10.1/x"}"#);
    }

    #[tokio::test]
    async fn prefix_is_kept_when_stripping_is_disabled() {
        let upstream = echo_upstream().await;
        let proxy = spawn_proxy(upstream, |c| c.strip_prefix = false, None).await;

        let reply: Value = reqwest::get(format!("{proxy}/.netlify/functions/app/api/stats"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(reply["path"], "/.netlify/functions/app/api/stats");
    }

    #[tokio::test]
    async fn outside_prefix_is_not_found() {
        let upstream = echo_upstream().await;
        let proxy = spawn_proxy(upstream, |_| {}, None).await;
        let response = reqwest::get(format!("{proxy}/api/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upstream_status_and_headers_pass_through() {
        let app = Router::new().route(
            "/missing",
            any(|| async { (StatusCode::IM_A_TEAPOT, [("x-upstream", "yes")], "short and stout") }),
        );
        let upstream = spawn(app).await;
        let proxy = spawn_proxy(upstream, |c| c.prefix = "/app".to_string(), None).await;

        let response = reqwest::Client::new()
            .request(Method::DELETE, format!("{proxy}/app/missing"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()["x-upstream"], "yes");
        assert_eq!(response.text().await.unwrap(), "short and stout");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed = listener.local_addr().unwrap();
        drop(listener);

        let proxy = spawn_proxy(closed, |_| {}, None).await;
        let response = reqwest::get(format!("{proxy}/.netlify/functions/app/api/stats"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn throttled_requests_get_retry_after() {
        let upstream = echo_upstream().await;
        let proxy = spawn_proxy(upstream, |_| {}, Some(RateLimiter::new(1))).await;
        let url = format!("{proxy}/.netlify/functions/app/api/stats");

        assert_eq!(reqwest::get(&url).await.unwrap().status(), StatusCode::OK);
        let throttled = reqwest::get(&url).await.unwrap();
        assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(throttled.headers()[header::RETRY_AFTER], "1");
    }
}
