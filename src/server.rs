//! HTTP surface.
//!
//! Every path and method lands on one handler which expects
//! `/{owner}/{repo}/{query}` and answers with a `302 Found` to the matching
//! asset, or streams the asset through when running in proxy mode. Failures
//! are answered with the bare reason phrase of their status code.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, HttpBody},
    extract::State,
    http::{HeaderMap, HeaderName, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::{debug, info, instrument, warn};

use crate::config::Delivery;
use crate::error::{RedirectError, Result};
use crate::resolver::{Resolver, parse_path};

/// State shared by all request handlers.
pub struct AppState {
    pub resolver: Resolver,
    pub delivery: Delivery,
    /// Client used to fetch asset bodies in proxy mode.
    pub http_client: reqwest::Client,
}

/// Build the axum [`Router`] with the catch-all asset handler.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new().fallback(handle_asset).with_state(state)
}

#[instrument(skip(state, headers, body), fields(path = %uri.path()))]
async fn handle_asset(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Result<Response> {
    let request = parse_path(uri.path())?;
    let resolved = state.resolver.resolve(&request).await?;

    info!(
        owner = %request.owner,
        repo = %request.repo,
        query = %request.query,
        asset = %resolved.asset.name,
        tag = %resolved.tag_name,
        "resolved asset"
    );

    match state.delivery {
        Delivery::Redirect => Ok(redirect(&resolved.url)),
        Delivery::Proxy => {
            proxy(&state.http_client, method, &headers, body, resolved.url).await
        }
    }
}

fn redirect(url: &Url) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.as_str())]).into_response()
}

/// Headers that describe a single connection and must not be forwarded.
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

fn forwardable(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Fetch the asset with the caller's method, headers, and body and stream it back.
///
/// Both bodies are streamed, so a disconnecting client drops the upstream
/// transfer with it.
async fn proxy(
    client: &reqwest::Client,
    method: Method,
    headers: &HeaderMap,
    body: Body,
    url: Url,
) -> Result<Response> {
    let mut outbound = forwardable(headers);
    outbound.remove(header::HOST);

    debug!(%url, %method, "proxying asset");

    let mut request = client.request(method, url).headers(outbound);
    // A bodiless request stays bodiless so GETs aren't sent chunked.
    if body.size_hint().exact() != Some(0) {
        request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }
    let upstream = request.send().await?;

    let status = upstream.status();
    let response_headers = forwardable(upstream.headers());
    debug!(%status, "upstream asset response");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

impl IntoResponse for RedirectError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, %status, "request failed");
        } else {
            debug!(error = %self, %status, "request rejected");
        }
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}
